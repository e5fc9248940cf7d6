use std::fmt::Display;

/// The webcam endpoints of the camera's control API.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WebcamRequest {
    Status,
    Start,
    Stop,
}

impl WebcamRequest {
    pub fn path(&self) -> &'static str {
        match self {
            WebcamRequest::Status => "/gopro/webcam/status",
            WebcamRequest::Start => "/gopro/webcam/start",
            WebcamRequest::Stop => "/gopro/webcam/stop",
        }
    }
}

impl Display for WebcamRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebcamRequest::Status => write!(f, "status"),
            WebcamRequest::Start => write!(f, "start"),
            WebcamRequest::Stop => write!(f, "stop"),
        }
    }
}
