use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{CameraStatus, WebcamRequest};

#[async_trait]
pub trait CommandSink {
    type Request;
    type Response;

    async fn command(&self, request: Self::Request) -> Self::Response;
}

/// Anything that can drive the camera's webcam endpoints. The listener keeps
/// its own copy so that it can stop the camera when the stream dies.
pub trait WebcamControl:
    CommandSink<Request = WebcamRequest, Response = anyhow::Result<CameraStatus>>
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> WebcamControl for T where
    T: CommandSink<Request = WebcamRequest, Response = anyhow::Result<CameraStatus>>
        + Clone
        + Send
        + Sync
        + 'static
{
}

#[async_trait]
pub trait Task {
    fn name(&self) -> &'static str;

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()>;
}
