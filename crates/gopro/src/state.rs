use std::fmt::Display;

use anyhow::{bail, Context};
use num_traits::FromPrimitive;
use serde::Deserialize;

/// Webcam mode as reported by the camera. Only the camera firmware changes
/// this, in response to start and stop commands.
#[repr(u8)]
#[derive(Debug, Copy, Clone, FromPrimitive, ToPrimitive, Eq, PartialEq)]
pub enum CameraStatus {
    Off = 0,
    Idle,
    HighPowerPreview,
    LowPowerPreview,
    Unavailable,
}

impl Display for CameraStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraStatus::Off => write!(f, "off"),
            CameraStatus::Idle => write!(f, "idle"),
            CameraStatus::HighPowerPreview => write!(f, "high power preview"),
            CameraStatus::LowPowerPreview => write!(f, "low power preview"),
            CameraStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, FromPrimitive, ToPrimitive, Eq, PartialEq)]
pub enum CameraError {
    None = 0,
    SetPreset,
    SetWindowSize,
    ExecStream,
    Shutter,
    ComTimeout,
    InvalidParam,
    Unavailable,
    Exit,
}

impl Display for CameraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraError::None => write!(f, "none"),
            CameraError::SetPreset => write!(f, "could not set preset"),
            CameraError::SetWindowSize => write!(f, "could not set window size"),
            CameraError::ExecStream => write!(f, "could not execute stream"),
            CameraError::Shutter => write!(f, "shutter error"),
            CameraError::ComTimeout => write!(f, "communication timeout"),
            CameraError::InvalidParam => write!(f, "invalid parameter"),
            CameraError::Unavailable => write!(f, "unavailable"),
            CameraError::Exit => write!(f, "exit"),
        }
    }
}

/// Body of every webcam endpoint, exactly as it appears on the wire.
#[derive(Debug, Deserialize)]
pub(crate) struct RawStatusResponse {
    pub status: i64,
    pub error: i64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StatusResponse {
    pub status: CameraStatus,
    pub error: CameraError,
}

impl TryFrom<RawStatusResponse> for StatusResponse {
    type Error = anyhow::Error;

    fn try_from(raw: RawStatusResponse) -> Result<Self, Self::Error> {
        let error = CameraError::from_i64(raw.error)
            .with_context(|| format!("unknown camera error code {}", raw.error))?;

        let status = CameraStatus::from_i64(raw.status)
            .with_context(|| format!("unknown camera status code {}", raw.status))?;

        Ok(StatusResponse { status, error })
    }
}

impl StatusResponse {
    /// Fails if the camera reported anything other than [`CameraError::None`].
    pub fn into_status(self) -> anyhow::Result<CameraStatus> {
        match self.error {
            CameraError::None => Ok(self.status),
            err => bail!("error in status response: {} ({})", err as u8, err),
        }
    }
}
