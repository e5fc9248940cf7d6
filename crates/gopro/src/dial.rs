use std::io::Read;

use anyhow::{bail, Context};
use log::*;

use crate::{
    client::CommandSink,
    listener::{CloseHandle, Listener},
    CameraStatus, GoProConfig, ListenerConfig, WebcamClient, WebcamControl, WebcamRequest,
};

/// Format label attached to every stream produced by this crate.
pub const FORMAT_NAME: &str = "gopro";

/// A live transport stream from the camera, ready to be handed to an MPEG-TS
/// demuxer.
pub struct StreamSource<C> {
    pub format_name: &'static str,
    /// Camera host the stream was negotiated with.
    pub remote_addr: String,
    listener: Listener<C>,
}

impl<C> StreamSource<C> {
    pub fn close(&mut self) {
        self.listener.close()
    }

    pub fn close_handle(&self) -> Option<CloseHandle> {
        self.listener.close_handle()
    }

    pub async fn read_async(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.listener.read_async(buf).await
    }
}

impl<C> Read for StreamSource<C> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.listener.read(buf)
    }
}

/// Puts the camera at `address` into webcam mode and starts receiving its
/// transport stream.
///
/// `address` is a url such as `gopro://172.25.190.51`; a bare host is accepted
/// too.
pub async fn dial(
    address: &str,
    config: &GoProConfig,
) -> anyhow::Result<StreamSource<WebcamClient>> {
    let (host, remote_addr) = parse_address(address)?;

    let control = WebcamClient::new(&host, &config.control)?;

    dial_with(control, remote_addr, config.listener.clone()).await
}

/// Like [`dial`], but drives the camera through any [`WebcamControl`].
pub async fn dial_with<C: WebcamControl>(
    control: C,
    remote_addr: String,
    config: ListenerConfig,
) -> anyhow::Result<StreamSource<C>> {
    let mut listener = Listener::new(control.clone(), config);

    negotiate(&control, &mut listener).await?;

    info!("receiving {FORMAT_NAME} stream from {remote_addr}");

    Ok(StreamSource {
        format_name: FORMAT_NAME,
        remote_addr,
        listener,
    })
}

/// Brings the camera into webcam mode with `listener` already receiving by the
/// time the camera starts sending.
pub async fn negotiate<C: WebcamControl>(
    control: &C,
    listener: &mut Listener<C>,
) -> anyhow::Result<()> {
    // a previous session may have left the webcam running
    let status = control
        .command(WebcamRequest::Status)
        .await
        .context("failed to query webcam status")?;

    match status {
        CameraStatus::HighPowerPreview | CameraStatus::LowPowerPreview => {
            info!("webcam is already active ({status}), stopping it first");

            control
                .command(WebcamRequest::Stop)
                .await
                .context("failed to stop active webcam")?;
        }
        CameraStatus::Off | CameraStatus::Idle | CameraStatus::Unavailable => {}
    }

    listener
        .listen()
        .await
        .context("failed to start udp listener")?;

    if let Err(err) = start_webcam(control).await {
        listener.close();
        return Err(err);
    }

    Ok(())
}

async fn start_webcam<C: WebcamControl>(control: &C) -> anyhow::Result<()> {
    let status = control
        .command(WebcamRequest::Status)
        .await
        .context("failed to query webcam status")?;

    match status {
        CameraStatus::Off | CameraStatus::Idle => {
            debug!("webcam is {status}, starting it");

            control
                .command(WebcamRequest::Start)
                .await
                .context("failed to start webcam")?;
        }
        CameraStatus::HighPowerPreview | CameraStatus::LowPowerPreview => {
            debug!("webcam is already streaming ({status})");
        }
        CameraStatus::Unavailable => {
            warn!("webcam is unavailable, waiting for it to start streaming anyway");
        }
    }

    Ok(())
}

/// Splits a camera address into the host used for control requests and the
/// address reported with the stream.
pub fn parse_address(address: &str) -> anyhow::Result<(String, String)> {
    let url = if address.contains("://") {
        reqwest::Url::parse(address)
    } else {
        reqwest::Url::parse(&format!("gopro://{address}"))
    }
    .with_context(|| format!("invalid camera address '{address}'"))?;

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_owned(),
        _ => bail!("camera address '{address}' has no host"),
    };

    let remote_addr = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.clone(),
    };

    Ok((host, remote_addr))
}
