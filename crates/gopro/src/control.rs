use anyhow::{bail, Context};
use async_trait::async_trait;
use log::*;
use reqwest::StatusCode;

use crate::{
    client::CommandSink,
    state::{RawStatusResponse, StatusResponse},
    CameraStatus, ControlConfig, WebcamRequest,
};

/// HTTP client for the camera's webcam control API.
#[derive(Clone, Debug)]
pub struct WebcamClient {
    base_url: reqwest::Url,
    http_client: reqwest::Client,
}

impl WebcamClient {
    pub fn new(host: &str, config: &ControlConfig) -> anyhow::Result<Self> {
        let base_url = reqwest::Url::parse(&format!("http://{}:{}", host, config.port))
            .context("invalid camera control url")?;

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to create http client")?;

        Ok(WebcamClient {
            base_url,
            http_client,
        })
    }
}

#[async_trait]
impl CommandSink for WebcamClient {
    type Request = WebcamRequest;
    type Response = anyhow::Result<CameraStatus>;

    async fn command(&self, request: Self::Request) -> Self::Response {
        let endpoint = self
            .base_url
            .join(request.path())
            .context("could not create webcam command url")?;

        trace!("sending {request} command to {endpoint}");

        let res = self
            .http_client
            .get(endpoint)
            .send()
            .await
            .with_context(|| format!("failed to send {request} command to camera"))?;

        if res.status() != StatusCode::OK {
            bail!("wrong response to {request} command: {}", res.status());
        }

        let raw: RawStatusResponse = res
            .json()
            .await
            .with_context(|| format!("malformed response to {request} command"))?;

        let status = StatusResponse::try_from(raw)?
            .into_status()
            .with_context(|| format!("camera rejected {request} command"))?;

        debug!("{request} command returned webcam status: {status}");

        Ok(status)
    }
}
