use anyhow::Context;
use gb_gopro::{CommandSink, WebcamClient, WebcamRequest};

use crate::config::BridgeConfig;

/// Sends a single webcam command to the camera and prints the status it
/// reports back.
pub async fn run_command(config: BridgeConfig, request: WebcamRequest) -> anyhow::Result<()> {
    let (host, _) = gb_gopro::parse_address(&config.address)?;

    let client = WebcamClient::new(&host, &config.gopro.control)?;

    debug!("sending {request} command to {host}");

    let status = client
        .command(request)
        .await
        .with_context(|| format!("{request} command failed"))?;

    println!("{status}");

    Ok(())
}
