use anyhow::Context;
use clap::Parser;
use gb_gopro::WebcamRequest;
use tokio_util::sync::CancellationToken;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::cli::{
    args::{BridgeCommand, MainArgs},
    control::run_command,
    stream::run_stream,
};

#[macro_use]
extern crate tracing;

mod cli;
mod config;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // setup colorful backtraces
    color_backtrace::install();

    let mut targets = Targets::new().with_default(LevelFilter::INFO);

    if let Ok(directives) = std::env::var("RUST_LOG") {
        for directive in directives.split(',') {
            if let Some((target, level)) = directive.split_once('=') {
                targets = targets.with_target(
                    target,
                    level.parse::<LevelFilter>().context("invalid log level")?,
                );
            } else {
                targets = targets.with_default(
                    directive
                        .parse::<LevelFilter>()
                        .context("invalid log level")?,
                );
            }
        }
    }

    let (writer, _guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::hourly("logs", "gopro-bridge"));

    let reg = tracing_subscriber::registry();

    #[cfg(tokio_unstable)]
    let reg = reg.with(console_subscriber::spawn());

    reg
        // writer that outputs to console; stdout may be carrying the stream
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(targets),
        )
        // writer that outputs to files
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(Targets::new().with_targets(vec![
                    ("gopro_bridge", LevelFilter::DEBUG),
                    ("gb_gopro", LevelFilter::DEBUG),
                ])),
        )
        .init();

    let main_args = MainArgs::parse();

    debug!("reading config from {:?}", &main_args.config);
    let config = crate::config::BridgeConfig::read(main_args.config.as_deref(), main_args.address)
        .context("failed to read config")?;

    match main_args.command {
        BridgeCommand::Stream { output } => {
            let cancellation_token = CancellationToken::new();

            ctrlc::set_handler({
                let cancellation_token = cancellation_token.clone();
                move || {
                    info!("received interrupt, shutting down");
                    cancellation_token.cancel();
                }
            })
            .context("could not set ctrl+c handler")?;

            run_stream(config, output, cancellation_token).await
        }
        BridgeCommand::Status => run_command(config, WebcamRequest::Status).await,
        BridgeCommand::Start => run_command(config, WebcamRequest::Start).await,
        BridgeCommand::Stop => run_command(config, WebcamRequest::Stop).await,
    }
}
