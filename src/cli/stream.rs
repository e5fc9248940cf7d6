use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use humansize::{file_size_opts, FileSize};
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;

/// Dials the camera and copies its transport stream to `output` until the
/// stream ends or the user interrupts.
pub async fn run_stream(
    config: BridgeConfig,
    output: Option<PathBuf>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let output = output
        .or(config.output)
        .unwrap_or_else(default_output_path);

    // open the output first so that a bad path does not leave the camera streaming
    let writer = open_output(&output)?;

    let source = gb_gopro::dial(&config.address, &config.gopro)
        .await
        .context("failed to connect to camera")?;

    let close_handle = source
        .close_handle()
        .context("stream closed before it started")?;

    info!(
        "writing {} stream from {} to {}",
        source.format_name,
        source.remote_addr,
        output.display()
    );

    // reads from the stream block, so they stay off the runtime
    let copy_task = tokio::task::spawn_blocking(move || {
        let mut source = source;
        let mut writer = BufWriter::new(writer);

        let total = std::io::copy(&mut source, &mut writer)?;
        writer.flush()?;

        Ok::<_, std::io::Error>(total)
    });

    select! {
        _ = cancellation_token.cancelled() => {
            info!("closing stream");
            close_handle.close();
        }
        _ = close_handle.closed() => {}
    }

    let total = copy_task
        .await
        .context("stream copy task panicked")?
        .context("failed to write stream")?;

    // the camera is told to stop during teardown; don't exit before that
    close_handle.closed().await;

    let size = total
        .file_size(file_size_opts::CONVENTIONAL)
        .unwrap_or_else(|_| format!("{total} B"));

    info!("stream ended after {size}");

    Ok(())
}

fn default_output_path() -> PathBuf {
    let file_name = chrono::Local::now().format("%FT%H-%M-%S.ts").to_string();

    Path::new("captures").join(file_name)
}

fn open_output(path: &Path) -> anyhow::Result<Box<dyn Write + Send>> {
    if path == Path::new("-") {
        return Ok(Box::new(std::io::stdout()));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).context("failed to create output directory")?;
        }
    }

    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;

    Ok(Box::new(file))
}
