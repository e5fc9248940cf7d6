use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use log::*;
use tokio::{net::UdpSocket, select};
use tokio_util::sync::CancellationToken;

use crate::{
    client::{CommandSink, Task},
    WebcamControl, WebcamRequest,
};

/// Largest datagram the camera sends.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Copies datagrams from the socket into the queue. The first receive error
/// ends the task, and going quiet for `idle_timeout` counts as one.
pub struct ReceiveTask<C> {
    pub(super) sock: UdpSocket,
    pub(super) pkt_tx: flume::Sender<Bytes>,
    pub(super) control: C,
    pub(super) idle_timeout: Duration,
    /// Cancelled once the queue is closed and the stop command has been sent.
    pub(super) finished: CancellationToken,
}

#[async_trait]
impl<C: WebcamControl> Task for ReceiveTask<C> {
    fn name(&self) -> &'static str {
        "gopro/receive"
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self {
            sock,
            pkt_tx,
            control,
            idle_timeout,
            finished,
        } = *self;

        let recv_loop = async {
            let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
            let mut count: u64 = 0;

            loop {
                let (len, _) = tokio::time::timeout(idle_timeout, sock.recv_from(&mut buf))
                    .await
                    .with_context(|| {
                        format!("no datagram received for {idle_timeout:?} after {count} datagrams")
                    })?
                    .context("failed to receive datagram")?;

                if len == 0 {
                    continue;
                }

                // blocks while the queue is full
                if pkt_tx
                    .send_async(Bytes::copy_from_slice(&buf[..len]))
                    .await
                    .is_err()
                {
                    debug!("stream reader is gone, stopping receiver");
                    break;
                }

                count += 1;
            }

            Ok::<_, anyhow::Error>(())
        };

        let result = select! {
            _ = cancel.cancelled() => {
                debug!("listener closed");
                Ok(())
            }
            res = recv_loop => res,
        };

        drop(pkt_tx);
        drop(sock);

        if let Err(err) = control.command(WebcamRequest::Stop).await {
            debug!("could not stop webcam after stream ended: {err:#}");
        }

        finished.cancel();

        result
    }
}
