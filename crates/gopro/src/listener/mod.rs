mod reader;
mod task;

use std::{io::Read, net::SocketAddr};

use anyhow::{bail, Context};
use log::*;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::{client::Task, ListenerConfig, WebcamControl};

pub use reader::DatagramReader;
pub use task::MAX_DATAGRAM_SIZE;

use self::task::ReceiveTask;

/// Receives the camera's transport stream over UDP and exposes it as a
/// sequential byte stream.
///
/// A listener starts out unstarted. [`Listener::listen`] binds the socket and
/// spawns the receive task; from then on the listener can be read until the
/// receive task ends and every queued datagram has been consumed. After that
/// the listener is closed for good.
pub struct Listener<C> {
    state: ListenerState<C>,
}

enum ListenerState<C> {
    Unstarted {
        control: C,
        config: ListenerConfig,
    },
    Running {
        reader: DatagramReader,
        local_addr: SocketAddr,
        handle: CloseHandle,
    },
    Closed,
}

/// Closes a running listener from anywhere, and waits for its teardown.
#[derive(Clone, Debug)]
pub struct CloseHandle {
    cancel: CancellationToken,
    finished: CancellationToken,
}

impl CloseHandle {
    /// Ends the receive task. Datagrams that were already queued can still be
    /// read.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the receive task has closed the queue and sent its stop
    /// command to the camera.
    pub async fn closed(&self) {
        self.finished.cancelled().await
    }
}

impl<C: WebcamControl> Listener<C> {
    /// `control` is used to stop the camera when the receive task ends.
    pub fn new(control: C, config: ListenerConfig) -> Self {
        Listener {
            state: ListenerState::Unstarted { control, config },
        }
    }

    pub async fn listen(&mut self) -> anyhow::Result<()> {
        let (control, config) = match std::mem::replace(&mut self.state, ListenerState::Closed) {
            ListenerState::Unstarted { control, config } => (control, config),
            state => {
                self.state = state;
                bail!("listener has already been started");
            }
        };

        let sock = UdpSocket::bind(config.bind_address)
            .await
            .with_context(|| format!("failed to bind udp socket to {}", config.bind_address))?;

        let local_addr = sock
            .local_addr()
            .context("failed to get local address of udp socket")?;

        info!("listening for transport stream on {local_addr}");

        let (pkt_tx, pkt_rx) = flume::bounded(config.queue_capacity);

        let handle = CloseHandle {
            cancel: CancellationToken::new(),
            finished: CancellationToken::new(),
        };

        let task = Box::new(ReceiveTask {
            sock,
            pkt_tx,
            control,
            idle_timeout: config.idle_timeout,
            finished: handle.finished.clone(),
        });

        let cancel = handle.cancel.clone();
        tokio::spawn(async move {
            let name = task.name();

            match task.run(cancel).await {
                Ok(()) => debug!("{name} task exited"),
                Err(err) => info!("{name} task ended: {err:#}"),
            }
        });

        self.state = ListenerState::Running {
            reader: DatagramReader::new(pkt_rx),
            local_addr,
            handle,
        };

        Ok(())
    }
}

impl<C> Listener<C> {
    /// Address that the socket is bound to, while the listener is running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.state {
            ListenerState::Running { local_addr, .. } => Some(*local_addr),
            ListenerState::Unstarted { .. } | ListenerState::Closed => None,
        }
    }

    pub fn close_handle(&self) -> Option<CloseHandle> {
        match &self.state {
            ListenerState::Running { handle, .. } => Some(handle.clone()),
            ListenerState::Unstarted { .. } | ListenerState::Closed => None,
        }
    }

    /// Stops receiving. Anything already queued can still be read, after
    /// which reads report end of stream.
    pub fn close(&mut self) {
        if let ListenerState::Running { handle, .. } = &self.state {
            handle.close();
        } else {
            self.state = ListenerState::Closed;
        }
    }

    /// Same as [`Read::read`], but waits for the next datagram without
    /// blocking the thread.
    pub async fn read_async(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = match &mut self.state {
            ListenerState::Unstarted { .. } => return Err(not_started()),
            ListenerState::Running { reader, .. } => reader.read_async(buf).await,
            ListenerState::Closed => return Ok(0),
        };

        self.finish_if_drained(n, buf.len());
        Ok(n)
    }

    fn finish_if_drained(&mut self, n: usize, requested: usize) {
        if n == 0 && requested > 0 {
            self.state = ListenerState::Closed;
        }
    }
}

impl<C> Read for Listener<C> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = match &mut self.state {
            ListenerState::Unstarted { .. } => return Err(not_started()),
            ListenerState::Running { reader, .. } => reader.read(buf)?,
            ListenerState::Closed => return Ok(0),
        };

        self.finish_if_drained(n, buf.len());
        Ok(n)
    }
}

fn not_started() -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "listener has not been started",
    )
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{client::CommandSink, CameraStatus, WebcamRequest};

    /// Records every command and reports the camera as idle.
    #[derive(Clone, Default)]
    struct RecordingCamera {
        requests: Arc<Mutex<Vec<WebcamRequest>>>,
    }

    impl RecordingCamera {
        fn requests(&self) -> Vec<WebcamRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandSink for RecordingCamera {
        type Request = WebcamRequest;
        type Response = anyhow::Result<CameraStatus>;

        async fn command(&self, request: Self::Request) -> Self::Response {
            self.requests.lock().unwrap().push(request);
            Ok(CameraStatus::Idle)
        }
    }

    fn test_config(idle_timeout: Duration, queue_capacity: usize) -> ListenerConfig {
        ListenerConfig {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            idle_timeout,
            queue_capacity,
        }
    }

    async fn started(
        camera: &RecordingCamera,
        config: ListenerConfig,
    ) -> (Listener<RecordingCamera>, std::net::UdpSocket) {
        let mut listener = Listener::new(camera.clone(), config);
        listener.listen().await.unwrap();

        let sender = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.connect(listener.local_addr().unwrap()).unwrap();

        (listener, sender)
    }

    async fn read_to_end(listener: &mut Listener<RecordingCamera>, buf_len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; buf_len];
        let mut out = Vec::new();

        loop {
            let n = listener.read_async(&mut buf).await.unwrap();
            if n == 0 {
                break out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[tokio::test]
    async fn delivers_datagrams_in_order() {
        let camera = RecordingCamera::default();
        let (mut listener, sender) =
            started(&camera, test_config(Duration::from_millis(300), 1024)).await;

        let mut expected = Vec::new();
        for i in 0..20u8 {
            let packet = vec![i; 1 + (i as usize * 73) % MAX_DATAGRAM_SIZE];
            sender.send(&packet).unwrap();
            expected.extend_from_slice(&packet);
        }

        assert_eq!(read_to_end(&mut listener, 100).await, expected);
    }

    #[tokio::test]
    async fn idle_timeout_ends_session_and_stops_camera_once() {
        let camera = RecordingCamera::default();
        let (mut listener, sender) =
            started(&camera, test_config(Duration::from_millis(200), 1024)).await;
        let handle = listener.close_handle().unwrap();

        sender.send(b"last words").unwrap();

        assert_eq!(read_to_end(&mut listener, 188).await, b"last words");
        assert!(listener.local_addr().is_none());

        handle.closed().await;
        assert_eq!(camera.requests(), vec![WebcamRequest::Stop]);
    }

    #[tokio::test]
    async fn full_queue_applies_backpressure() {
        let camera = RecordingCamera::default();
        let (mut listener, sender) =
            started(&camera, test_config(Duration::from_millis(500), 4)).await;

        for i in 0..12u8 {
            sender.send(&[i; 188]).unwrap();
        }

        // give the receiver time to fill the queue and stall
        tokio::time::sleep(Duration::from_millis(100)).await;

        let expected: Vec<u8> = (0..12u8).flat_map(|i| [i; 188]).collect();
        assert_eq!(read_to_end(&mut listener, 188).await, expected);
    }

    #[tokio::test]
    async fn close_drains_queue_then_ends() {
        let camera = RecordingCamera::default();
        let (mut listener, sender) =
            started(&camera, test_config(Duration::from_secs(30), 1024)).await;
        let handle = listener.close_handle().unwrap();

        sender.send(b"queued").unwrap();

        let mut buf = [0u8; 3];
        assert_eq!(listener.read_async(&mut buf).await.unwrap(), 3);

        listener.close();
        handle.closed().await;

        assert_eq!(read_to_end(&mut listener, 16).await, b"ued");
        assert_eq!(camera.requests(), vec![WebcamRequest::Stop]);
    }

    #[tokio::test]
    async fn dropping_reader_stops_receiver() {
        let camera = RecordingCamera::default();
        let (listener, sender) =
            started(&camera, test_config(Duration::from_secs(30), 1)).await;
        let handle = listener.close_handle().unwrap();

        drop(listener);
        sender.send(b"nobody is listening").unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle.closed())
            .await
            .unwrap();
        assert_eq!(camera.requests(), vec![WebcamRequest::Stop]);
    }

    #[tokio::test]
    async fn reading_before_listen_fails() {
        let mut listener = Listener::new(
            RecordingCamera::default(),
            test_config(Duration::from_secs(1), 1),
        );

        let err = listener.read(&mut [0u8; 8]).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotConnected);

        listener.close();
        assert_eq!(listener.read(&mut [0u8; 8]).unwrap(), 0);
        assert!(listener.listen().await.is_err());
    }

    #[tokio::test]
    async fn listen_twice_fails() {
        let camera = RecordingCamera::default();
        let (mut listener, _sender) =
            started(&camera, test_config(Duration::from_secs(1), 1)).await;

        assert!(listener.listen().await.is_err());
        assert!(listener.local_addr().is_some());
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let config = ListenerConfig {
            bind_address: taken.local_addr().unwrap(),
            ..test_config(Duration::from_secs(1), 1)
        };

        let mut listener = Listener::new(RecordingCamera::default(), config);
        assert!(listener.listen().await.is_err());
    }
}
