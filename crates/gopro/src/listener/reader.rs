use std::io::Read;

use bytes::{Buf, Bytes};

/// Turns the queue of datagrams into a sequential byte stream. Once the
/// sending half of the queue is gone and every datagram has been read, reads
/// return `Ok(0)`.
pub struct DatagramReader {
    pkt_rx: flume::Receiver<Bytes>,
    /// Unread tail of the most recently dequeued datagram.
    pending: Bytes,
}

impl DatagramReader {
    pub fn new(pkt_rx: flume::Receiver<Bytes>) -> Self {
        DatagramReader {
            pkt_rx,
            pending: Bytes::new(),
        }
    }

    /// Same as [`Read::read`], but waits for the next datagram without
    /// blocking the thread.
    pub async fn read_async(&mut self, buf: &mut [u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }

        while self.pending.is_empty() {
            match self.pkt_rx.recv_async().await {
                Ok(packet) => self.pending = packet,
                Err(_) => return 0,
            }
        }

        self.fill(buf)
    }

    fn fill(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        n
    }
}

impl Read for DatagramReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.pending.is_empty() {
            match self.pkt_rx.recv() {
                Ok(packet) => self.pending = packet,
                // queue closed and drained
                Err(_) => return Ok(0),
            }
        }

        Ok(self.fill(buf))
    }
}
