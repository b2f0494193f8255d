//! In-process transport pair.
//!
//! Each endpoint owns the sending half of one bounded channel and the
//! receiving half of the other, so frames stay ordered per direction and a
//! full channel blocks the sender like a full socket buffer would.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::{Transport, with_timeout};

/// One endpoint of an in-process frame channel.
#[derive(Debug)]
pub struct LoopbackTransport {
    tx: Option<mpsc::Sender<Vec<u8>>>,
    rx: mpsc::Receiver<Vec<u8>>,
    io_timeout: Option<Duration>,
    closed: bool,
}

impl LoopbackTransport {
    /// Creates two connected endpoints.
    ///
    /// `capacity` is the number of frames buffered per direction (at least 1).
    pub fn pair(capacity: usize) -> (Self, Self) {
        let capacity = capacity.max(1);
        let (a_tx, b_rx) = mpsc::channel(capacity);
        let (b_tx, a_rx) = mpsc::channel(capacity);
        (Self::new(a_tx, a_rx), Self::new(b_tx, b_rx))
    }

    fn new(tx: mpsc::Sender<Vec<u8>>, rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            tx: Some(tx),
            rx,
            io_timeout: None,
            closed: false,
        }
    }

    /// Sets the per-operation I/O timeout.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }
}

impl Transport for LoopbackTransport {
    async fn send(&mut self, frame: &[u8]) -> Result<usize, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        with_timeout(self.io_timeout, async move {
            tx.send(frame.to_vec())
                .await
                .map_err(|_| TransportError::Closed)?;
            Ok(frame.len())
        })
        .await
    }

    async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let rx = &mut self.rx;
        with_timeout(self.io_timeout, async move {
            rx.recv().await.ok_or(TransportError::Closed)
        })
        .await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}
