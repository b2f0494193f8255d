//! Test doubles shared by the engine and wrapper tests.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use filehelper_protocol::envelope::{Envelope, decode};
use filehelper_transport::{Transport, TransportError};
use tokio::io::{AsyncRead, ReadBuf};

/// A frame seen by a [`Tap`], from the tapped endpoint's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Sent(Envelope),
    Received(Envelope),
}

/// Transport wrapper that records every frame and can tamper with traffic.
pub(crate) struct Tap<T> {
    inner: T,
    events: Arc<Mutex<Vec<Event>>>,
    corrupt_chunk: Option<usize>,
    chunks_sent: usize,
    ack_delay: Option<Duration>,
}

impl<T: Transport> Tap<T> {
    pub(crate) fn new(inner: T) -> Self {
        Self {
            inner,
            events: Arc::new(Mutex::new(Vec::new())),
            corrupt_chunk: None,
            chunks_sent: 0,
            ack_delay: None,
        }
    }

    /// Flips the lowest bit of the last data byte of the `index`th chunk sent.
    pub(crate) fn corrupt_chunk(mut self, index: usize) -> Self {
        self.corrupt_chunk = Some(index);
        self
    }

    /// Holds every outgoing acknowledgement back for `delay`.
    pub(crate) fn delay_acks(mut self, delay: Duration) -> Self {
        self.ack_delay = Some(delay);
        self
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl<T: Transport> Transport for Tap<T> {
    async fn send(&mut self, frame: &[u8]) -> Result<usize, TransportError> {
        let mut frame = frame.to_vec();
        match decode(&frame) {
            Ok(Envelope::Chunk(data)) if !data.is_empty() => {
                if self.corrupt_chunk == Some(self.chunks_sent) {
                    let last = frame.len() - 1;
                    frame[last] ^= 0x01;
                }
                self.chunks_sent += 1;
            }
            Ok(Envelope::Ack) => {
                if let Some(delay) = self.ack_delay {
                    tokio::time::sleep(delay).await;
                }
            }
            _ => {}
        }

        if let Ok(envelope) = decode(&frame) {
            self.record(Event::Sent(envelope));
        }
        self.inner.send(&frame).await
    }

    async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        let frame = self.inner.receive().await?;
        if let Ok(envelope) = decode(&frame) {
            self.record(Event::Received(envelope));
        }
        Ok(frame)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close().await
    }
}

/// Largest number of chunks sent but not yet acknowledged at any point.
pub(crate) fn max_in_flight(events: &[Event]) -> usize {
    let mut in_flight = 0usize;
    let mut max = 0;
    for event in events {
        match event {
            Event::Sent(Envelope::Chunk(_)) => {
                in_flight += 1;
                max = max.max(in_flight);
            }
            Event::Received(Envelope::Ack) => in_flight = in_flight.saturating_sub(1),
            _ => {}
        }
    }
    max
}

/// Reader that yields `data`, then fails instead of reporting end of input.
pub(crate) struct FailingReader {
    data: Vec<u8>,
}

impl FailingReader {
    pub(crate) fn new(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.data.is_empty() {
            return Poll::Ready(Err(io::Error::other("disk unplugged")));
        }
        let n = self.data.len().min(buf.remaining());
        buf.put_slice(&self.data[..n]);
        self.data.drain(..n);
        Poll::Ready(Ok(()))
    }
}
