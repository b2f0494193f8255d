//! Length-prefixed framing over a byte stream.
//!
//! # Wire format
//!
//! ```text
//! [4 bytes BE: frame_len][frame_len bytes: frame]
//! ```
//!
//! The stream may be a plain `TcpStream` or any secure stream that was
//! already authenticated by the caller.

use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::TransportError;
use crate::{Transport, TransportConfig, with_timeout};

/// Frame transport over an `AsyncRead + AsyncWrite` stream.
pub struct StreamTransport<S> {
    framed: Framed<S, LengthDelimitedCodec>,
    io_timeout: Option<Duration>,
    max_frame_length: usize,
    closed: bool,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps an established stream.
    pub fn new(stream: S, config: &TransportConfig) -> Self {
        let codec = LengthDelimitedCodec::builder()
            .length_field_length(4)
            .max_frame_length(config.max_frame_length)
            .new_codec();
        Self {
            framed: Framed::new(stream, codec),
            io_timeout: config.io_timeout,
            max_frame_length: config.max_frame_length,
            closed: false,
        }
    }

    /// Returns the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.framed.get_ref()
    }

    /// Consumes the transport, returning the underlying stream.
    ///
    /// Frames buffered but not yet read are lost.
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frame: &[u8]) -> Result<usize, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if frame.len() > self.max_frame_length {
            return Err(TransportError::FrameTooLarge {
                len: frame.len(),
                max: self.max_frame_length,
            });
        }

        let framed = &mut self.framed;
        with_timeout(self.io_timeout, async move {
            framed.send(Bytes::copy_from_slice(frame)).await?;
            Ok(frame.len())
        })
        .await
    }

    async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        let framed = &mut self.framed;
        with_timeout(self.io_timeout, async move {
            match framed.next().await {
                Some(Ok(frame)) => Ok(frame.to_vec()),
                Some(Err(e)) => Err(e.into()),
                None => Err(TransportError::Closed),
            }
        })
        .await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        SinkExt::<Bytes>::close(&mut self.framed).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, DuplexStream};

    type DuplexTransport = StreamTransport<DuplexStream>;

    fn pair(config: &TransportConfig) -> (DuplexTransport, DuplexTransport) {
        let (a, b) = tokio::io::duplex(64 * 1024);
        (
            StreamTransport::new(a, config),
            StreamTransport::new(b, config),
        )
    }

    #[tokio::test]
    async fn frames_keep_boundaries() {
        let (mut a, mut b) = pair(&TransportConfig::default());

        assert_eq!(a.send(b"first").await.unwrap(), 5);
        a.send(b"").await.unwrap();
        a.send(b"third frame").await.unwrap();

        assert_eq!(b.receive().await.unwrap(), b"first");
        assert!(b.receive().await.unwrap().is_empty());
        assert_eq!(b.receive().await.unwrap(), b"third frame");
    }

    #[tokio::test]
    async fn both_directions() {
        let (mut a, mut b) = pair(&TransportConfig::default());

        a.send(b"ping").await.unwrap();
        assert_eq!(b.receive().await.unwrap(), b"ping");
        b.send(b"pong").await.unwrap();
        assert_eq!(a.receive().await.unwrap(), b"pong");
    }

    #[tokio::test]
    async fn oversized_frame_rejected_on_send() {
        let config = TransportConfig::default().with_max_frame_length(8);
        let (mut a, _b) = pair(&config);

        let result = a.send(&[0u8; 9]).await;
        assert!(matches!(
            result,
            Err(TransportError::FrameTooLarge { len: 9, max: 8 })
        ));
    }

    #[tokio::test]
    async fn oversized_frame_rejected_on_receive() {
        let small = TransportConfig::default().with_max_frame_length(4);
        let (mut raw, b) = tokio::io::duplex(1024);
        let mut b = StreamTransport::new(b, &small);

        raw.write_all(&[0, 0, 0, 16]).await.unwrap();
        raw.write_all(&[0u8; 16]).await.unwrap();

        let result = b.receive().await;
        assert!(matches!(result, Err(TransportError::Io(_))));
    }

    #[tokio::test]
    async fn peer_close_reported_as_closed() {
        let (mut a, mut b) = pair(&TransportConfig::default());

        a.send(b"last").await.unwrap();
        a.close().await.unwrap();
        drop(a);

        assert_eq!(b.receive().await.unwrap(), b"last");
        let result = b.receive().await;
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn truncated_frame_is_io_error() {
        let (mut raw, b) = tokio::io::duplex(1024);
        let mut b = StreamTransport::new(b, &TransportConfig::default());

        raw.write_all(&[0, 0, 0, 10, 1, 2, 3]).await.unwrap();
        drop(raw);

        let result = b.receive().await;
        assert!(matches!(result, Err(TransportError::Io(_))));
    }

    #[tokio::test]
    async fn closed_endpoint_refuses_io() {
        let (mut a, _b) = pair(&TransportConfig::default());
        a.close().await.unwrap();

        assert!(matches!(a.send(b"x").await, Err(TransportError::Closed)));
        assert!(matches!(a.receive().await, Err(TransportError::Closed)));
        // Closing twice is harmless.
        a.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn receive_times_out() {
        let config = TransportConfig::default().with_io_timeout(Duration::from_secs(5));
        let (_a, mut b) = pair(&config);

        let result = b.receive().await;
        assert!(matches!(result, Err(TransportError::Timeout)));
    }
}
