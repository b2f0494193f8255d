//! Frame transports for chunked transfers.
//!
//! A [`Transport`] moves whole frames between two endpoints. The transfer
//! engine only ever sends and receives complete frames; connection setup
//! and teardown stay with the caller.
//!
//! - [`StreamTransport`] frames any `AsyncRead + AsyncWrite` stream, so the
//!   same code runs over a plain `TcpStream` or a secure stream produced by
//!   an external handshake layer.
//! - [`tcp`] connects and accepts framed TCP transports.
//! - [`LoopbackTransport`] joins two endpoints in-process.

pub mod error;
pub mod loopback;
pub mod stream;
pub mod tcp;

pub use error::TransportError;
pub use loopback::LoopbackTransport;
pub use stream::StreamTransport;
pub use tcp::{TcpTransport, TransportListener, connect};

use std::future::Future;
use std::time::Duration;

/// Largest frame accepted by default (8 MiB).
///
/// Leaves room for a 1 MiB data chunk plus envelope overhead several times
/// over.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 8 * 1024 * 1024;

/// Timeout for a TCP connection attempt.
pub const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for waiting on an incoming TCP connection.
pub const TCP_ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bidirectional frame channel.
///
/// Every operation may block until the peer makes progress. A configured
/// timeout turns a stalled operation into [`TransportError::Timeout`].
pub trait Transport: Send {
    /// Writes one complete frame and returns the number of bytes written.
    fn send(
        &mut self,
        frame: &[u8],
    ) -> impl Future<Output = Result<usize, TransportError>> + Send;

    /// Reads one complete frame.
    ///
    /// Fails with [`TransportError::Closed`] once the peer has gone away.
    fn receive(&mut self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Flushes pending output and shuts the endpoint down.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Transport settings shared by all implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Per-operation timeout for `send` and `receive`. `None` waits forever.
    pub io_timeout: Option<Duration>,
    /// Largest frame accepted in either direction.
    pub max_frame_length: usize,
    /// Timeout for establishing an outgoing TCP connection.
    pub connect_timeout: Duration,
    /// Timeout for waiting on an incoming TCP connection.
    pub accept_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            io_timeout: None,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            connect_timeout: TCP_CONNECT_TIMEOUT,
            accept_timeout: TCP_ACCEPT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Sets the per-operation I/O timeout.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Sets the largest accepted frame.
    pub fn with_max_frame_length(mut self, len: usize) -> Self {
        self.max_frame_length = len;
        self
    }
}

/// Runs `fut`, failing with [`TransportError::Timeout`] if `limit` elapses first.
pub(crate) async fn with_timeout<T, F>(
    limit: Option<Duration>,
    fut: F,
) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        },
        None => fut.await,
    }
}
