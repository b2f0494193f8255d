//! Chunked byte-stream transfers with inline checksum verification.
//!
//! A sender splits a byte source into chunks of at most `packet_size` bytes
//! and sends each one in an envelope, waiting for the receiver's
//! acknowledgement before the next. The final envelope carries the MD5 of
//! everything sent; the receiver compares it with its own running digest.

mod checksum;
mod config;
mod engine;
mod sink;
mod source;
mod streaming;
mod types;

#[cfg(test)]
mod testing;

pub use checksum::{Checksum, calculate_file_checksum, checksum_bytes};
pub use config::TransferConfig;
pub use engine::ChunkedTransfer;
pub use filehelper_protocol::DEFAULT_PACKET_SIZE;
pub use sink::DataSink;
pub use source::DataSource;
pub use types::TransferState;

use filehelper_protocol::{DecodeError, EncodeError};
use filehelper_transport::TransportError;

/// Error message sent to a sender whose stream exceeds the receive limit.
pub const SIZE_LIMIT_MESSAGE: &str = "Exceeded maximum file size";

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to decode envelope: {0}")]
    Decode(#[from] DecodeError),

    #[error("failed to encode envelope: {0}")]
    Encode(#[from] EncodeError),

    #[error("unexpected {0} envelope")]
    UnexpectedEnvelope(&'static str),

    #[error("{0}")]
    Peer(String),

    #[error("error in file CRC")]
    Integrity,

    #[error("failed to read source: {0}")]
    Source(std::io::Error),

    #[error("failed to write sink: {0}")]
    Sink(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("received data exceeds maximum size of {0} bytes")]
    SizeLimitExceeded(u64),
}

impl TransferError {
    /// The stream arrived intact in structure but its content did not match
    /// the sender's digest.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, TransferError::Integrity)
    }

    /// The connection itself failed or carried something unreadable.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            TransferError::Transport(_)
                | TransferError::Decode(_)
                | TransferError::UnexpectedEnvelope(_)
        )
    }
}
