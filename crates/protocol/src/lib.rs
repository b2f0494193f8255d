//! Wire types for chunked FileHelper transfers.
//!
//! Every unit exchanged over a transport is an [`Envelope`]: a data chunk,
//! the end-of-stream marker carrying the sender's digest, an acknowledgement,
//! or an error report.

pub mod constants;
pub mod envelope;

pub use constants::DEFAULT_PACKET_SIZE;
pub use envelope::{
    DecodeError, EncodeError, Envelope, decode, encode_ack, encode_chunk, encode_end_of_stream,
    encode_error,
};
