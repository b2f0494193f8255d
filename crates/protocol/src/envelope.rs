//! Envelope codec.
//!
//! # Wire format
//!
//! ```text
//! OK envelope:     [0x01][kind: u8] ...
//!   ACK            kind 0x00, no further bytes
//!   CHUNK          kind 0x01, [4 bytes BE: len][len bytes: data]
//!   END_OF_STREAM  kind 0x02, [4 bytes BE: len][len bytes: ASCII hex digest]
//!
//! ERROR envelope:  [0x00][4 bytes BE: len][len bytes: UTF-8 message]
//! ```
//!
//! Decoding is strict: a frame must contain exactly one envelope.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::constants::{
    ENVELOPE_OVERHEAD, KIND_ACK, KIND_CHUNK, KIND_END_OF_STREAM, MAX_PAYLOAD_LEN, STATUS_ERROR,
    STATUS_OK,
};

/// Errors produced when a payload cannot be represented on the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("payload of {len} bytes exceeds limit of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },
}

/// Errors produced when a frame is not a well-formed envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("empty envelope")]
    Empty,

    #[error("unknown status byte 0x{0:02x}")]
    UnknownStatus(u8),

    #[error("unknown payload kind 0x{0:02x}")]
    UnknownKind(u8),

    #[error("truncated envelope: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("{0} trailing bytes after envelope")]
    TrailingBytes(usize),

    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("malformed digest: {0:?}")]
    MalformedDigest(String),
}

/// One decoded unit of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// A slice of the byte stream (`ok = true, more = true`).
    Chunk(Vec<u8>),
    /// End of the stream with the sender's hex digest (`ok = true, more = false`).
    EndOfStream { digest: String },
    /// Flow-control acknowledgement (`ok = true`, no payload).
    Ack,
    /// Failure reported by the peer (`ok = false`).
    Error { message: String },
}

impl Envelope {
    /// Decodes a single envelope from a complete frame.
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        decode(frame)
    }

    /// Encodes this envelope into a frame.
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        match self {
            Envelope::Chunk(data) => encode_chunk(data),
            Envelope::EndOfStream { digest } => encode_end_of_stream(digest),
            Envelope::Ack => Ok(encode_ack()),
            Envelope::Error { message } => encode_error(message),
        }
    }

    /// Returns `true` for every variant except [`Envelope::Error`].
    pub fn is_ok(&self) -> bool {
        !matches!(self, Envelope::Error { .. })
    }

    /// Short name used in logs and protocol errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Chunk(_) => "chunk",
            Envelope::EndOfStream { .. } => "end-of-stream",
            Envelope::Ack => "acknowledgement",
            Envelope::Error { .. } => "error",
        }
    }
}

/// Encodes a data chunk.
pub fn encode_chunk(data: &[u8]) -> Result<Bytes, EncodeError> {
    encode_ok(KIND_CHUNK, data)
}

/// Encodes the end-of-stream marker carrying `digest`.
pub fn encode_end_of_stream(digest: &str) -> Result<Bytes, EncodeError> {
    encode_ok(KIND_END_OF_STREAM, digest.as_bytes())
}

/// Encodes an acknowledgement.
pub fn encode_ack() -> Bytes {
    Bytes::from_static(&[STATUS_OK, KIND_ACK])
}

/// Encodes an error report.
pub fn encode_error(message: &str) -> Result<Bytes, EncodeError> {
    let len = payload_len(message.len())?;
    let mut buf = BytesMut::with_capacity(1 + 4 + message.len());
    buf.put_u8(STATUS_ERROR);
    buf.put_u32(len);
    buf.put_slice(message.as_bytes());
    Ok(buf.freeze())
}

fn encode_ok(kind: u8, payload: &[u8]) -> Result<Bytes, EncodeError> {
    let len = payload_len(payload.len())?;
    let mut buf = BytesMut::with_capacity(ENVELOPE_OVERHEAD + payload.len());
    buf.put_u8(STATUS_OK);
    buf.put_u8(kind);
    buf.put_u32(len);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Checks that a payload length fits the 4-byte length prefix.
fn payload_len(len: usize) -> Result<u32, EncodeError> {
    if len > MAX_PAYLOAD_LEN {
        return Err(EncodeError::PayloadTooLarge {
            len,
            max: MAX_PAYLOAD_LEN,
        });
    }
    Ok(len as u32)
}

/// Decodes a single envelope from a complete frame.
pub fn decode(frame: &[u8]) -> Result<Envelope, DecodeError> {
    let mut buf = frame;
    if !buf.has_remaining() {
        return Err(DecodeError::Empty);
    }

    let envelope = match buf.get_u8() {
        STATUS_OK => {
            ensure_remaining(buf, 1)?;
            match buf.get_u8() {
                KIND_ACK => Envelope::Ack,
                KIND_CHUNK => Envelope::Chunk(take_payload(&mut buf)?.to_vec()),
                KIND_END_OF_STREAM => {
                    let digest = std::str::from_utf8(take_payload(&mut buf)?)
                        .map_err(|_| DecodeError::InvalidUtf8("digest"))?;
                    if digest.is_empty() || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
                        return Err(DecodeError::MalformedDigest(digest.to_string()));
                    }
                    Envelope::EndOfStream {
                        digest: digest.to_string(),
                    }
                }
                other => return Err(DecodeError::UnknownKind(other)),
            }
        }
        STATUS_ERROR => {
            let message = String::from_utf8(take_payload(&mut buf)?.to_vec())
                .map_err(|_| DecodeError::InvalidUtf8("error message"))?;
            Envelope::Error { message }
        }
        other => return Err(DecodeError::UnknownStatus(other)),
    };

    if buf.has_remaining() {
        return Err(DecodeError::TrailingBytes(buf.remaining()));
    }
    Ok(envelope)
}

fn take_payload<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], DecodeError> {
    ensure_remaining(*buf, 4)?;
    let len = buf.get_u32() as usize;
    let whole: &'a [u8] = *buf;
    ensure_remaining(whole, len)?;
    let (payload, rest) = whole.split_at(len);
    *buf = rest;
    Ok(payload)
}

fn ensure_remaining(buf: &[u8], needed: usize) -> Result<(), DecodeError> {
    if buf.remaining() < needed {
        return Err(DecodeError::Truncated {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}
