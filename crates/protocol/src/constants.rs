/// Default size of a data chunk (1 MiB).
///
/// Overridable per transfer through the transfer crate's configuration.
pub const DEFAULT_PACKET_SIZE: usize = 1024 * 1024;

/// Status byte of a successful envelope.
pub const STATUS_OK: u8 = 0x01;

/// Status byte of an error envelope.
pub const STATUS_ERROR: u8 = 0x00;

/// Payload kind: acknowledgement, no payload.
pub const KIND_ACK: u8 = 0x00;

/// Payload kind: data chunk (`more = true`).
pub const KIND_CHUNK: u8 = 0x01;

/// Payload kind: end-of-stream marker (`more = false`).
pub const KIND_END_OF_STREAM: u8 = 0x02;

/// Bytes an envelope adds around its payload: status, kind and length prefix.
pub const ENVELOPE_OVERHEAD: usize = 1 + 1 + 4;

/// Largest payload the 4-byte length prefix can describe.
pub const MAX_PAYLOAD_LEN: usize = u32::MAX as usize;
