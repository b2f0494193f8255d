use serde::{Deserialize, Serialize};

use crate::DEFAULT_PACKET_SIZE;

/// Per-engine transfer settings.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Largest chunk sent in one envelope. `0` means [`DEFAULT_PACKET_SIZE`].
    pub packet_size: usize,
    /// Largest total a receive accepts before rejecting the stream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            max_size: None,
        }
    }
}

impl TransferConfig {
    /// Sets the chunk size.
    pub fn with_packet_size(mut self, packet_size: usize) -> Self {
        self.packet_size = packet_size;
        self
    }

    /// Sets the receive size limit.
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Chunk size actually used, never zero.
    pub fn effective_packet_size(&self) -> usize {
        if self.packet_size == 0 {
            DEFAULT_PACKET_SIZE
        } else {
            self.packet_size
        }
    }
}
