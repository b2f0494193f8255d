use crate::checksum::Checksum;

/// Where a transfer engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// No transfer has run yet.
    Idle,
    /// A send is in progress.
    Sending,
    /// A receive is in progress.
    Receiving,
    /// The last transfer completed and its checksum matched.
    Finished,
    /// The last transfer failed.
    Errored,
}

impl TransferState {
    /// Returns `true` while a send or receive is running.
    pub fn is_active(self) -> bool {
        matches!(self, TransferState::Sending | TransferState::Receiving)
    }
}

/// Mutable state of one transfer, reset when the next one begins.
#[derive(Debug)]
pub(crate) struct TransferSession {
    pub(crate) checksum: Checksum,
    /// End-of-stream sent or received.
    pub(crate) finished: bool,
    /// End-of-stream received (receive side only).
    pub(crate) received_eof: bool,
    /// Local digest differed from the peer's.
    pub(crate) integrity_error: bool,
    pub(crate) transferred_bytes: u64,
    pub(crate) state: TransferState,
}

impl TransferSession {
    pub(crate) fn new() -> Self {
        Self {
            checksum: Checksum::new(),
            finished: false,
            received_eof: false,
            integrity_error: false,
            transferred_bytes: 0,
            state: TransferState::Idle,
        }
    }

    /// Clears everything left by a previous transfer and enters `state`.
    pub(crate) fn begin(&mut self, state: TransferState) {
        self.checksum.reset();
        self.finished = false;
        self.received_eof = false;
        self.integrity_error = false;
        self.transferred_bytes = 0;
        self.state = state;
    }
}
