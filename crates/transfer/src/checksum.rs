use std::fmt;
use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

use crate::TransferError;

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Computes MD5 of `data` and returns the lowercase hex digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut checksum = Checksum::new();
    checksum.update(data);
    checksum.hex_digest()
}

/// Computes MD5 of an entire file and returns the lowercase hex digest.
///
/// Produces the same digest a transfer of the file carries in its
/// end-of-stream marker.
pub fn calculate_file_checksum(path: &Path) -> Result<String, TransferError> {
    let mut file = std::fs::File::open(path)?;
    let mut checksum = Checksum::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        checksum.update(&buf[..n]);
    }
    Ok(checksum.hex_digest())
}

// ---------------------------------------------------------------------------
// Checksum
// ---------------------------------------------------------------------------

/// Running MD5 over every byte of one transfer, in stream order.
///
/// The digest depends only on the concatenated bytes, not on where chunk
/// boundaries fell. Integrity check only; not a security boundary.
#[derive(Clone, Default)]
pub struct Checksum {
    hasher: Md5,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next bytes of the stream.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the digest of everything fed so far as lowercase hex.
    ///
    /// Does not consume the accumulator; more bytes may follow.
    pub fn hex_digest(&self) -> String {
        hex::encode(self.hasher.clone().finalize())
    }

    /// Forgets all bytes fed so far.
    pub fn reset(&mut self) {
        self.hasher = Md5::new();
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checksum")
            .field("digest", &self.hex_digest())
            .finish()
    }
}
