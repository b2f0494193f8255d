//! Byte sources a send pulls chunks from.

use std::io;
use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Where the bytes of an outgoing transfer come from.
///
/// The variant is chosen once when the transfer starts; every chunk is then
/// read the same way.
pub enum DataSource<'a> {
    /// An in-memory buffer, consumed front to back.
    Buffer(&'a [u8]),
    /// An open file (or duplicated descriptor), read from its current position.
    File(tokio::fs::File),
    /// Any other async reader.
    Reader(Box<dyn AsyncRead + Send + Unpin + 'a>),
}

impl<'a> DataSource<'a> {
    pub fn buffer(data: &'a [u8]) -> Self {
        DataSource::Buffer(data)
    }

    pub fn reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'a,
    {
        DataSource::Reader(Box::new(reader))
    }

    /// Opens `path` for reading. The file is closed when the source is dropped.
    pub async fn open(path: &Path) -> io::Result<DataSource<'static>> {
        Ok(DataSource::File(tokio::fs::File::open(path).await?))
    }

    /// Reads from a descriptor the caller keeps ownership of.
    ///
    /// The descriptor is duplicated; the duplicate shares the file offset and
    /// is closed when the source is dropped.
    #[cfg(unix)]
    pub fn from_fd(fd: std::os::fd::BorrowedFd<'_>) -> io::Result<DataSource<'static>> {
        let file = std::fs::File::from(fd.try_clone_to_owned()?);
        Ok(DataSource::File(tokio::fs::File::from_std(file)))
    }

    /// Bytes left, when known up front.
    pub(crate) fn remaining_hint(&self) -> Option<usize> {
        match self {
            DataSource::Buffer(data) => Some(data.len()),
            DataSource::File(_) | DataSource::Reader(_) => None,
        }
    }

    /// Fills `buf` as far as the source allows. Returns 0 once exhausted.
    pub(crate) async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DataSource::Buffer(data) => {
                let current: &'a [u8] = *data;
                let n = current.len().min(buf.len());
                buf[..n].copy_from_slice(&current[..n]);
                *data = &current[n..];
                Ok(n)
            }
            DataSource::File(file) => fill(file, buf).await,
            DataSource::Reader(reader) => fill(reader, buf).await,
        }
    }
}

/// Reads until `buf` is full or the reader reports end of input.
async fn fill<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
