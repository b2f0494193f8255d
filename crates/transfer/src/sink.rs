//! Byte sinks a receive writes chunks into.

use std::io;
use std::path::Path;

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Where the bytes of an incoming transfer go.
pub enum DataSink<'a> {
    /// An in-memory buffer. Cleared when a receive into it begins.
    Buffer(Vec<u8>),
    /// An open file (or duplicated descriptor), written at its current position.
    File(tokio::fs::File),
    /// Any other async writer.
    Writer(Box<dyn AsyncWrite + Send + Unpin + 'a>),
}

impl<'a> DataSink<'a> {
    pub fn buffer() -> Self {
        DataSink::Buffer(Vec::new())
    }

    pub fn writer<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'a,
    {
        DataSink::Writer(Box::new(writer))
    }

    /// Creates (or truncates) `path`. The file is closed when the sink is dropped.
    pub async fn create(path: &Path) -> io::Result<DataSink<'static>> {
        Ok(DataSink::File(tokio::fs::File::create(path).await?))
    }

    /// Writes to a descriptor the caller keeps ownership of.
    ///
    /// The descriptor is duplicated; the duplicate is closed when the sink is
    /// dropped.
    #[cfg(unix)]
    pub fn from_fd(fd: std::os::fd::BorrowedFd<'_>) -> io::Result<DataSink<'static>> {
        let file = std::fs::File::from(fd.try_clone_to_owned()?);
        Ok(DataSink::File(tokio::fs::File::from_std(file)))
    }

    /// Returns the collected bytes of a [`DataSink::Buffer`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DataSink::Buffer(data) => Some(data),
            DataSink::File(_) | DataSink::Writer(_) => None,
        }
    }

    /// Consumes a [`DataSink::Buffer`], returning its bytes.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            DataSink::Buffer(data) => Some(data),
            DataSink::File(_) | DataSink::Writer(_) => None,
        }
    }

    pub(crate) fn reset(&mut self) {
        if let DataSink::Buffer(data) = self {
            data.clear();
        }
    }

    /// Stores `data`. For files and writers the bytes are flushed before this
    /// returns, so a failed write is seen before the chunk is acknowledged.
    pub(crate) async fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            DataSink::Buffer(buf) => {
                buf.extend_from_slice(data);
                Ok(())
            }
            DataSink::File(file) => {
                file.write_all(data).await?;
                file.flush().await
            }
            DataSink::Writer(writer) => {
                writer.write_all(data).await?;
                writer.flush().await
            }
        }
    }

    /// Pushes buffered writes down to the file or writer.
    pub(crate) async fn flush(&mut self) -> io::Result<()> {
        match self {
            DataSink::Buffer(_) => Ok(()),
            DataSink::File(file) => file.flush().await,
            DataSink::Writer(writer) => writer.flush().await,
        }
    }
}
