//! Convenience entry points over the send and receive paths.
//!
//! Files and descriptors are opened here on the caller's behalf and are
//! closed on every exit path when the source or sink is dropped.

use std::io;
use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use filehelper_transport::Transport;

use crate::TransferError;
use crate::engine::ChunkedTransfer;
use crate::sink::DataSink;
use crate::source::DataSource;

impl<T: Transport> ChunkedTransfer<'_, T> {
    /// Sends an in-memory buffer.
    pub async fn string_to_network(&mut self, data: &[u8]) -> Result<u64, TransferError> {
        self.send_source(DataSource::buffer(data)).await
    }

    /// Receives a stream into memory and returns it.
    pub async fn network_to_string(&mut self) -> Result<Vec<u8>, TransferError> {
        let mut sink = DataSink::buffer();
        self.receive_sink(&mut sink).await?;
        Ok(sink.into_bytes().unwrap_or_default())
    }

    /// Sends everything readable from a descriptor the caller owns.
    #[cfg(unix)]
    pub async fn fd_to_network(
        &mut self,
        fd: std::os::fd::BorrowedFd<'_>,
    ) -> Result<u64, TransferError> {
        match DataSource::from_fd(fd) {
            Ok(source) => self.send_source(source).await,
            Err(e) => Err(self.refuse("cannot read descriptor", e).await),
        }
    }

    /// Receives a stream and writes it to a descriptor the caller owns.
    #[cfg(unix)]
    pub async fn network_to_fd(
        &mut self,
        fd: std::os::fd::BorrowedFd<'_>,
    ) -> Result<u64, TransferError> {
        match DataSink::from_fd(fd) {
            Ok(mut sink) => self.receive_sink(&mut sink).await,
            Err(e) => Err(self.refuse("cannot write descriptor", e).await),
        }
    }

    /// Sends the contents of the file at `path`.
    pub async fn file_to_network(&mut self, path: &Path) -> Result<u64, TransferError> {
        match DataSource::open(path).await {
            Ok(source) => self.send_source(source).await,
            Err(e) => Err(self.refuse("cannot open file", e).await),
        }
    }

    /// Receives a stream into the file at `path`, creating or truncating it.
    ///
    /// A failed transfer leaves whatever was written so far in place.
    pub async fn network_to_file(&mut self, path: &Path) -> Result<u64, TransferError> {
        match DataSink::create(path).await {
            Ok(mut sink) => self.receive_sink(&mut sink).await,
            Err(e) => Err(self.refuse("cannot create file", e).await),
        }
    }

    /// Sends everything `reader` yields until end of input.
    pub async fn reader_to_network<R>(&mut self, reader: R) -> Result<u64, TransferError>
    where
        R: AsyncRead + Send + Unpin,
    {
        self.send_source(DataSource::reader(reader)).await
    }

    /// Receives a stream into `writer`.
    pub async fn network_to_writer<W>(&mut self, writer: W) -> Result<u64, TransferError>
    where
        W: AsyncWrite + Send + Unpin,
    {
        self.receive_sink(&mut DataSink::writer(writer)).await
    }

    /// Reports a local setup failure to the peer so it does not wait forever.
    async fn refuse(&mut self, context: &str, e: io::Error) -> TransferError {
        if let Err(report) = self.send_error(&format!("{context}: {e}")).await {
            debug!(error = %report, "could not report setup failure to peer");
        }
        TransferError::Io(e)
    }
}
