//! Chunked transfer engine.
//!
//! One engine drives one transfer at a time over a borrowed transport:
//!
//! ```text
//! sender                              receiver
//!   CHUNK(data[0..n])        ---->      checksum, write sink
//!                            <----    ACK
//!   CHUNK(data[n..2n])       ---->      checksum, write sink
//!                            <----    ACK
//!   ...
//!   END_OF_STREAM(md5 hex)   ---->      compare digests
//! ```
//!
//! A chunk is never sent before the previous one was acknowledged, so at
//! most one chunk is in flight. The receiver answers a chunk it cannot
//! accept with an error envelope instead of an ACK.

use tracing::{Instrument, Span, debug, trace, warn};

use filehelper_protocol::envelope::{
    Envelope, encode_ack, encode_chunk, encode_end_of_stream, encode_error,
};
use filehelper_transport::Transport;

use crate::config::TransferConfig;
use crate::sink::DataSink;
use crate::source::DataSource;
use crate::types::{TransferSession, TransferState};
use crate::{SIZE_LIMIT_MESSAGE, TransferError};

/// Sends or receives chunked, checksummed byte streams over a transport.
///
/// The engine borrows the transport and never connects or closes it.
/// It may run any number of transfers one after another; each starts from a
/// fresh checksum.
pub struct ChunkedTransfer<'t, T: Transport> {
    transport: &'t mut T,
    config: TransferConfig,
    session: TransferSession,
    span: Span,
}

impl<'t, T: Transport> ChunkedTransfer<'t, T> {
    /// Creates an engine with the default configuration.
    pub fn new(transport: &'t mut T) -> Self {
        Self::with_config(transport, TransferConfig::default())
    }

    pub fn with_config(transport: &'t mut T, config: TransferConfig) -> Self {
        let span = tracing::debug_span!(
            "chunked_transfer",
            packet_size = config.effective_packet_size()
        );
        Self {
            transport,
            config,
            session: TransferSession::new(),
            span,
        }
    }

    /// Replaces the span all transfer logging is recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub fn state(&self) -> TransferState {
        self.session.state
    }

    /// End-of-stream was sent or received in the current transfer.
    pub fn is_finished(&self) -> bool {
        self.session.finished
    }

    pub fn received_eof(&self) -> bool {
        self.session.received_eof
    }

    /// The last receive ended with a digest mismatch.
    pub fn integrity_error(&self) -> bool {
        self.session.integrity_error
    }

    /// Payload bytes sent or received in the current transfer.
    pub fn transferred_bytes(&self) -> u64 {
        self.session.transferred_bytes
    }

    /// Digest of the payload bytes seen so far in the current transfer.
    pub fn digest(&self) -> String {
        self.session.checksum.hex_digest()
    }

    /// Sends every byte of `source`, then the end-of-stream marker.
    ///
    /// Returns the number of payload bytes sent. Each chunk is acknowledged
    /// before the next is read from the source.
    pub async fn send_source(
        &mut self,
        mut source: DataSource<'_>,
    ) -> Result<u64, TransferError> {
        let span = self.span.clone();
        async {
            self.session.begin(TransferState::Sending);
            debug!("send started");
            let result = self.pump(&mut source).await;
            self.settle(result)
        }
        .instrument(span)
        .await
    }

    /// Receives one stream into `sink`.
    ///
    /// Returns the number of payload bytes received. Fails with
    /// [`TransferError::Integrity`] if the stream's digest does not match.
    pub async fn receive_sink(
        &mut self,
        sink: &mut DataSink<'_>,
    ) -> Result<u64, TransferError> {
        let span = self.span.clone();
        async {
            self.session.begin(TransferState::Receiving);
            sink.reset();
            debug!("receive started");
            let result = self.drain(sink).await;
            self.settle(result)
        }
        .instrument(span)
        .await
    }

    /// Tells the peer this side cannot take part in the transfer.
    ///
    /// Ends the session; a waiting receiver fails with `message`.
    pub async fn send_error(&mut self, message: &str) -> Result<(), TransferError> {
        let span = self.span.clone();
        async {
            self.session.begin(TransferState::Errored);
            self.session.finished = true;
            warn!(reason = message, "reporting error to peer");
            self.transport.send(&encode_error(message)?).await?;
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Records the outcome of a transfer in the session state.
    fn settle(&mut self, result: Result<(), TransferError>) -> Result<u64, TransferError> {
        match result {
            Ok(()) => {
                self.session.state = TransferState::Finished;
                debug!(
                    bytes = self.session.transferred_bytes,
                    digest = %self.session.checksum.hex_digest(),
                    "transfer finished"
                );
                Ok(self.session.transferred_bytes)
            }
            Err(e) => {
                self.session.state = TransferState::Errored;
                debug!(error = %e, bytes = self.session.transferred_bytes, "transfer failed");
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Send path
    // -----------------------------------------------------------------------

    async fn pump(&mut self, source: &mut DataSource<'_>) -> Result<(), TransferError> {
        let packet_size = self.config.effective_packet_size();
        let capacity = source
            .remaining_hint()
            .map_or(packet_size, |n| n.clamp(1, packet_size));
        let mut buf = vec![0u8; capacity];

        loop {
            let n = match source.read_chunk(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    let message = format!("sender failed to read data: {e}");
                    self.report_to_peer(&message).await;
                    return Err(TransferError::Source(e));
                }
            };
            if n == 0 {
                break;
            }
            self.send_chunk(&buf[..n]).await?;
        }

        self.send_end_of_stream().await
    }

    async fn send_chunk(&mut self, data: &[u8]) -> Result<(), TransferError> {
        let frame = encode_chunk(data)?;
        self.session.checksum.update(data);
        self.transport.send(&frame).await?;
        self.session.transferred_bytes += data.len() as u64;
        trace!(len = data.len(), "chunk sent, waiting for acknowledgement");
        self.await_ack().await
    }

    async fn await_ack(&mut self) -> Result<(), TransferError> {
        let frame = self.transport.receive().await?;
        match Envelope::decode(&frame)? {
            Envelope::Ack => Ok(()),
            Envelope::Error { message } => {
                warn!(error = %message, "peer rejected chunk");
                Err(TransferError::Peer(message))
            }
            other => Err(TransferError::UnexpectedEnvelope(other.kind())),
        }
    }

    async fn send_end_of_stream(&mut self) -> Result<(), TransferError> {
        let digest = self.session.checksum.hex_digest();
        self.transport.send(&encode_end_of_stream(&digest)?).await?;
        self.session.finished = true;
        trace!(%digest, "end of stream sent");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Receive path
    // -----------------------------------------------------------------------

    async fn drain(&mut self, sink: &mut DataSink<'_>) -> Result<(), TransferError> {
        while !self.session.received_eof {
            let frame = self.transport.receive().await?;
            match Envelope::decode(&frame)? {
                Envelope::Chunk(data) => self.accept_chunk(&data, sink).await?,
                Envelope::EndOfStream { digest } => self.accept_end_of_stream(&digest),
                Envelope::Error { message } => {
                    warn!(error = %message, "peer aborted transfer");
                    return Err(TransferError::Peer(message));
                }
                Envelope::Ack => {
                    return Err(TransferError::UnexpectedEnvelope(Envelope::Ack.kind()));
                }
            }
        }

        sink.flush().await.map_err(TransferError::Sink)?;
        if self.session.integrity_error {
            return Err(TransferError::Integrity);
        }
        Ok(())
    }

    async fn accept_chunk(
        &mut self,
        data: &[u8],
        sink: &mut DataSink<'_>,
    ) -> Result<(), TransferError> {
        self.session.checksum.update(data);

        let total = self.session.transferred_bytes + data.len() as u64;
        if let Some(limit) = self.config.max_size {
            if total > limit {
                warn!(limit, total, "incoming stream exceeds size limit");
                self.report_to_peer(SIZE_LIMIT_MESSAGE).await;
                return Err(TransferError::SizeLimitExceeded(limit));
            }
        }

        if let Err(e) = sink.write_chunk(data).await {
            let message = format!("receiver failed to store data: {e}");
            self.report_to_peer(&message).await;
            return Err(TransferError::Sink(e));
        }
        self.session.transferred_bytes = total;
        trace!(len = data.len(), total, "chunk received");

        self.transport.send(&encode_ack()).await?;
        Ok(())
    }

    fn accept_end_of_stream(&mut self, digest: &str) {
        self.session.received_eof = true;
        self.session.finished = true;

        let local = self.session.checksum.hex_digest();
        if !local.eq_ignore_ascii_case(digest) {
            self.session.integrity_error = true;
            warn!(expected = %digest, actual = %local, "checksum mismatch");
        }
    }

    /// Sends an error envelope in place of the next protocol step.
    ///
    /// Only used while the connection is healthy; a failure here is logged
    /// and the original error is what the caller sees.
    async fn report_to_peer(&mut self, message: &str) {
        let frame = match encode_error(message) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "could not encode error for peer");
                return;
            }
        };
        if let Err(e) = self.transport.send(&frame).await {
            debug!(error = %e, "could not report error to peer");
        }
    }
}
