//! Framed TCP transports.
//!
//! [`connect`] opens the client side, [`TransportListener`] accepts the
//! server side. Both return a [`TcpTransport`] ready for frame I/O.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::stream::StreamTransport;
use crate::TransportConfig;

/// Frame transport over a plain TCP connection.
pub type TcpTransport = StreamTransport<TcpStream>;

/// Connects to `addr`, bounded by the configured connect timeout.
pub async fn connect(
    addr: SocketAddr,
    config: &TransportConfig,
) -> Result<TcpTransport, TransportError> {
    let stream = match tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr)).await
    {
        Ok(Ok(s)) => {
            info!(%addr, "transport connected");
            s
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(TransportError::Timeout),
    };

    // Chunks are acknowledged one at a time; don't let Nagle hold the ACKs.
    stream.set_nodelay(true)?;
    Ok(StreamTransport::new(stream, config))
}

/// Listening socket producing framed TCP transports.
pub struct TransportListener {
    listener: TcpListener,
    config: TransportConfig,
}

impl TransportListener {
    /// Binds a listener. Use port 0 for an ephemeral port.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        config: TransportConfig,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        debug!(addr = %listener.local_addr()?, "transport listener bound");
        Ok(Self { listener, config })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts one connection, bounded by the configured accept timeout.
    pub async fn accept(&self) -> Result<(TcpTransport, SocketAddr), TransportError> {
        let (stream, addr) =
            match tokio::time::timeout(self.config.accept_timeout, self.listener.accept()).await {
                Ok(Ok(accepted)) => accepted,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(TransportError::Timeout),
            };

        info!(%addr, "transport connection accepted");
        stream.set_nodelay(true)?;
        Ok((StreamTransport::new(stream, &self.config), addr))
    }
}
