//! The transport stream used by all protocol clients.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

use crate::compress::DeflateStream;
use crate::tls::TlsConfig;
use crate::{Error, Result};

/// A stream that can be plaintext, TLS, or DEFLATE-compressed.
///
/// Compression wraps whatever the stream was at negotiation time, so
/// `Deflate` over `Tls` is the common COMPRESS=DEFLATE arrangement.
pub enum NetStream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
    /// DEFLATE-compressed stream over a previously established transport.
    Deflate(Box<DeflateStream<NetStream>>),
}

impl NetStream {
    /// Connects without TLS (for STARTTLS-capable endpoints or testing).
    pub async fn connect_plain(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let tcp = TcpStream::connect(&addr).await?;
        tracing::debug!(host, port, "plaintext connection established");
        Ok(Self::Plain(tcp))
    }

    /// Connects with implicit TLS (e.g. ports 993/995/465).
    pub async fn connect_tls(host: &str, port: u16, config: &TlsConfig) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let tcp = TcpStream::connect(&addr).await?;

        let connector = config.connector()?;
        let server_name = config.server_name(host)?;
        let tls = connector.connect(server_name, tcp).await?;
        tracing::debug!(host, port, "implicit TLS connection established");

        Ok(Self::Tls(Box::new(tls)))
    }

    /// Upgrades a plaintext stream to TLS in place (STARTTLS/STLS).
    ///
    /// The caller must have completed the protocol-level STARTTLS exchange
    /// first; the handshake starts on the very next bytes.
    pub async fn upgrade_to_tls(self, host: &str, config: &TlsConfig) -> Result<Self> {
        match self {
            Self::Plain(tcp) => {
                let connector = config.connector()?;
                let server_name = config.server_name(host)?;
                let tls = connector.connect(server_name, tcp).await?;
                tracing::debug!(host, "STARTTLS upgrade complete");
                Ok(Self::Tls(Box::new(tls)))
            }
            Self::Tls(_) => Err(Error::InvalidState("stream is already TLS".to_string())),
            Self::Deflate(_) => Err(Error::InvalidState(
                "cannot upgrade a compressed stream".to_string(),
            )),
        }
    }

    /// Wraps the stream in DEFLATE after a successful COMPRESS negotiation.
    pub fn start_compression(self) -> Result<Self> {
        match self {
            Self::Deflate(_) => Err(Error::InvalidState(
                "compression is already active".to_string(),
            )),
            other => Ok(Self::Deflate(Box::new(DeflateStream::new(other)))),
        }
    }

    /// Returns true if the stream is TLS-encrypted (possibly compressed).
    #[must_use]
    pub fn is_tls(&self) -> bool {
        match self {
            Self::Plain(_) => false,
            Self::Tls(_) => true,
            Self::Deflate(inner) => inner.get_ref().is_tls(),
        }
    }

    /// Returns true if DEFLATE compression is active.
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        matches!(self, Self::Deflate(_))
    }

    /// Returns the tls-server-end-point channel binding (RFC 5929).
    ///
    /// This is the SHA-256 digest of the server's leaf certificate, used by
    /// the SCRAM `-PLUS` mechanisms. `None` on plaintext streams.
    #[must_use]
    pub fn channel_binding(&self) -> Option<Vec<u8>> {
        match self {
            Self::Plain(_) => None,
            Self::Tls(tls) => {
                let (_, conn) = tls.get_ref();
                let cert = conn.peer_certificates()?.first()?;
                Some(Sha256::digest(cert.as_ref()).to_vec())
            }
            Self::Deflate(inner) => inner.get_ref().channel_binding(),
        }
    }
}

impl AsyncRead for NetStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Deflate(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for NetStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Deflate(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
            Self::Deflate(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Deflate(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

impl std::fmt::Debug for NetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("NetStream::Plain"),
            Self::Tls(_) => f.write_str("NetStream::Tls"),
            Self::Deflate(_) => f.write_str("NetStream::Deflate"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_has_no_channel_binding() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await });

        let stream = NetStream::connect_plain("127.0.0.1", addr.port())
            .await
            .unwrap();
        accept.await.unwrap().unwrap();

        assert!(!stream.is_tls());
        assert!(stream.channel_binding().is_none());
    }

    #[tokio::test]
    async fn compression_wraps_once() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await });

        let stream = NetStream::connect_plain("127.0.0.1", addr.port())
            .await
            .unwrap();
        accept.await.unwrap().unwrap();

        let compressed = stream.start_compression().unwrap();
        assert!(compressed.is_compressed());
        assert!(compressed.start_compression().is_err());
    }
}
