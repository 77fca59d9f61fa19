//! Proxy tunnel handshakes.
//!
//! These run over an already-open stream, before the mail protocol client
//! takes over. Supported: HTTP CONNECT, SOCKS4/4a, SOCKS5 (with optional
//! username/password subnegotiation).

#![allow(clippy::missing_errors_doc)]

mod http_connect;
mod socks4;
mod socks5;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::{Error, Result};

/// Kind of proxy to tunnel through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// HTTP CONNECT tunnel.
    HttpConnect,
    /// SOCKS version 4 (or 4a when enabled).
    Socks4,
    /// SOCKS version 5.
    Socks5,
}

/// Proxy connection settings.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Proxy protocol.
    pub kind: ProxyKind,
    /// Proxy server hostname.
    pub host: String,
    /// Proxy server port.
    pub port: u16,
    /// Username for proxy authentication.
    pub username: Option<String>,
    /// Password for proxy authentication.
    pub password: Option<String>,
    /// Allow SOCKS4a hostname addressing.
    pub socks4a: bool,
    /// Upper bound on reply reads before the handshake is abandoned.
    pub max_reads: usize,
    /// Extra headers sent with HTTP CONNECT.
    pub headers: Vec<(String, String)>,
}

impl ProxySettings {
    /// Creates settings for the given proxy endpoint.
    #[must_use]
    pub fn new(kind: ProxyKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            kind,
            host: host.into(),
            port,
            username: None,
            password: None,
            socks4a: false,
            max_reads: 512,
            headers: Vec::new(),
        }
    }

    /// Sets proxy credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Enables SOCKS4a hostname addressing.
    #[must_use]
    pub const fn socks4a(mut self, enabled: bool) -> Self {
        self.socks4a = enabled;
        self
    }

    /// Adds an extra header to the HTTP CONNECT request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Performs the proxy handshake for `settings` over `stream`, tunneling to
/// `host:port`.
///
/// On success the stream carries end-to-end bytes to the destination.
pub async fn establish<S>(
    stream: &mut S,
    settings: &ProxySettings,
    host: &str,
    port: u16,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tracing::debug!(kind = ?settings.kind, host, port, "starting proxy handshake");
    match settings.kind {
        ProxyKind::HttpConnect => http_connect::handshake(stream, settings, host, port).await,
        ProxyKind::Socks4 => socks4::handshake(stream, settings, host, port).await,
        ProxyKind::Socks5 => socks5::handshake(stream, settings, host, port).await,
    }
}

/// Reads a CRLF-terminated line, tolerating bare LF. The trailing line
/// ending is stripped.
pub(crate) async fn read_line<S>(stream: &mut S, max_reads: usize) -> Result<String>
where
    S: AsyncRead + Unpin,
{
    let mut line = Vec::new();
    for _ in 0..max_reads {
        let byte = stream.read_u8().await?;
        if byte == b'\n' {
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            return String::from_utf8(line)
                .map_err(|_| Error::Protocol("non-UTF-8 proxy reply".to_string()));
        }
        line.push(byte);
    }
    Err(Error::Protocol("proxy reply line too long".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_line_strips_crlf() {
        let mut mock = tokio_test::io::Builder::new()
            .read(b"HTTP/1.1 200 OK\r\n")
            .build();
        let line = read_line(&mut mock, 64).await.unwrap();
        assert_eq!(line, "HTTP/1.1 200 OK");
    }

    #[tokio::test]
    async fn read_line_tolerates_bare_lf() {
        let mut mock = tokio_test::io::Builder::new().read(b"ok\n").build();
        let line = read_line(&mut mock, 64).await.unwrap();
        assert_eq!(line, "ok");
    }

    #[tokio::test]
    async fn read_line_enforces_bound() {
        let mut mock = tokio_test::io::Builder::new().read(b"aaaaaaaaaa").build();
        let result = read_line(&mut mock, 5).await;
        assert!(result.is_err());
    }
}
