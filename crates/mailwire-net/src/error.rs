//! Error types for the transport layer.

use thiserror::Error;

/// Errors that can occur while establishing or using a transport.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// The stream is not in a state that allows the requested operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// HTTP CONNECT proxy refused the tunnel.
    #[error("HTTP CONNECT failed with status {status}: {text}")]
    HttpConnectFailed {
        /// HTTP status code from the proxy.
        status: u16,
        /// Status line text.
        text: String,
    },

    /// SOCKS4 proxy rejected the request.
    #[error("SOCKS4 request rejected with code {0:#04x}")]
    Socks4Rejected(u8),

    /// SOCKS5 proxy rejected the request.
    #[error("SOCKS5 request rejected with code {0:#04x}")]
    Socks5Rejected(u8),

    /// The proxy cannot carry the requested address type.
    #[error("Proxy does not support the destination address type")]
    UnsupportedAddressType,

    /// Proxy authentication failed.
    #[error("Proxy authentication failed")]
    ProxyAuthFailed,

    /// Malformed proxy reply.
    #[error("Proxy protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
