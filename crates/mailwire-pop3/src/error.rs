//! Error types for POP3 operations.

use std::io;

/// Result type alias for POP3 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// POP3 error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport-level error (TLS, proxy).
    #[error("Transport error: {0}")]
    Transport(#[from] mailwire_net::Error),

    /// SASL exchange error.
    #[error("SASL error: {0}")]
    Sasl(#[from] mailwire_sasl::Error),

    /// Server answered `-ERR`.
    #[error("Server error: {0}")]
    Err(String),

    /// Protocol violation or malformed response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Feature not supported by the server.
    #[error("Server does not support {0}")]
    NotSupported(&'static str),

    /// Invalid state for the requested operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The connection was closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,
}
