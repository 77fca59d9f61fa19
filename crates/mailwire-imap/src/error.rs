//! Error types for the IMAP library.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level error (TLS, proxy, compression).
    #[error("Transport error: {0}")]
    Transport(#[from] mailwire_net::Error),

    /// SASL exchange error.
    #[error("SASL error: {0}")]
    Sasl(#[from] mailwire_sasl::Error),

    /// Protocol parsing error. The offending line is preserved for
    /// diagnostics.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Server returned NO response.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD response.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE (disconnecting).
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// The connection was closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid state for the requested operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The server does not advertise a required capability.
    #[error("Server does not advertise {0}")]
    MissingCapability(&'static str),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Creates a parse error carrying the offending line.
    #[must_use]
    pub fn parse_line(position: usize, message: impl Into<String>, line: &[u8]) -> Self {
        Self::Parse {
            position,
            message: format!(
                "{} (line: {:?})",
                message.into(),
                String::from_utf8_lossy(line)
            ),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
