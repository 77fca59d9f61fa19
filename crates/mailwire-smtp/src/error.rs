//! Error types for SMTP operations.

use std::io;

use crate::types::EnhancedCode;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
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

    /// Server returned an error reply.
    #[error("SMTP error {code}: {message}")]
    Smtp {
        /// Reply code (e.g. 550).
        code: u16,
        /// Enhanced status code, when advertised and present.
        enhanced: Option<EnhancedCode>,
        /// Error text from the server.
        message: String,
    },

    /// Protocol error (malformed or unexpected reply).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The envelope has no sender.
    #[error("Envelope has no sender")]
    MissingSender,

    /// The envelope has no recipients.
    #[error("Envelope has no recipients")]
    MissingRecipients,

    /// Every recipient was rejected by the server.
    #[error("All recipients were rejected")]
    AllRecipientsRejected,

    /// Message exceeds the server's advertised size limit.
    #[error("Message of {size} bytes exceeds server limit of {limit}")]
    MessageTooLarge {
        /// Encoded message size.
        size: usize,
        /// Advertised SIZE limit.
        limit: usize,
    },

    /// The envelope needs SMTPUTF8 but the server does not offer it.
    #[error("Envelope requires SMTPUTF8 which the server does not advertise")]
    InternationalNotSupported,

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

impl Error {
    /// Creates an SMTP error from a reply.
    #[must_use]
    pub fn from_reply(reply: &crate::types::Reply, enhanced_advertised: bool) -> Self {
        Self::Smtp {
            code: reply.code.as_u16(),
            enhanced: if enhanced_advertised {
                reply.enhanced_code()
            } else {
                None
            },
            message: reply.message_text(),
        }
    }

    /// True for 5xx replies.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Smtp { code, .. } if *code >= 500 && *code < 600)
    }

    /// True for 4xx replies.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Smtp { code, .. } if *code >= 400 && *code < 500)
    }
}
