//! Error types for session coordination.

use std::time::Duration;

use thiserror::Error;

/// Errors from the retry, pool, and assembly layers.
#[derive(Debug, Error)]
pub enum Error {
    /// IMAP protocol error.
    #[error("IMAP error: {0}")]
    Imap(#[from] mailwire_imap::Error),

    /// SMTP protocol error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] mailwire_smtp::Error),

    /// POP3 protocol error.
    #[error("POP3 error: {0}")]
    Pop3(#[from] mailwire_pop3::Error),

    /// Transport error.
    #[error("Transport error: {0}")]
    Transport(#[from] mailwire_net::Error),

    /// Operation exceeded its deadline.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// No pooled connection became available.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// The pool was closed while waiting.
    #[error("Connection pool closed")]
    PoolClosed,

    /// A pooled session turned out to be dead.
    #[error("Pooled connection is no longer valid")]
    InvalidConnection,

    /// Authentication failed while creating a pooled session.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Connecting a new pooled session failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Malformed delivery-status report.
    #[error("Malformed delivery-status report: {0}")]
    MalformedReport(String),

    /// MIME parsing failed.
    #[error("MIME parse error: {0}")]
    Mime(#[from] mailparse::MailParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
