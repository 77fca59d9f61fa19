//! Error types for SASL exchanges.

use thiserror::Error;

/// Errors that can occur during a SASL exchange.
#[derive(Debug, Error)]
pub enum Error {
    /// Server challenge ended before the mechanism was satisfied.
    #[error("Incomplete challenge: {0}")]
    IncompleteChallenge(String),

    /// Server challenge did not match the mechanism grammar.
    #[error("Invalid challenge: {0}")]
    InvalidChallenge(String),

    /// Server verification value did not match the computed one.
    #[error("Server signature verification failed")]
    IncorrectHash,

    /// A base64 field inside the exchange failed to decode.
    #[error("Invalid base64 in challenge: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The mechanism was stepped after completion.
    #[error("Mechanism already completed")]
    AlreadyAuthenticated,

    /// No mutually supported mechanism.
    #[error("No acceptable SASL mechanism offered by the server")]
    NoMechanism,

    /// Channel binding was required but no binding data is available.
    #[error("Channel binding required but unavailable")]
    ChannelBindingUnavailable,

    /// The GSSAPI context reported a failure.
    #[error("GSSAPI context error: {0}")]
    Gssapi(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
