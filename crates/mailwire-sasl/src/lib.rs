//! # mailwire-sasl
//!
//! Client-side SASL mechanisms for IMAP, SMTP, and POP3: PLAIN, LOGIN,
//! CRAM-MD5, SCRAM-SHA-1/-256 (with `-PLUS` channel binding), XOAUTH2,
//! OAUTHBEARER, NTLM, and GSSAPI.
//!
//! Mechanisms operate on **raw** challenge/response bytes. Base64 framing
//! belongs to the protocol layer (IMAP `AUTHENTICATE`, SMTP `AUTH`, POP3
//! `AUTH` all wrap the exchange in base64 lines).
//!
//! ```ignore
//! use mailwire_sasl::{Mechanism, Step, scram::{Scram, ScramVariant}};
//!
//! let mut mech = Scram::new(ScramVariant::Sha256, "user", "pencil");
//! let first = mech.initial_response().unwrap();
//! // send base64(first), receive server-first-message...
//! match mech.step(&server_first)? {
//!     Step::Response(client_final) => { /* send it */ }
//!     Step::Done => {}
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod cram_md5;
mod error;
pub mod gssapi;
pub mod login;
pub mod ntlm;
pub mod oauth;
pub mod plain;
pub mod scram;
mod select;

pub use cram_md5::CramMd5;
pub use error::{Error, Result};
pub use gssapi::{Gssapi, GssContext, GssStep, SecurityLayer};
pub use login::Login;
pub use ntlm::Ntlm;
pub use oauth::{OAuthBearer, XOAuth2};
pub use plain::Plain;
pub use scram::{Scram, ScramVariant};
pub use select::select_mechanism;

/// Outcome of one mechanism step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Bytes to send to the server (before base64 framing).
    Response(Vec<u8>),
    /// The exchange is complete on the client side.
    Done,
}

/// A client-side SASL mechanism.
///
/// The protocol client calls [`Mechanism::initial_response`] once (usable
/// with SASL-IR), then [`Mechanism::step`] for every server challenge until
/// the server reports completion or the mechanism returns [`Step::Done`].
pub trait Mechanism {
    /// The IANA mechanism name, e.g. `"SCRAM-SHA-256"`.
    fn name(&self) -> &'static str;

    /// Initial client response, when the mechanism defines one.
    fn initial_response(&mut self) -> Option<Vec<u8>> {
        None
    }

    /// Processes a decoded server challenge.
    ///
    /// # Errors
    ///
    /// Returns an error when the challenge is malformed or fails
    /// verification.
    fn step(&mut self, challenge: &[u8]) -> Result<Step>;
}
