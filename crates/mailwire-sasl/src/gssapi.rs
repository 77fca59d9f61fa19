//! GSSAPI mechanism framing (RFC 4752).
//!
//! Kerberos context establishment is delegated to a [`GssContext`]
//! implementation supplied by the caller (a binding to the platform GSS
//! library, or a test double). This module drives the SASL side: the
//! context-token loop and the final wrapped security-layer negotiation.

use crate::{Error, Mechanism, Result, Step};

/// Security layer requested after authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLayer {
    /// No protection; the connection relies on TLS.
    None,
    /// Integrity protection (MIC).
    Integrity,
    /// Confidentiality (wrap with encryption).
    Confidentiality,
}

impl SecurityLayer {
    const fn mask(self) -> u8 {
        match self {
            Self::None => 0x01,
            Self::Integrity => 0x02,
            Self::Confidentiality => 0x04,
        }
    }
}

/// Result of one GSS context-establishment step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GssStep {
    /// Context needs more round trips; send this token.
    Continue(Vec<u8>),
    /// Context is established; an optional final token may accompany it.
    Complete(Option<Vec<u8>>),
}

/// A GSS security context.
///
/// Implementations wrap a real Kerberos library. The trait carries exactly
/// what the SASL exchange needs: token exchange plus message wrap/unwrap
/// for the security-layer negotiation.
pub trait GssContext {
    /// Feeds a server token (empty on the first call) and produces the next
    /// client token.
    ///
    /// # Errors
    ///
    /// Returns an error if context establishment fails.
    fn step(&mut self, token: &[u8]) -> std::result::Result<GssStep, String>;

    /// Wraps a message (`conf` requests encryption).
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot wrap.
    fn wrap(&mut self, conf: bool, data: &[u8]) -> std::result::Result<Vec<u8>, String>;

    /// Unwraps a message from the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the token fails integrity checks.
    fn unwrap(&mut self, data: &[u8]) -> std::result::Result<Vec<u8>, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Establishing,
    Negotiating,
    Done,
}

/// GSSAPI SASL mechanism over a pluggable context.
pub struct Gssapi<C> {
    context: C,
    layer: SecurityLayer,
    authzid: Option<String>,
    state: State,
}

impl<C: GssContext> Gssapi<C> {
    /// Creates a GSSAPI mechanism requesting no security layer (the usual
    /// arrangement under TLS).
    pub fn new(context: C) -> Self {
        Self {
            context,
            layer: SecurityLayer::None,
            authzid: None,
            state: State::Establishing,
        }
    }

    /// Requests a security layer.
    #[must_use]
    pub fn layer(mut self, layer: SecurityLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Sets the authorization identity sent with the negotiation token.
    #[must_use]
    pub fn authzid(mut self, authzid: impl Into<String>) -> Self {
        self.authzid = Some(authzid.into());
        self
    }

    fn negotiate_layer(&mut self, challenge: &[u8]) -> Result<Step> {
        let token = self.context.unwrap(challenge).map_err(Error::Gssapi)?;
        if token.len() < 4 {
            return Err(Error::IncompleteChallenge(
                "security layer token shorter than 4 bytes".into(),
            ));
        }

        let offered = token[0];
        let max_size = [token[1], token[2], token[3]];
        if offered & self.layer.mask() == 0 {
            return Err(Error::InvalidChallenge(format!(
                "server does not offer requested security layer (mask {offered:#04x})"
            )));
        }

        // Reply: chosen layer, echoed max size, optional authzid.
        let mut reply = vec![self.layer.mask(), max_size[0], max_size[1], max_size[2]];
        if let Some(authzid) = &self.authzid {
            reply.extend_from_slice(authzid.as_bytes());
        }

        let wrapped = self.context.wrap(false, &reply).map_err(Error::Gssapi)?;
        self.state = State::Done;
        Ok(Step::Response(wrapped))
    }
}

impl<C: GssContext> Mechanism for Gssapi<C> {
    fn name(&self) -> &'static str {
        "GSSAPI"
    }

    fn initial_response(&mut self) -> Option<Vec<u8>> {
        match self.context.step(&[]) {
            Ok(GssStep::Continue(token)) => Some(token),
            Ok(GssStep::Complete(token)) => {
                self.state = State::Negotiating;
                token
            }
            Err(_) => None,
        }
    }

    fn step(&mut self, challenge: &[u8]) -> Result<Step> {
        match self.state {
            State::Establishing => match self.context.step(challenge).map_err(Error::Gssapi)? {
                GssStep::Continue(token) => Ok(Step::Response(token)),
                GssStep::Complete(token) => {
                    self.state = State::Negotiating;
                    Ok(Step::Response(token.unwrap_or_default()))
                }
            },
            State::Negotiating => self.negotiate_layer(challenge),
            State::Done => Err(Error::AlreadyAuthenticated),
        }
    }
}

impl<C> std::fmt::Debug for Gssapi<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gssapi")
            .field("layer", &self.layer)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Context double: one token round trip, identity wrap/unwrap.
    struct FakeContext {
        rounds: usize,
    }

    impl GssContext for FakeContext {
        fn step(&mut self, _token: &[u8]) -> std::result::Result<GssStep, String> {
            if self.rounds == 0 {
                Ok(GssStep::Complete(None))
            } else {
                self.rounds -= 1;
                Ok(GssStep::Continue(b"token".to_vec()))
            }
        }

        fn wrap(&mut self, _conf: bool, data: &[u8]) -> std::result::Result<Vec<u8>, String> {
            Ok(data.to_vec())
        }

        fn unwrap(&mut self, data: &[u8]) -> std::result::Result<Vec<u8>, String> {
            Ok(data.to_vec())
        }
    }

    #[test]
    fn establishes_then_negotiates_layer() {
        let mut mech = Gssapi::new(FakeContext { rounds: 1 });

        let ir = mech.initial_response().unwrap();
        assert_eq!(ir, b"token");

        // Context completes on the next leg.
        let step = mech.step(b"server-token").unwrap();
        assert_eq!(step, Step::Response(Vec::new()));

        // Server offers no-layer with a 64 KiB cap.
        let step = mech.step(&[0x01, 0x00, 0xFF, 0xFF]).unwrap();
        let Step::Response(reply) = step else {
            panic!("expected wrapped negotiation reply");
        };
        assert_eq!(reply, vec![0x01, 0x00, 0xFF, 0xFF]);

        assert!(mech.step(b"").is_err());
    }

    #[test]
    fn rejects_unoffered_layer() {
        let mut mech = Gssapi::new(FakeContext { rounds: 0 }).layer(SecurityLayer::Confidentiality);
        let _ = mech.initial_response();

        // Only no-layer offered.
        let err = mech.step(&[0x01, 0x00, 0x10, 0x00]).unwrap_err();
        assert!(matches!(err, Error::InvalidChallenge(_)));
    }

    #[test]
    fn authzid_is_appended() {
        let mut mech = Gssapi::new(FakeContext { rounds: 0 }).authzid("admin");
        let _ = mech.initial_response();
        let Step::Response(reply) = mech.step(&[0x07, 0x00, 0x10, 0x00]).unwrap() else {
            panic!("expected response");
        };
        assert_eq!(&reply[4..], b"admin");
    }

    #[test]
    fn short_negotiation_token_rejected() {
        let mut mech = Gssapi::new(FakeContext { rounds: 0 });
        let _ = mech.initial_response();
        assert!(mech.step(&[0x01, 0x00]).is_err());
    }
}
