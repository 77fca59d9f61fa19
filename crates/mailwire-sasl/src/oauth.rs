//! Bearer-token mechanisms: XOAUTH2 (Google/Microsoft proprietary) and
//! OAUTHBEARER (RFC 7628).
//!
//! Both send a single initial response. On failure the server returns a
//! JSON error challenge; the client answers with an empty response so the
//! server can complete the exchange with its final status line.

use crate::{Error, Mechanism, Result, Step};

/// XOAUTH2: `user=<user>\x01auth=Bearer <token>\x01\x01`.
#[derive(Debug)]
pub struct XOAuth2 {
    user: String,
    token: String,
    state: OAuthState,
}

/// OAUTHBEARER: `n,a=<user>,\x01auth=Bearer <token>\x01\x01`.
#[derive(Debug)]
pub struct OAuthBearer {
    user: String,
    token: String,
    state: OAuthState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OAuthState {
    Initial,
    Sent,
    Acked,
}

impl XOAuth2 {
    /// Creates an XOAUTH2 mechanism.
    #[must_use]
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
            state: OAuthState::Initial,
        }
    }

    fn payload(&self) -> Vec<u8> {
        format!("user={}\x01auth=Bearer {}\x01\x01", self.user, self.token).into_bytes()
    }
}

impl Mechanism for XOAuth2 {
    fn name(&self) -> &'static str {
        "XOAUTH2"
    }

    fn initial_response(&mut self) -> Option<Vec<u8>> {
        self.state = OAuthState::Sent;
        Some(self.payload())
    }

    fn step(&mut self, challenge: &[u8]) -> Result<Step> {
        let payload = self.payload();
        step_oauth(&mut self.state, challenge, payload)
    }
}

impl OAuthBearer {
    /// Creates an OAUTHBEARER mechanism.
    #[must_use]
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
            state: OAuthState::Initial,
        }
    }

    fn payload(&self) -> Vec<u8> {
        format!(
            "n,a={},\x01auth=Bearer {}\x01\x01",
            self.user, self.token
        )
        .into_bytes()
    }
}

impl Mechanism for OAuthBearer {
    fn name(&self) -> &'static str {
        "OAUTHBEARER"
    }

    fn initial_response(&mut self) -> Option<Vec<u8>> {
        self.state = OAuthState::Sent;
        Some(self.payload())
    }

    fn step(&mut self, challenge: &[u8]) -> Result<Step> {
        let payload = self.payload();
        step_oauth(&mut self.state, challenge, payload)
    }
}

fn step_oauth(state: &mut OAuthState, challenge: &[u8], payload: Vec<u8>) -> Result<Step> {
    match state {
        OAuthState::Initial => {
            *state = OAuthState::Sent;
            Ok(Step::Response(payload))
        }
        OAuthState::Sent => {
            // An error challenge (JSON body). Acknowledge with an empty
            // response so the server emits its tagged failure.
            tracing::debug!(
                challenge = %String::from_utf8_lossy(challenge),
                "OAuth error challenge received"
            );
            *state = OAuthState::Acked;
            Ok(Step::Response(Vec::new()))
        }
        OAuthState::Acked => Err(Error::AlreadyAuthenticated),
    }
}
