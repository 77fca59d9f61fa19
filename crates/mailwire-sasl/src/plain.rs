//! PLAIN mechanism (RFC 4616).

use crate::{Error, Mechanism, Result, Step};

/// PLAIN: a single `authzid \0 authcid \0 password` response.
#[derive(Debug)]
pub struct Plain {
    authzid: String,
    authcid: String,
    password: String,
    sent: bool,
}

impl Plain {
    /// Creates a PLAIN mechanism with an empty authorization identity.
    #[must_use]
    pub fn new(authcid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            authzid: String::new(),
            authcid: authcid.into(),
            password: password.into(),
            sent: false,
        }
    }

    /// Sets the authorization identity (acting-on-behalf-of).
    #[must_use]
    pub fn authzid(mut self, authzid: impl Into<String>) -> Self {
        self.authzid = authzid.into();
        self
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(self.authzid.as_bytes());
        out.push(0);
        out.extend_from_slice(self.authcid.as_bytes());
        out.push(0);
        out.extend_from_slice(self.password.as_bytes());
        out
    }
}

impl Mechanism for Plain {
    fn name(&self) -> &'static str {
        "PLAIN"
    }

    fn initial_response(&mut self) -> Option<Vec<u8>> {
        self.sent = true;
        Some(self.payload())
    }

    fn step(&mut self, _challenge: &[u8]) -> Result<Step> {
        if self.sent {
            return Err(Error::AlreadyAuthenticated);
        }
        // Server issued an empty continuation instead of accepting SASL-IR.
        self.sent = true;
        Ok(Step::Response(self.payload()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn initial_response_layout() {
        let mut mech = Plain::new("tim", "tanstaaftanstaaf");
        let ir = mech.initial_response().unwrap();
        assert_eq!(ir, b"\0tim\0tanstaaftanstaaf");
    }

    #[test]
    fn authzid_prefix() {
        let mut mech = Plain::new("user", "pass").authzid("admin");
        let ir = mech.initial_response().unwrap();
        assert_eq!(ir, b"admin\0user\0pass");
    }

    #[test]
    fn step_after_send_fails() {
        let mut mech = Plain::new("user", "pass");
        let _ = mech.initial_response();
        assert!(mech.step(b"").is_err());
    }

    #[test]
    fn step_without_initial_sends_payload() {
        let mut mech = Plain::new("user", "pass");
        match mech.step(b"").unwrap() {
            Step::Response(bytes) => assert_eq!(bytes, b"\0user\0pass"),
            Step::Done => panic!("expected response"),
        }
    }
}
