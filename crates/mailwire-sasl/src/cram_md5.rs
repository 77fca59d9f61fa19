//! CRAM-MD5 mechanism (RFC 2195).

use hmac::{Hmac, Mac};
use md5::Md5;

use crate::{Error, Mechanism, Result, Step};

type HmacMd5 = Hmac<Md5>;

/// CRAM-MD5: HMAC-MD5 of the server timestamp challenge, keyed by the
/// password.
#[derive(Debug)]
pub struct CramMd5 {
    username: String,
    password: String,
    done: bool,
}

impl CramMd5 {
    /// Creates a CRAM-MD5 mechanism.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            done: false,
        }
    }
}

impl Mechanism for CramMd5 {
    fn name(&self) -> &'static str {
        "CRAM-MD5"
    }

    fn step(&mut self, challenge: &[u8]) -> Result<Step> {
        if self.done {
            return Err(Error::AlreadyAuthenticated);
        }
        if challenge.is_empty() {
            return Err(Error::IncompleteChallenge("empty CRAM-MD5 challenge".into()));
        }

        let mut mac = HmacMd5::new_from_slice(self.password.as_bytes())
            .map_err(|_| Error::InvalidChallenge("HMAC key setup failed".into()))?;
        mac.update(challenge);
        let digest = mac.finalize().into_bytes();

        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.done = true;
        Ok(Step::Response(
            format!("{} {hex}", self.username).into_bytes(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // RFC 2195 section 2 example.
    #[test]
    fn rfc_vector() {
        let mut mech = CramMd5::new("tim", "tanstaaftanstaaf");
        let challenge = b"<1896.697170952@postoffice.reston.mci.net>";
        match mech.step(challenge).unwrap() {
            Step::Response(bytes) => {
                assert_eq!(
                    String::from_utf8(bytes).unwrap(),
                    "tim b913a602c7eda7a495b4e6e7334d3890"
                );
            }
            Step::Done => panic!("expected response"),
        }
    }

    #[test]
    fn empty_challenge_rejected() {
        let mut mech = CramMd5::new("tim", "pw");
        assert!(mech.step(b"").is_err());
    }

    #[test]
    fn second_step_rejected() {
        let mut mech = CramMd5::new("tim", "pw");
        let _ = mech.step(b"<x@y>").unwrap();
        assert!(mech.step(b"<x@y>").is_err());
    }
}
