//! Envelope address types.

use crate::error::{Error, Result};

/// Email address for the SMTP envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address after basic validation.
    ///
    /// # Errors
    ///
    /// Returns an error when the address is structurally invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the address contains non-ASCII bytes and therefore
    /// needs SMTPUTF8.
    #[must_use]
    pub fn needs_utf8(&self) -> bool {
        !self.0.is_ascii()
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("address cannot be empty".into()));
        }
        let Some((local, domain)) = addr.rsplit_once('@') else {
            return Err(Error::InvalidAddress("address must contain @".into()));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(
                "local and domain parts cannot be empty".into(),
            ));
        }
        if addr.chars().any(|c| c == '<' || c == '>' || c.is_control()) {
            return Err(Error::InvalidAddress(
                "address contains forbidden characters".into(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(Address::new("user@example.com").is_ok());
        assert!(Address::new("user+tag@sub.example.com").is_ok());
    }

    #[test]
    fn rejects_malformed() {
        assert!(Address::new("").is_err());
        assert!(Address::new("no-at-sign").is_err());
        assert!(Address::new("@missing-local").is_err());
        assert!(Address::new("missing-domain@").is_err());
        assert!(Address::new("angle<bracket>@example.com").is_err());
    }

    #[test]
    fn utf8_detection() {
        assert!(!Address::new("user@example.com").unwrap().needs_utf8());
        assert!(Address::new("usér@example.com").unwrap().needs_utf8());
        assert!(Address::new("user@exämple.com").unwrap().needs_utf8());
    }
}
