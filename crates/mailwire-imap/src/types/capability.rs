//! Server capabilities.

/// Response status from a status-bearing response line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// Versioned set of server capability tokens.
///
/// Tokens are stored uppercase. Every reissue (untagged CAPABILITY, a
/// `[CAPABILITY ...]` response code, or a post-command refresh) replaces the
/// set and bumps a monotonic version counter, letting higher layers notice
/// that cached derived state is stale.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    tokens: Vec<String>,
    version: u64,
}

impl Capabilities {
    /// Creates an empty capability set (version 0, nothing advertised).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the set with freshly advertised tokens and bumps the
    /// version.
    pub fn replace<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tokens = tokens
            .into_iter()
            .map(|t| t.as_ref().to_uppercase())
            .collect();
        self.tokens.sort();
        self.tokens.dedup();
        self.version += 1;
    }

    /// Clears the set (post-STARTTLS, post-STLS), bumping the version.
    pub fn invalidate(&mut self) {
        self.tokens.clear();
        self.version += 1;
    }

    /// Monotonic reissue counter.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// True when the token is advertised (case-insensitive).
    #[must_use]
    pub fn supports(&self, token: &str) -> bool {
        let upper = token.to_uppercase();
        self.tokens.binary_search(&upper).is_ok()
    }

    /// SASL mechanisms advertised via `AUTH=` tokens.
    #[must_use]
    pub fn sasl_mechanisms(&self) -> Vec<String> {
        self.tokens
            .iter()
            .filter_map(|t| t.strip_prefix("AUTH="))
            .map(ToString::to_string)
            .collect()
    }

    /// All advertised tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// True when nothing has been advertised yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        assert!(Status::Ok.is_ok());
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::No.is_ok());
        assert!(!Status::Bad.is_ok());
        assert!(!Status::Bye.is_ok());
    }

    #[test]
    fn replace_uppercases_and_bumps_version() {
        let mut caps = Capabilities::new();
        assert_eq!(caps.version(), 0);

        caps.replace(["imap4rev1", "Idle", "AUTH=plain"]);
        assert_eq!(caps.version(), 1);
        assert!(caps.supports("IDLE"));
        assert!(caps.supports("idle"));
        assert!(caps.supports("IMAP4REV1"));

        caps.replace(["IMAP4REV1"]);
        assert_eq!(caps.version(), 2);
        assert!(!caps.supports("IDLE"));
    }

    #[test]
    fn sasl_mechanisms_derived_view() {
        let mut caps = Capabilities::new();
        caps.replace(["IMAP4rev1", "AUTH=PLAIN", "AUTH=SCRAM-SHA-256", "IDLE"]);
        let mechs = caps.sasl_mechanisms();
        assert_eq!(mechs.len(), 2);
        assert!(mechs.contains(&"PLAIN".to_string()));
        assert!(mechs.contains(&"SCRAM-SHA-256".to_string()));
    }

    #[test]
    fn invalidate_clears_but_keeps_counting() {
        let mut caps = Capabilities::new();
        caps.replace(["STARTTLS"]);
        caps.invalidate();
        assert_eq!(caps.version(), 2);
        assert!(caps.is_empty());
    }
}
