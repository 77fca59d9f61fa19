//! SMTP extension keywords from the EHLO response.

/// One EHLO extension line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS (RFC 3207).
    StartTls,
    /// AUTH with offered mechanism names.
    Auth(Vec<String>),
    /// SIZE with optional maximum.
    Size(Option<usize>),
    /// 8BITMIME.
    EightBitMime,
    /// BINARYMIME (requires CHUNKING).
    BinaryMime,
    /// PIPELINING.
    Pipelining,
    /// CHUNKING (BDAT).
    Chunking,
    /// SMTPUTF8.
    SmtpUtf8,
    /// DSN (RFC 3461).
    Dsn,
    /// REQUIRETLS (RFC 8689).
    RequireTls,
    /// ENHANCEDSTATUSCODES (RFC 2034).
    EnhancedStatusCodes,
    /// VRFY support.
    Vrfy,
    /// EXPN support.
    Expn,
    /// HELP support.
    Help,
    /// Unknown extension, raw line preserved.
    Unknown(String),
}

impl Extension {
    /// Parses one EHLO response line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return Self::Unknown(line.to_string());
        };

        match keyword.to_uppercase().as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => Self::Auth(parts.map(str::to_uppercase).collect()),
            "SIZE" => Self::Size(parts.next().and_then(|s| s.parse().ok())),
            "8BITMIME" => Self::EightBitMime,
            "BINARYMIME" => Self::BinaryMime,
            "PIPELINING" => Self::Pipelining,
            "CHUNKING" => Self::Chunking,
            "SMTPUTF8" => Self::SmtpUtf8,
            "DSN" => Self::Dsn,
            "REQUIRETLS" => Self::RequireTls,
            "ENHANCEDSTATUSCODES" => Self::EnhancedStatusCodes,
            "VRFY" => Self::Vrfy,
            "EXPN" => Self::Expn,
            "HELP" => Self::Help,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Capability view over the parsed EHLO extensions.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    /// Server hostname from the greeting or EHLO line.
    pub hostname: String,
    /// Parsed extensions.
    pub extensions: Vec<Extension>,
}

impl Capabilities {
    /// Rebuilds the set from EHLO response lines (skipping the first,
    /// which is the server greeting).
    pub fn update_from_ehlo(&mut self, lines: &[String]) {
        if let Some(first) = lines.first() {
            if let Some(host) = first.split_whitespace().next() {
                self.hostname = host.to_string();
            }
        }
        self.extensions = lines.iter().skip(1).map(|l| Extension::parse(l)).collect();
    }

    /// Clears everything (post-STARTTLS, HELO fallback).
    pub fn clear(&mut self) {
        self.extensions.clear();
    }

    /// Maximum message size, when advertised with a value.
    #[must_use]
    pub fn max_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|e| match e {
            Extension::Size(limit) => *limit,
            _ => None,
        })
    }

    /// Offered SASL mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<String> {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::Auth(mechs) => Some(mechs.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// True when PIPELINING is advertised.
    #[must_use]
    pub fn pipelining(&self) -> bool {
        self.has(&Extension::Pipelining)
    }

    /// True when CHUNKING is advertised.
    #[must_use]
    pub fn chunking(&self) -> bool {
        self.has(&Extension::Chunking)
    }

    /// True when STARTTLS is advertised.
    #[must_use]
    pub fn starttls(&self) -> bool {
        self.has(&Extension::StartTls)
    }

    /// True when 8BITMIME is advertised.
    #[must_use]
    pub fn eight_bit_mime(&self) -> bool {
        self.has(&Extension::EightBitMime)
    }

    /// True when BINARYMIME is advertised.
    #[must_use]
    pub fn binary_mime(&self) -> bool {
        self.has(&Extension::BinaryMime)
    }

    /// True when SMTPUTF8 is advertised.
    #[must_use]
    pub fn smtputf8(&self) -> bool {
        self.has(&Extension::SmtpUtf8)
    }

    /// True when DSN is advertised.
    #[must_use]
    pub fn dsn(&self) -> bool {
        self.has(&Extension::Dsn)
    }

    /// True when REQUIRETLS is advertised.
    #[must_use]
    pub fn require_tls(&self) -> bool {
        self.has(&Extension::RequireTls)
    }

    /// True when ENHANCEDSTATUSCODES is advertised.
    #[must_use]
    pub fn enhanced_status_codes(&self) -> bool {
        self.has(&Extension::EnhancedStatusCodes)
    }

    fn has(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_keywords() {
        assert_eq!(Extension::parse("STARTTLS"), Extension::StartTls);
        assert_eq!(Extension::parse("starttls"), Extension::StartTls);
        assert_eq!(Extension::parse("8BITMIME"), Extension::EightBitMime);
        assert_eq!(Extension::parse("REQUIRETLS"), Extension::RequireTls);
        assert_eq!(
            Extension::parse("ENHANCEDSTATUSCODES"),
            Extension::EnhancedStatusCodes
        );
        assert!(matches!(Extension::parse("X-CUSTOM"), Extension::Unknown(_)));
    }

    #[test]
    fn parse_auth_mechanisms() {
        let ext = Extension::parse("AUTH plain LOGIN cram-md5");
        assert_eq!(
            ext,
            Extension::Auth(vec![
                "PLAIN".to_string(),
                "LOGIN".to_string(),
                "CRAM-MD5".to_string()
            ])
        );
    }

    #[test]
    fn parse_size_values() {
        assert_eq!(Extension::parse("SIZE 52428800"), Extension::Size(Some(52_428_800)));
        assert_eq!(Extension::parse("SIZE"), Extension::Size(None));
    }

    #[test]
    fn capabilities_from_ehlo() {
        let mut caps = Capabilities::default();
        caps.update_from_ehlo(&[
            "mail.example.com greets client".to_string(),
            "PIPELINING".to_string(),
            "SIZE 1000".to_string(),
            "AUTH PLAIN SCRAM-SHA-256".to_string(),
            "ENHANCEDSTATUSCODES".to_string(),
            "8BITMIME".to_string(),
        ]);

        assert_eq!(caps.hostname, "mail.example.com");
        assert!(caps.pipelining());
        assert!(!caps.chunking());
        assert_eq!(caps.max_size(), Some(1000));
        assert!(caps.enhanced_status_codes());
        assert_eq!(caps.auth_mechanisms(), vec!["PLAIN", "SCRAM-SHA-256"]);
    }
}
