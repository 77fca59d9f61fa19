//! POP3 protocol types.

/// Parsed status line: `+OK`, `-ERR`, or a SASL continuation `+ `.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    /// Positive completion with trailing text.
    Ok(String),
    /// Negative completion with trailing text.
    Err(String),
    /// SASL continuation carrying base64 data.
    Continuation(String),
}

impl StatusLine {
    /// Parses one response line.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        if let Some(rest) = line.strip_prefix("+OK") {
            Some(Self::Ok(rest.trim_start().to_string()))
        } else if let Some(rest) = line.strip_prefix("-ERR") {
            Some(Self::Err(rest.trim_start().to_string()))
        } else if let Some(rest) = line.strip_prefix("+ ") {
            Some(Self::Continuation(rest.trim().to_string()))
        } else if line == "+" {
            Some(Self::Continuation(String::new()))
        } else {
            None
        }
    }
}

/// Maildrop statistics from STAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Number of messages.
    pub count: u32,
    /// Total size in octets.
    pub size: u64,
}

/// One LIST entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntry {
    /// Message number.
    pub message: u32,
    /// Size in octets.
    pub size: u64,
}

/// One UIDL entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidlEntry {
    /// Message number.
    pub message: u32,
    /// Unique id, stable across sessions.
    pub uid: String,
}

/// Server capabilities from CAPA (RFC 2449).
///
/// CAPA is optional; when unsupported the set stays empty and callers
/// assume the minimal command set (USER/PASS, STAT, LIST, RETR, DELE).
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    tags: Vec<Vec<String>>,
    /// APOP timestamp from the greeting, when the server offered one.
    pub apop_timestamp: Option<String>,
}

impl Capabilities {
    /// Rebuilds from CAPA response lines (each line split on whitespace).
    pub fn update(&mut self, lines: &[String]) {
        self.tags = lines
            .iter()
            .map(|l| l.split_whitespace().map(str::to_string).collect())
            .filter(|words: &Vec<String>| !words.is_empty())
            .collect();
    }

    /// Clears the cache (after STLS).
    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// True when the tag is present (case-insensitive).
    #[must_use]
    pub fn has(&self, tag: &str) -> bool {
        self.tags
            .iter()
            .any(|words| words[0].eq_ignore_ascii_case(tag))
    }

    /// Arguments of a tag, when present.
    #[must_use]
    pub fn args(&self, tag: &str) -> Option<&[String]> {
        self.tags
            .iter()
            .find(|words| words[0].eq_ignore_ascii_case(tag))
            .map(|words| &words[1..])
    }

    /// SASL mechanisms from the SASL tag.
    #[must_use]
    pub fn sasl_mechanisms(&self) -> Vec<String> {
        self.args("SASL")
            .map(|args| args.iter().map(|s| s.to_uppercase()).collect())
            .unwrap_or_default()
    }

    /// True when TOP is supported.
    #[must_use]
    pub fn top(&self) -> bool {
        self.has("TOP")
    }

    /// True when UIDL is supported.
    #[must_use]
    pub fn uidl(&self) -> bool {
        self.has("UIDL")
    }

    /// True when STLS is supported.
    #[must_use]
    pub fn stls(&self) -> bool {
        self.has("STLS")
    }

    /// True when PIPELINING is supported.
    #[must_use]
    pub fn pipelining(&self) -> bool {
        self.has("PIPELINING")
    }

    /// EXPIRE policy in days, when advertised with a number.
    #[must_use]
    pub fn expire_days(&self) -> Option<u32> {
        self.args("EXPIRE")?.first()?.parse().ok()
    }

    /// LOGIN-DELAY in seconds, when advertised.
    #[must_use]
    pub fn login_delay(&self) -> Option<u32> {
        self.args("LOGIN-DELAY")?.first()?.parse().ok()
    }

    /// True when nothing has been learned (CAPA unsupported or not yet
    /// issued).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Extracts an APOP timestamp (`<...>`) from the greeting text.
#[must_use]
pub fn apop_timestamp(greeting: &str) -> Option<String> {
    let start = greeting.find('<')?;
    let end = greeting[start..].find('>')? + start;
    Some(greeting[start..=end].to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_line_parsing() {
        assert_eq!(
            StatusLine::parse("+OK 2 messages"),
            Some(StatusLine::Ok("2 messages".to_string()))
        );
        assert_eq!(
            StatusLine::parse("-ERR no such message"),
            Some(StatusLine::Err("no such message".to_string()))
        );
        assert_eq!(
            StatusLine::parse("+ dGVzdA=="),
            Some(StatusLine::Continuation("dGVzdA==".to_string()))
        );
        assert_eq!(StatusLine::parse("garbage"), None);
    }

    #[test]
    fn apop_timestamp_extraction() {
        assert_eq!(
            apop_timestamp("POP3 server ready <1896.697170952@dbc.mtview.ca.us>"),
            Some("<1896.697170952@dbc.mtview.ca.us>".to_string())
        );
        assert_eq!(apop_timestamp("POP3 server ready"), None);
    }

    #[test]
    fn capabilities_lookup() {
        let mut caps = Capabilities::default();
        caps.update(&[
            "TOP".to_string(),
            "UIDL".to_string(),
            "SASL PLAIN SCRAM-SHA-256".to_string(),
            "EXPIRE 30".to_string(),
            "LOGIN-DELAY 120".to_string(),
            "IMPLEMENTATION mailwire-test".to_string(),
        ]);

        assert!(caps.top());
        assert!(caps.uidl());
        assert!(!caps.stls());
        assert_eq!(caps.expire_days(), Some(30));
        assert_eq!(caps.login_delay(), Some(120));
        assert_eq!(caps.sasl_mechanisms(), vec!["PLAIN", "SCRAM-SHA-256"]);
    }

    #[test]
    fn empty_capabilities_mean_minimal_set() {
        let caps = Capabilities::default();
        assert!(caps.is_empty());
        assert!(!caps.top());
        assert!(caps.sasl_mechanisms().is_empty());
    }
}
