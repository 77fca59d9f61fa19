//! Automatic mechanism selection.

/// Preference order when the caller asks for automatic selection.
///
/// Channel-bound SCRAM first (when binding data is available), then the
/// stronger digest mechanisms, with plaintext forms as the last resort.
const BOUND_PREFERENCE: &[&str] = &["SCRAM-SHA-256-PLUS", "SCRAM-SHA-1-PLUS"];
const PREFERENCE: &[&str] = &[
    "SCRAM-SHA-256",
    "SCRAM-SHA-1",
    "CRAM-MD5",
    "LOGIN",
    "PLAIN",
];

/// Picks the best mutually supported mechanism.
///
/// `offered` is the server's advertised mechanism list (case-insensitive);
/// `channel_binding` indicates whether tls-server-end-point data is
/// available for `-PLUS` variants.
#[must_use]
pub fn select_mechanism(offered: &[String], channel_binding: bool) -> Option<&'static str> {
    let upper: Vec<String> = offered.iter().map(|m| m.to_uppercase()).collect();
    let pick = |candidates: &[&'static str]| {
        candidates
            .iter()
            .copied()
            .find(|name| upper.iter().any(|m| m.as_str() == *name))
    };

    if channel_binding {
        if let Some(found) = pick(BOUND_PREFERENCE) {
            return Some(found);
        }
    }
    pick(PREFERENCE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn offered(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn prefers_plus_with_binding() {
        let mechs = offered(&["PLAIN", "SCRAM-SHA-256", "SCRAM-SHA-256-PLUS"]);
        assert_eq!(select_mechanism(&mechs, true), Some("SCRAM-SHA-256-PLUS"));
    }

    #[test]
    fn skips_plus_without_binding() {
        let mechs = offered(&["PLAIN", "SCRAM-SHA-256", "SCRAM-SHA-256-PLUS"]);
        assert_eq!(select_mechanism(&mechs, false), Some("SCRAM-SHA-256"));
    }

    #[test]
    fn falls_through_preference_order() {
        assert_eq!(
            select_mechanism(&offered(&["LOGIN", "PLAIN"]), true),
            Some("LOGIN")
        );
        assert_eq!(
            select_mechanism(&offered(&["PLAIN"]), false),
            Some("PLAIN")
        );
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(
            select_mechanism(&offered(&["scram-sha-1"]), false),
            Some("SCRAM-SHA-1")
        );
    }

    #[test]
    fn none_when_nothing_matches() {
        assert_eq!(select_mechanism(&offered(&["EXTERNAL"]), true), None);
        assert_eq!(select_mechanism(&[], true), None);
    }
}
