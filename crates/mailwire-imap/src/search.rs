//! Search query AST, optimizer, and IMAP serialization.
//!
//! Queries are immutable trees built from combinators. [`SearchQuery::optimize`]
//! applies semantics-preserving simplifications to a fixed point, and
//! [`SearchQuery::to_imap`] emits RFC 3501 SEARCH atoms (with a
//! `CHARSET UTF-8` prefix whenever a string argument needs it).

use chrono::NaiveDate;

use crate::types::UidSet;

/// An immutable search query tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// All messages.
    All,
    /// Messages with `\Answered`.
    Answered,
    /// Messages with `\Deleted`.
    Deleted,
    /// Messages with `\Draft`.
    Draft,
    /// Messages with `\Flagged`.
    Flagged,
    /// Messages without `\Seen` that are recent.
    New,
    /// Messages that are not recent.
    Old,
    /// Messages with `\Recent`.
    Recent,
    /// Messages with `\Seen`.
    Seen,
    /// Messages without `\Seen`.
    Unseen,
    /// Internal date is `date`.
    On(NaiveDate),
    /// Internal date is on or after `date`.
    Since(NaiveDate),
    /// Internal date is before `date`.
    Before(NaiveDate),
    /// Date header is `date`.
    SentOn(NaiveDate),
    /// Date header is on or after `date`.
    SentSince(NaiveDate),
    /// Date header is before `date`.
    SentBefore(NaiveDate),
    /// From header contains the string.
    From(String),
    /// To header contains the string.
    To(String),
    /// Cc header contains the string.
    Cc(String),
    /// Bcc header contains the string.
    Bcc(String),
    /// Subject header contains the string.
    Subject(String),
    /// Body contains the string.
    Body(String),
    /// Header or body contains the string.
    Text(String),
    /// Named header contains the value.
    Header(String, String),
    /// Size greater than n octets.
    Larger(u32),
    /// Size smaller than n octets.
    Smaller(u32),
    /// UID within the set.
    Uid(UidSet),
    /// Gmail raw search (X-GM-RAW).
    GmRaw(String),
    /// MODSEQ at least n (CONDSTORE).
    ModSeq(u64),
    /// Received within the last n seconds (RFC 5032 YOUNGER).
    YoungerThan(u32),
    /// Received more than n seconds ago (RFC 5032 OLDER).
    OlderThan(u32),
    /// Conjunction.
    And(Vec<SearchQuery>),
    /// Disjunction.
    Or(Box<SearchQuery>, Box<SearchQuery>),
    /// Negation.
    Not(Box<SearchQuery>),
}

impl SearchQuery {
    /// Builds a conjunction.
    #[must_use]
    pub fn and(a: Self, b: Self) -> Self {
        Self::And(vec![a, b])
    }

    /// Builds a disjunction.
    #[must_use]
    pub fn or(a: Self, b: Self) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }

    /// Builds a negation.
    #[must_use]
    pub fn not(q: Self) -> Self {
        Self::Not(Box::new(q))
    }

    /// Returns a semantically equivalent, simplified query.
    ///
    /// Normalization runs to a fixed point: nested conjunctions are
    /// flattened, `ALL` acts as the AND-identity and the OR-annihilator,
    /// double negations cancel, duplicate conjuncts are dropped, and a
    /// De Morgan rewrite is kept only when it shortens serialization.
    #[must_use]
    pub fn optimize(&self) -> Self {
        let mut current = self.clone();
        loop {
            let next = current.simplify_once();
            if next == current {
                return next;
            }
            current = next;
        }
    }

    fn simplify_once(&self) -> Self {
        match self {
            Self::And(items) => {
                let mut flat = Vec::new();
                for item in items {
                    match item.simplify_once() {
                        // Identity element.
                        Self::All => {}
                        Self::And(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                // Drop duplicate conjuncts.
                let mut deduped: Vec<Self> = Vec::with_capacity(flat.len());
                for item in flat {
                    if !deduped.contains(&item) {
                        deduped.push(item);
                    }
                }
                match deduped.len() {
                    0 => Self::All,
                    1 => deduped.into_iter().next().unwrap_or(Self::All),
                    _ => Self::And(deduped),
                }
            }
            Self::Or(a, b) => {
                let a = a.simplify_once();
                let b = b.simplify_once();
                if a == Self::All || b == Self::All {
                    // OR with ALL matches everything.
                    Self::All
                } else if a == b {
                    a
                } else {
                    Self::Or(Box::new(a), Box::new(b))
                }
            }
            Self::Not(inner) => match inner.simplify_once() {
                Self::Not(deep) => *deep,
                simplified => {
                    let plain = Self::Not(Box::new(simplified.clone()));
                    if let Some(pushed) = de_morgan(&simplified) {
                        if pushed.to_imap().len() < plain.to_imap().len() {
                            return pushed;
                        }
                    }
                    plain
                }
            },
            leaf => leaf.clone(),
        }
    }

    /// Serializes to IMAP SEARCH arguments.
    ///
    /// Emits `CHARSET UTF-8` first when any string argument contains
    /// non-ASCII bytes.
    #[must_use]
    pub fn to_imap(&self) -> String {
        let body = self.serialize_node();
        if self.needs_utf8() {
            format!("CHARSET UTF-8 {body}")
        } else {
            body
        }
    }

    /// Serializes without a charset prefix. SORT and THREAD pass the
    /// charset as a positional argument instead.
    #[must_use]
    pub fn serialize_without_charset(&self) -> String {
        self.serialize_node()
    }

    fn needs_utf8(&self) -> bool {
        match self {
            Self::From(s)
            | Self::To(s)
            | Self::Cc(s)
            | Self::Bcc(s)
            | Self::Subject(s)
            | Self::Body(s)
            | Self::Text(s)
            | Self::GmRaw(s) => !s.is_ascii(),
            Self::Header(name, value) => !name.is_ascii() || !value.is_ascii(),
            Self::And(items) => items.iter().any(Self::needs_utf8),
            Self::Or(a, b) => a.needs_utf8() || b.needs_utf8(),
            Self::Not(q) => q.needs_utf8(),
            _ => false,
        }
    }

    fn serialize_node(&self) -> String {
        match self {
            Self::All => "ALL".to_string(),
            Self::Answered => "ANSWERED".to_string(),
            Self::Deleted => "DELETED".to_string(),
            Self::Draft => "DRAFT".to_string(),
            Self::Flagged => "FLAGGED".to_string(),
            Self::New => "NEW".to_string(),
            Self::Old => "OLD".to_string(),
            Self::Recent => "RECENT".to_string(),
            Self::Seen => "SEEN".to_string(),
            Self::Unseen => "UNSEEN".to_string(),
            Self::On(d) => format!("ON {}", imap_date(*d)),
            Self::Since(d) => format!("SINCE {}", imap_date(*d)),
            Self::Before(d) => format!("BEFORE {}", imap_date(*d)),
            Self::SentOn(d) => format!("SENTON {}", imap_date(*d)),
            Self::SentSince(d) => format!("SENTSINCE {}", imap_date(*d)),
            Self::SentBefore(d) => format!("SENTBEFORE {}", imap_date(*d)),
            Self::From(s) => format!("FROM {}", quote(s)),
            Self::To(s) => format!("TO {}", quote(s)),
            Self::Cc(s) => format!("CC {}", quote(s)),
            Self::Bcc(s) => format!("BCC {}", quote(s)),
            Self::Subject(s) => format!("SUBJECT {}", quote(s)),
            Self::Body(s) => format!("BODY {}", quote(s)),
            Self::Text(s) => format!("TEXT {}", quote(s)),
            Self::Header(name, value) => format!("HEADER {} {}", quote(name), quote(value)),
            Self::Larger(n) => format!("LARGER {n}"),
            Self::Smaller(n) => format!("SMALLER {n}"),
            Self::Uid(set) => format!("UID {set}"),
            Self::GmRaw(s) => format!("X-GM-RAW {}", quote(s)),
            Self::ModSeq(n) => format!("MODSEQ {n}"),
            Self::YoungerThan(n) => format!("YOUNGER {n}"),
            Self::OlderThan(n) => format!("OLDER {n}"),
            Self::And(items) => items
                .iter()
                .map(Self::serialize_node)
                .collect::<Vec<_>>()
                .join(" "),
            Self::Or(a, b) => format!("OR {} {}", a.serialize_group(), b.serialize_group()),
            Self::Not(q) => format!("NOT {}", q.serialize_group()),
        }
    }

    /// Like `serialize_node` but parenthesizes multi-atom conjunctions so
    /// they bind as one OR/NOT operand.
    fn serialize_group(&self) -> String {
        match self {
            Self::And(items) if items.len() > 1 => format!("({})", self.serialize_node()),
            _ => self.serialize_node(),
        }
    }
}

/// De Morgan rewrite of a negated conjunction/disjunction, when applicable.
fn de_morgan(inner: &SearchQuery) -> Option<SearchQuery> {
    match inner {
        SearchQuery::And(items) => {
            let negated: Vec<SearchQuery> = items.iter().cloned().map(SearchQuery::not).collect();
            // NOT (a AND b) == (NOT a) OR (NOT b)
            let mut iter = negated.into_iter();
            let first = iter.next()?;
            Some(iter.fold(first, SearchQuery::or))
        }
        SearchQuery::Or(a, b) => Some(SearchQuery::And(vec![
            SearchQuery::not((**a).clone()),
            SearchQuery::not((**b).clone()),
        ])),
        _ => None,
    }
}

/// Formats a date as `d-Mon-yyyy`.
fn imap_date(date: NaiveDate) -> String {
    date.format("%-d-%b-%Y").to_string()
}

/// Quotes a search string, escaping embedded quotes and backslashes.
fn quote(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// One SORT key (RFC 5256, plus DISPLAY variants from RFC 5957).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Internal date.
    Arrival,
    /// First Cc address.
    Cc,
    /// Date header.
    Date,
    /// First From address.
    From,
    /// Message size.
    Size,
    /// Base subject.
    Subject,
    /// First To address.
    To,
    /// Display name of From (SORT=DISPLAY).
    DisplayFrom,
    /// Display name of To (SORT=DISPLAY).
    DisplayTo,
}

impl SortKey {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Arrival => "ARRIVAL",
            Self::Cc => "CC",
            Self::Date => "DATE",
            Self::From => "FROM",
            Self::Size => "SIZE",
            Self::Subject => "SUBJECT",
            Self::To => "TO",
            Self::DisplayFrom => "DISPLAYFROM",
            Self::DisplayTo => "DISPLAYTO",
        }
    }
}

/// An ordered SORT program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortCriteria {
    keys: Vec<(SortKey, bool)>,
}

impl SortCriteria {
    /// Creates an empty sort program.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an ascending key.
    #[must_use]
    pub fn key(mut self, key: SortKey) -> Self {
        self.keys.push((key, false));
        self
    }

    /// Appends a reversed key.
    #[must_use]
    pub fn reverse(mut self, key: SortKey) -> Self {
        self.keys.push((key, true));
        self
    }

    /// True when any key needs the SORT=DISPLAY capability.
    #[must_use]
    pub fn needs_display(&self) -> bool {
        self.keys
            .iter()
            .any(|(k, _)| matches!(k, SortKey::DisplayFrom | SortKey::DisplayTo))
    }

    /// Serializes to the parenthesized sort program.
    #[must_use]
    pub fn to_imap(&self) -> String {
        let mut parts = Vec::new();
        for (key, reversed) in &self.keys {
            if *reversed {
                parts.push("REVERSE");
            }
            parts.push(key.as_str());
        }
        format!("({})", parts.join(" "))
    }

    /// True when no keys were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// THREAD algorithm selector (RFC 5256).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadAlgorithm {
    /// REFERENCES threading.
    References,
    /// ORDEREDSUBJECT threading.
    OrderedSubject,
}

impl ThreadAlgorithm {
    /// The algorithm token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::References => "REFERENCES",
            Self::OrderedSubject => "ORDEREDSUBJECT",
        }
    }

    /// The capability the server must advertise.
    #[must_use]
    pub const fn required_capability(self) -> &'static str {
        match self {
            Self::References => "THREAD=REFERENCES",
            Self::OrderedSubject => "THREAD=ORDEREDSUBJECT",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn leaf_serialization() {
        assert_eq!(SearchQuery::Unseen.to_imap(), "UNSEEN");
        assert_eq!(SearchQuery::Larger(1024).to_imap(), "LARGER 1024");
        assert_eq!(
            SearchQuery::Since(date(1994, 2, 7)).to_imap(),
            "SINCE 7-Feb-1994"
        );
        assert_eq!(
            SearchQuery::From("alice@example.com".to_string()).to_imap(),
            "FROM \"alice@example.com\""
        );
        assert_eq!(
            SearchQuery::Header("X-Priority".to_string(), "1".to_string()).to_imap(),
            "HEADER \"X-Priority\" \"1\""
        );
        assert_eq!(
            SearchQuery::Uid(UidSet::parse("1,3:5").unwrap()).to_imap(),
            "UID 1,3:5"
        );
    }

    #[test]
    fn non_ascii_triggers_charset_prefix() {
        let q = SearchQuery::Subject("köln".to_string());
        assert_eq!(q.to_imap(), "CHARSET UTF-8 SUBJECT \"köln\"");

        let nested = SearchQuery::and(SearchQuery::Unseen, SearchQuery::Body("héllo".to_string()));
        assert!(nested.to_imap().starts_with("CHARSET UTF-8 "));
    }

    #[test]
    fn and_flattens_and_absorbs_all() {
        let q = SearchQuery::and(
            SearchQuery::All,
            SearchQuery::and(SearchQuery::Unseen, SearchQuery::Flagged),
        );
        assert_eq!(
            q.optimize(),
            SearchQuery::And(vec![SearchQuery::Unseen, SearchQuery::Flagged])
        );
    }

    #[test]
    fn and_with_all_is_identity() {
        let q = SearchQuery::and(SearchQuery::All, SearchQuery::Unseen);
        assert_eq!(q.optimize(), SearchQuery::Unseen.optimize());
    }

    #[test]
    fn or_with_all_annihilates() {
        let q = SearchQuery::or(SearchQuery::Unseen, SearchQuery::All);
        assert_eq!(q.optimize(), SearchQuery::All);
    }

    #[test]
    fn double_negation_cancels() {
        let q = SearchQuery::not(SearchQuery::not(SearchQuery::Flagged));
        assert_eq!(q.optimize(), SearchQuery::Flagged.optimize());
    }

    #[test]
    fn duplicate_conjuncts_dropped() {
        let q = SearchQuery::and(SearchQuery::Unseen, SearchQuery::Unseen);
        assert_eq!(q.optimize(), SearchQuery::Unseen);
    }

    #[test]
    fn or_operands_parenthesize_conjunctions() {
        let q = SearchQuery::or(
            SearchQuery::And(vec![SearchQuery::Unseen, SearchQuery::Flagged]),
            SearchQuery::Deleted,
        );
        assert_eq!(q.to_imap(), "OR (UNSEEN FLAGGED) DELETED");
    }

    #[test]
    fn not_groups_conjunctions() {
        let q = SearchQuery::not(SearchQuery::And(vec![
            SearchQuery::Unseen,
            SearchQuery::Flagged,
        ]));
        // The De Morgan form "OR NOT UNSEEN NOT FLAGGED" is longer than
        // "NOT (UNSEEN FLAGGED)", so the plain form is kept.
        assert_eq!(q.optimize().to_imap(), "NOT (UNSEEN FLAGGED)");
    }

    #[test]
    fn optimize_is_idempotent() {
        let queries = vec![
            SearchQuery::and(
                SearchQuery::All,
                SearchQuery::or(SearchQuery::Unseen, SearchQuery::All),
            ),
            SearchQuery::not(SearchQuery::not(SearchQuery::and(
                SearchQuery::Flagged,
                SearchQuery::Flagged,
            ))),
            SearchQuery::Or(
                Box::new(SearchQuery::Not(Box::new(SearchQuery::Seen))),
                Box::new(SearchQuery::Draft),
            ),
        ];
        for q in queries {
            let once = q.optimize();
            assert_eq!(once.optimize(), once);
        }
    }

    #[test]
    fn sort_criteria_serialization() {
        let sort = SortCriteria::new()
            .reverse(SortKey::Date)
            .key(SortKey::Subject);
        assert_eq!(sort.to_imap(), "(REVERSE DATE SUBJECT)");
        assert!(!sort.needs_display());

        let display = SortCriteria::new().key(SortKey::DisplayFrom);
        assert!(display.needs_display());
    }

    #[test]
    fn thread_algorithm_tokens() {
        assert_eq!(ThreadAlgorithm::References.as_str(), "REFERENCES");
        assert_eq!(
            ThreadAlgorithm::OrderedSubject.required_capability(),
            "THREAD=ORDEREDSUBJECT"
        );
    }

    fn arb_query() -> impl Strategy<Value = SearchQuery> {
        let leaf = prop_oneof![
            Just(SearchQuery::All),
            Just(SearchQuery::Unseen),
            Just(SearchQuery::Flagged),
            Just(SearchQuery::Deleted),
            (1u32..10_000).prop_map(SearchQuery::Larger),
            "[a-z]{1,8}".prop_map(SearchQuery::Subject),
        ];
        leaf.prop_recursive(3, 24, 3, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone())
                    .prop_map(|(a, b)| SearchQuery::and(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| SearchQuery::or(a, b)),
                inner.prop_map(SearchQuery::not),
            ]
        })
    }

    proptest! {
        #[test]
        fn optimize_idempotent_property(q in arb_query()) {
            let once = q.optimize();
            prop_assert_eq!(once.optimize(), once);
        }
    }
}
