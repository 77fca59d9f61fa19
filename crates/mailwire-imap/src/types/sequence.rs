//! Message-set algebra: UID sets and sequence-number sets.
//!
//! Both set types hold a canonical, sorted, non-overlapping list of
//! inclusive ranges with support for the `*` sentinel (the last existing
//! message, which compares greater than any concrete id). Parsing accepts
//! any RFC 3501 `sequence-set` syntax; serialization always emits the
//! canonical form, so `parse(serialize(s)) == s`.

use crate::{Error, Result};

/// Internal bound value. Concrete ids occupy `1..=u32::MAX`; the `*`
/// sentinel is one past them so ordinary interval arithmetic applies.
const STAR: u64 = (u32::MAX as u64) + 1;

/// One inclusive range over the extended id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    lo: u64,
    hi: u64,
}

impl Span {
    fn format_into(self, out: &mut String) {
        use std::fmt::Write;
        match (self.lo, self.hi) {
            (STAR, STAR) => out.push('*'),
            (lo, STAR) => {
                let _ = write!(out, "{lo}:*");
            }
            (lo, hi) if lo == hi => {
                let _ = write!(out, "{lo}");
            }
            (lo, hi) => {
                let _ = write!(out, "{lo}:{hi}");
            }
        }
    }
}

/// Canonical range list shared by [`UidSet`] and [`SequenceSet`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct RangeList {
    spans: Vec<Span>,
}

impl RangeList {
    fn normalize(&mut self) {
        self.spans.sort_by_key(|s| (s.lo, s.hi));
        let mut merged: Vec<Span> = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            match merged.last_mut() {
                // Adjacent or overlapping spans collapse.
                Some(last) if span.lo <= last.hi.saturating_add(1) => {
                    last.hi = last.hi.max(span.hi);
                }
                _ => merged.push(span),
            }
        }
        self.spans = merged;
    }

    fn push(&mut self, lo: u64, hi: u64) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.spans.push(Span { lo, hi });
        self.normalize();
    }

    fn parse(input: &str) -> Result<Self> {
        let mut list = Self::default();
        if input.trim().is_empty() {
            return Err(Error::Protocol("empty sequence set".to_string()));
        }
        for part in input.split(',') {
            let part = part.trim();
            let (lo_str, hi_str) = part.split_once(':').unwrap_or((part, part));
            let lo = parse_id(lo_str)?;
            let hi = parse_id(hi_str)?;
            list.push(lo.min(hi), lo.max(hi));
        }
        Ok(list)
    }

    fn contains(&self, id: u32) -> bool {
        let id = u64::from(id);
        self.spans.iter().any(|s| s.lo <= id && id <= s.hi)
    }

    fn count(&self) -> Option<u64> {
        let mut total = 0u64;
        for span in &self.spans {
            if span.hi == STAR {
                return None;
            }
            total += span.hi - span.lo + 1;
        }
        Some(total)
    }

    fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.spans.extend_from_slice(&other.spans);
        out.normalize();
        out
    }

    fn intersect(&self, other: &Self) -> Self {
        let mut out = Self::default();
        for a in &self.spans {
            for b in &other.spans {
                let lo = a.lo.max(b.lo);
                let hi = a.hi.min(b.hi);
                if lo <= hi {
                    out.spans.push(Span { lo, hi });
                }
            }
        }
        out.normalize();
        out
    }

    fn subtract(&self, other: &Self) -> Self {
        let mut current = self.spans.clone();
        for b in &other.spans {
            let mut next = Vec::with_capacity(current.len() + 1);
            for a in current {
                if b.hi < a.lo || b.lo > a.hi {
                    next.push(a);
                    continue;
                }
                if a.lo < b.lo {
                    next.push(Span {
                        lo: a.lo,
                        hi: b.lo - 1,
                    });
                }
                if b.hi < a.hi {
                    next.push(Span {
                        lo: b.hi + 1,
                        hi: a.hi,
                    });
                }
            }
            current = next;
        }
        let mut out = Self { spans: current };
        out.normalize();
        out
    }

    fn iter_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.spans
            .iter()
            .filter(|s| s.hi < STAR)
            .flat_map(|s| s.lo..=s.hi)
            .map(|id| u32::try_from(id).unwrap_or(u32::MAX))
    }

    fn serialize(&self) -> String {
        let mut out = String::new();
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            span.format_into(&mut out);
        }
        out
    }
}

fn parse_id(s: &str) -> Result<u64> {
    if s == "*" {
        return Ok(STAR);
    }
    let n: u32 = s
        .parse()
        .map_err(|_| Error::Protocol(format!("invalid sequence-set element: {s:?}")))?;
    if n == 0 {
        return Err(Error::Protocol("message number 0 is invalid".to_string()));
    }
    Ok(u64::from(n))
}

macro_rules! message_set {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            list: RangeList,
        }

        impl $name {
            /// Creates an empty set.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Creates a set holding a single id. Returns `None` for 0.
            #[must_use]
            pub fn single(id: u32) -> Option<Self> {
                if id == 0 {
                    return None;
                }
                let mut set = Self::new();
                set.list.push(u64::from(id), u64::from(id));
                Some(set)
            }

            /// Creates a set from an inclusive range. Returns `None` when
            /// either end is 0.
            #[must_use]
            pub fn range(start: u32, end: u32) -> Option<Self> {
                if start == 0 || end == 0 {
                    return None;
                }
                let mut set = Self::new();
                set.list.push(u64::from(start), u64::from(end));
                Some(set)
            }

            /// Creates the open range `start:*`. Returns `None` for 0.
            #[must_use]
            pub fn range_from(start: u32) -> Option<Self> {
                if start == 0 {
                    return None;
                }
                let mut set = Self::new();
                set.list.push(u64::from(start), STAR);
                Some(set)
            }

            /// Creates the full range `1:*`.
            #[must_use]
            pub fn all() -> Self {
                let mut set = Self::new();
                set.list.push(1, STAR);
                set
            }

            /// Creates the `*` singleton (the last existing message).
            #[must_use]
            pub fn last() -> Self {
                let mut set = Self::new();
                set.list.push(STAR, STAR);
                set
            }

            /// Parses any RFC 3501 sequence-set and canonicalizes it.
            ///
            /// # Errors
            ///
            /// Returns an error for empty input, zero ids, or malformed
            /// elements.
            pub fn parse(input: &str) -> Result<Self> {
                Ok(Self {
                    list: RangeList::parse(input)?,
                })
            }

            /// Adds a single id to the set.
            pub fn insert(&mut self, id: u32) {
                if id != 0 {
                    self.list.push(u64::from(id), u64::from(id));
                }
            }

            /// Adds an inclusive range to the set.
            pub fn insert_range(&mut self, start: u32, end: u32) {
                if start != 0 && end != 0 {
                    self.list.push(u64::from(start), u64::from(end));
                }
            }

            /// Returns true when the set has no elements.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.list.spans.is_empty()
            }

            /// Returns true when `id` is a member.
            ///
            /// Open ranges (`n:*`) contain every id at or above `n`; the
            /// bare `*` element matches no concrete id because its value is
            /// only known at evaluation time on the server.
            #[must_use]
            pub fn contains(&self, id: u32) -> bool {
                self.list.contains(id)
            }

            /// Number of concrete ids, or `None` when the set contains an
            /// open range whose extent is server-defined.
            #[must_use]
            pub fn count(&self) -> Option<u64> {
                self.list.count()
            }

            /// Set union.
            #[must_use]
            pub fn union(&self, other: &Self) -> Self {
                Self {
                    list: self.list.union(&other.list),
                }
            }

            /// Set intersection.
            #[must_use]
            pub fn intersect(&self, other: &Self) -> Self {
                Self {
                    list: self.list.intersect(&other.list),
                }
            }

            /// Set difference (`self` minus `other`).
            #[must_use]
            pub fn subtract(&self, other: &Self) -> Self {
                Self {
                    list: self.list.subtract(&other.list),
                }
            }

            /// Iterates the concrete ids in ascending order. Ids covered
            /// only by open ranges are not produced.
            pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
                self.list.iter_ids()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.list.serialize())
            }
        }

        impl FromIterator<u32> for $name {
            fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
                let mut set = Self::new();
                for id in iter {
                    set.insert(id);
                }
                set
            }
        }
    };
}

message_set!(
    UidSet,
    "Canonical set of message UIDs.\n\nUIDs are only meaningful within one \
     UIDVALIDITY epoch; callers invalidate cached sets when the selected \
     mailbox reports a new UIDVALIDITY."
);
message_set!(
    SequenceSet,
    "Canonical set of message sequence numbers (1-based, renumbered on \
     expunge)."
);

impl UidSet {
    /// Reinterprets the UIDs as sequence numbers for `UID` command
    /// serialization, which shares the sequence-set grammar.
    #[must_use]
    pub fn as_sequence_set(&self) -> SequenceSet {
        SequenceSet {
            list: self.list.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn canonical_round_trip() {
        let set = UidSet::parse("1,3:5,7:*").unwrap();
        assert_eq!(set.to_string(), "1,3:5,7:*");
        assert_eq!(UidSet::parse(&set.to_string()).unwrap(), set);
    }

    #[test]
    fn parse_merges_overlaps_and_adjacency() {
        assert_eq!(UidSet::parse("1:3,2:5").unwrap().to_string(), "1:5");
        assert_eq!(UidSet::parse("1,2,3").unwrap().to_string(), "1:3");
        assert_eq!(UidSet::parse("5,1:2,4").unwrap().to_string(), "1:2,4:5");
    }

    #[test]
    fn parse_accepts_reversed_ranges() {
        assert_eq!(UidSet::parse("5:3").unwrap().to_string(), "3:5");
        assert_eq!(UidSet::parse("*:7").unwrap().to_string(), "7:*");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(UidSet::parse("").is_err());
        assert!(UidSet::parse("0").is_err());
        assert!(UidSet::parse("a:b").is_err());
        assert!(UidSet::parse("1,,2").is_err());
    }

    #[test]
    fn star_sorts_last_and_absorbs() {
        assert_eq!(UidSet::parse("*,1").unwrap().to_string(), "1,*");
        // 7:* already covers everything from 7 up, including the last id.
        assert_eq!(UidSet::parse("7:*,9,*").unwrap().to_string(), "7:*");
    }

    #[test]
    fn singleton_collapse() {
        assert_eq!(UidSet::parse("4:4").unwrap().to_string(), "4");
    }

    #[test]
    fn contains_semantics() {
        let set = UidSet::parse("1,3:5,10:*").unwrap();
        assert!(set.contains(1));
        assert!(!set.contains(2));
        assert!(set.contains(4));
        assert!(set.contains(10));
        assert!(set.contains(4_000_000_000));
        // Bare * matches no concrete id.
        assert!(!UidSet::last().contains(1));
    }

    #[test]
    fn count_is_none_for_open_ranges() {
        assert_eq!(UidSet::parse("1,3:5").unwrap().count(), Some(4));
        assert_eq!(UidSet::parse("1:*").unwrap().count(), None);
    }

    #[test]
    fn set_operations() {
        let a = UidSet::parse("1:10").unwrap();
        let b = UidSet::parse("5:15").unwrap();
        assert_eq!(a.union(&b).to_string(), "1:15");
        assert_eq!(a.intersect(&b).to_string(), "5:10");
        assert_eq!(a.subtract(&b).to_string(), "1:4");
        assert_eq!(b.subtract(&a).to_string(), "11:15");
    }

    #[test]
    fn subtract_splits_ranges() {
        let a = UidSet::parse("1:10").unwrap();
        let b = UidSet::parse("4:6").unwrap();
        assert_eq!(a.subtract(&b).to_string(), "1:3,7:10");
    }

    #[test]
    fn iter_ascending() {
        let set = UidSet::parse("3,1,5:7").unwrap();
        let ids: Vec<u32> = set.iter().collect();
        assert_eq!(ids, vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn from_iterator_canonicalizes() {
        let set: SequenceSet = [4u32, 2, 3, 9].into_iter().collect();
        assert_eq!(set.to_string(), "2:4,9");
    }

    #[test]
    fn uid_set_to_sequence_set() {
        let uids = UidSet::parse("1:3,8").unwrap();
        assert_eq!(uids.as_sequence_set().to_string(), "1:3,8");
    }

    proptest! {
        #[test]
        fn round_trip_is_identity(ids in proptest::collection::vec(1u32..10_000, 0..40)) {
            let set: UidSet = ids.iter().copied().collect();
            if !set.is_empty() {
                let reparsed = UidSet::parse(&set.to_string()).unwrap();
                prop_assert_eq!(reparsed, set);
            }
        }

        #[test]
        fn membership_matches_source(ids in proptest::collection::vec(1u32..500, 1..40), probe in 1u32..500) {
            let set: UidSet = ids.iter().copied().collect();
            prop_assert_eq!(set.contains(probe), ids.contains(&probe));
        }

        #[test]
        fn union_contains_both(a in proptest::collection::vec(1u32..200, 1..20), b in proptest::collection::vec(1u32..200, 1..20)) {
            let sa: UidSet = a.iter().copied().collect();
            let sb: UidSet = b.iter().copied().collect();
            let u = sa.union(&sb);
            for id in a.iter().chain(b.iter()) {
                prop_assert!(u.contains(*id));
            }
        }
    }
}
