//! Core IMAP identifiers.
//!
//! Newtypes for tags, sequence numbers, UIDs, UIDVALIDITY, and MODSEQ.
//! Message numbers are 32-bit and never zero, so the wrappers hold
//! `NonZeroU32` and creation from a raw value is fallible.

use std::num::{NonZeroU32, NonZeroU64};

/// IMAP command tag.
///
/// Each command carries a unique alphanumeric tag; the server echoes it in
/// the completing response so replies can be correlated with requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(pub String);

impl Tag {
    /// Creates a new tag from a string.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message sequence number.
///
/// Assigned from 1 within the selected mailbox; renumbered on expunge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeqNum(pub NonZeroU32);

impl SeqNum {
    /// Creates a new sequence number. Returns `None` for 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for SeqNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message.
///
/// Stable across sessions for a given UIDVALIDITY; a UIDVALIDITY change
/// invalidates every cached UID for the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(pub NonZeroU32);

impl Uid {
    /// Creates a new UID. Returns `None` for 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// UIDVALIDITY value for a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UidValidity(pub NonZeroU32);

impl UidValidity {
    /// Creates a new UIDVALIDITY. Returns `None` for 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for UidValidity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Modification sequence number (CONDSTORE/QRESYNC, RFC 7162).
///
/// Increases whenever a message's flags or metadata change; the mailbox
/// tracks the highest value seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModSeq(NonZeroU64);

impl ModSeq {
    /// Creates a new `ModSeq`. Returns `None` for 0.
    #[must_use]
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    /// Returns the raw value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for ModSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected_everywhere() {
        assert!(SeqNum::new(0).is_none());
        assert!(Uid::new(0).is_none());
        assert!(UidValidity::new(0).is_none());
        assert!(ModSeq::new(0).is_none());
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(Tag::new("A0007").to_string(), "A0007");
        assert_eq!(SeqNum::new(3).unwrap().to_string(), "3");
        assert_eq!(Uid::new(12345).unwrap().to_string(), "12345");
        assert_eq!(ModSeq::new(98765).unwrap().to_string(), "98765");
    }

    #[test]
    fn ordering() {
        assert!(Uid::new(1).unwrap() < Uid::new(2).unwrap());
        assert!(ModSeq::new(100).unwrap() < ModSeq::new(120).unwrap());
    }

    #[test]
    fn uid_validity_equality() {
        let a = UidValidity::new(42).unwrap();
        let b = UidValidity::new(42).unwrap();
        let c = UidValidity::new(43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
