//! Mailbox types.

use super::{Flags, ModSeq, SeqNum, Uid, UidValidity};

/// Mailbox name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Creates a new mailbox name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The INBOX mailbox (case-insensitive per RFC).
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Returns the mailbox name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison treating INBOX specially.
    #[must_use]
    pub fn same_as(&self, other: &str) -> bool {
        if self.0.eq_ignore_ascii_case("INBOX") {
            other.eq_ignore_ascii_case("INBOX")
        } else {
            self.0 == other
        }
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::inbox()
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mailbox status information from SELECT/EXAMINE.
#[derive(Debug, Clone, Default)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// First unseen message sequence number.
    pub unseen: Option<SeqNum>,
    /// Next UID to be assigned.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<UidValidity>,
    /// Flags defined for this mailbox.
    pub flags: Flags,
    /// Flags that can be permanently stored.
    pub permanent_flags: Flags,
    /// Whether mailbox is read-only.
    pub read_only: bool,
    /// Highest mod-sequence (if CONDSTORE enabled).
    pub highest_mod_seq: Option<ModSeq>,
}

/// LIST/LSUB response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    /// Mailbox attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
    /// Mailbox name.
    pub mailbox: Mailbox,
}

impl ListResponse {
    /// Returns the special-use role, when one is attributed.
    #[must_use]
    pub fn special_use(&self) -> Option<SpecialUse> {
        self.attributes.iter().find_map(MailboxAttribute::role)
    }
}

/// Special-use mailbox roles (RFC 6154 / XLIST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialUse {
    /// All messages (virtual).
    All,
    /// Archive folder.
    Archive,
    /// Drafts folder.
    Drafts,
    /// Flagged messages (virtual).
    Flagged,
    /// Junk/spam folder.
    Junk,
    /// Sent folder.
    Sent,
    /// Trash folder.
    Trash,
}

/// Mailbox attributes from LIST responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// Mailbox cannot be selected.
    NoSelect,
    /// Mailbox has no children.
    HasNoChildren,
    /// Mailbox has children.
    HasChildren,
    /// Mailbox is marked for attention.
    Marked,
    /// Mailbox is not marked.
    Unmarked,
    /// Name exists only as hierarchy (LIST-EXTENDED).
    NonExistent,
    /// All messages (virtual mailbox).
    All,
    /// Mailbox is the archive folder.
    Archive,
    /// Mailbox is the drafts folder.
    Drafts,
    /// Flagged/starred messages (virtual mailbox).
    Flagged,
    /// Mailbox is the junk/spam folder.
    Junk,
    /// Mailbox is the sent folder.
    Sent,
    /// Mailbox is the trash folder.
    Trash,
    /// Important messages (RFC 8457).
    Important,
    /// Mailbox is subscribed.
    Subscribed,
    /// Unknown attribute.
    Unknown(String),
}

impl MailboxAttribute {
    /// Parses a mailbox attribute token.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "\\NOSELECT" => Self::NoSelect,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            "\\NONEXISTENT" => Self::NonExistent,
            "\\ALL" | "\\ALLMAIL" => Self::All,
            "\\ARCHIVE" => Self::Archive,
            "\\DRAFTS" => Self::Drafts,
            "\\FLAGGED" | "\\STARRED" => Self::Flagged,
            "\\JUNK" | "\\SPAM" => Self::Junk,
            "\\SENT" => Self::Sent,
            "\\TRASH" => Self::Trash,
            "\\IMPORTANT" => Self::Important,
            "\\SUBSCRIBED" => Self::Subscribed,
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// Maps the attribute to a special-use role, if it names one.
    #[must_use]
    pub const fn role(&self) -> Option<SpecialUse> {
        match self {
            Self::All => Some(SpecialUse::All),
            Self::Archive => Some(SpecialUse::Archive),
            Self::Drafts => Some(SpecialUse::Drafts),
            Self::Flagged => Some(SpecialUse::Flagged),
            Self::Junk => Some(SpecialUse::Junk),
            Self::Sent => Some(SpecialUse::Sent),
            Self::Trash => Some(SpecialUse::Trash),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inbox_comparison() {
        assert!(Mailbox::new("inbox").same_as("INBOX"));
        assert!(Mailbox::inbox().same_as("InBox"));
        assert!(!Mailbox::new("Archive").same_as("archive"));
        assert!(Mailbox::new("Archive").same_as("Archive"));
    }

    #[test]
    fn attribute_parsing() {
        assert_eq!(MailboxAttribute::parse("\\Noselect"), MailboxAttribute::NoSelect);
        assert_eq!(MailboxAttribute::parse("\\Sent"), MailboxAttribute::Sent);
        // XLIST aliases map onto the RFC 6154 roles.
        assert_eq!(MailboxAttribute::parse("\\Starred"), MailboxAttribute::Flagged);
        assert_eq!(MailboxAttribute::parse("\\AllMail"), MailboxAttribute::All);
        assert!(matches!(
            MailboxAttribute::parse("\\SomethingNew"),
            MailboxAttribute::Unknown(_)
        ));
    }

    #[test]
    fn special_use_from_list_response() {
        let list = ListResponse {
            attributes: vec![MailboxAttribute::HasNoChildren, MailboxAttribute::Trash],
            delimiter: Some('/'),
            mailbox: Mailbox::new("Deleted"),
        };
        assert_eq!(list.special_use(), Some(SpecialUse::Trash));

        let plain = ListResponse {
            attributes: vec![MailboxAttribute::Marked],
            delimiter: None,
            mailbox: Mailbox::new("INBOX"),
        };
        assert_eq!(plain.special_use(), None);
    }
}
