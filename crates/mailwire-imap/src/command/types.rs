//! Command argument types.

use crate::types::Flag;

/// STATUS attributes to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAttribute {
    /// Number of messages.
    Messages,
    /// Number of recent messages.
    Recent,
    /// Next UID.
    UidNext,
    /// UIDVALIDITY.
    UidValidity,
    /// Number of unseen messages.
    Unseen,
    /// Highest mod-sequence.
    HighestModSeq,
    /// Mailbox size in octets (STATUS=SIZE).
    Size,
}

impl StatusAttribute {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
            Self::HighestModSeq => "HIGHESTMODSEQ",
            Self::Size => "SIZE",
        }
    }
}

/// FETCH items to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// FLAGS INTERNALDATE RFC822.SIZE ENVELOPE.
    All,
    /// ALL plus BODY.
    Full,
    /// FLAGS INTERNALDATE RFC822.SIZE.
    Fast,
    /// Custom list of attributes.
    Items(Vec<FetchAttribute>),
}

/// Individual FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// Message flags.
    Flags,
    /// Internal date.
    InternalDate,
    /// RFC822 size.
    Rfc822Size,
    /// Envelope structure.
    Envelope,
    /// Body structure.
    BodyStructure,
    /// UID.
    Uid,
    /// Body section.
    Body {
        /// Section specifier.
        section: Option<String>,
        /// Peek (don't set `\Seen`).
        peek: bool,
        /// Partial fetch `<start.length>`.
        partial: Option<(u32, u32)>,
    },
    /// BINARY section (RFC 3516).
    Binary {
        /// Section specifier.
        section: String,
        /// Peek variant.
        peek: bool,
        /// Partial fetch.
        partial: Option<(u32, u32)>,
    },
    /// BINARY.SIZE (RFC 3516).
    BinarySize {
        /// Section specifier.
        section: String,
    },
    /// MODSEQ (CONDSTORE).
    ModSeq,
    /// PREVIEW (RFC 8970); `lazy` adds the LAZY modifier.
    Preview {
        /// Allow the server to defer generation.
        lazy: bool,
    },
    /// EMAILID and THREADID (OBJECTID).
    ObjectId,
    /// SAVEDATE (RFC 8514).
    SaveDate,
    /// X-GM-MSGID, X-GM-THRID, X-GM-LABELS (Gmail).
    GmailIds,
}

/// STORE action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreAction {
    /// How the flag list is applied.
    pub mode: StoreMode,
    /// Flags to apply.
    pub flags: Vec<Flag>,
    /// CONDSTORE UNCHANGEDSINCE guard.
    pub unchanged_since: Option<u64>,
}

/// STORE flag application mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Replace the flag list.
    Set,
    /// Add to the flag list.
    Add,
    /// Remove from the flag list.
    Remove,
}

impl StoreAction {
    /// Replace flags.
    #[must_use]
    pub const fn set(flags: Vec<Flag>) -> Self {
        Self {
            mode: StoreMode::Set,
            flags,
            unchanged_since: None,
        }
    }

    /// Add flags.
    #[must_use]
    pub const fn add(flags: Vec<Flag>) -> Self {
        Self {
            mode: StoreMode::Add,
            flags,
            unchanged_since: None,
        }
    }

    /// Remove flags.
    #[must_use]
    pub const fn remove(flags: Vec<Flag>) -> Self {
        Self {
            mode: StoreMode::Remove,
            flags,
            unchanged_since: None,
        }
    }

    /// Guards the store with UNCHANGEDSINCE (CONDSTORE).
    #[must_use]
    pub const fn unchanged_since(mut self, modseq: u64) -> Self {
        self.unchanged_since = Some(modseq);
        self
    }
}

/// NOTIFY command specification (RFC 5465).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifySpec {
    /// NOTIFY NONE: stop all notifications.
    None,
    /// NOTIFY SET (SELECTED (events)): events for the selected mailbox.
    Selected(Vec<NotifyEvent>),
}

/// NOTIFY event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    /// New and appended messages.
    MessageNew,
    /// Expunged messages.
    MessageExpunge,
    /// Flag changes.
    FlagChange,
    /// Mailbox name changes.
    MailboxName,
}

impl NotifyEvent {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::MessageNew => "MessageNew",
            Self::MessageExpunge => "MessageExpunge",
            Self::FlagChange => "FlagChange",
            Self::MailboxName => "MailboxName",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_action_builders() {
        let action = StoreAction::add(vec![Flag::Seen]).unchanged_since(99);
        assert_eq!(action.mode, StoreMode::Add);
        assert_eq!(action.unchanged_since, Some(99));
    }

    #[test]
    fn status_attribute_tokens() {
        assert_eq!(StatusAttribute::HighestModSeq.as_str(), "HIGHESTMODSEQ");
        assert_eq!(StatusAttribute::Size.as_str(), "SIZE");
    }
}
