//! Core IMAP types: identifiers, flags, mailboxes, capabilities, and the
//! message-set algebra.

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capabilities, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{ModSeq, SeqNum, Tag, Uid, UidValidity};
pub use mailbox::{ListResponse, Mailbox, MailboxAttribute, MailboxStatus, SpecialUse};
pub use response_code::ResponseCode;
pub use sequence::{SequenceSet, UidSet};
