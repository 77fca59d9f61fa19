//! Mail store facade.
//!
//! [`MailStore`] is the thin seam between MUA-level code and the session
//! layer: implementations wrap a [`crate::pool::ConnectionPool`] of IMAP
//! sessions plus an SMTP submission path, and translate these calls into
//! protocol operations under the retry policy. The trait stays at the
//! interface level on purpose; protocol detail lives in the protocol
//! crates.

use crate::Result;
use crate::summary::MessageSummary;

use mailwire_imap::{SearchQuery, SpecialUse, UidSet};
use mailwire_smtp::Envelope;

/// High-level mailbox listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    /// Mailbox name.
    pub name: String,
    /// Special-use role, when attributed.
    pub role: Option<SpecialUse>,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
}

/// Asynchronous mail store interface.
///
/// One operation runs at a time per underlying session; implementations
/// acquire and release pooled sessions around each call.
pub trait MailStore: Send + Sync {
    /// Lists folders with their special-use roles.
    fn folders(&self) -> impl Future<Output = Result<Vec<FolderInfo>>> + Send;

    /// Fetches summaries for a UID set in a folder.
    fn summaries(
        &self,
        folder: &str,
        uids: &UidSet,
    ) -> impl Future<Output = Result<Vec<MessageSummary>>> + Send;

    /// Searches a folder, returning matching UIDs.
    fn search(
        &self,
        folder: &str,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<UidSet>> + Send;

    /// Moves messages between folders.
    fn move_messages(
        &self,
        folder: &str,
        uids: &UidSet,
        destination: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Marks messages deleted and expunges them.
    fn delete_messages(
        &self,
        folder: &str,
        uids: &UidSet,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Submits a message for delivery.
    fn submit(
        &self,
        envelope: &Envelope,
        message: &[u8],
    ) -> impl Future<Output = Result<()>> + Send;
}
