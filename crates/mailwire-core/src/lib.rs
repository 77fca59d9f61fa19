//! # mailwire-core
//!
//! Session coordination for the mailwire protocol stack: deadlines and
//! retry with error classification, a bounded connection pool,
//! delivery-status report parsing, message-summary assembly, and
//! subject/References threading.
//!
//! The protocol mechanics live in `mailwire-imap`, `mailwire-smtp`, and
//! `mailwire-pop3`; this crate owns the policies that wrap them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod dsn;
mod error;
pub mod pool;
pub mod retry;
pub mod store;
pub mod summary;
pub mod threading;

pub use dsn::{DeliveryStatusReport, DsnAction, MessageFields, RecipientFields};
pub use error::{Error, Result};
pub use pool::{ConnectionPool, SessionFactory};
pub use retry::{Classify, DEFAULT_TIMEOUT, ErrorClass, RetryError, RetryPolicy, retry, with_deadline};
pub use store::{FolderInfo, MailStore};
pub use summary::{MessageSummary, PREVIEW_LENGTH};
pub use threading::{
    NormalizedSubject, ThreadMessage, ThreadedNode, normalize_subject, thread_by_ordered_subject,
    thread_by_references,
};
