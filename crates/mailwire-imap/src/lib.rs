//! # mailwire-imap
//!
//! An IMAP4rev1 (RFC 3501) client library with a curated extension set:
//! IDLE, ENABLE, CONDSTORE/QRESYNC, UIDPLUS, MOVE, ESEARCH/SEARCHRES,
//! SORT/THREAD, NAMESPACE, LIST-EXTENDED/SPECIAL-USE/XLIST, ACL, QUOTA,
//! METADATA, NOTIFY, COMPRESS=DEFLATE, BINARY, PREVIEW, and the Gmail
//! FETCH attributes.
//!
//! ## Design
//!
//! - **Type-state connection management**: compile-time enforcement of
//!   the `NotAuthenticated` → `Authenticated` → `Selected` transitions
//! - **One command at a time**: same-state commands take `&mut self`, so
//!   the wire never carries interleaved commands
//! - **Sans-I/O parser**: the response parser operates on framed logical
//!   messages, independent of the transport
//! - **Typed state tracking**: every untagged response folds into a
//!   [`selected::SelectedState`], with QRESYNC deltas surfaced as events
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailwire_imap::{Client, Connected, FetchItems, SearchQuery};
//! use mailwire_net::{NetStream, TlsConfig};
//!
//! let stream = NetStream::connect_tls("imap.example.com", 993, &TlsConfig::default()).await?;
//! let client = match Client::from_stream(stream).await? {
//!     Connected::NotAuthenticated(c) => c.login("user", "password").await?,
//!     Connected::PreAuthenticated(c) => c,
//! };
//!
//! let (mut client, status) = client.select("INBOX").await?;
//! println!("{} messages", status.exists);
//!
//! let unseen = client.search(&SearchQuery::Unseen, true).await?;
//! println!("unseen UIDs: {:?}", unseen.ids);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod client;
pub mod command;
mod error;
pub mod framing;
pub mod parser;
pub mod qresync;
pub mod search;
pub mod selected;
pub mod types;

pub use client::{
    Authenticated, Client, Connected, IdleEvent, IdleHandle, NotAuthenticated, SearchResult,
    Selected,
};
pub use command::{
    Command, FetchAttribute, FetchItems, NotifyEvent, NotifySpec, StatusAttribute, StoreAction,
    StoreMode, TagGenerator,
};
pub use error::{Error, Result};
pub use framing::{FramedStream, LiteralMessage};
pub use parser::{Response, ResponseParser, UntaggedResponse};
pub use qresync::{QresyncEvent, QresyncParams, SyncState};
pub use search::{SearchQuery, SortCriteria, SortKey, ThreadAlgorithm};
pub use selected::SelectedState;
pub use types::{
    Capabilities, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, ModSeq,
    ResponseCode, SeqNum, SequenceSet, SpecialUse, Status, Tag, Uid, UidSet, UidValidity,
};

/// IMAP protocol version implemented.
pub const IMAP_VERSION: &str = "IMAP4rev1";
