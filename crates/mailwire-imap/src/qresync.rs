//! QRESYNC and CONDSTORE synchronization support (RFC 7162).
//!
//! CONDSTORE gives every message a modification sequence (`MODSEQ`);
//! QRESYNC builds on it so a client can learn everything that changed
//! since its last session from the SELECT response alone: the server
//! replays expunges as `VANISHED (EARLIER)` and flag changes as FETCH
//! responses with `MODSEQ` items.
//!
//! The caller persists a [`SyncState`] per mailbox (the crate does no I/O
//! of its own) and passes [`QresyncParams`] into
//! `select_qresync`; changes arrive as [`QresyncEvent`]s.

use serde::{Deserialize, Serialize};

use crate::types::{Flags, ModSeq, Uid, UidSet, UidValidity};

/// Per-mailbox synchronization snapshot for the next QRESYNC SELECT.
///
/// Serializable so callers can persist it between sessions. A
/// `uidvalidity` mismatch on the next SELECT invalidates the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncState {
    /// UIDVALIDITY when the snapshot was taken.
    pub uidvalidity: u32,
    /// HIGHESTMODSEQ when the snapshot was taken.
    pub highestmodseq: u64,
    /// Known UIDs, canonical sequence-set form.
    pub known_uids: Option<String>,
}

impl SyncState {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(uidvalidity: UidValidity, highestmodseq: ModSeq) -> Self {
        Self {
            uidvalidity: uidvalidity.get(),
            highestmodseq: highestmodseq.get(),
            known_uids: None,
        }
    }

    /// Attaches the known-UID set.
    #[must_use]
    pub fn with_known_uids(mut self, uids: &UidSet) -> Self {
        self.known_uids = Some(uids.to_string());
        self
    }

    /// Builds QRESYNC parameters from the snapshot.
    ///
    /// Returns `None` when the stored values are out of range (zero
    /// UIDVALIDITY or MODSEQ) or the UID set no longer parses.
    #[must_use]
    pub fn to_params(&self) -> Option<QresyncParams> {
        let uidvalidity = UidValidity::new(self.uidvalidity)?;
        let modseq = ModSeq::new(self.highestmodseq)?;
        let known_uids = match &self.known_uids {
            Some(text) => Some(UidSet::parse(text).ok()?),
            None => None,
        };
        Some(QresyncParams {
            uidvalidity,
            modseq,
            known_uids,
        })
    }
}

/// Parameters for a QRESYNC SELECT/EXAMINE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QresyncParams {
    /// The last known UIDVALIDITY.
    pub uidvalidity: UidValidity,
    /// The last known HIGHESTMODSEQ.
    pub modseq: ModSeq,
    /// Known UIDs; lets the server send VANISHED for expunged ones.
    pub known_uids: Option<UidSet>,
}

impl QresyncParams {
    /// Creates minimal parameters.
    #[must_use]
    pub const fn new(uidvalidity: UidValidity, modseq: ModSeq) -> Self {
        Self {
            uidvalidity,
            modseq,
            known_uids: None,
        }
    }

    /// Adds known UIDs.
    #[must_use]
    pub fn with_known_uids(mut self, uids: UidSet) -> Self {
        self.known_uids = Some(uids);
        self
    }

    /// Serializes the SELECT parameter list, e.g.
    /// `(QRESYNC (42 100 1:10))`.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut parts = vec![
            self.uidvalidity.get().to_string(),
            self.modseq.get().to_string(),
        ];
        if let Some(uids) = &self.known_uids {
            parts.push(uids.to_string());
        }
        format!("(QRESYNC ({}))", parts.join(" "))
    }
}

/// One change surfaced during a QRESYNC-enabled session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QresyncEvent {
    /// Messages expunged since the last sync.
    Vanished(UidSet),
    /// A message's flags changed.
    FlagsChanged {
        /// Message UID.
        uid: Uid,
        /// Current flags.
        flags: Flags,
        /// New MODSEQ, when reported.
        modseq: Option<ModSeq>,
    },
    /// A message's MODSEQ advanced without a flag report.
    ModSeqChanged {
        /// Message UID.
        uid: Uid,
        /// New MODSEQ.
        modseq: ModSeq,
    },
    /// The mailbox was rebuilt; every cached UID is invalid.
    UidValidityChanged(UidValidity),
}
