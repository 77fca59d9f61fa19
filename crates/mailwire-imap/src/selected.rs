//! Selected-mailbox state tracking.
//!
//! While a mailbox is selected, every untagged response the server sends
//! is offered to [`SelectedState::apply`], which keeps the counters and
//! the sequence→(UID, MODSEQ) tables current and surfaces QRESYNC-visible
//! changes as [`QresyncEvent`]s. The state is created on SELECT/EXAMINE
//! and discarded on CLOSE/UNSELECT or disconnect.

use std::collections::BTreeMap;

use crate::parser::{FetchItem, StatusItem, UntaggedResponse};
use crate::qresync::QresyncEvent;
use crate::types::{
    Flags, Mailbox, ModSeq, ResponseCode, SeqNum, Uid, UidSet, UidValidity,
};

/// Live message entry in the sequence table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageEntry {
    /// UID, once observed in a FETCH.
    pub uid: Option<Uid>,
    /// Latest MODSEQ, once observed.
    pub modseq: Option<ModSeq>,
}

/// State of the currently selected mailbox.
#[derive(Debug, Clone, Default)]
pub struct SelectedState {
    /// Selected mailbox name.
    pub mailbox: Mailbox,
    /// Whether the mailbox was opened read-only (EXAMINE).
    pub read_only: bool,
    /// Message count.
    pub exists: u32,
    /// Recent count.
    pub recent: u32,
    /// First unseen sequence number.
    pub unseen: Option<SeqNum>,
    /// Predicted next UID.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY epoch.
    pub uid_validity: Option<UidValidity>,
    /// Highest MODSEQ observed.
    pub highest_modseq: Option<ModSeq>,
    /// Applicable flags.
    pub flags: Flags,
    /// Permanent flags.
    pub permanent_flags: Flags,
    /// UIDs reported VANISHED this session.
    pub vanished: UidSet,
    /// Capabilities enabled via ENABLE.
    pub enabled: Vec<String>,
    /// Sequence-number table of observed messages.
    by_seq: BTreeMap<u32, MessageEntry>,
}

impl SelectedState {
    /// Creates state for a freshly selected mailbox.
    #[must_use]
    pub fn new(mailbox: Mailbox, read_only: bool) -> Self {
        Self {
            mailbox,
            read_only,
            ..Self::default()
        }
    }

    /// Looks up an observed message by sequence number.
    #[must_use]
    pub fn message(&self, seq: SeqNum) -> Option<MessageEntry> {
        self.by_seq.get(&seq.get()).copied()
    }

    /// Number of sequence numbers with observed entries.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.by_seq.len()
    }

    /// Applies one untagged response, returning any sync-visible events.
    #[allow(clippy::too_many_lines)]
    pub fn apply(&mut self, response: &UntaggedResponse) -> Vec<QresyncEvent> {
        let mut events = Vec::new();

        match response {
            UntaggedResponse::Exists(n) => self.exists = *n,
            UntaggedResponse::Recent(n) => self.recent = *n,
            UntaggedResponse::Flags(flags) => self.flags = flags.clone(),
            UntaggedResponse::Expunge(seq) => self.apply_expunge(*seq),
            UntaggedResponse::Vanished { uids, .. } => {
                events.push(QresyncEvent::Vanished(uids.clone()));
                self.apply_vanished(uids);
            }
            UntaggedResponse::Fetch { seq, items } => {
                if let Some(event) = self.apply_fetch(*seq, items) {
                    events.push(event);
                }
            }
            UntaggedResponse::Ok { code: Some(code), .. } => {
                self.apply_code(code, &mut events);
            }
            UntaggedResponse::Enabled(caps) => {
                for cap in caps {
                    let upper = cap.to_uppercase();
                    if !self.enabled.contains(&upper) {
                        self.enabled.push(upper);
                    }
                }
            }
            UntaggedResponse::Status { mailbox, items } => {
                // STATUS refers to an arbitrary mailbox; only apply when it
                // names the one we have selected.
                if mailbox.same_as(self.mailbox.as_str()) {
                    self.apply_status(items);
                }
            }
            _ => {}
        }

        events
    }

    fn apply_code(&mut self, code: &ResponseCode, events: &mut Vec<QresyncEvent>) {
        match code {
            ResponseCode::UidValidity(validity) => {
                if let Some(previous) = self.uid_validity {
                    if previous != *validity {
                        events.push(QresyncEvent::UidValidityChanged(*validity));
                        self.by_seq.clear();
                        self.vanished = UidSet::new();
                    }
                }
                self.uid_validity = Some(*validity);
            }
            ResponseCode::UidNext(uid) => self.uid_next = Some(*uid),
            ResponseCode::Unseen(seq) => self.unseen = Some(*seq),
            ResponseCode::HighestModSeq(modseq) => {
                self.bump_highest_modseq(*modseq);
            }
            ResponseCode::NoModSeq => self.highest_modseq = None,
            ResponseCode::PermanentFlags(flags) => {
                self.permanent_flags = flags.iter().cloned().collect();
            }
            ResponseCode::ReadOnly => self.read_only = true,
            ResponseCode::ReadWrite => self.read_only = false,
            _ => {}
        }
    }

    fn apply_status(&mut self, items: &[StatusItem]) {
        for item in items {
            match item {
                StatusItem::Messages(n) => self.exists = *n,
                StatusItem::Recent(n) => self.recent = *n,
                StatusItem::UidNext(uid) => self.uid_next = Some(*uid),
                StatusItem::UidValidity(v) => self.uid_validity = Some(*v),
                StatusItem::Unseen(n) => self.unseen = SeqNum::new(*n),
                StatusItem::HighestModSeq(m) => self.bump_highest_modseq(*m),
                StatusItem::Size(_) => {}
            }
        }
    }

    fn apply_expunge(&mut self, seq: SeqNum) {
        let n = seq.get();
        self.by_seq.remove(&n);
        // Messages above the expunged one renumber down by one.
        let above: Vec<(u32, MessageEntry)> = self
            .by_seq
            .range((n + 1)..)
            .map(|(k, v)| (*k, *v))
            .collect();
        for (k, _) in &above {
            self.by_seq.remove(k);
        }
        for (k, v) in above {
            self.by_seq.insert(k - 1, v);
        }
        self.exists = self.exists.saturating_sub(1);
    }

    fn apply_vanished(&mut self, uids: &UidSet) {
        self.vanished = self.vanished.union(uids);

        let removed: Vec<u32> = self
            .by_seq
            .iter()
            .filter(|(_, entry)| entry.uid.is_some_and(|uid| uids.contains(uid.get())))
            .map(|(seq, _)| *seq)
            .collect();
        for seq in &removed {
            self.by_seq.remove(seq);
        }
        if let Some(count) = uids.count() {
            let count = u32::try_from(count).unwrap_or(u32::MAX);
            self.exists = self.exists.saturating_sub(count);
        }
    }

    fn apply_fetch(&mut self, seq: SeqNum, items: &[FetchItem]) -> Option<QresyncEvent> {
        let mut uid = None;
        let mut modseq = None;
        let mut flags = None;

        for item in items {
            match item {
                FetchItem::Uid(u) => uid = Some(*u),
                FetchItem::ModSeq(m) => modseq = Some(*m),
                FetchItem::Flags(f) => flags = Some(f.clone()),
                _ => {}
            }
        }

        let entry = self.by_seq.entry(seq.get()).or_default();
        if uid.is_some() {
            entry.uid = uid;
        }
        if modseq.is_some() {
            entry.modseq = modseq;
        }
        let effective_uid = entry.uid;

        if let Some(m) = modseq {
            self.bump_highest_modseq(m);
        }

        match (effective_uid, flags, modseq) {
            (Some(uid), Some(flags), modseq) => Some(QresyncEvent::FlagsChanged {
                uid,
                flags,
                modseq,
            }),
            (Some(uid), None, Some(modseq)) => Some(QresyncEvent::ModSeqChanged { uid, modseq }),
            _ => None,
        }
    }

    fn bump_highest_modseq(&mut self, modseq: ModSeq) {
        if self.highest_modseq.is_none_or(|current| current < modseq) {
            self.highest_modseq = Some(modseq);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::ResponseParser;

    fn apply_line(state: &mut SelectedState, line: &[u8]) -> Vec<QresyncEvent> {
        let parsed = ResponseParser::parse(line).unwrap();
        match parsed {
            crate::parser::Response::Untagged(untagged) => state.apply(&untagged),
            other => panic!("expected untagged response, got {other:?}"),
        }
    }

    fn state() -> SelectedState {
        SelectedState::new(Mailbox::inbox(), false)
    }

    #[test]
    fn select_responses_populate_fields() {
        let mut st = state();
        apply_line(&mut st, b"* 3 EXISTS\r\n");
        apply_line(&mut st, b"* 0 RECENT\r\n");
        apply_line(&mut st, b"* OK [UIDVALIDITY 42] UIDs valid\r\n");
        apply_line(&mut st, b"* OK [UIDNEXT 11] next\r\n");
        apply_line(&mut st, b"* OK [UNSEEN 2] first unseen\r\n");
        apply_line(&mut st, b"* OK [HIGHESTMODSEQ 100] modseq\r\n");
        apply_line(&mut st, b"* FLAGS (\\Seen \\Deleted)\r\n");

        assert_eq!(st.exists, 3);
        assert_eq!(st.recent, 0);
        assert_eq!(st.uid_validity.unwrap().get(), 42);
        assert_eq!(st.uid_next.unwrap().get(), 11);
        assert_eq!(st.unseen.unwrap().get(), 2);
        assert_eq!(st.highest_modseq.unwrap().get(), 100);
        assert!(st.flags.contains(&crate::types::Flag::Seen));
    }

    #[test]
    fn uidvalidity_change_emits_event_and_clears_tables() {
        let mut st = state();
        apply_line(&mut st, b"* OK [UIDVALIDITY 42] ok\r\n");
        apply_line(&mut st, b"* 1 FETCH (UID 5)\r\n");
        assert_eq!(st.tracked_count(), 1);

        let events = apply_line(&mut st, b"* OK [UIDVALIDITY 43] rebuilt\r\n");
        assert_eq!(
            events,
            vec![QresyncEvent::UidValidityChanged(
                UidValidity::new(43).unwrap()
            )]
        );
        assert_eq!(st.tracked_count(), 0);
    }

    #[test]
    fn fetch_updates_tables_and_emits_flag_events() {
        let mut st = state();
        let events = apply_line(
            &mut st,
            b"* 3 FETCH (UID 5 FLAGS (\\Seen) MODSEQ (120))\r\n",
        );

        assert_eq!(events.len(), 1);
        let QresyncEvent::FlagsChanged { uid, flags, modseq } = &events[0] else {
            panic!("expected flag change");
        };
        assert_eq!(uid.get(), 5);
        assert!(flags.is_seen());
        assert_eq!(modseq.unwrap().get(), 120);

        assert_eq!(st.highest_modseq.unwrap().get(), 120);
        let entry = st.message(SeqNum::new(3).unwrap()).unwrap();
        assert_eq!(entry.uid.unwrap().get(), 5);
        assert_eq!(entry.modseq.unwrap().get(), 120);
    }

    #[test]
    fn fetch_modseq_only_emits_modseq_event() {
        let mut st = state();
        apply_line(&mut st, b"* 2 FETCH (UID 9)\r\n");
        let events = apply_line(&mut st, b"* 2 FETCH (MODSEQ (130))\r\n");
        assert_eq!(
            events,
            vec![QresyncEvent::ModSeqChanged {
                uid: Uid::new(9).unwrap(),
                modseq: ModSeq::new(130).unwrap(),
            }]
        );
    }

    #[test]
    fn expunge_renumbers_following_sequences() {
        let mut st = state();
        apply_line(&mut st, b"* 5 EXISTS\r\n");
        apply_line(&mut st, b"* 1 FETCH (UID 11)\r\n");
        apply_line(&mut st, b"* 2 FETCH (UID 12)\r\n");
        apply_line(&mut st, b"* 3 FETCH (UID 13)\r\n");

        apply_line(&mut st, b"* 2 EXPUNGE\r\n");

        assert_eq!(st.exists, 4);
        // Sequence 3 became sequence 2.
        let entry = st.message(SeqNum::new(2).unwrap()).unwrap();
        assert_eq!(entry.uid.unwrap().get(), 13);
        assert!(st.message(SeqNum::new(3).unwrap()).is_none());
    }

    #[test]
    fn vanished_removes_and_counts() {
        let mut st = state();
        apply_line(&mut st, b"* 10 EXISTS\r\n");
        apply_line(&mut st, b"* 1 FETCH (UID 2)\r\n");
        apply_line(&mut st, b"* 2 FETCH (UID 4)\r\n");
        apply_line(&mut st, b"* 3 FETCH (UID 6)\r\n");

        let events = apply_line(&mut st, b"* VANISHED (EARLIER) 2,4\r\n");
        assert_eq!(
            events,
            vec![QresyncEvent::Vanished(UidSet::parse("2,4").unwrap())]
        );
        assert_eq!(st.exists, 8);
        assert_eq!(st.vanished.to_string(), "2,4");
        assert_eq!(st.tracked_count(), 1);
    }

    #[test]
    fn status_applies_only_to_selected_mailbox() {
        let mut st = state();
        apply_line(&mut st, b"* 3 EXISTS\r\n");
        apply_line(&mut st, b"* STATUS Archive (MESSAGES 99)\r\n");
        assert_eq!(st.exists, 3);

        apply_line(&mut st, b"* STATUS INBOX (MESSAGES 7 UNSEEN 2)\r\n");
        assert_eq!(st.exists, 7);
        assert_eq!(st.unseen.unwrap().get(), 2);
    }

    #[test]
    fn enabled_capabilities_accumulate() {
        let mut st = state();
        apply_line(&mut st, b"* ENABLED CONDSTORE\r\n");
        apply_line(&mut st, b"* ENABLED QRESYNC CONDSTORE\r\n");
        assert_eq!(st.enabled, vec!["CONDSTORE", "QRESYNC"]);
    }

    #[test]
    fn exists_matches_live_after_mixed_updates() {
        let mut st = state();
        apply_line(&mut st, b"* 4 EXISTS\r\n");
        for line in [
            &b"* 1 FETCH (UID 1)\r\n"[..],
            b"* 2 FETCH (UID 2)\r\n",
            b"* 3 FETCH (UID 3)\r\n",
            b"* 4 FETCH (UID 4)\r\n",
        ] {
            apply_line(&mut st, line);
        }
        apply_line(&mut st, b"* 1 EXPUNGE\r\n");
        apply_line(&mut st, b"* VANISHED 4\r\n");

        assert_eq!(st.exists as usize, st.tracked_count());
    }
}
