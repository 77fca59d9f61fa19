//! Selected-state operations: FETCH, STORE, COPY/MOVE, EXPUNGE, SEARCH,
//! SORT, THREAD, IDLE, CLOSE/UNSELECT.

use tokio::io::{AsyncRead, AsyncWrite};

use super::idle::IdleHandle;
use super::states::{Authenticated, Selected};
use super::Client;
use crate::command::{Command, FetchItems, StoreAction};
use crate::parser::{
    EsearchResponse, FetchItem, Response, ThreadNode, UntaggedResponse,
};
use crate::search::{SearchQuery, SortCriteria, ThreadAlgorithm};
use crate::selected::SelectedState;
use crate::types::{Mailbox, ResponseCode, SeqNum, SequenceSet, UidSet, UidValidity};
use crate::{Error, Result};

/// Result of a SEARCH command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Matching message numbers.
    pub ids: Vec<u32>,
    /// True when the numbers are UIDs (UID SEARCH).
    pub is_uid: bool,
}

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// The tracked state of the selected mailbox.
    #[must_use]
    pub fn selected_state(&self) -> Option<&SelectedState> {
        self.selected.as_ref()
    }

    /// The selected mailbox name.
    #[must_use]
    pub fn mailbox(&self) -> Option<&Mailbox> {
        self.selected.as_ref().map(|s| &s.mailbox)
    }

    /// Fetches items by sequence numbers.
    pub async fn fetch(
        &mut self,
        sequence: &SequenceSet,
        items: FetchItems,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.do_fetch(sequence.clone(), items, false, None, false)
            .await
    }

    /// Fetches items by UIDs.
    pub async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        items: FetchItems,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.do_fetch(uids.as_sequence_set(), items, true, None, false)
            .await
    }

    /// UID FETCH with a CHANGEDSINCE guard (CONDSTORE), optionally asking
    /// for VANISHED replay (QRESYNC).
    pub async fn uid_fetch_changed_since(
        &mut self,
        uids: &UidSet,
        items: FetchItems,
        modseq: u64,
        vanished: bool,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        if !self.caps.supports("CONDSTORE") {
            return Err(Error::MissingCapability("CONDSTORE"));
        }
        if vanished && !self.caps.supports("QRESYNC") {
            return Err(Error::MissingCapability("QRESYNC"));
        }
        self.do_fetch(
            uids.as_sequence_set(),
            items,
            true,
            Some(modseq),
            vanished,
        )
        .await
    }

    async fn do_fetch(
        &mut self,
        sequence: SequenceSet,
        items: FetchItems,
        uid: bool,
        changed_since: Option<u64>,
        vanished: bool,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        let responses = self
            .run_command(&Command::Fetch {
                sequence,
                items,
                uid,
                changed_since,
                vanished,
            })
            .await?;
        Ok(collect_fetches(&responses))
    }

    /// Stores flags by sequence numbers.
    pub async fn store(
        &mut self,
        sequence: &SequenceSet,
        action: StoreAction,
        silent: bool,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.do_store(sequence.clone(), action, false, silent).await
    }

    /// Stores flags by UIDs.
    pub async fn uid_store(
        &mut self,
        uids: &UidSet,
        action: StoreAction,
        silent: bool,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.do_store(uids.as_sequence_set(), action, true, silent)
            .await
    }

    async fn do_store(
        &mut self,
        sequence: SequenceSet,
        action: StoreAction,
        uid: bool,
        silent: bool,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        if action.unchanged_since.is_some() && !self.caps.supports("CONDSTORE") {
            return Err(Error::MissingCapability("CONDSTORE"));
        }
        let responses = self
            .run_command(&Command::Store {
                sequence,
                action,
                uid,
                silent,
            })
            .await?;
        Ok(collect_fetches(&responses))
    }

    /// Copies messages to another mailbox. Returns COPYUID data when the
    /// server supports UIDPLUS.
    pub async fn copy(
        &mut self,
        sequence: &SequenceSet,
        mailbox: &str,
        uid: bool,
    ) -> Result<Option<(UidValidity, UidSet, UidSet)>> {
        let responses = self
            .run_command(&Command::Copy {
                sequence: sequence.clone(),
                mailbox: Mailbox::new(mailbox),
                uid,
            })
            .await?;
        Ok(extract_copyuid(&responses))
    }

    /// Moves messages to another mailbox (RFC 6851).
    pub async fn r#move(
        &mut self,
        sequence: &SequenceSet,
        mailbox: &str,
        uid: bool,
    ) -> Result<Option<(UidValidity, UidSet, UidSet)>> {
        if !self.caps.supports("MOVE") {
            return Err(Error::MissingCapability("MOVE"));
        }
        let responses = self
            .run_command(&Command::Move {
                sequence: sequence.clone(),
                mailbox: Mailbox::new(mailbox),
                uid,
            })
            .await?;
        Ok(extract_copyuid(&responses))
    }

    /// Expunges messages flagged `\Deleted`. Returns the expunged
    /// sequence numbers.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let responses = self.run_command(&Command::Expunge).await?;
        Ok(responses
            .iter()
            .filter_map(|r| match r {
                Response::Untagged(UntaggedResponse::Expunge(seq)) => Some(*seq),
                _ => None,
            })
            .collect())
    }

    /// Expunges only the given UIDs (UIDPLUS).
    pub async fn uid_expunge(&mut self, uids: &UidSet) -> Result<Vec<SeqNum>> {
        if !self.caps.supports("UIDPLUS") {
            return Err(Error::MissingCapability("UIDPLUS"));
        }
        let responses = self
            .run_command(&Command::UidExpunge { uids: uids.clone() })
            .await?;
        Ok(responses
            .iter()
            .filter_map(|r| match r {
                Response::Untagged(UntaggedResponse::Expunge(seq)) => Some(*seq),
                _ => None,
            })
            .collect())
    }

    /// Searches the mailbox. Handles both classic SEARCH and ESEARCH
    /// result forms.
    pub async fn search(&mut self, query: &SearchQuery, uid: bool) -> Result<SearchResult> {
        let responses = self
            .run_command(&Command::Search {
                query: query.optimize(),
                uid,
                return_options: Vec::new(),
            })
            .await?;

        let mut ids = Vec::new();
        for response in &responses {
            match response {
                Response::Untagged(UntaggedResponse::Search(nums)) => {
                    ids.extend_from_slice(nums);
                }
                Response::Untagged(UntaggedResponse::Esearch(es)) => {
                    if let Some(all) = &es.all {
                        ids.extend(all.iter());
                    }
                }
                _ => {}
            }
        }
        Ok(SearchResult { ids, is_uid: uid })
    }

    /// ESEARCH with explicit return options (RFC 4731); `SAVE` stores the
    /// result for SEARCHRES references.
    pub async fn esearch(
        &mut self,
        query: &SearchQuery,
        uid: bool,
        return_options: &[&str],
    ) -> Result<EsearchResponse> {
        if !self.caps.supports("ESEARCH") {
            return Err(Error::MissingCapability("ESEARCH"));
        }
        if return_options.contains(&"SAVE") && !self.caps.supports("SEARCHRES") {
            return Err(Error::MissingCapability("SEARCHRES"));
        }
        let responses = self
            .run_command(&Command::Search {
                query: query.optimize(),
                uid,
                return_options: return_options.iter().map(ToString::to_string).collect(),
            })
            .await?;

        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Esearch(es)) = response {
                return Ok(es.clone());
            }
        }
        Ok(EsearchResponse::default())
    }

    /// Server-side SORT (RFC 5256).
    pub async fn sort(
        &mut self,
        criteria: &SortCriteria,
        query: &SearchQuery,
        uid: bool,
    ) -> Result<Vec<u32>> {
        if !self.caps.supports("SORT") {
            return Err(Error::MissingCapability("SORT"));
        }
        if criteria.needs_display() && !self.caps.supports("SORT=DISPLAY") {
            return Err(Error::MissingCapability("SORT=DISPLAY"));
        }
        let responses = self
            .run_command(&Command::Sort {
                criteria: criteria.clone(),
                query: query.optimize(),
                uid,
            })
            .await?;

        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Sort(nums)) = response {
                return Ok(nums.clone());
            }
        }
        Ok(Vec::new())
    }

    /// Server-side THREAD (RFC 5256).
    pub async fn thread(
        &mut self,
        algorithm: ThreadAlgorithm,
        query: &SearchQuery,
        uid: bool,
    ) -> Result<Vec<ThreadNode>> {
        if !self.caps.supports(algorithm.required_capability()) {
            return Err(Error::MissingCapability(algorithm.required_capability()));
        }
        let responses = self
            .run_command(&Command::Thread {
                algorithm,
                query: query.optimize(),
                uid,
            })
            .await?;

        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Thread(forest)) = response {
                return Ok(forest.clone());
            }
        }
        Ok(Vec::new())
    }

    /// Enters IDLE mode (RFC 2177).
    ///
    /// The returned handle delivers untagged events until
    /// [`IdleHandle::done`] restores command readiness. Dropping the
    /// handle without calling `done` leaves the connection unusable.
    pub async fn idle(&mut self) -> Result<IdleHandle<'_, S>> {
        if !self.caps.supports("IDLE") {
            return Err(Error::MissingCapability("IDLE"));
        }

        let tag = self.tags.next();
        let line = Command::Idle.serialize(&tag);
        self.stream.write_command(&line).await?;

        // Await the continuation that confirms IDLE is active.
        loop {
            let message = self.stream.read_message().await?;
            match crate::parser::ResponseParser::parse(&message.flattened())? {
                Response::Continuation { .. } => break,
                Response::Untagged(untagged) => self.route_untagged(&untagged),
                Response::Tagged { status, text, .. } => {
                    return match status {
                        crate::types::Status::No => Err(Error::No(text)),
                        crate::types::Status::Bad => Err(Error::Bad(text)),
                        _ => Err(Error::Protocol(
                            "unexpected tagged response entering IDLE".to_string(),
                        )),
                    };
                }
            }
        }

        Ok(IdleHandle::new(self, tag))
    }

    /// Closes the mailbox (expunging deleted messages) and returns to the
    /// authenticated state.
    pub async fn close(mut self) -> Result<Client<S, Authenticated>> {
        self.run_command(&Command::Close).await?;
        self.selected = None;
        self.sync_events.clear();
        Ok(self.transition())
    }

    /// Unselects without expunging (RFC 3691).
    pub async fn unselect(mut self) -> Result<Client<S, Authenticated>> {
        if !self.caps.supports("UNSELECT") {
            return Err(Error::MissingCapability("UNSELECT"));
        }
        self.run_command(&Command::Unselect).await?;
        self.selected = None;
        self.sync_events.clear();
        Ok(self.transition())
    }
}

/// Collects FETCH responses from a batch.
fn collect_fetches(responses: &[Response]) -> Vec<(SeqNum, Vec<FetchItem>)> {
    responses
        .iter()
        .filter_map(|r| match r {
            Response::Untagged(UntaggedResponse::Fetch { seq, items }) => {
                Some((*seq, items.clone()))
            }
            _ => None,
        })
        .collect()
}

/// Extracts COPYUID data from the tagged completion.
fn extract_copyuid(responses: &[Response]) -> Option<(UidValidity, UidSet, UidSet)> {
    responses.iter().rev().find_map(|r| match r {
        Response::Tagged {
            code:
                Some(ResponseCode::CopyUid {
                    uidvalidity,
                    source_uids,
                    dest_uids,
                }),
            ..
        } => Some((*uidvalidity, source_uids.clone(), dest_uids.clone())),
        _ => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::Connected;
    use crate::command::FetchAttribute;

    fn greeting() -> &'static [u8] {
        b"* PREAUTH [CAPABILITY IMAP4rev1 UIDPLUS MOVE ESEARCH SORT THREAD=REFERENCES CONDSTORE QRESYNC IDLE] ok\r\n"
    }

    async fn selected(mock: tokio_test::io::Mock) -> Client<tokio_test::io::Mock, Selected> {
        let client = match Client::from_stream(mock).await.unwrap() {
            Connected::PreAuthenticated(c) => c,
            Connected::NotAuthenticated(_) => panic!("expected preauth"),
        };
        let (client, _) = client.select("INBOX").await.unwrap();
        client
    }

    fn select_exchange(builder: &mut tokio_test::io::Builder) {
        builder
            .read(greeting())
            .write(b"A0001 SELECT INBOX\r\n")
            .read(b"* 3 EXISTS\r\n")
            .read(b"* OK [UIDVALIDITY 42] valid\r\n")
            .read(b"A0001 OK [READ-WRITE] done\r\n");
    }

    #[tokio::test]
    async fn uid_search_returns_uids() {
        let mut builder = tokio_test::io::Builder::new();
        select_exchange(&mut builder);
        let mock = builder
            .write(b"A0002 UID SEARCH UNSEEN\r\n")
            .read(b"* SEARCH 7 9\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut client = selected(mock).await;

        let result = client.search(&SearchQuery::Unseen, true).await.unwrap();
        assert_eq!(result.ids, vec![7, 9]);
        assert!(result.is_uid);
    }

    #[tokio::test]
    async fn search_accepts_esearch_form() {
        let mut builder = tokio_test::io::Builder::new();
        select_exchange(&mut builder);
        let mock = builder
            .write(b"A0002 UID SEARCH UNSEEN\r\n")
            .read(b"* ESEARCH (TAG \"A0002\") UID ALL 7,9\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut client = selected(mock).await;

        let result = client.search(&SearchQuery::Unseen, true).await.unwrap();
        assert_eq!(result.ids, vec![7, 9]);
    }

    #[tokio::test]
    async fn uid_fetch_body_literal() {
        let mut builder = tokio_test::io::Builder::new();
        select_exchange(&mut builder);
        let mock = builder
            .write(b"A0002 UID FETCH 7 BODY.PEEK[HEADER]\r\n")
            .read(b"* 1 FETCH (UID 7 BODY[HEADER] {12}\r\nSubject: hi\n)\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut client = selected(mock).await;

        let items = FetchItems::Items(vec![FetchAttribute::Body {
            section: Some("HEADER".to_string()),
            peek: true,
            partial: None,
        }]);
        let fetched = client
            .uid_fetch(&UidSet::parse("7").unwrap(), items)
            .await
            .unwrap();

        assert_eq!(fetched.len(), 1);
        let (seq, items) = &fetched[0];
        assert_eq!(seq.get(), 1);
        let body = items.iter().find_map(|i| match i {
            FetchItem::Body { section, data, .. } => Some((section.clone(), data.clone())),
            _ => None,
        });
        let (section, data) = body.unwrap();
        assert_eq!(section.as_deref(), Some("HEADER"));
        assert_eq!(data.unwrap(), b"Subject: hi\n");
    }

    #[tokio::test]
    async fn store_returns_fetch_echo() {
        let mut builder = tokio_test::io::Builder::new();
        select_exchange(&mut builder);
        let mock = builder
            .write(b"A0002 STORE 1 +FLAGS (\\Seen)\r\n")
            .read(b"* 1 FETCH (FLAGS (\\Seen))\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut client = selected(mock).await;

        let updated = client
            .store(
                &SequenceSet::parse("1").unwrap(),
                StoreAction::add(vec![crate::types::Flag::Seen]),
                false,
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
    }

    #[tokio::test]
    async fn move_returns_copyuid() {
        let mut builder = tokio_test::io::Builder::new();
        select_exchange(&mut builder);
        let mock = builder
            .write(b"A0002 UID MOVE 7 Archive\r\n")
            .read(b"A0002 OK [COPYUID 42 7 101] done\r\n")
            .build();
        let mut client = selected(mock).await;

        let copied = client
            .r#move(
                &UidSet::parse("7").unwrap().as_sequence_set(),
                "Archive",
                true,
            )
            .await
            .unwrap();
        let (validity, src, dst) = copied.unwrap();
        assert_eq!(validity.get(), 42);
        assert_eq!(src.to_string(), "7");
        assert_eq!(dst.to_string(), "101");
    }

    #[tokio::test]
    async fn expunge_collects_sequence_numbers() {
        let mut builder = tokio_test::io::Builder::new();
        select_exchange(&mut builder);
        let mock = builder
            .write(b"A0002 EXPUNGE\r\n")
            .read(b"* 3 EXPUNGE\r\n")
            .read(b"* 3 EXPUNGE\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut client = selected(mock).await;

        let expunged = client.expunge().await.unwrap();
        assert_eq!(expunged.len(), 2);
    }

    #[tokio::test]
    async fn thread_requires_capability() {
        let mut builder = tokio_test::io::Builder::new();
        select_exchange(&mut builder);
        let mock = builder.build();
        let mut client = selected(mock).await;

        let err = client
            .thread(ThreadAlgorithm::OrderedSubject, &SearchQuery::All, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingCapability(_)));
    }

    #[tokio::test]
    async fn thread_parses_forest() {
        let mut builder = tokio_test::io::Builder::new();
        select_exchange(&mut builder);
        let mock = builder
            .write(b"A0002 UID THREAD REFERENCES UTF-8 ALL\r\n")
            .read(b"* THREAD (2)(3 6)\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut client = selected(mock).await;

        let forest = client
            .thread(ThreadAlgorithm::References, &SearchQuery::All, true)
            .await
            .unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[1].id, 3);
    }

    #[tokio::test]
    async fn close_returns_to_authenticated() {
        let mut builder = tokio_test::io::Builder::new();
        select_exchange(&mut builder);
        let mock = builder
            .write(b"A0002 CLOSE\r\n")
            .read(b"A0002 OK closed\r\n")
            .write(b"A0003 LIST \"\" *\r\n")
            .read(b"A0003 OK done\r\n")
            .build();
        let client = selected(mock).await;

        let mut authed = client.close().await.unwrap();
        assert!(authed.list("", "*").await.unwrap().is_empty());
    }
}
