//! Authenticated-state operations: mailbox management, SELECT/EXAMINE,
//! LIST variants, STATUS, APPEND, ACL, QUOTA, METADATA, NOTIFY.

use tokio::io::{AsyncRead, AsyncWrite};

use mailwire_net::NetStream;

use super::states::{Authenticated, Selected};
use super::Client;
use crate::command::{Command, NotifySpec, StatusAttribute};
use crate::framing::FramedStream;
use crate::parser::{
    NamespaceResponse, QuotaResource, Response, ResponseParser, StatusItem, UntaggedResponse,
};
use crate::qresync::{QresyncEvent, QresyncParams};
use crate::selected::SelectedState;
use crate::types::{
    Flag, ListResponse, Mailbox, MailboxStatus, ResponseCode, SpecialUse, UidSet, UidValidity,
};
use crate::{Error, Result};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Selects a mailbox for read-write access.
    pub async fn select(self, mailbox: &str) -> Result<(Client<S, Selected>, MailboxStatus)> {
        self.do_select(mailbox, false, false, None).await
    }

    /// Selects with the CONDSTORE parameter.
    pub async fn select_condstore(
        self,
        mailbox: &str,
    ) -> Result<(Client<S, Selected>, MailboxStatus)> {
        if !self.caps.supports("CONDSTORE") {
            return Err(Error::MissingCapability("CONDSTORE"));
        }
        self.do_select(mailbox, false, true, None).await
    }

    /// Selects with QRESYNC resynchronization parameters.
    ///
    /// Deltas observed during the SELECT (VANISHED, flag changes) are
    /// available from `take_sync_events` on the returned client.
    pub async fn select_qresync(
        self,
        mailbox: &str,
        params: QresyncParams,
    ) -> Result<(Client<S, Selected>, MailboxStatus, Vec<QresyncEvent>)> {
        if !self.caps.supports("QRESYNC") {
            return Err(Error::MissingCapability("QRESYNC"));
        }
        let (mut client, status) = self.do_select(mailbox, false, false, Some(params)).await?;
        let events = client.take_sync_events();
        Ok((client, status, events))
    }

    /// Examines a mailbox (read-only SELECT).
    pub async fn examine(self, mailbox: &str) -> Result<(Client<S, Selected>, MailboxStatus)> {
        self.do_select(mailbox, true, false, None).await
    }

    async fn do_select(
        mut self,
        mailbox: &str,
        read_only: bool,
        condstore: bool,
        qresync: Option<QresyncParams>,
    ) -> Result<(Client<S, Selected>, MailboxStatus)> {
        let name = Mailbox::new(mailbox);
        // Install the state first so untagged SELECT data lands in it.
        self.selected = Some(SelectedState::new(name.clone(), read_only));

        let command = if read_only {
            Command::Examine {
                mailbox: name,
                qresync,
            }
        } else {
            Command::Select {
                mailbox: name,
                condstore,
                qresync,
            }
        };

        match self.run_command(&command).await {
            Ok(responses) => {
                if let Some(state) = &mut self.selected {
                    // READ-ONLY/READ-WRITE arrives on the tagged line.
                    if let Some(code) = Client::<S, Authenticated>::tagged_code(&responses) {
                        match code {
                            ResponseCode::ReadOnly => state.read_only = true,
                            ResponseCode::ReadWrite => state.read_only = false,
                            _ => {}
                        }
                    }
                }
                let status = self.mailbox_status();
                Ok((self.transition(), status))
            }
            Err(e) => {
                self.selected = None;
                Err(e)
            }
        }
    }

    fn mailbox_status(&self) -> MailboxStatus {
        self.selected
            .as_ref()
            .map(|state| MailboxStatus {
                exists: state.exists,
                recent: state.recent,
                unseen: state.unseen,
                uid_next: state.uid_next,
                uid_validity: state.uid_validity,
                flags: state.flags.clone(),
                permanent_flags: state.permanent_flags.clone(),
                read_only: state.read_only,
                highest_mod_seq: state.highest_modseq,
            })
            .unwrap_or_default()
    }

    /// Lists mailboxes matching a pattern.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        self.list_with_options(reference, pattern, Vec::new()).await
    }

    /// LIST with LIST-EXTENDED return options.
    pub async fn list_with_options(
        &mut self,
        reference: &str,
        pattern: &str,
        return_options: Vec<String>,
    ) -> Result<Vec<ListResponse>> {
        if !return_options.is_empty() && !self.caps.supports("LIST-EXTENDED") {
            return Err(Error::MissingCapability("LIST-EXTENDED"));
        }
        let responses = self
            .run_command(&Command::List {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
                return_options,
            })
            .await?;
        Ok(collect_lists(&responses))
    }

    /// Lists subscribed mailboxes.
    pub async fn lsub(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        let responses = self
            .run_command(&Command::Lsub {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;
        Ok(collect_lists(&responses))
    }

    /// Discovers special-use mailboxes (Sent, Drafts, Trash, ...).
    ///
    /// Prefers `LIST RETURN (SPECIAL-USE)`; falls back to XLIST for
    /// servers that predate RFC 6154.
    pub async fn special_use_mailboxes(&mut self) -> Result<Vec<(SpecialUse, Mailbox)>> {
        let lists = if self.caps.supports("SPECIAL-USE") {
            let options = if self.caps.supports("LIST-EXTENDED") {
                vec!["SPECIAL-USE".to_string()]
            } else {
                Vec::new()
            };
            let responses = self
                .run_command(&Command::List {
                    reference: String::new(),
                    pattern: "*".to_string(),
                    return_options: options,
                })
                .await?;
            collect_lists(&responses)
        } else if self.caps.supports("XLIST") {
            let responses = self
                .run_command(&Command::Xlist {
                    reference: String::new(),
                    pattern: "*".to_string(),
                })
                .await?;
            collect_lists(&responses)
        } else {
            return Err(Error::MissingCapability("SPECIAL-USE or XLIST"));
        };

        Ok(lists
            .into_iter()
            .filter_map(|l| l.special_use().map(|role| (role, l.mailbox)))
            .collect())
    }

    /// Creates a mailbox, optionally with a special-use role
    /// (CREATE-SPECIAL-USE), e.g. `\Sent`.
    pub async fn create(&mut self, mailbox: &str, special_use: Option<&str>) -> Result<()> {
        if special_use.is_some() && !self.caps.supports("CREATE-SPECIAL-USE") {
            return Err(Error::MissingCapability("CREATE-SPECIAL-USE"));
        }
        self.run_command(&Command::Create {
            mailbox: Mailbox::new(mailbox),
            special_use: special_use.map(ToString::to_string),
        })
        .await?;
        Ok(())
    }

    /// Deletes a mailbox.
    pub async fn delete(&mut self, mailbox: &str) -> Result<()> {
        self.run_command(&Command::Delete {
            mailbox: Mailbox::new(mailbox),
        })
        .await?;
        Ok(())
    }

    /// Renames a mailbox.
    pub async fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        self.run_command(&Command::Rename {
            from: Mailbox::new(from),
            to: Mailbox::new(to),
        })
        .await?;
        Ok(())
    }

    /// Subscribes to a mailbox.
    pub async fn subscribe(&mut self, mailbox: &str) -> Result<()> {
        self.run_command(&Command::Subscribe {
            mailbox: Mailbox::new(mailbox),
        })
        .await?;
        Ok(())
    }

    /// Unsubscribes from a mailbox.
    pub async fn unsubscribe(&mut self, mailbox: &str) -> Result<()> {
        self.run_command(&Command::Unsubscribe {
            mailbox: Mailbox::new(mailbox),
        })
        .await?;
        Ok(())
    }

    /// Requests STATUS for a mailbox without selecting it.
    pub async fn status(
        &mut self,
        mailbox: &str,
        items: Vec<StatusAttribute>,
    ) -> Result<Vec<StatusItem>> {
        if items.contains(&StatusAttribute::Size) && !self.caps.supports("STATUS=SIZE") {
            return Err(Error::MissingCapability("STATUS=SIZE"));
        }
        let responses = self
            .run_command(&Command::Status {
                mailbox: Mailbox::new(mailbox),
                items,
            })
            .await?;

        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Status { items, .. }) = response {
                return Ok(items.clone());
            }
        }
        Ok(Vec::new())
    }

    /// Requests the server's namespaces.
    pub async fn namespace(&mut self) -> Result<NamespaceResponse> {
        if !self.caps.supports("NAMESPACE") {
            return Err(Error::MissingCapability("NAMESPACE"));
        }
        let responses = self.run_command(&Command::Namespace).await?;
        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Namespace(ns)) = response {
                return Ok(ns.clone());
            }
        }
        Ok(NamespaceResponse::default())
    }

    /// Exchanges client/server identification (RFC 2971).
    pub async fn id(
        &mut self,
        parameters: Option<Vec<(String, String)>>,
    ) -> Result<Option<Vec<(String, String)>>> {
        if !self.caps.supports("ID") {
            return Err(Error::MissingCapability("ID"));
        }
        let responses = self.run_command(&Command::Id { parameters }).await?;
        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Id(fields)) = response {
                return Ok(fields.clone());
            }
        }
        Ok(None)
    }

    /// Enables capabilities (RFC 5161). Returns the tokens the server
    /// actually enabled.
    pub async fn enable(&mut self, capabilities: &[&str]) -> Result<Vec<String>> {
        if !self.caps.supports("ENABLE") {
            return Err(Error::MissingCapability("ENABLE"));
        }
        let responses = self
            .run_command(&Command::Enable {
                capabilities: capabilities.iter().map(ToString::to_string).collect(),
            })
            .await?;
        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Enabled(tokens)) = response {
                return Ok(tokens.clone());
            }
        }
        Ok(Vec::new())
    }

    /// Appends a message, honoring the literal discipline: without
    /// LITERAL+ the payload waits for the server's continuation.
    ///
    /// Returns the APPENDUID assignment when the server supports UIDPLUS.
    pub async fn append(
        &mut self,
        mailbox: &str,
        flags: Option<Vec<Flag>>,
        message: &[u8],
    ) -> Result<Option<(UidValidity, UidSet)>> {
        let literal_plus = self.caps.supports("LITERAL+");
        let tag = self.tags.next();
        let command = Command::Append {
            mailbox: Mailbox::new(mailbox),
            flags,
            message_len: message.len(),
            literal_plus,
        };
        self.stream.write_command(&command.serialize(&tag)).await?;

        if !literal_plus {
            // Wait for the continuation before sending the bytes.
            loop {
                let msg = self.stream.read_message().await?;
                match ResponseParser::parse(&msg.flattened())? {
                    Response::Continuation { .. } => break,
                    Response::Untagged(untagged) => self.route_untagged(&untagged),
                    Response::Tagged { status, text, .. } => {
                        return match status {
                            crate::types::Status::No => Err(Error::No(text)),
                            crate::types::Status::Bad => Err(Error::Bad(text)),
                            _ => Err(Error::Protocol(
                                "unexpected tagged response before literal".to_string(),
                            )),
                        };
                    }
                }
            }
        }

        self.stream.write_raw(message).await?;
        self.stream.write_raw(b"\r\n").await?;

        let responses = self.read_until_tagged(&tag).await?;
        if let Some(ResponseCode::AppendUid { uidvalidity, uids }) =
            Client::<S, Authenticated>::tagged_code(&responses)
        {
            return Ok(Some((*uidvalidity, uids.clone())));
        }
        Ok(None)
    }

    /// Fetches the access control list for a mailbox (RFC 4314).
    pub async fn get_acl(&mut self, mailbox: &str) -> Result<Vec<(String, String)>> {
        self.require_acl()?;
        let responses = self
            .run_command(&Command::GetAcl {
                mailbox: Mailbox::new(mailbox),
            })
            .await?;
        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Acl { entries, .. }) = response {
                return Ok(entries.clone());
            }
        }
        Ok(Vec::new())
    }

    /// Grants or modifies rights (RFC 4314).
    pub async fn set_acl(&mut self, mailbox: &str, identifier: &str, rights: &str) -> Result<()> {
        self.require_acl()?;
        self.run_command(&Command::SetAcl {
            mailbox: Mailbox::new(mailbox),
            identifier: identifier.to_string(),
            rights: rights.to_string(),
        })
        .await?;
        Ok(())
    }

    /// Removes an identifier's rights (RFC 4314).
    pub async fn delete_acl(&mut self, mailbox: &str, identifier: &str) -> Result<()> {
        self.require_acl()?;
        self.run_command(&Command::DeleteAcl {
            mailbox: Mailbox::new(mailbox),
            identifier: identifier.to_string(),
        })
        .await?;
        Ok(())
    }

    /// Lists the rights that may be granted to an identifier (RFC 4314).
    pub async fn list_rights(&mut self, mailbox: &str, identifier: &str) -> Result<Vec<String>> {
        self.require_acl()?;
        let responses = self
            .run_command(&Command::ListRights {
                mailbox: Mailbox::new(mailbox),
                identifier: identifier.to_string(),
            })
            .await?;
        for response in &responses {
            if let Response::Untagged(UntaggedResponse::ListRights { rights, .. }) = response {
                return Ok(rights.clone());
            }
        }
        Ok(Vec::new())
    }

    /// Queries the rights of the current user (RFC 4314).
    pub async fn my_rights(&mut self, mailbox: &str) -> Result<String> {
        self.require_acl()?;
        let responses = self
            .run_command(&Command::MyRights {
                mailbox: Mailbox::new(mailbox),
            })
            .await?;
        for response in &responses {
            if let Response::Untagged(UntaggedResponse::MyRights { rights, .. }) = response {
                return Ok(rights.clone());
            }
        }
        Ok(String::new())
    }

    fn require_acl(&self) -> Result<()> {
        if self.caps.supports("ACL") {
            Ok(())
        } else {
            Err(Error::MissingCapability("ACL"))
        }
    }

    /// Fetches quota usage and limits for a root (RFC 9208).
    pub async fn get_quota(&mut self, root: &str) -> Result<Vec<QuotaResource>> {
        self.require_quota()?;
        let responses = self
            .run_command(&Command::GetQuota {
                root: root.to_string(),
            })
            .await?;
        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Quota { resources, .. }) = response {
                return Ok(resources.clone());
            }
        }
        Ok(Vec::new())
    }

    /// Fetches the quota roots for a mailbox plus their quotas (RFC 9208).
    pub async fn get_quota_root(
        &mut self,
        mailbox: &str,
    ) -> Result<(Vec<String>, Vec<QuotaResource>)> {
        self.require_quota()?;
        let responses = self
            .run_command(&Command::GetQuotaRoot {
                mailbox: Mailbox::new(mailbox),
            })
            .await?;

        let mut roots = Vec::new();
        let mut resources = Vec::new();
        for response in &responses {
            match response {
                Response::Untagged(UntaggedResponse::QuotaRoot { roots: r, .. }) => {
                    roots = r.clone();
                }
                Response::Untagged(UntaggedResponse::Quota { resources: r, .. }) => {
                    resources.extend(r.iter().cloned());
                }
                _ => {}
            }
        }
        Ok((roots, resources))
    }

    /// Sets quota limits on a root (RFC 9208).
    pub async fn set_quota(&mut self, root: &str, limits: Vec<(String, u64)>) -> Result<()> {
        self.require_quota()?;
        self.run_command(&Command::SetQuota {
            root: root.to_string(),
            limits,
        })
        .await?;
        Ok(())
    }

    fn require_quota(&self) -> Result<()> {
        if self.caps.supports("QUOTA") {
            Ok(())
        } else {
            Err(Error::MissingCapability("QUOTA"))
        }
    }

    /// Fetches metadata entries (RFC 5464). An empty mailbox name
    /// addresses server metadata.
    pub async fn get_metadata(
        &mut self,
        mailbox: &str,
        entries: &[&str],
    ) -> Result<Vec<(String, Option<String>)>> {
        self.require_metadata()?;
        let responses = self
            .run_command(&Command::GetMetadata {
                mailbox: Mailbox::new(mailbox),
                entries: entries.iter().map(ToString::to_string).collect(),
            })
            .await?;
        for response in &responses {
            if let Response::Untagged(UntaggedResponse::Metadata { entries, .. }) = response {
                return Ok(entries.clone());
            }
        }
        Ok(Vec::new())
    }

    /// Sets (or with `None` unsets) metadata entries (RFC 5464).
    pub async fn set_metadata(
        &mut self,
        mailbox: &str,
        entries: Vec<(String, Option<String>)>,
    ) -> Result<()> {
        self.require_metadata()?;
        self.run_command(&Command::SetMetadata {
            mailbox: Mailbox::new(mailbox),
            entries,
        })
        .await?;
        Ok(())
    }

    fn require_metadata(&self) -> Result<()> {
        if self.caps.supports("METADATA") {
            Ok(())
        } else {
            Err(Error::MissingCapability("METADATA"))
        }
    }

    /// Configures server-pushed notifications (RFC 5465).
    pub async fn notify(&mut self, spec: NotifySpec) -> Result<()> {
        if !self.caps.supports("NOTIFY") {
            return Err(Error::MissingCapability("NOTIFY"));
        }
        self.run_command(&Command::Notify { spec }).await?;
        Ok(())
    }
}

impl Client<NetStream, Authenticated> {
    /// Negotiates COMPRESS=DEFLATE and switches the transport.
    ///
    /// A `COMPRESSIONACTIVE` rejection is accepted as a no-op: the codec
    /// is already in place and is not re-wrapped.
    pub async fn compress(mut self) -> Result<Self> {
        if !self.caps.supports("COMPRESS=DEFLATE") {
            return Err(Error::MissingCapability("COMPRESS=DEFLATE"));
        }

        match self.run_command(&Command::Compress).await {
            Ok(_) => {
                let stream = self.stream.into_inner();
                let compressed = stream.start_compression()?;
                self.stream = FramedStream::new(compressed);
                tracing::debug!("DEFLATE compression active");
                Ok(self)
            }
            Err(Error::No(text)) if text.to_uppercase().contains("COMPRESSIONACTIVE") => Ok(self),
            Err(e) => Err(e),
        }
    }
}

/// Collects LIST-shaped responses (LIST, LSUB, XLIST) from a batch.
fn collect_lists(responses: &[Response]) -> Vec<ListResponse> {
    responses
        .iter()
        .filter_map(|r| match r {
            Response::Untagged(
                UntaggedResponse::List(item)
                | UntaggedResponse::Lsub(item)
                | UntaggedResponse::Xlist(item),
            ) => Some(item.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::Connected;

    fn preauth_greeting() -> &'static [u8] {
        b"* PREAUTH [CAPABILITY IMAP4rev1 ENABLE NAMESPACE ID LITERAL+ SPECIAL-USE LIST-EXTENDED STATUS=SIZE UIDPLUS QRESYNC CONDSTORE] ok\r\n"
    }

    async fn preauth(mock: tokio_test::io::Mock) -> Client<tokio_test::io::Mock, Authenticated> {
        match Client::from_stream(mock).await.unwrap() {
            Connected::PreAuthenticated(c) => c,
            Connected::NotAuthenticated(_) => panic!("expected preauth"),
        }
    }

    #[tokio::test]
    async fn select_populates_status() {
        let mock = tokio_test::io::Builder::new()
            .read(preauth_greeting())
            .write(b"A0001 SELECT INBOX\r\n")
            .read(b"* 3 EXISTS\r\n")
            .read(b"* 0 RECENT\r\n")
            .read(b"* OK [UIDVALIDITY 42] valid\r\n")
            .read(b"* OK [UIDNEXT 11] next\r\n")
            .read(b"A0001 OK [READ-WRITE] SELECT completed\r\n")
            .build();
        let client = preauth(mock).await;

        let (selected, status) = client.select("INBOX").await.unwrap();
        assert_eq!(status.exists, 3);
        assert_eq!(status.recent, 0);
        assert_eq!(status.uid_validity.unwrap().get(), 42);
        assert_eq!(status.uid_next.unwrap().get(), 11);
        assert!(!status.read_only);
        assert_eq!(selected.selected_state().unwrap().exists, 3);
    }

    #[tokio::test]
    async fn select_failure_clears_state() {
        let mock = tokio_test::io::Builder::new()
            .read(preauth_greeting())
            .write(b"A0001 SELECT Missing\r\n")
            .read(b"A0001 NO [TRYCREATE] no such mailbox\r\n")
            .build();
        let client = preauth(mock).await;
        let err = client.select("Missing").await.unwrap_err();
        assert!(matches!(err, Error::No(_)));
    }

    #[tokio::test]
    async fn qresync_select_surfaces_events() {
        let mock = tokio_test::io::Builder::new()
            .read(preauth_greeting())
            .write(b"A0001 SELECT INBOX (QRESYNC (42 100 1:10))\r\n")
            .read(b"* 8 EXISTS\r\n")
            .read(b"* OK [UIDVALIDITY 42] valid\r\n")
            .read(b"* VANISHED (EARLIER) 2,4\r\n")
            .read(b"* 3 FETCH (UID 5 FLAGS (\\Seen) MODSEQ (120))\r\n")
            .read(b"* OK [HIGHESTMODSEQ 120] modseq\r\n")
            .read(b"A0001 OK [READ-WRITE] done\r\n")
            .build();
        let client = preauth(mock).await;

        let params = QresyncParams::new(
            crate::types::UidValidity::new(42).unwrap(),
            crate::types::ModSeq::new(100).unwrap(),
        )
        .with_known_uids(UidSet::parse("1:10").unwrap());

        let (selected, _status, events) =
            client.select_qresync("INBOX", params).await.unwrap();

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], QresyncEvent::Vanished(uids) if uids.to_string() == "2,4"));
        assert!(
            matches!(&events[1], QresyncEvent::FlagsChanged { uid, modseq, .. } if uid.get() == 5 && modseq.unwrap().get() == 120)
        );
        assert!(selected.selected_state().unwrap().highest_modseq.unwrap().get() >= 120);
    }

    #[tokio::test]
    async fn list_collects_responses() {
        let mock = tokio_test::io::Builder::new()
            .read(preauth_greeting())
            .write(b"A0001 LIST \"\" *\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n")
            .read(b"* LIST (\\HasChildren \\Sent) \"/\" \"Sent Mail\"\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut client = preauth(mock).await;

        let lists = client.list("", "*").await.unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[1].special_use(), Some(SpecialUse::Sent));
    }

    #[tokio::test]
    async fn special_use_via_list_extended() {
        let mock = tokio_test::io::Builder::new()
            .read(preauth_greeting())
            .write(b"A0001 LIST \"\" * RETURN (SPECIAL-USE)\r\n")
            .read(b"* LIST (\\Drafts) \"/\" Drafts\r\n")
            .read(b"* LIST () \"/\" INBOX\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut client = preauth(mock).await;

        let roles = client.special_use_mailboxes().await.unwrap();
        assert_eq!(roles, vec![(SpecialUse::Drafts, Mailbox::new("Drafts"))]);
    }

    #[tokio::test]
    async fn status_returns_items() {
        let mock = tokio_test::io::Builder::new()
            .read(preauth_greeting())
            .write(b"A0001 STATUS Archive (MESSAGES SIZE)\r\n")
            .read(b"* STATUS Archive (MESSAGES 12 SIZE 4096)\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut client = preauth(mock).await;

        let items = client
            .status(
                "Archive",
                vec![StatusAttribute::Messages, StatusAttribute::Size],
            )
            .await
            .unwrap();
        assert!(items.contains(&StatusItem::Messages(12)));
        assert!(items.contains(&StatusItem::Size(4096)));
    }

    #[tokio::test]
    async fn append_with_literal_plus_sends_immediately() {
        let mock = tokio_test::io::Builder::new()
            .read(preauth_greeting())
            .write(b"A0001 APPEND Drafts {5+}\r\n")
            .write(b"hello")
            .write(b"\r\n")
            .read(b"A0001 OK [APPENDUID 42 101] done\r\n")
            .build();
        let mut client = preauth(mock).await;

        let appended = client.append("Drafts", None, b"hello").await.unwrap();
        let (validity, uids) = appended.unwrap();
        assert_eq!(validity.get(), 42);
        assert_eq!(uids.to_string(), "101");
    }

    #[tokio::test]
    async fn enable_returns_enabled_tokens() {
        let mock = tokio_test::io::Builder::new()
            .read(preauth_greeting())
            .write(b"A0001 ENABLE QRESYNC\r\n")
            .read(b"* ENABLED QRESYNC\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut client = preauth(mock).await;

        let enabled = client.enable(&["QRESYNC"]).await.unwrap();
        assert_eq!(enabled, vec!["QRESYNC".to_string()]);
    }

    #[tokio::test]
    async fn namespace_parsed() {
        let mock = tokio_test::io::Builder::new()
            .read(preauth_greeting())
            .write(b"A0001 NAMESPACE\r\n")
            .read(b"* NAMESPACE ((\"\" \"/\")) NIL NIL\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut client = preauth(mock).await;

        let ns = client.namespace().await.unwrap();
        assert_eq!(ns.personal.len(), 1);
    }

    #[tokio::test]
    async fn acl_requires_capability() {
        let mock = tokio_test::io::Builder::new()
            .read(preauth_greeting())
            .build();
        let mut client = preauth(mock).await;
        let err = client.get_acl("INBOX").await.unwrap_err();
        assert!(matches!(err, Error::MissingCapability("ACL")));
    }
}
