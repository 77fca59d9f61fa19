//! IMAP command builders and serialization.

mod serialize;
mod tag;
mod types;

pub use tag::TagGenerator;
pub use types::{
    FetchAttribute, FetchItems, NotifyEvent, NotifySpec, StatusAttribute, StoreAction, StoreMode,
};

use crate::qresync::QresyncParams;
use crate::search::{SearchQuery, SortCriteria, ThreadAlgorithm};
use crate::types::{Flag, Mailbox, SequenceSet, UidSet};

use serialize::{write_astring, write_fetch_items, write_mailbox, write_store_action};

/// An IMAP command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// CAPABILITY.
    Capability,
    /// NOOP.
    Noop,
    /// LOGOUT.
    Logout,
    /// STARTTLS.
    StartTls,
    /// LOGIN with plaintext credentials.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// AUTHENTICATE with a SASL mechanism.
    Authenticate {
        /// Mechanism name.
        mechanism: String,
        /// Base64 initial response (SASL-IR).
        initial_response: Option<String>,
    },
    /// ID (RFC 2971).
    Id {
        /// Field/value pairs; `None` sends `ID NIL`.
        parameters: Option<Vec<(String, String)>>,
    },
    /// ENABLE (RFC 5161).
    Enable {
        /// Capabilities to enable.
        capabilities: Vec<String>,
    },
    /// COMPRESS DEFLATE (RFC 4978).
    Compress,
    /// SELECT, optionally with CONDSTORE or QRESYNC parameters.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
        /// Append `(CONDSTORE)`.
        condstore: bool,
        /// QRESYNC resynchronization parameters.
        qresync: Option<QresyncParams>,
    },
    /// EXAMINE (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
        /// QRESYNC resynchronization parameters.
        qresync: Option<QresyncParams>,
    },
    /// CREATE.
    Create {
        /// Mailbox to create.
        mailbox: Mailbox,
        /// Special-use attribute (CREATE-SPECIAL-USE), e.g. `\Sent`.
        special_use: Option<String>,
    },
    /// DELETE.
    Delete {
        /// Mailbox to delete.
        mailbox: Mailbox,
    },
    /// RENAME.
    Rename {
        /// Current name.
        from: Mailbox,
        /// New name.
        to: Mailbox,
    },
    /// SUBSCRIBE.
    Subscribe {
        /// Mailbox.
        mailbox: Mailbox,
    },
    /// UNSUBSCRIBE.
    Unsubscribe {
        /// Mailbox.
        mailbox: Mailbox,
    },
    /// LIST, with optional LIST-EXTENDED return options.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
        /// RETURN options (LIST-EXTENDED), e.g. `SPECIAL-USE`, `STATUS (...)`.
        return_options: Vec<String>,
    },
    /// LSUB.
    Lsub {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// XLIST (pre-standard special-use listing).
    Xlist {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// NAMESPACE.
    Namespace,
    /// STATUS.
    Status {
        /// Mailbox.
        mailbox: Mailbox,
        /// Attributes to request.
        items: Vec<StatusAttribute>,
    },
    /// APPEND. Serializes the command line ending in a literal marker;
    /// the message bytes follow after the continuation (or immediately
    /// with LITERAL+).
    Append {
        /// Target mailbox.
        mailbox: Mailbox,
        /// Flags to set on the appended message.
        flags: Option<Vec<Flag>>,
        /// Message length in bytes.
        message_len: usize,
        /// Use a non-synchronizing literal (LITERAL+).
        literal_plus: bool,
    },
    /// CLOSE.
    Close,
    /// UNSELECT (RFC 3691).
    Unselect,
    /// EXPUNGE.
    Expunge,
    /// UID EXPUNGE (UIDPLUS).
    UidExpunge {
        /// UIDs to expunge.
        uids: UidSet,
    },
    /// SEARCH / UID SEARCH.
    Search {
        /// Query tree.
        query: SearchQuery,
        /// Issue as UID SEARCH.
        uid: bool,
        /// ESEARCH RETURN options (`MIN`, `MAX`, `ALL`, `COUNT`, `SAVE`).
        return_options: Vec<String>,
    },
    /// SORT / UID SORT (RFC 5256).
    Sort {
        /// Sort program.
        criteria: SortCriteria,
        /// Filter query.
        query: SearchQuery,
        /// Issue as UID SORT.
        uid: bool,
    },
    /// THREAD / UID THREAD (RFC 5256).
    Thread {
        /// Threading algorithm.
        algorithm: ThreadAlgorithm,
        /// Filter query.
        query: SearchQuery,
        /// Issue as UID THREAD.
        uid: bool,
    },
    /// FETCH / UID FETCH.
    Fetch {
        /// Message set.
        sequence: SequenceSet,
        /// Items to fetch.
        items: FetchItems,
        /// Issue as UID FETCH.
        uid: bool,
        /// CHANGEDSINCE modifier (CONDSTORE).
        changed_since: Option<u64>,
        /// VANISHED modifier (QRESYNC, UID FETCH only).
        vanished: bool,
    },
    /// STORE / UID STORE.
    Store {
        /// Message set.
        sequence: SequenceSet,
        /// Flag action.
        action: StoreAction,
        /// Issue as UID STORE.
        uid: bool,
        /// Suppress the FETCH echo.
        silent: bool,
    },
    /// COPY / UID COPY.
    Copy {
        /// Message set.
        sequence: SequenceSet,
        /// Target mailbox.
        mailbox: Mailbox,
        /// Issue as UID COPY.
        uid: bool,
    },
    /// MOVE / UID MOVE (RFC 6851).
    Move {
        /// Message set.
        sequence: SequenceSet,
        /// Target mailbox.
        mailbox: Mailbox,
        /// Issue as UID MOVE.
        uid: bool,
    },
    /// IDLE (RFC 2177).
    Idle,
    /// DONE (terminates IDLE; sent untagged).
    Done,
    /// GETACL (RFC 4314).
    GetAcl {
        /// Mailbox.
        mailbox: Mailbox,
    },
    /// SETACL (RFC 4314).
    SetAcl {
        /// Mailbox.
        mailbox: Mailbox,
        /// Identifier to grant/deny.
        identifier: String,
        /// Rights modification string.
        rights: String,
    },
    /// DELETEACL (RFC 4314).
    DeleteAcl {
        /// Mailbox.
        mailbox: Mailbox,
        /// Identifier to remove.
        identifier: String,
    },
    /// LISTRIGHTS (RFC 4314).
    ListRights {
        /// Mailbox.
        mailbox: Mailbox,
        /// Identifier.
        identifier: String,
    },
    /// MYRIGHTS (RFC 4314).
    MyRights {
        /// Mailbox.
        mailbox: Mailbox,
    },
    /// GETQUOTA (RFC 9208).
    GetQuota {
        /// Quota root.
        root: String,
    },
    /// GETQUOTAROOT (RFC 9208).
    GetQuotaRoot {
        /// Mailbox.
        mailbox: Mailbox,
    },
    /// SETQUOTA (RFC 9208).
    SetQuota {
        /// Quota root.
        root: String,
        /// Resource limits.
        limits: Vec<(String, u64)>,
    },
    /// GETMETADATA (RFC 5464).
    GetMetadata {
        /// Mailbox; empty string addresses server metadata.
        mailbox: Mailbox,
        /// Entry names.
        entries: Vec<String>,
    },
    /// SETMETADATA (RFC 5464).
    SetMetadata {
        /// Mailbox; empty string addresses server metadata.
        mailbox: Mailbox,
        /// Entry name/value pairs; `None` unsets.
        entries: Vec<(String, Option<String>)>,
    },
    /// NOTIFY (RFC 5465).
    Notify {
        /// Notification specification.
        spec: NotifySpec,
    },
}

impl Command {
    /// Serializes the command line (including trailing CRLF) with `tag`.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::new();

        // DONE is raw framing during IDLE and carries no tag.
        if !matches!(self, Self::Done) {
            buf.extend_from_slice(tag.as_bytes());
            buf.push(b' ');
        }

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
            Self::StartTls => buf.extend_from_slice(b"STARTTLS"),
            Self::Compress => buf.extend_from_slice(b"COMPRESS DEFLATE"),
            Self::Done => buf.extend_from_slice(b"DONE"),
            Self::Idle => buf.extend_from_slice(b"IDLE"),
            Self::Close => buf.extend_from_slice(b"CLOSE"),
            Self::Unselect => buf.extend_from_slice(b"UNSELECT"),
            Self::Expunge => buf.extend_from_slice(b"EXPUNGE"),
            Self::Namespace => buf.extend_from_slice(b"NAMESPACE"),

            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }

            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                buf.extend_from_slice(b"AUTHENTICATE ");
                buf.extend_from_slice(mechanism.as_bytes());
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    buf.extend_from_slice(resp.as_bytes());
                }
            }

            Self::Id { parameters } => {
                buf.extend_from_slice(b"ID ");
                match parameters {
                    Some(params) => {
                        buf.push(b'(');
                        for (i, (key, value)) in params.iter().enumerate() {
                            if i > 0 {
                                buf.push(b' ');
                            }
                            write_astring(&mut buf, key);
                            buf.push(b' ');
                            write_astring(&mut buf, value);
                        }
                        buf.push(b')');
                    }
                    None => buf.extend_from_slice(b"NIL"),
                }
            }

            Self::Enable { capabilities } => {
                buf.extend_from_slice(b"ENABLE");
                for cap in capabilities {
                    buf.push(b' ');
                    buf.extend_from_slice(cap.as_bytes());
                }
            }

            Self::Select {
                mailbox,
                condstore,
                qresync,
            } => {
                buf.extend_from_slice(b"SELECT ");
                write_mailbox(&mut buf, mailbox);
                if let Some(params) = qresync {
                    buf.push(b' ');
                    buf.extend_from_slice(params.serialize().as_bytes());
                } else if *condstore {
                    buf.extend_from_slice(b" (CONDSTORE)");
                }
            }

            Self::Examine { mailbox, qresync } => {
                buf.extend_from_slice(b"EXAMINE ");
                write_mailbox(&mut buf, mailbox);
                if let Some(params) = qresync {
                    buf.push(b' ');
                    buf.extend_from_slice(params.serialize().as_bytes());
                }
            }

            Self::Create {
                mailbox,
                special_use,
            } => {
                buf.extend_from_slice(b"CREATE ");
                write_mailbox(&mut buf, mailbox);
                if let Some(role) = special_use {
                    buf.extend_from_slice(format!(" (USE ({role}))").as_bytes());
                }
            }

            Self::Delete { mailbox } => {
                buf.extend_from_slice(b"DELETE ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::Rename { from, to } => {
                buf.extend_from_slice(b"RENAME ");
                write_mailbox(&mut buf, from);
                buf.push(b' ');
                write_mailbox(&mut buf, to);
            }

            Self::Subscribe { mailbox } => {
                buf.extend_from_slice(b"SUBSCRIBE ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::Unsubscribe { mailbox } => {
                buf.extend_from_slice(b"UNSUBSCRIBE ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::List {
                reference,
                pattern,
                return_options,
            } => {
                buf.extend_from_slice(b"LIST ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_astring(&mut buf, pattern);
                if !return_options.is_empty() {
                    buf.extend_from_slice(b" RETURN (");
                    buf.extend_from_slice(return_options.join(" ").as_bytes());
                    buf.push(b')');
                }
            }

            Self::Lsub { reference, pattern } => {
                buf.extend_from_slice(b"LSUB ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_astring(&mut buf, pattern);
            }

            Self::Xlist { reference, pattern } => {
                buf.extend_from_slice(b"XLIST ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_astring(&mut buf, pattern);
            }

            Self::Status { mailbox, items } => {
                buf.extend_from_slice(b"STATUS ");
                write_mailbox(&mut buf, mailbox);
                buf.extend_from_slice(b" (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    buf.extend_from_slice(item.as_str().as_bytes());
                }
                buf.push(b')');
            }

            Self::Append {
                mailbox,
                flags,
                message_len,
                literal_plus,
            } => {
                buf.extend_from_slice(b"APPEND ");
                write_mailbox(&mut buf, mailbox);
                if let Some(flags) = flags {
                    buf.extend_from_slice(b" (");
                    for (i, flag) in flags.iter().enumerate() {
                        if i > 0 {
                            buf.push(b' ');
                        }
                        buf.extend_from_slice(flag.as_str().as_bytes());
                    }
                    buf.push(b')');
                }
                if *literal_plus {
                    buf.extend_from_slice(format!(" {{{message_len}+}}").as_bytes());
                } else {
                    buf.extend_from_slice(format!(" {{{message_len}}}").as_bytes());
                }
            }

            Self::UidExpunge { uids } => {
                buf.extend_from_slice(b"UID EXPUNGE ");
                buf.extend_from_slice(uids.to_string().as_bytes());
            }

            Self::Search {
                query,
                uid,
                return_options,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"SEARCH ");
                if !return_options.is_empty() {
                    buf.extend_from_slice(b"RETURN (");
                    buf.extend_from_slice(return_options.join(" ").as_bytes());
                    buf.extend_from_slice(b") ");
                }
                buf.extend_from_slice(query.to_imap().as_bytes());
            }

            Self::Sort {
                criteria,
                query,
                uid,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"SORT ");
                buf.extend_from_slice(criteria.to_imap().as_bytes());
                buf.extend_from_slice(b" UTF-8 ");
                buf.extend_from_slice(query.serialize_without_charset().as_bytes());
            }

            Self::Thread {
                algorithm,
                query,
                uid,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"THREAD ");
                buf.extend_from_slice(algorithm.as_str().as_bytes());
                buf.extend_from_slice(b" UTF-8 ");
                buf.extend_from_slice(query.serialize_without_charset().as_bytes());
            }

            Self::Fetch {
                sequence,
                items,
                uid,
                changed_since,
                vanished,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"FETCH ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_items(&mut buf, items);
                if let Some(modseq) = changed_since {
                    buf.extend_from_slice(format!(" (CHANGEDSINCE {modseq}").as_bytes());
                    if *vanished {
                        buf.extend_from_slice(b" VANISHED");
                    }
                    buf.push(b')');
                }
            }

            Self::Store {
                sequence,
                action,
                uid,
                silent,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"STORE ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_store_action(&mut buf, action, *silent);
            }

            Self::Copy {
                sequence,
                mailbox,
                uid,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"COPY ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_mailbox(&mut buf, mailbox);
            }

            Self::Move {
                sequence,
                mailbox,
                uid,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"MOVE ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_mailbox(&mut buf, mailbox);
            }

            Self::GetAcl { mailbox } => {
                buf.extend_from_slice(b"GETACL ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::SetAcl {
                mailbox,
                identifier,
                rights,
            } => {
                buf.extend_from_slice(b"SETACL ");
                write_mailbox(&mut buf, mailbox);
                buf.push(b' ');
                write_astring(&mut buf, identifier);
                buf.push(b' ');
                write_astring(&mut buf, rights);
            }

            Self::DeleteAcl {
                mailbox,
                identifier,
            } => {
                buf.extend_from_slice(b"DELETEACL ");
                write_mailbox(&mut buf, mailbox);
                buf.push(b' ');
                write_astring(&mut buf, identifier);
            }

            Self::ListRights {
                mailbox,
                identifier,
            } => {
                buf.extend_from_slice(b"LISTRIGHTS ");
                write_mailbox(&mut buf, mailbox);
                buf.push(b' ');
                write_astring(&mut buf, identifier);
            }

            Self::MyRights { mailbox } => {
                buf.extend_from_slice(b"MYRIGHTS ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::GetQuota { root } => {
                buf.extend_from_slice(b"GETQUOTA ");
                write_astring(&mut buf, root);
            }

            Self::GetQuotaRoot { mailbox } => {
                buf.extend_from_slice(b"GETQUOTAROOT ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::SetQuota { root, limits } => {
                buf.extend_from_slice(b"SETQUOTA ");
                write_astring(&mut buf, root);
                buf.extend_from_slice(b" (");
                for (i, (name, limit)) in limits.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    buf.extend_from_slice(format!("{name} {limit}").as_bytes());
                }
                buf.push(b')');
            }

            Self::GetMetadata { mailbox, entries } => {
                buf.extend_from_slice(b"GETMETADATA ");
                write_mailbox(&mut buf, mailbox);
                buf.extend_from_slice(b" (");
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    write_astring(&mut buf, entry);
                }
                buf.push(b')');
            }

            Self::SetMetadata { mailbox, entries } => {
                buf.extend_from_slice(b"SETMETADATA ");
                write_mailbox(&mut buf, mailbox);
                buf.extend_from_slice(b" (");
                for (i, (name, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    write_astring(&mut buf, name);
                    buf.push(b' ');
                    match value {
                        Some(v) => write_astring(&mut buf, v),
                        None => buf.extend_from_slice(b"NIL"),
                    }
                }
                buf.push(b')');
            }

            Self::Notify { spec } => {
                buf.extend_from_slice(b"NOTIFY ");
                match spec {
                    NotifySpec::None => buf.extend_from_slice(b"NONE"),
                    NotifySpec::Selected(events) => {
                        buf.extend_from_slice(b"SET (SELECTED (");
                        for (i, event) in events.iter().enumerate() {
                            if i > 0 {
                                buf.push(b' ');
                            }
                            buf.extend_from_slice(event.as_str().as_bytes());
                        }
                        buf.extend_from_slice(b"))");
                    }
                }
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn serialize(cmd: &Command) -> String {
        String::from_utf8(cmd.serialize("A0001")).unwrap()
    }

    #[test]
    fn login_quotes_credentials() {
        let cmd = Command::Login {
            username: "u".to_string(),
            password: "p w".to_string(),
        };
        assert_eq!(serialize(&cmd), "A0001 LOGIN u \"p w\"\r\n");
    }

    #[test]
    fn select_with_qresync() {
        use crate::types::{ModSeq, UidValidity};
        let params = QresyncParams::new(
            UidValidity::new(42).unwrap(),
            ModSeq::new(100).unwrap(),
        )
        .with_known_uids(UidSet::parse("1:10").unwrap());

        let cmd = Command::Select {
            mailbox: Mailbox::inbox(),
            condstore: false,
            qresync: Some(params),
        };
        assert_eq!(
            serialize(&cmd),
            "A0001 SELECT INBOX (QRESYNC (42 100 1:10))\r\n"
        );
    }

    #[test]
    fn select_condstore() {
        let cmd = Command::Select {
            mailbox: Mailbox::inbox(),
            condstore: true,
            qresync: None,
        };
        assert_eq!(serialize(&cmd), "A0001 SELECT INBOX (CONDSTORE)\r\n");
    }

    #[test]
    fn uid_search_with_return() {
        let cmd = Command::Search {
            query: SearchQuery::Unseen,
            uid: true,
            return_options: vec!["MIN".to_string(), "COUNT".to_string()],
        };
        assert_eq!(
            serialize(&cmd),
            "A0001 UID SEARCH RETURN (MIN COUNT) UNSEEN\r\n"
        );
    }

    #[test]
    fn uid_fetch_changedsince_vanished() {
        let cmd = Command::Fetch {
            sequence: SequenceSet::parse("1:*").unwrap(),
            items: FetchItems::Items(vec![FetchAttribute::Flags]),
            uid: true,
            changed_since: Some(100),
            vanished: true,
        };
        assert_eq!(
            serialize(&cmd),
            "A0001 UID FETCH 1:* FLAGS (CHANGEDSINCE 100 VANISHED)\r\n"
        );
    }

    #[test]
    fn append_literal_marker() {
        let cmd = Command::Append {
            mailbox: Mailbox::new("Drafts"),
            flags: Some(vec![Flag::Draft]),
            message_len: 310,
            literal_plus: false,
        };
        assert_eq!(serialize(&cmd), "A0001 APPEND Drafts (\\Draft) {310}\r\n");

        let plus = Command::Append {
            mailbox: Mailbox::new("Drafts"),
            flags: None,
            message_len: 310,
            literal_plus: true,
        };
        assert_eq!(serialize(&plus), "A0001 APPEND Drafts {310+}\r\n");
    }

    #[test]
    fn done_has_no_tag() {
        assert_eq!(
            String::from_utf8(Command::Done.serialize("ignored")).unwrap(),
            "DONE\r\n"
        );
    }

    #[test]
    fn sort_and_thread() {
        use crate::search::{SortCriteria, SortKey};
        let cmd = Command::Sort {
            criteria: SortCriteria::new().reverse(SortKey::Date),
            query: SearchQuery::All,
            uid: true,
        };
        assert_eq!(serialize(&cmd), "A0001 UID SORT (REVERSE DATE) UTF-8 ALL\r\n");

        let cmd = Command::Thread {
            algorithm: ThreadAlgorithm::References,
            query: SearchQuery::Unseen,
            uid: false,
        };
        assert_eq!(serialize(&cmd), "A0001 THREAD REFERENCES UTF-8 UNSEEN\r\n");
    }

    #[test]
    fn metadata_commands() {
        let cmd = Command::GetMetadata {
            mailbox: Mailbox::inbox(),
            entries: vec!["/private/comment".to_string()],
        };
        assert_eq!(
            serialize(&cmd),
            "A0001 GETMETADATA INBOX (/private/comment)\r\n"
        );

        let cmd = Command::SetMetadata {
            mailbox: Mailbox::inbox(),
            entries: vec![("/private/comment".to_string(), None)],
        };
        assert_eq!(
            serialize(&cmd),
            "A0001 SETMETADATA INBOX (/private/comment NIL)\r\n"
        );
    }

    #[test]
    fn notify_commands() {
        let cmd = Command::Notify {
            spec: NotifySpec::Selected(vec![NotifyEvent::MessageNew, NotifyEvent::MessageExpunge]),
        };
        assert_eq!(
            serialize(&cmd),
            "A0001 NOTIFY SET (SELECTED (MessageNew MessageExpunge))\r\n"
        );
        assert_eq!(
            serialize(&Command::Notify {
                spec: NotifySpec::None
            }),
            "A0001 NOTIFY NONE\r\n"
        );
    }

    #[test]
    fn quota_commands() {
        assert_eq!(
            serialize(&Command::SetQuota {
                root: String::new(),
                limits: vec![("STORAGE".to_string(), 512)],
            }),
            "A0001 SETQUOTA \"\" (STORAGE 512)\r\n"
        );
    }
}
