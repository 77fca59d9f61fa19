//! Response codes carried in bracketed `[...]` sections of status lines.

use super::{Flag, ModSeq, SeqNum, Uid, UidSet, UidValidity};

/// Response code from a status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: human-readable message that must reach the user.
    Alert,
    /// BADCHARSET: requested charset not supported.
    BadCharset,
    /// CAPABILITY list embedded in a status line.
    Capability(Vec<String>),
    /// PARSE: server had trouble parsing a message.
    Parse,
    /// PERMANENTFLAGS: flags that persist across sessions.
    PermanentFlags(Vec<Flag>),
    /// READ-ONLY mailbox.
    ReadOnly,
    /// READ-WRITE mailbox.
    ReadWrite,
    /// TRYCREATE: target mailbox does not exist but could be created.
    TryCreate,
    /// UIDNEXT value.
    UidNext(Uid),
    /// UIDVALIDITY value.
    UidValidity(UidValidity),
    /// UNSEEN: first unseen sequence number.
    Unseen(SeqNum),
    /// APPENDUID (UIDPLUS): UID assigned to an appended message.
    AppendUid {
        /// UIDVALIDITY of the target mailbox.
        uidvalidity: UidValidity,
        /// Assigned UIDs.
        uids: UidSet,
    },
    /// COPYUID (UIDPLUS): source/destination UID mapping.
    CopyUid {
        /// UIDVALIDITY of the destination mailbox.
        uidvalidity: UidValidity,
        /// Source UIDs.
        source_uids: UidSet,
        /// Destination UIDs.
        dest_uids: UidSet,
    },
    /// UIDNOTSTICKY: the mailbox does not keep UIDs stable.
    UidNotSticky,
    /// HIGHESTMODSEQ value (CONDSTORE).
    HighestModSeq(ModSeq),
    /// NOMODSEQ: mod-sequences unsupported for this mailbox.
    NoModSeq,
    /// MODIFIED (CONDSTORE): messages rejected by UNCHANGEDSINCE.
    Modified(UidSet),
    /// CLOSED (QRESYNC): previous mailbox was implicitly closed.
    Closed,
    /// COMPRESSIONACTIVE: compression is already enabled.
    CompressionActive,
    /// AUTHENTICATIONFAILED (RFC 5530).
    AuthenticationFailed,
    /// Unknown response code, name and raw argument preserved.
    Unknown(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn copyuid_carries_sets() {
        let code = ResponseCode::CopyUid {
            uidvalidity: UidValidity::new(42).unwrap(),
            source_uids: UidSet::parse("1:3").unwrap(),
            dest_uids: UidSet::parse("7:9").unwrap(),
        };
        if let ResponseCode::CopyUid {
            source_uids,
            dest_uids,
            ..
        } = code
        {
            assert_eq!(source_uids.count(), Some(3));
            assert_eq!(dest_uids.to_string(), "7:9");
        } else {
            panic!("expected CopyUid");
        }
    }

    #[test]
    fn permanent_flags_holds_wildcard() {
        let code = ResponseCode::PermanentFlags(vec![Flag::Seen, Flag::Wildcard]);
        if let ResponseCode::PermanentFlags(flags) = code {
            assert!(flags.contains(&Flag::Wildcard));
        } else {
            panic!("expected PermanentFlags");
        }
    }
}
