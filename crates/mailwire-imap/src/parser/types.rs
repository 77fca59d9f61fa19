//! Parsed response data types.

use crate::types::{
    Flags, ListResponse, Mailbox, ModSeq, ResponseCode, SeqNum, Uid, UidSet, UidValidity,
};

/// FETCH response item.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchItem {
    /// Message flags.
    Flags(Flags),
    /// Internal date, as transmitted.
    InternalDate(String),
    /// RFC822 size.
    Rfc822Size(u32),
    /// Envelope.
    Envelope(Box<Envelope>),
    /// UID.
    Uid(Uid),
    /// BODY/BODY.PEEK section payload.
    Body {
        /// Section specifier, e.g. `HEADER`, `1.2`, `HEADER.FIELDS (...)`.
        section: Option<String>,
        /// Origin offset from a partial fetch (`<o>` suffix).
        origin: Option<u32>,
        /// Payload bytes; `None` when the server returned NIL.
        data: Option<Vec<u8>>,
    },
    /// BINARY section payload (RFC 3516).
    Binary {
        /// Section specifier.
        section: Option<String>,
        /// Decoded payload bytes.
        data: Option<Vec<u8>>,
    },
    /// BINARY.SIZE value.
    BinarySize {
        /// Section specifier.
        section: Option<String>,
        /// Decoded size.
        size: u32,
    },
    /// BODYSTRUCTURE.
    BodyStructure(BodyStructure),
    /// MODSEQ (CONDSTORE).
    ModSeq(ModSeq),
    /// PREVIEW text (RFC 8970); NIL when the server defers generation.
    Preview(Option<String>),
    /// X-GM-LABELS (Gmail).
    GmLabels(Vec<String>),
    /// X-GM-MSGID (Gmail).
    GmMsgId(u64),
    /// X-GM-THRID (Gmail).
    GmThreadId(u64),
    /// EMAILID (OBJECTID, RFC 8474).
    EmailId(String),
    /// THREADID (OBJECTID, RFC 8474).
    ThreadId(String),
    /// SAVEDATE (RFC 8514).
    SaveDate(Option<String>),
}

/// Message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header.
    pub date: Option<String>,
    /// Subject header.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// Email address from an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Source route (obsolete).
    pub adl: Option<String>,
    /// Mailbox name (local part).
    pub mailbox: Option<String>,
    /// Host name (domain part).
    pub host: Option<String>,
}

impl Address {
    /// Returns the full email address when both parts are present.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{m}@{h}")),
            _ => None,
        }
    }
}

/// Body structure.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyStructure {
    /// Single-part non-text body.
    Basic {
        /// MIME type.
        media_type: String,
        /// MIME subtype.
        media_subtype: String,
        /// Body parameters (charset etc.).
        params: Vec<(String, String)>,
        /// Content-ID.
        id: Option<String>,
        /// Content-Description.
        description: Option<String>,
        /// Content-Transfer-Encoding.
        encoding: String,
        /// Body size in bytes.
        size: u32,
    },
    /// `message/rfc822` body.
    Message {
        /// Envelope of nested message.
        envelope: Box<Envelope>,
        /// Body structure of nested message.
        body: Box<Self>,
        /// Size in lines.
        lines: u32,
    },
    /// Text body.
    Text {
        /// Text subtype.
        subtype: String,
        /// Body parameters (charset etc.).
        params: Vec<(String, String)>,
        /// Content-ID.
        id: Option<String>,
        /// Content-Description.
        description: Option<String>,
        /// Content-Transfer-Encoding.
        encoding: String,
        /// Body size in bytes.
        size: u32,
        /// Size in lines.
        lines: u32,
    },
    /// Multipart body.
    Multipart {
        /// Child body parts.
        bodies: Vec<Self>,
        /// Multipart subtype.
        subtype: String,
    },
}

impl BodyStructure {
    /// The charset parameter of this part, when declared.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        let params = match self {
            Self::Basic { params, .. } | Self::Text { params, .. } => params,
            _ => return None,
        };
        params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("charset"))
            .map(|(_, v)| v.as_str())
    }

    /// The transfer encoding of this part, when declared.
    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        match self {
            Self::Basic { encoding, .. } | Self::Text { encoding, .. } => Some(encoding),
            _ => None,
        }
    }
}

/// STATUS response item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusItem {
    /// Number of messages.
    Messages(u32),
    /// Number of recent messages.
    Recent(u32),
    /// Next UID.
    UidNext(Uid),
    /// UIDVALIDITY value.
    UidValidity(UidValidity),
    /// Number of unseen messages.
    Unseen(u32),
    /// Highest mod-sequence.
    HighestModSeq(ModSeq),
    /// Total mailbox size in octets (STATUS=SIZE).
    Size(u64),
}

/// ESEARCH response (RFC 4731).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EsearchResponse {
    /// Correlating command tag, when echoed.
    pub tag: Option<String>,
    /// Whether the result values are UIDs.
    pub uid: bool,
    /// MIN return item.
    pub min: Option<u32>,
    /// MAX return item.
    pub max: Option<u32>,
    /// COUNT return item.
    pub count: Option<u32>,
    /// ALL return item.
    pub all: Option<UidSet>,
    /// MODSEQ return item (CONDSTORE search).
    pub modseq: Option<ModSeq>,
}

/// One namespace entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEntry {
    /// Mailbox prefix.
    pub prefix: String,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
}

/// NAMESPACE response (RFC 2342).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespaceResponse {
    /// Personal namespaces.
    pub personal: Vec<NamespaceEntry>,
    /// Other-users namespaces.
    pub other_users: Vec<NamespaceEntry>,
    /// Shared namespaces.
    pub shared: Vec<NamespaceEntry>,
}

/// One node of a THREAD response tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadNode {
    /// Message number (sequence or UID, per command).
    pub id: u32,
    /// Child messages.
    pub children: Vec<ThreadNode>,
}

/// One quota resource limit (RFC 9208).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaResource {
    /// Resource name (STORAGE, MESSAGE, ...).
    pub name: String,
    /// Current usage.
    pub usage: u64,
    /// Limit.
    pub limit: u64,
}

/// Untagged response data.
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedResponse {
    /// OK response with optional code.
    Ok {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// NO response.
    No {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BAD response.
    Bad {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// PREAUTH greeting.
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BYE notice.
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// CAPABILITY tokens.
    Capability(Vec<String>),
    /// ENABLED tokens (RFC 5161).
    Enabled(Vec<String>),
    /// LIST response.
    List(ListResponse),
    /// LSUB response.
    Lsub(ListResponse),
    /// XLIST response (pre-RFC 6154 special-use).
    Xlist(ListResponse),
    /// FLAGS response.
    Flags(Flags),
    /// EXISTS count.
    Exists(u32),
    /// RECENT count.
    Recent(u32),
    /// EXPUNGE notice.
    Expunge(SeqNum),
    /// FETCH data.
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Fetch data items.
        items: Vec<FetchItem>,
    },
    /// SEARCH result numbers.
    Search(Vec<u32>),
    /// ESEARCH result (RFC 4731).
    Esearch(EsearchResponse),
    /// SORT result numbers.
    Sort(Vec<u32>),
    /// THREAD result forest.
    Thread(Vec<ThreadNode>),
    /// STATUS data.
    Status {
        /// Mailbox name.
        mailbox: Mailbox,
        /// Status items.
        items: Vec<StatusItem>,
    },
    /// NAMESPACE data.
    Namespace(NamespaceResponse),
    /// VANISHED notice (QRESYNC).
    Vanished {
        /// Whether this reports historical expunges (EARLIER).
        earlier: bool,
        /// Expunged UIDs.
        uids: UidSet,
    },
    /// QUOTA data.
    Quota {
        /// Quota root name.
        root: String,
        /// Resource limits.
        resources: Vec<QuotaResource>,
    },
    /// QUOTAROOT data.
    QuotaRoot {
        /// Mailbox name.
        mailbox: Mailbox,
        /// Quota roots that apply.
        roots: Vec<String>,
    },
    /// ACL data.
    Acl {
        /// Mailbox name.
        mailbox: Mailbox,
        /// Identifier/rights pairs.
        entries: Vec<(String, String)>,
    },
    /// LISTRIGHTS data.
    ListRights {
        /// Mailbox name.
        mailbox: Mailbox,
        /// Identifier.
        identifier: String,
        /// Required rights followed by optional right groups.
        rights: Vec<String>,
    },
    /// MYRIGHTS data.
    MyRights {
        /// Mailbox name.
        mailbox: Mailbox,
        /// Granted rights.
        rights: String,
    },
    /// METADATA data (RFC 5464).
    Metadata {
        /// Mailbox name (empty for server metadata).
        mailbox: Mailbox,
        /// Entry name/value pairs; `None` value means unset.
        entries: Vec<(String, Option<String>)>,
    },
    /// ID data (RFC 2971).
    Id(Option<Vec<(String, String)>>),
}
