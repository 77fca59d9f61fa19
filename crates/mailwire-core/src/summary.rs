//! Message summary assembly.
//!
//! Joins a FETCH item list with its body-section payloads into one
//! immutable [`MessageSummary`]: envelope, flags, sizes, preview text,
//! parsed headers, and References. Header decoding is delegated to
//! `mailparse`; this module never interprets MIME itself beyond locating
//! the right sections.

use chrono::{DateTime, FixedOffset};

use mailwire_imap::parser::{BodyStructure, Envelope, FetchItem};
use mailwire_imap::types::{Flags, ModSeq, SeqNum, Uid};

use crate::dsn::parse_header_block;

/// Default preview length in characters.
pub const PREVIEW_LENGTH: usize = 256;

/// Immutable per-message summary assembled from FETCH data.
#[derive(Debug, Clone, Default)]
pub struct MessageSummary {
    /// Message UID.
    pub uid: Option<Uid>,
    /// Sequence number the data arrived under.
    pub sequence: Option<SeqNum>,
    /// Message flags.
    pub flags: Flags,
    /// INTERNALDATE, parsed.
    pub internal_date: Option<DateTime<FixedOffset>>,
    /// RFC822.SIZE.
    pub size: Option<u32>,
    /// MODSEQ (CONDSTORE).
    pub modseq: Option<ModSeq>,
    /// ENVELOPE.
    pub envelope: Option<Envelope>,
    /// BODYSTRUCTURE.
    pub body_structure: Option<BodyStructure>,
    /// Preview text: PREVIEW when returned, else decoded from the
    /// `BODY[TEXT]` partial, truncated to [`PREVIEW_LENGTH`].
    pub preview_text: Option<String>,
    /// Headers from `BODY[HEADER.FIELDS (...)]`, in arrival order.
    pub headers: Vec<(String, String)>,
    /// Message-ids from the References header, oldest first.
    pub references: Vec<String>,
    /// Gmail message id (X-GM-MSGID).
    pub gm_msgid: Option<u64>,
    /// Gmail thread id (X-GM-THRID).
    pub gm_thread_id: Option<u64>,
    /// Gmail labels (X-GM-LABELS).
    pub gm_labels: Vec<String>,
}

impl MessageSummary {
    /// Assembles a summary from one FETCH response entry.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn assemble(sequence: SeqNum, items: &[FetchItem]) -> Self {
        let mut summary = Self {
            sequence: Some(sequence),
            ..Self::default()
        };

        let mut text_section: Option<Vec<u8>> = None;

        for item in items {
            match item {
                FetchItem::Uid(uid) => summary.uid = Some(*uid),
                FetchItem::Flags(flags) => summary.flags = flags.clone(),
                FetchItem::Rfc822Size(size) => summary.size = Some(*size),
                FetchItem::ModSeq(modseq) => summary.modseq = Some(*modseq),
                FetchItem::InternalDate(raw) => {
                    summary.internal_date = parse_internal_date(raw);
                }
                FetchItem::Envelope(envelope) => {
                    summary.envelope = Some((**envelope).clone());
                }
                FetchItem::BodyStructure(body) => summary.body_structure = Some(body.clone()),
                FetchItem::Preview(preview) => {
                    if let Some(text) = preview {
                        summary.preview_text = Some(truncate(text, PREVIEW_LENGTH));
                    }
                }
                FetchItem::GmMsgId(id) => summary.gm_msgid = Some(*id),
                FetchItem::GmThreadId(id) => summary.gm_thread_id = Some(*id),
                FetchItem::GmLabels(labels) => summary.gm_labels = labels.clone(),
                FetchItem::Body {
                    section: Some(section),
                    data: Some(data),
                    ..
                } => {
                    let upper = section.to_uppercase();
                    if upper.starts_with("HEADER") {
                        if let Ok(headers) = parse_header_block(data) {
                            summary.headers = headers;
                        }
                    } else if upper == "TEXT" || upper == "1" {
                        text_section = Some(data.clone());
                    }
                }
                _ => {}
            }
        }

        // PREVIEW wins when the server produced one; otherwise decode the
        // fetched text section using the announced charset and encoding.
        if summary.preview_text.is_none() {
            if let Some(data) = text_section {
                let decoded = decode_text_part(&data, summary.body_structure.as_ref());
                summary.preview_text = Some(truncate(&collapse_whitespace(&decoded), PREVIEW_LENGTH));
            }
        }

        if let Some(refs) = summary.header_value("References") {
            summary.references = parse_message_ids(&refs);
        }

        summary
    }

    /// Looks up a header by name (case-insensitive).
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}

/// Parses an INTERNALDATE value, e.g. `07-Feb-1994 21:52:25 -0800`.
fn parse_internal_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw.trim(), "%d-%b-%Y %H:%M:%S %z").ok()
}

/// Decodes a body section honoring the transfer encoding and charset
/// announced in the body structure, by synthesizing a single-part MIME
/// entity for `mailparse` to decode.
fn decode_text_part(data: &[u8], structure: Option<&BodyStructure>) -> String {
    let text_part = structure.and_then(find_text_part);
    let charset = text_part.and_then(BodyStructure::charset).unwrap_or("utf-8");
    let encoding = text_part.and_then(BodyStructure::encoding).unwrap_or("7BIT");

    let mut synthetic = Vec::new();
    synthetic.extend_from_slice(
        format!(
            "Content-Type: text/plain; charset=\"{charset}\"\r\n\
             Content-Transfer-Encoding: {encoding}\r\n\r\n"
        )
        .as_bytes(),
    );
    synthetic.extend_from_slice(data);

    mailparse::parse_mail(&synthetic)
        .and_then(|mail| mail.get_body())
        .unwrap_or_else(|_| String::from_utf8_lossy(data).into_owned())
}

/// Finds the first text part in a body structure (depth-first).
fn find_text_part(structure: &BodyStructure) -> Option<&BodyStructure> {
    match structure {
        BodyStructure::Text { .. } => Some(structure),
        BodyStructure::Multipart { bodies, .. } => bodies.iter().find_map(find_text_part),
        BodyStructure::Message { body, .. } => find_text_part(body),
        BodyStructure::Basic { .. } => None,
    }
}

/// Extracts `<...>` message-ids from a References/In-Reply-To value.
fn parse_message_ids(value: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut rest = value;
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        ids.push(rest[start..=start + len].to_string());
        rest = &rest[start + len + 1..];
    }
    ids
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        text.chars().take(limit).collect()
    }
}
