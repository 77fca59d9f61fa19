//! Command serialization helpers.

use crate::types::Mailbox;

use super::types::{FetchAttribute, FetchItems, StoreAction, StoreMode};

/// Writes an astring (atom or quoted string).
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a mailbox name.
pub fn write_mailbox(buf: &mut Vec<u8>, mailbox: &Mailbox) {
    write_astring(buf, mailbox.as_str());
}

const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

/// Writes FETCH items.
pub fn write_fetch_items(buf: &mut Vec<u8>, items: &FetchItems) {
    match items {
        FetchItems::All => buf.extend_from_slice(b"ALL"),
        FetchItems::Full => buf.extend_from_slice(b"FULL"),
        FetchItems::Fast => buf.extend_from_slice(b"FAST"),
        FetchItems::Items(attrs) => {
            if let [single] = attrs.as_slice() {
                write_fetch_attribute(buf, single);
            } else {
                buf.push(b'(');
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    write_fetch_attribute(buf, attr);
                }
                buf.push(b')');
            }
        }
    }
}

fn write_fetch_attribute(buf: &mut Vec<u8>, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => buf.extend_from_slice(b"FLAGS"),
        FetchAttribute::InternalDate => buf.extend_from_slice(b"INTERNALDATE"),
        FetchAttribute::Rfc822Size => buf.extend_from_slice(b"RFC822.SIZE"),
        FetchAttribute::Envelope => buf.extend_from_slice(b"ENVELOPE"),
        FetchAttribute::BodyStructure => buf.extend_from_slice(b"BODYSTRUCTURE"),
        FetchAttribute::Uid => buf.extend_from_slice(b"UID"),
        FetchAttribute::ModSeq => buf.extend_from_slice(b"MODSEQ"),
        FetchAttribute::SaveDate => buf.extend_from_slice(b"SAVEDATE"),
        FetchAttribute::ObjectId => buf.extend_from_slice(b"EMAILID THREADID"),
        FetchAttribute::GmailIds => buf.extend_from_slice(b"X-GM-MSGID X-GM-THRID X-GM-LABELS"),
        FetchAttribute::Preview { lazy } => {
            if *lazy {
                buf.extend_from_slice(b"PREVIEW (LAZY)");
            } else {
                buf.extend_from_slice(b"PREVIEW");
            }
        }
        FetchAttribute::Body {
            section,
            peek,
            partial,
        } => {
            if *peek {
                buf.extend_from_slice(b"BODY.PEEK[");
            } else {
                buf.extend_from_slice(b"BODY[");
            }
            if let Some(s) = section {
                buf.extend_from_slice(s.as_bytes());
            }
            buf.push(b']');
            if let Some((start, len)) = partial {
                buf.extend_from_slice(format!("<{start}.{len}>").as_bytes());
            }
        }
        FetchAttribute::Binary {
            section,
            peek,
            partial,
        } => {
            if *peek {
                buf.extend_from_slice(b"BINARY.PEEK[");
            } else {
                buf.extend_from_slice(b"BINARY[");
            }
            buf.extend_from_slice(section.as_bytes());
            buf.push(b']');
            if let Some((start, len)) = partial {
                buf.extend_from_slice(format!("<{start}.{len}>").as_bytes());
            }
        }
        FetchAttribute::BinarySize { section } => {
            buf.extend_from_slice(b"BINARY.SIZE[");
            buf.extend_from_slice(section.as_bytes());
            buf.push(b']');
        }
    }
}

/// Writes a STORE action.
pub fn write_store_action(buf: &mut Vec<u8>, action: &StoreAction, silent: bool) {
    if let Some(modseq) = action.unchanged_since {
        buf.extend_from_slice(format!("(UNCHANGEDSINCE {modseq}) ").as_bytes());
    }
    let prefix = match action.mode {
        StoreMode::Set => "FLAGS",
        StoreMode::Add => "+FLAGS",
        StoreMode::Remove => "-FLAGS",
    };
    buf.extend_from_slice(prefix.as_bytes());
    if silent {
        buf.extend_from_slice(b".SILENT");
    }
    buf.extend_from_slice(b" (");
    for (i, flag) in action.flags.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        buf.extend_from_slice(flag.as_str().as_bytes());
    }
    buf.push(b')');
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Flag;

    fn to_string(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut buf = Vec::new();
        f(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn astring_quoting() {
        assert_eq!(to_string(|b| write_astring(b, "INBOX")), "INBOX");
        assert_eq!(to_string(|b| write_astring(b, "My Mail")), "\"My Mail\"");
        assert_eq!(to_string(|b| write_astring(b, "")), "\"\"");
        assert_eq!(to_string(|b| write_astring(b, "a\"b")), "\"a\\\"b\"");
    }

    #[test]
    fn fetch_single_attribute_unparenthesized() {
        let items = FetchItems::Items(vec![FetchAttribute::Flags]);
        assert_eq!(to_string(|b| write_fetch_items(b, &items)), "FLAGS");
    }

    #[test]
    fn fetch_body_peek_partial() {
        let items = FetchItems::Items(vec![
            FetchAttribute::Uid,
            FetchAttribute::Body {
                section: Some("TEXT".to_string()),
                peek: true,
                partial: Some((0, 256)),
            },
        ]);
        assert_eq!(
            to_string(|b| write_fetch_items(b, &items)),
            "(UID BODY.PEEK[TEXT]<0.256>)"
        );
    }

    #[test]
    fn fetch_preview_lazy() {
        let items = FetchItems::Items(vec![FetchAttribute::Preview { lazy: true }]);
        assert_eq!(to_string(|b| write_fetch_items(b, &items)), "PREVIEW (LAZY)");
    }

    #[test]
    fn store_action_serialization() {
        let action = super::super::types::StoreAction::add(vec![Flag::Seen]);
        assert_eq!(
            to_string(|b| write_store_action(b, &action, true)),
            "+FLAGS.SILENT (\\Seen)"
        );
    }

    #[test]
    fn store_action_unchanged_since() {
        let action = super::super::types::StoreAction::set(vec![Flag::Deleted]).unchanged_since(42);
        assert_eq!(
            to_string(|b| write_store_action(b, &action, false)),
            "(UNCHANGEDSINCE 42) FLAGS (\\Deleted)"
        );
    }
}
