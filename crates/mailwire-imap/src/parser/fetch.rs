//! FETCH response parsing.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ModSeq, Uid};
use crate::{Error, Result};

use super::helpers::parse_flag_list;
use super::types::{Address, BodyStructure, Envelope, FetchItem};

/// Parses the parenthesized item list of a FETCH response.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                let upper = name.to_uppercase();
                match upper.as_str() {
                    "FLAGS" => {
                        lexer.expect_space()?;
                        let flags = parse_flag_list(lexer)?;
                        items.push(FetchItem::Flags(flags));
                    }
                    "UID" => {
                        lexer.expect_space()?;
                        let n = lexer.read_number_u32()?;
                        let uid = Uid::new(n).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "invalid UID 0 in FETCH".to_string(),
                        })?;
                        items.push(FetchItem::Uid(uid));
                    }
                    "RFC822.SIZE" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::Rfc822Size(lexer.read_number_u32()?));
                    }
                    "INTERNALDATE" => {
                        lexer.expect_space()?;
                        if let Token::QuotedString(date) = lexer.next_token()? {
                            items.push(FetchItem::InternalDate(date));
                        }
                    }
                    "ENVELOPE" => {
                        lexer.expect_space()?;
                        let envelope = parse_envelope(lexer)?;
                        items.push(FetchItem::Envelope(Box::new(envelope)));
                    }
                    "BODYSTRUCTURE" => {
                        lexer.expect_space()?;
                        let body_structure = parse_body_structure(lexer)?;
                        items.push(FetchItem::BodyStructure(body_structure));
                    }
                    "BODY" | "BODY.PEEK" | "RFC822" | "RFC822.HEADER" | "RFC822.TEXT" => {
                        // BODY followed by '(' (no section) is the legacy
                        // BODY structure; treat like BODYSTRUCTURE.
                        if lexer.peek() == Some(b'(')
                            || (lexer.peek() == Some(b' ') && lexer.peek_at(1) == Some(b'('))
                        {
                            lexer.skip_spaces();
                            let body_structure = parse_body_structure(lexer)?;
                            items.push(FetchItem::BodyStructure(body_structure));
                            continue;
                        }
                        let (section, origin) = parse_section_and_origin(lexer)?;

                        lexer.expect_space()?;
                        let data = match lexer.next_token()? {
                            Token::Literal(d) => Some(d),
                            Token::QuotedString(s) => Some(s.into_bytes()),
                            Token::Nil => None,
                            token => {
                                return Err(Error::Parse {
                                    position: lexer.position(),
                                    message: format!("expected body payload, got {token:?}"),
                                });
                            }
                        };

                        items.push(FetchItem::Body {
                            section,
                            origin,
                            data,
                        });
                    }
                    "BINARY" => {
                        let (section, _) = parse_section_and_origin(lexer)?;
                        lexer.expect_space()?;
                        let data = match lexer.next_token()? {
                            Token::Literal(d) => Some(d),
                            Token::Nil => None,
                            token => {
                                return Err(Error::Parse {
                                    position: lexer.position(),
                                    message: format!("expected binary payload, got {token:?}"),
                                });
                            }
                        };
                        items.push(FetchItem::Binary { section, data });
                    }
                    "BINARY.SIZE" => {
                        let (section, _) = parse_section_and_origin(lexer)?;
                        lexer.expect_space()?;
                        let size = lexer.read_number_u32()?;
                        items.push(FetchItem::BinarySize { section, size });
                    }
                    "MODSEQ" => {
                        lexer.expect_space()?;
                        lexer.expect(Token::LParen)?;
                        let n = lexer.read_number()?;
                        let modseq = ModSeq::new(n).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "invalid MODSEQ 0 in FETCH".to_string(),
                        })?;
                        lexer.expect(Token::RParen)?;
                        items.push(FetchItem::ModSeq(modseq));
                    }
                    "PREVIEW" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::Preview(lexer.read_nstring()?));
                    }
                    "X-GM-LABELS" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::GmLabels(parse_gm_labels(lexer)?));
                    }
                    "X-GM-MSGID" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::GmMsgId(lexer.read_number()?));
                    }
                    "X-GM-THRID" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::GmThreadId(lexer.read_number()?));
                    }
                    "EMAILID" => {
                        lexer.expect_space()?;
                        lexer.expect(Token::LParen)?;
                        let id = lexer.read_astring()?;
                        lexer.expect(Token::RParen)?;
                        items.push(FetchItem::EmailId(id));
                    }
                    "THREADID" => {
                        lexer.expect_space()?;
                        match lexer.next_token()? {
                            Token::Nil => {}
                            Token::LParen => {
                                let id = lexer.read_astring()?;
                                lexer.expect(Token::RParen)?;
                                items.push(FetchItem::ThreadId(id));
                            }
                            token => {
                                return Err(Error::Parse {
                                    position: lexer.position(),
                                    message: format!("expected THREADID data, got {token:?}"),
                                });
                            }
                        }
                    }
                    "SAVEDATE" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::SaveDate(lexer.read_nstring()?));
                    }
                    _ => skip_fetch_item(lexer)?,
                }
            }
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in FETCH items: {token:?}"),
                });
            }
        }
    }

    Ok(items)
}

/// Parses optional `[section]` and `<origin>` suffixes of a BODY/BINARY
/// item. Section text may contain spaces and parentheses
/// (`HEADER.FIELDS (FROM TO)`), so it is scanned bytewise up to `]`.
fn parse_section_and_origin(lexer: &mut Lexer<'_>) -> Result<(Option<String>, Option<u32>)> {
    let mut section = None;
    let mut origin = None;

    if lexer.peek() == Some(b'[') {
        lexer.advance();
        let mut buf = String::new();
        loop {
            match lexer.peek() {
                Some(b']') => {
                    lexer.advance();
                    break;
                }
                Some(b) => {
                    buf.push(char::from(b));
                    lexer.advance();
                }
                None => {
                    return Err(Error::Parse {
                        position: lexer.position(),
                        message: "unterminated body section".to_string(),
                    });
                }
            }
        }
        if !buf.is_empty() {
            section = Some(buf);
        }
    }

    if lexer.peek() == Some(b'<') {
        lexer.advance();
        let mut buf = String::new();
        loop {
            match lexer.peek() {
                Some(b'>') => {
                    lexer.advance();
                    break;
                }
                Some(b) if b.is_ascii_digit() => {
                    buf.push(char::from(b));
                    lexer.advance();
                }
                _ => break,
            }
        }
        origin = buf.parse().ok();
    }

    Ok((section, origin))
}

/// Parses the Gmail label list: `("\\Inbox" "Custom label")` or `()`.
fn parse_gm_labels(lexer: &mut Lexer<'_>) -> Result<Vec<String>> {
    lexer.expect(Token::LParen)?;
    let mut labels = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::QuotedString(s) => labels.push(s),
            Token::Atom(s) => labels.push(s.to_string()),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in X-GM-LABELS: {token:?}"),
                });
            }
        }
    }
    Ok(labels)
}

/// Skips one unknown fetch item value (atom, string, or balanced parens).
fn skip_fetch_item(lexer: &mut Lexer<'_>) -> Result<()> {
    lexer.skip_spaces();
    let mut depth = 0usize;
    loop {
        match lexer.peek() {
            Some(b'(') => {
                depth += 1;
                lexer.advance();
            }
            Some(b')') => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
                lexer.advance();
                if depth == 0 {
                    return Ok(());
                }
            }
            Some(b' ') if depth == 0 => return Ok(()),
            Some(_) => {
                lexer.advance();
            }
            None => return Ok(()),
        }
    }
}

/// Parses an ENVELOPE structure.
pub fn parse_envelope(lexer: &mut Lexer<'_>) -> Result<Envelope> {
    lexer.expect(Token::LParen)?;

    let date = lexer.read_nstring()?;
    lexer.expect_space()?;
    let subject = lexer.read_nstring()?;
    lexer.expect_space()?;
    let from = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let sender = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let reply_to = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let to = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let cc = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let bcc = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let in_reply_to = lexer.read_nstring()?;
    lexer.expect_space()?;
    let message_id = lexer.read_nstring()?;

    lexer.expect(Token::RParen)?;

    Ok(Envelope {
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        in_reply_to,
        message_id,
    })
}

/// Parses an address list (NIL or parenthesized addresses).
fn parse_address_list(lexer: &mut Lexer<'_>) -> Result<Vec<Address>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut addresses = Vec::new();
            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        break;
                    }
                    Some(b'(') => addresses.push(parse_address(lexer)?),
                    Some(b' ') => {
                        lexer.advance();
                    }
                    _ => break,
                }
            }
            Ok(addresses)
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("expected address list, got {token:?}"),
        }),
    }
}

fn parse_address(lexer: &mut Lexer<'_>) -> Result<Address> {
    lexer.expect(Token::LParen)?;

    let name = lexer.read_nstring()?;
    lexer.expect_space()?;
    let adl = lexer.read_nstring()?;
    lexer.expect_space()?;
    let mailbox = lexer.read_nstring()?;
    lexer.expect_space()?;
    let host = lexer.read_nstring()?;

    lexer.expect(Token::RParen)?;

    Ok(Address {
        name,
        adl,
        mailbox,
        host,
    })
}

/// Parses a BODYSTRUCTURE (or legacy BODY) structure.
pub fn parse_body_structure(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    lexer.expect(Token::LParen)?;

    if lexer.peek() == Some(b'(') {
        // Multipart: nested parts then the subtype.
        let mut parts = Vec::new();
        while lexer.peek() == Some(b'(') {
            parts.push(parse_body_structure(lexer)?);
            if lexer.peek() == Some(b' ') {
                lexer.advance();
            }
        }

        let subtype = lexer.read_nstring()?.unwrap_or_default().to_uppercase();
        skip_to_close_paren(lexer)?;

        Ok(BodyStructure::Multipart {
            bodies: parts,
            subtype,
        })
    } else {
        let media_type = lexer.read_nstring()?.unwrap_or_default().to_uppercase();
        lexer.expect_space()?;
        let media_subtype = lexer.read_nstring()?.unwrap_or_default().to_uppercase();
        lexer.expect_space()?;
        let params = parse_body_params(lexer)?;
        lexer.expect_space()?;
        let id = lexer.read_nstring()?;
        lexer.expect_space()?;
        let description = lexer.read_nstring()?;
        lexer.expect_space()?;
        let encoding = lexer.read_nstring()?.unwrap_or_default().to_uppercase();
        lexer.expect_space()?;
        let size = lexer.read_number_u32()?;

        let body = if media_type == "TEXT" {
            lexer.expect_space()?;
            let lines = lexer.read_number_u32()?;
            BodyStructure::Text {
                subtype: media_subtype,
                params,
                id,
                description,
                encoding,
                size,
                lines,
            }
        } else if media_type == "MESSAGE" && media_subtype == "RFC822" {
            lexer.expect_space()?;
            let envelope = parse_envelope(lexer)?;
            lexer.expect_space()?;
            let nested = parse_body_structure(lexer)?;
            lexer.expect_space()?;
            let lines = lexer.read_number_u32()?;
            BodyStructure::Message {
                envelope: Box::new(envelope),
                body: Box::new(nested),
                lines,
            }
        } else {
            BodyStructure::Basic {
                media_type,
                media_subtype,
                params,
                id,
                description,
                encoding,
                size,
            }
        };

        skip_to_close_paren(lexer)?;
        Ok(body)
    }
}

/// Parses body parameter pairs: `("NAME" "value" ...)` or NIL.
fn parse_body_params(lexer: &mut Lexer<'_>) -> Result<Vec<(String, String)>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut params = Vec::new();
            loop {
                match lexer.next_token()? {
                    Token::RParen => break,
                    Token::Space => {}
                    Token::QuotedString(name) => {
                        lexer.expect_space()?;
                        let value = lexer.read_astring()?;
                        params.push((name.to_uppercase(), value));
                    }
                    token => {
                        return Err(Error::Parse {
                            position: lexer.position(),
                            message: format!("unexpected token in body params: {token:?}"),
                        });
                    }
                }
            }
            Ok(params)
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("expected body params, got {token:?}"),
        }),
    }
}

/// Skips remaining optional extension data up to the matching `)`.
fn skip_to_close_paren(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match lexer.peek() {
            Some(b'(') => {
                depth += 1;
                lexer.advance();
            }
            Some(b')') => {
                lexer.advance();
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Some(b'"') => {
                // Skip a quoted string without tripping on ')' inside it.
                lexer.advance();
                while let Some(b) = lexer.advance() {
                    if b == b'\\' {
                        lexer.advance();
                    } else if b == b'"' {
                        break;
                    }
                }
            }
            Some(_) => {
                lexer.advance();
            }
            None => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: "unterminated body structure".to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Flag;

    fn parse(input: &[u8]) -> Vec<FetchItem> {
        let mut lexer = Lexer::new(input);
        parse_fetch_response(&mut lexer).unwrap()
    }

    #[test]
    fn flags_uid_size() {
        let items = parse(b"(FLAGS (\\Seen) UID 7 RFC822.SIZE 1024)");
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[0], FetchItem::Flags(f) if f.contains(&Flag::Seen)));
        assert!(matches!(items[1], FetchItem::Uid(u) if u.get() == 7));
        assert!(matches!(items[2], FetchItem::Rfc822Size(1024)));
    }

    #[test]
    fn body_section_with_literal() {
        let items = parse(b"(UID 7 BODY[HEADER] {12}\r\nSubject: hi\n)");
        let FetchItem::Body {
            section,
            origin,
            data,
        } = &items[1]
        else {
            panic!("expected body item");
        };
        assert_eq!(section.as_deref(), Some("HEADER"));
        assert_eq!(*origin, None);
        assert_eq!(data.as_deref(), Some(&b"Subject: hi\n"[..]));
    }

    #[test]
    fn body_header_fields_section() {
        let items = parse(b"(BODY[HEADER.FIELDS (FROM TO)] {4}\r\nabcd)");
        let FetchItem::Body { section, .. } = &items[0] else {
            panic!("expected body item");
        };
        assert_eq!(section.as_deref(), Some("HEADER.FIELDS (FROM TO)"));
    }

    #[test]
    fn body_partial_origin() {
        let items = parse(b"(BODY[TEXT]<0> {3}\r\nabc)");
        let FetchItem::Body { origin, .. } = &items[0] else {
            panic!("expected body item");
        };
        assert_eq!(*origin, Some(0));
    }

    #[test]
    fn modseq_item() {
        let items = parse(b"(MODSEQ (625140003))");
        assert!(matches!(&items[0], FetchItem::ModSeq(m) if m.get() == 625_140_003));
    }

    #[test]
    fn preview_item() {
        let items = parse(b"(PREVIEW \"Hello there\")");
        assert!(matches!(&items[0], FetchItem::Preview(Some(p)) if p == "Hello there"));

        let items = parse(b"(PREVIEW NIL)");
        assert!(matches!(&items[0], FetchItem::Preview(None)));
    }

    #[test]
    fn gmail_extension_items() {
        let items = parse(
            b"(X-GM-THRID 1278455344230334865 X-GM-MSGID 1278455344230334865 X-GM-LABELS (\"\\\\Inbox\" \"Custom\"))",
        );
        assert!(matches!(items[0], FetchItem::GmThreadId(1_278_455_344_230_334_865)));
        assert!(matches!(items[1], FetchItem::GmMsgId(_)));
        let FetchItem::GmLabels(labels) = &items[2] else {
            panic!("expected labels");
        };
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1], "Custom");
    }

    #[test]
    fn envelope_roundtrip() {
        let raw = b"(ENVELOPE (\"Mon, 7 Feb 1994 21:52:25 -0800\" \"Hi\" ((\"Terry\" NIL \"gray\" \"cac.washington.edu\")) NIL NIL ((NIL NIL \"imap\" \"cac.washington.edu\")) NIL NIL NIL \"<B27397-0100000@cac.washington.edu>\"))";
        let items = parse(raw);
        let FetchItem::Envelope(env) = &items[0] else {
            panic!("expected envelope");
        };
        assert_eq!(env.subject.as_deref(), Some("Hi"));
        assert_eq!(env.from[0].email().unwrap(), "gray@cac.washington.edu");
        assert_eq!(env.to[0].email().unwrap(), "imap@cac.washington.edu");
        assert_eq!(
            env.message_id.as_deref(),
            Some("<B27397-0100000@cac.washington.edu>")
        );
    }

    #[test]
    fn simple_text_bodystructure() {
        let raw = b"(BODYSTRUCTURE (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"US-ASCII\") NIL NIL \"7BIT\" 2279 48))";
        let items = parse(raw);
        let FetchItem::BodyStructure(BodyStructure::Text {
            subtype,
            params,
            encoding,
            size,
            lines,
            ..
        }) = &items[0]
        else {
            panic!("expected text body");
        };
        assert_eq!(subtype, "PLAIN");
        assert_eq!(params[0], ("CHARSET".to_string(), "US-ASCII".to_string()));
        assert_eq!(encoding, "7BIT");
        assert_eq!(*size, 2279);
        assert_eq!(*lines, 48);
    }

    #[test]
    fn multipart_bodystructure() {
        let raw = b"(BODYSTRUCTURE ((\"TEXT\" \"PLAIN\" (\"CHARSET\" \"UTF-8\") NIL NIL \"7BIT\" 10 1)(\"TEXT\" \"HTML\" (\"CHARSET\" \"UTF-8\") NIL NIL \"QUOTED-PRINTABLE\" 20 1) \"ALTERNATIVE\" (\"BOUNDARY\" \"xyz\") NIL NIL))";
        let items = parse(raw);
        let FetchItem::BodyStructure(BodyStructure::Multipart { bodies, subtype }) = &items[0]
        else {
            panic!("expected multipart");
        };
        assert_eq!(subtype, "ALTERNATIVE");
        assert_eq!(bodies.len(), 2);
        assert!(matches!(&bodies[1], BodyStructure::Text { subtype, .. } if subtype == "HTML"));
    }

    #[test]
    fn binary_items() {
        let items = parse(b"(BINARY[1] {3}\r\nabc BINARY.SIZE[1] 3)");
        assert!(
            matches!(&items[0], FetchItem::Binary { section, data } if section.as_deref() == Some("1") && data.as_deref() == Some(&b"abc"[..]))
        );
        assert!(
            matches!(&items[1], FetchItem::BinarySize { section, size } if section.as_deref() == Some("1") && *size == 3)
        );
    }

    #[test]
    fn unknown_item_is_skipped() {
        let items = parse(b"(X-UNKNOWN (a b (c)) UID 9)");
        assert!(matches!(items[0], FetchItem::Uid(u) if u.get() == 9));
    }
}
