//! Parser helper functions for untagged response bodies and response codes.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{
    Flag, Flags, ListResponse, Mailbox, MailboxAttribute, ModSeq, ResponseCode, SeqNum, Uid,
    UidSet, UidValidity,
};
use crate::{Error, Result};

use super::types::{
    EsearchResponse, NamespaceEntry, NamespaceResponse, QuotaResource, StatusItem, ThreadNode,
};

/// Parses a bracketed response code: `[CODE args]`.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;

    let atom = lexer.read_atom_string()?;
    let upper = atom.to_uppercase();

    let code = match upper.as_str() {
        "ALERT" => ResponseCode::Alert,
        "BADCHARSET" => ResponseCode::BadCharset,
        "PARSE" => ResponseCode::Parse,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "NOMODSEQ" => ResponseCode::NoModSeq,
        "CLOSED" => ResponseCode::Closed,
        "COMPRESSIONACTIVE" => ResponseCode::CompressionActive,
        "AUTHENTICATIONFAILED" => ResponseCode::AuthenticationFailed,
        "UIDNOTSTICKY" => ResponseCode::UidNotSticky,
        "UIDNEXT" => {
            lexer.expect_space()?;
            let uid = read_uid(lexer)?;
            ResponseCode::UidNext(uid)
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            let n = lexer.read_number_u32()?;
            let validity = UidValidity::new(n).ok_or_else(|| Error::Parse {
                position: lexer.position(),
                message: "invalid UIDVALIDITY 0".to_string(),
            })?;
            ResponseCode::UidValidity(validity)
        }
        "UNSEEN" => {
            lexer.expect_space()?;
            let n = lexer.read_number_u32()?;
            let seq = SeqNum::new(n).ok_or_else(|| Error::Parse {
                position: lexer.position(),
                message: "invalid sequence number 0".to_string(),
            })?;
            ResponseCode::Unseen(seq)
        }
        "HIGHESTMODSEQ" => {
            lexer.expect_space()?;
            let modseq = read_modseq(lexer)?;
            ResponseCode::HighestModSeq(modseq)
        }
        "MODIFIED" => {
            lexer.expect_space()?;
            let set = read_uid_set(lexer)?;
            ResponseCode::Modified(set)
        }
        "CAPABILITY" => {
            let caps = parse_capability_tokens(lexer)?;
            ResponseCode::Capability(caps)
        }
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            let flags = parse_flag_list(lexer)?;
            ResponseCode::PermanentFlags(flags.iter().cloned().collect())
        }
        "APPENDUID" => {
            lexer.expect_space()?;
            let validity = read_uid_validity(lexer)?;
            lexer.expect_space()?;
            let uids = read_uid_set(lexer)?;
            ResponseCode::AppendUid {
                uidvalidity: validity,
                uids,
            }
        }
        "COPYUID" => {
            lexer.expect_space()?;
            let validity = read_uid_validity(lexer)?;
            lexer.expect_space()?;
            let source_uids = read_uid_set(lexer)?;
            lexer.expect_space()?;
            let dest_uids = read_uid_set(lexer)?;
            ResponseCode::CopyUid {
                uidvalidity: validity,
                source_uids,
                dest_uids,
            }
        }
        _ => {
            // Unknown codes keep their name; arguments are skipped below.
            ResponseCode::Unknown(atom.to_string())
        }
    };

    // Skip any unconsumed arguments up to the closing bracket.
    while lexer.peek() != Some(b']') && !lexer.is_eof() {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;

    Ok(code)
}

fn read_uid(lexer: &mut Lexer<'_>) -> Result<Uid> {
    let n = lexer.read_number_u32()?;
    Uid::new(n).ok_or_else(|| Error::Parse {
        position: lexer.position(),
        message: "invalid UID 0".to_string(),
    })
}

fn read_uid_validity(lexer: &mut Lexer<'_>) -> Result<UidValidity> {
    let n = lexer.read_number_u32()?;
    UidValidity::new(n).ok_or_else(|| Error::Parse {
        position: lexer.position(),
        message: "invalid UIDVALIDITY 0".to_string(),
    })
}

fn read_modseq(lexer: &mut Lexer<'_>) -> Result<ModSeq> {
    let n = lexer.read_number()?;
    ModSeq::new(n).ok_or_else(|| Error::Parse {
        position: lexer.position(),
        message: "invalid MODSEQ 0".to_string(),
    })
}

/// Reads a sequence-set token (number or range atom) as a [`UidSet`].
pub fn read_uid_set(lexer: &mut Lexer<'_>) -> Result<UidSet> {
    let text = match lexer.next_token()? {
        Token::Number(n) => n.to_string(),
        Token::Atom(s) => s.to_string(),
        token => {
            return Err(Error::Parse {
                position: lexer.position(),
                message: format!("expected sequence set, got {token:?}"),
            });
        }
    };
    UidSet::parse(&text).map_err(|_| Error::Parse {
        position: lexer.position(),
        message: format!("malformed sequence set: {text:?}"),
    })
}

/// Parses space-separated capability tokens until end of atom run.
pub fn parse_capability_tokens(lexer: &mut Lexer<'_>) -> Result<Vec<String>> {
    let mut caps = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        match lexer.next_token()? {
            Token::Atom(s) => caps.push(s.to_string()),
            Token::Number(n) => caps.push(n.to_string()),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in capability list: {token:?}"),
                });
            }
        }
    }
    Ok(caps)
}

/// Parses a parenthesized flag list.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;

    let mut flags = Flags::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            // The wildcard flag lexes as a lone backslash atom followed
            // by an asterisk token.
            Token::Atom("\\") if lexer.peek() == Some(b'*') => {
                lexer.advance();
                flags.insert(Flag::Wildcard);
            }
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            Token::Space => {}
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in flag list: {token:?}"),
                });
            }
        }
    }
    Ok(flags)
}

/// Parses a LIST/LSUB/XLIST response body.
pub fn parse_list_response(lexer: &mut Lexer<'_>) -> Result<ListResponse> {
    lexer.expect(Token::LParen)?;
    let mut attributes = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Atom(s) => attributes.push(MailboxAttribute::parse(s)),
            Token::Space => {}
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in LIST attributes: {token:?}"),
                });
            }
        }
    }

    lexer.expect_space()?;

    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::QuotedString(s) => s.chars().next(),
        token => {
            return Err(Error::Parse {
                position: lexer.position(),
                message: format!("expected delimiter, got {token:?}"),
            });
        }
    };

    lexer.expect_space()?;
    let mailbox_name = lexer.read_astring()?;

    // LIST-EXTENDED extension data ("CHILDINFO" etc.) is tolerated and
    // skipped; it trails in a parenthesized group.
    lexer.skip_spaces();

    Ok(ListResponse {
        attributes,
        delimiter,
        mailbox: Mailbox::new(mailbox_name),
    })
}

/// Parses the classic `* SEARCH n n n` body.
pub fn parse_search_response(lexer: &mut Lexer<'_>) -> Result<Vec<u32>> {
    let mut numbers = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::Space => {}
            Token::Number(n) => {
                numbers.push(u32::try_from(n).map_err(|_| Error::Parse {
                    position: lexer.position(),
                    message: "search result exceeds 32 bits".to_string(),
                })?);
            }
            Token::Crlf | Token::Eof => break,
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in SEARCH response: {token:?}"),
                });
            }
        }
    }
    Ok(numbers)
}

/// Parses an ESEARCH response body (RFC 4731).
pub fn parse_esearch_response(lexer: &mut Lexer<'_>) -> Result<EsearchResponse> {
    let mut response = EsearchResponse::default();

    loop {
        lexer.skip_spaces();
        match lexer.next_token()? {
            Token::Crlf | Token::Eof => break,
            Token::LParen => {
                // Search correlator: (TAG "A285")
                let keyword = lexer.read_atom_string()?.to_uppercase();
                lexer.expect_space()?;
                let value = lexer.read_astring()?;
                lexer.expect(Token::RParen)?;
                if keyword == "TAG" {
                    response.tag = Some(value);
                }
            }
            Token::Atom(s) => match s.to_uppercase().as_str() {
                "UID" => response.uid = true,
                "MIN" => {
                    lexer.expect_space()?;
                    response.min = Some(lexer.read_number_u32()?);
                }
                "MAX" => {
                    lexer.expect_space()?;
                    response.max = Some(lexer.read_number_u32()?);
                }
                "COUNT" => {
                    lexer.expect_space()?;
                    response.count = Some(lexer.read_number_u32()?);
                }
                "ALL" => {
                    lexer.expect_space()?;
                    response.all = Some(read_uid_set(lexer)?);
                }
                "MODSEQ" => {
                    lexer.expect_space()?;
                    response.modseq = Some(read_modseq(lexer)?);
                }
                other => {
                    return Err(Error::Parse {
                        position: lexer.position(),
                        message: format!("unknown ESEARCH item: {other}"),
                    });
                }
            },
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in ESEARCH response: {token:?}"),
                });
            }
        }
    }

    Ok(response)
}

/// Parses a STATUS response body: `mailbox (ITEM n ...)`.
pub fn parse_status_response(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<StatusItem>)> {
    let mailbox = Mailbox::new(lexer.read_astring()?);
    lexer.expect_space()?;
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                lexer.expect_space()?;
                let item = match name.to_uppercase().as_str() {
                    "MESSAGES" => StatusItem::Messages(lexer.read_number_u32()?),
                    "RECENT" => StatusItem::Recent(lexer.read_number_u32()?),
                    "UIDNEXT" => StatusItem::UidNext(read_uid(lexer)?),
                    "UIDVALIDITY" => StatusItem::UidValidity(read_uid_validity(lexer)?),
                    "UNSEEN" => StatusItem::Unseen(lexer.read_number_u32()?),
                    "HIGHESTMODSEQ" => StatusItem::HighestModSeq(read_modseq(lexer)?),
                    "SIZE" => StatusItem::Size(lexer.read_number()?),
                    other => {
                        return Err(Error::Parse {
                            position: lexer.position(),
                            message: format!("unknown STATUS item: {other}"),
                        });
                    }
                };
                items.push(item);
            }
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in STATUS response: {token:?}"),
                });
            }
        }
    }

    Ok((mailbox, items))
}

/// Parses a VANISHED response body: `(EARLIER)? uid-set`.
pub fn parse_vanished_response(lexer: &mut Lexer<'_>) -> Result<(bool, UidSet)> {
    lexer.skip_spaces();
    let mut earlier = false;

    if lexer.peek() == Some(b'(') {
        lexer.expect(Token::LParen)?;
        let keyword = lexer.read_atom_string()?;
        if keyword.eq_ignore_ascii_case("EARLIER") {
            earlier = true;
        }
        lexer.expect(Token::RParen)?;
        lexer.expect_space()?;
    }

    let uids = read_uid_set(lexer)?;
    Ok((earlier, uids))
}

/// Parses a NAMESPACE response body: three namespace lists.
pub fn parse_namespace_response(lexer: &mut Lexer<'_>) -> Result<NamespaceResponse> {
    let personal = parse_namespace_list(lexer)?;
    lexer.expect_space()?;
    let other_users = parse_namespace_list(lexer)?;
    lexer.expect_space()?;
    let shared = parse_namespace_list(lexer)?;

    Ok(NamespaceResponse {
        personal,
        other_users,
        shared,
    })
}

fn parse_namespace_list(lexer: &mut Lexer<'_>) -> Result<Vec<NamespaceEntry>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut entries = Vec::new();
            loop {
                match lexer.next_token()? {
                    Token::RParen => break,
                    Token::LParen => {
                        let prefix = lexer.read_astring()?;
                        lexer.expect_space()?;
                        let delimiter = match lexer.next_token()? {
                            Token::Nil => None,
                            Token::QuotedString(s) => s.chars().next(),
                            token => {
                                return Err(Error::Parse {
                                    position: lexer.position(),
                                    message: format!("expected namespace delimiter, got {token:?}"),
                                });
                            }
                        };
                        // Namespace response extensions are skipped.
                        while lexer.peek() != Some(b')') && !lexer.is_eof() {
                            lexer.advance();
                        }
                        lexer.expect(Token::RParen)?;
                        entries.push(NamespaceEntry { prefix, delimiter });
                    }
                    Token::Space => {}
                    token => {
                        return Err(Error::Parse {
                            position: lexer.position(),
                            message: format!("unexpected token in namespace list: {token:?}"),
                        });
                    }
                }
            }
            Ok(entries)
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("expected namespace list, got {token:?}"),
        }),
    }
}

/// Parses a THREAD response body: `(2)(3 6 (4 23)(44 7 96))`.
pub fn parse_thread_response(lexer: &mut Lexer<'_>) -> Result<Vec<ThreadNode>> {
    let mut roots = Vec::new();
    loop {
        lexer.skip_spaces();
        match lexer.next_token()? {
            Token::Crlf | Token::Eof => break,
            Token::LParen => {
                if let Some(node) = parse_thread_group(lexer)? {
                    roots.push(node);
                }
            }
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in THREAD response: {token:?}"),
                });
            }
        }
    }
    Ok(roots)
}

/// Parses one parenthesized thread group. Numbers form a parent chain;
/// nested groups branch under the most recent number.
fn parse_thread_group(lexer: &mut Lexer<'_>) -> Result<Option<ThreadNode>> {
    let mut chain: Vec<ThreadNode> = Vec::new();

    loop {
        lexer.skip_spaces();
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Number(n) => {
                let id = u32::try_from(n).map_err(|_| Error::Parse {
                    position: lexer.position(),
                    message: "thread id exceeds 32 bits".to_string(),
                })?;
                chain.push(ThreadNode {
                    id,
                    children: Vec::new(),
                });
            }
            Token::LParen => {
                let child = parse_thread_group(lexer)?;
                if let Some(child) = child {
                    if let Some(last) = chain.last_mut() {
                        last.children.push(child);
                    } else {
                        // Group with no leading number: promote the child.
                        chain.push(child);
                    }
                }
            }
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in thread group: {token:?}"),
                });
            }
        }
    }

    // Fold the chain right-to-left: each number parents the next.
    let mut iter = chain.into_iter().rev();
    let Some(mut node) = iter.next() else {
        return Ok(None);
    };
    for mut parent in iter {
        parent.children.insert(0, node);
        node = parent;
    }
    Ok(Some(node))
}

/// Parses a QUOTA response body: `root (STORAGE 10 512 ...)`.
pub fn parse_quota_response(lexer: &mut Lexer<'_>) -> Result<(String, Vec<QuotaResource>)> {
    let root = lexer.read_astring()?;
    lexer.expect_space()?;
    lexer.expect(Token::LParen)?;

    let mut resources = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                lexer.expect_space()?;
                let usage = lexer.read_number()?;
                lexer.expect_space()?;
                let limit = lexer.read_number()?;
                resources.push(QuotaResource {
                    name: name.to_uppercase(),
                    usage,
                    limit,
                });
            }
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in QUOTA response: {token:?}"),
                });
            }
        }
    }

    Ok((root, resources))
}

/// Parses a QUOTAROOT response body: `mailbox root...`.
pub fn parse_quotaroot_response(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<String>)> {
    let mailbox = Mailbox::new(lexer.read_astring()?);
    let mut roots = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        roots.push(lexer.read_astring()?);
    }
    Ok((mailbox, roots))
}

/// Parses an ACL response body: `mailbox (identifier rights)*`.
pub fn parse_acl_response(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<(String, String)>)> {
    let mailbox = Mailbox::new(lexer.read_astring()?);
    let mut entries = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        let identifier = lexer.read_astring()?;
        lexer.expect_space()?;
        let rights = lexer.read_astring()?;
        entries.push((identifier, rights));
    }
    Ok((mailbox, entries))
}

/// Parses a METADATA response body: `mailbox (entry value ...)` or the
/// unsolicited `mailbox entry-list` form.
pub fn parse_metadata_response(
    lexer: &mut Lexer<'_>,
) -> Result<(Mailbox, Vec<(String, Option<String>)>)> {
    let mailbox = Mailbox::new(lexer.read_astring()?);
    lexer.expect_space()?;

    let mut entries = Vec::new();
    match lexer.next_token()? {
        Token::LParen => loop {
            match lexer.next_token()? {
                Token::RParen => break,
                Token::Space => {}
                Token::Atom(name) => {
                    let name = name.to_string();
                    lexer.expect_space()?;
                    let value = lexer.read_nstring()?;
                    entries.push((name, value));
                }
                Token::QuotedString(name) => {
                    lexer.expect_space()?;
                    let value = lexer.read_nstring()?;
                    entries.push((name, value));
                }
                token => {
                    return Err(Error::Parse {
                        position: lexer.position(),
                        message: format!("unexpected token in METADATA entries: {token:?}"),
                    });
                }
            }
        },
        // Unsolicited form: bare entry names, no values.
        Token::Atom(name) => {
            entries.push((name.to_string(), None));
            while lexer.peek() == Some(b' ') {
                lexer.advance();
                entries.push((lexer.read_astring()?, None));
            }
        }
        token => {
            return Err(Error::Parse {
                position: lexer.position(),
                message: format!("unexpected token in METADATA response: {token:?}"),
            });
        }
    }

    Ok((mailbox, entries))
}

/// Parses an ID response body: `(field value ...)` or NIL.
pub fn parse_id_response(lexer: &mut Lexer<'_>) -> Result<Option<Vec<(String, String)>>> {
    match lexer.next_token()? {
        Token::Nil => Ok(None),
        Token::LParen => {
            let mut fields = Vec::new();
            loop {
                match lexer.next_token()? {
                    Token::RParen => break,
                    Token::Space => {}
                    Token::QuotedString(name) => {
                        lexer.expect_space()?;
                        let value = lexer.read_nstring()?.unwrap_or_default();
                        fields.push((name, value));
                    }
                    token => {
                        return Err(Error::Parse {
                            position: lexer.position(),
                            message: format!("unexpected token in ID response: {token:?}"),
                        });
                    }
                }
            }
            Ok(Some(fields))
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("expected ID data, got {token:?}"),
        }),
    }
}

/// Reads the response text up to end of line.
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    lexer.rest_of_line()
}
