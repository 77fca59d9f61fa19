//! IMAP response parser.
//!
//! Hand-rolled lexer plus recursive-descent parsing of the RFC 3501
//! response grammar and the curated extension responses (ESEARCH,
//! VANISHED, ENABLED, NAMESPACE, QUOTA, ACL, METADATA, ID, SORT, THREAD).

#![allow(clippy::missing_errors_doc)]

mod fetch;
mod helpers;
pub mod lexer;
mod types;

pub use types::{
    Address, BodyStructure, Envelope, EsearchResponse, FetchItem, NamespaceEntry,
    NamespaceResponse, QuotaResource, StatusItem, ThreadNode, UntaggedResponse,
};

use crate::types::{ResponseCode, SeqNum, Status, Tag};
use crate::{Error, Result};
use lexer::{Lexer, Token};

use helpers::{
    parse_acl_response, parse_capability_tokens, parse_esearch_response, parse_flag_list,
    parse_id_response, parse_list_response, parse_metadata_response, parse_namespace_response,
    parse_quota_response, parse_quotaroot_response, parse_response_code, parse_search_response,
    parse_status_response, parse_thread_response, parse_vanished_response, read_text_until_crlf,
};

/// A parsed IMAP response line.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Response status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request; carries the challenge/prompt text.
    Continuation {
        /// Optional text or base64 data.
        text: Option<String>,
    },
}

/// Response parser entry point.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete (flattened) response message.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer)
                .map_err(|e| annotate_with_line(e, input)),
            Token::Plus => Self::parse_continuation(&mut lexer),
            Token::Atom(tag) => {
                Self::parse_tagged(&mut lexer, tag).map_err(|e| annotate_with_line(e, input))
            }
            token => Err(Error::parse_line(
                0,
                format!("expected *, +, or tag, got {token:?}"),
                input,
            )),
        }
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag_str: &str) -> Result<Response> {
        lexer.expect_space()?;
        let status = Self::parse_status(lexer)?;
        // Some servers send bare "A001 OK" without trailing text.
        let (code, text) = if lexer.peek() == Some(b' ') {
            lexer.advance();
            Self::parse_resp_text(lexer)?
        } else {
            (None, String::new())
        };

        Ok(Response::Tagged {
            tag: Tag::new(tag_str),
            status,
            code,
            text,
        })
    }

    #[allow(clippy::too_many_lines)]
    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Response> {
        lexer.expect_space()?;

        match lexer.next_token()? {
            Token::Atom(s) => {
                let upper = s.to_uppercase();
                match upper.as_str() {
                    "OK" | "NO" | "BAD" | "PREAUTH" | "BYE" => {
                        let (code, text) = if lexer.peek() == Some(b' ') {
                            lexer.advance();
                            Self::parse_resp_text(lexer)?
                        } else {
                            (None, String::new())
                        };
                        let untagged = match upper.as_str() {
                            "OK" => UntaggedResponse::Ok { code, text },
                            "NO" => UntaggedResponse::No { code, text },
                            "BAD" => UntaggedResponse::Bad { code, text },
                            "PREAUTH" => UntaggedResponse::PreAuth { code, text },
                            _ => UntaggedResponse::Bye { code, text },
                        };
                        Ok(Response::Untagged(untagged))
                    }
                    "CAPABILITY" => {
                        let caps = parse_capability_tokens(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Capability(caps)))
                    }
                    "ENABLED" => {
                        let caps = parse_capability_tokens(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Enabled(caps)))
                    }
                    "FLAGS" => {
                        lexer.expect_space()?;
                        let flags = parse_flag_list(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Flags(flags)))
                    }
                    "LIST" => {
                        lexer.expect_space()?;
                        let list = parse_list_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::List(list)))
                    }
                    "LSUB" => {
                        lexer.expect_space()?;
                        let list = parse_list_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Lsub(list)))
                    }
                    "XLIST" => {
                        lexer.expect_space()?;
                        let list = parse_list_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Xlist(list)))
                    }
                    "SEARCH" => {
                        let nums = parse_search_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Search(nums)))
                    }
                    "ESEARCH" => {
                        let es = parse_esearch_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Esearch(es)))
                    }
                    "SORT" => {
                        let nums = parse_search_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Sort(nums)))
                    }
                    "THREAD" => {
                        lexer.skip_spaces();
                        let forest = parse_thread_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Thread(forest)))
                    }
                    "STATUS" => {
                        lexer.expect_space()?;
                        let (mailbox, items) = parse_status_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Status {
                            mailbox,
                            items,
                        }))
                    }
                    "NAMESPACE" => {
                        lexer.expect_space()?;
                        let ns = parse_namespace_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Namespace(ns)))
                    }
                    "VANISHED" => {
                        lexer.expect_space()?;
                        let (earlier, uids) = parse_vanished_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Vanished {
                            earlier,
                            uids,
                        }))
                    }
                    "QUOTA" => {
                        lexer.expect_space()?;
                        let (root, resources) = parse_quota_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Quota {
                            root,
                            resources,
                        }))
                    }
                    "QUOTAROOT" => {
                        lexer.expect_space()?;
                        let (mailbox, roots) = parse_quotaroot_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::QuotaRoot {
                            mailbox,
                            roots,
                        }))
                    }
                    "ACL" => {
                        lexer.expect_space()?;
                        let (mailbox, entries) = parse_acl_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Acl {
                            mailbox,
                            entries,
                        }))
                    }
                    "LISTRIGHTS" => {
                        lexer.expect_space()?;
                        let mailbox = crate::types::Mailbox::new(lexer.read_astring()?);
                        lexer.expect_space()?;
                        let identifier = lexer.read_astring()?;
                        let mut rights = Vec::new();
                        while lexer.peek() == Some(b' ') {
                            lexer.advance();
                            rights.push(lexer.read_astring()?);
                        }
                        Ok(Response::Untagged(UntaggedResponse::ListRights {
                            mailbox,
                            identifier,
                            rights,
                        }))
                    }
                    "MYRIGHTS" => {
                        lexer.expect_space()?;
                        let mailbox = crate::types::Mailbox::new(lexer.read_astring()?);
                        lexer.expect_space()?;
                        let rights = lexer.read_astring()?;
                        Ok(Response::Untagged(UntaggedResponse::MyRights {
                            mailbox,
                            rights,
                        }))
                    }
                    "METADATA" => {
                        lexer.expect_space()?;
                        let (mailbox, entries) = parse_metadata_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Metadata {
                            mailbox,
                            entries,
                        }))
                    }
                    "ID" => {
                        lexer.expect_space()?;
                        let fields = parse_id_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Id(fields)))
                    }
                    _ => Err(Error::Parse {
                        position: lexer.position(),
                        message: format!("unknown untagged response: {s}"),
                    }),
                }
            }
            Token::Number(n) => {
                let n = u32::try_from(n).map_err(|_| Error::Parse {
                    position: lexer.position(),
                    message: "message number exceeds 32 bits".to_string(),
                })?;
                lexer.expect_space()?;
                let keyword = lexer.read_atom_string()?;

                match keyword.to_uppercase().as_str() {
                    "EXISTS" => Ok(Response::Untagged(UntaggedResponse::Exists(n))),
                    "RECENT" => Ok(Response::Untagged(UntaggedResponse::Recent(n))),
                    "EXPUNGE" => {
                        let seq = SeqNum::new(n).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "invalid sequence number 0".to_string(),
                        })?;
                        Ok(Response::Untagged(UntaggedResponse::Expunge(seq)))
                    }
                    "FETCH" => {
                        let seq = SeqNum::new(n).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "invalid sequence number 0".to_string(),
                        })?;
                        lexer.expect_space()?;
                        let items = fetch::parse_fetch_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Fetch { seq, items }))
                    }
                    other => Err(Error::Parse {
                        position: lexer.position(),
                        message: format!("unknown message data: {other}"),
                    }),
                }
            }
            token => Err(Error::Parse {
                position: lexer.position(),
                message: format!("unexpected token in untagged response: {token:?}"),
            }),
        }
    }

    fn parse_continuation(lexer: &mut Lexer<'_>) -> Result<Response> {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        let text = read_text_until_crlf(lexer);
        Ok(Response::Continuation {
            text: if text.is_empty() { None } else { Some(text) },
        })
    }

    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let atom = lexer.read_atom_string()?;
        match atom.to_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "NO" => Ok(Status::No),
            "BAD" => Ok(Status::Bad),
            "PREAUTH" => Ok(Status::PreAuth),
            "BYE" => Ok(Status::Bye),
            other => Err(Error::Parse {
                position: lexer.position(),
                message: format!("unknown status: {other}"),
            }),
        }
    }

    /// Parses resp-text: optional `[code]` then freeform text.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        let code = if lexer.peek() == Some(b'[') {
            let code = parse_response_code(lexer)?;
            if lexer.peek() == Some(b' ') {
                lexer.advance();
            }
            Some(code)
        } else {
            None
        };

        let text = read_text_until_crlf(lexer);
        Ok((code, text))
    }
}

/// Attaches the raw line to a parse error for diagnostics.
fn annotate_with_line(err: Error, line: &[u8]) -> Error {
    match err {
        Error::Parse { position, message } => Error::parse_line(position, message, line),
        other => other,
    }
}
