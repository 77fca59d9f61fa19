//! Type-state IMAP client.
//!
//! Valid protocol state transitions are enforced at compile time:
//!
//! - `NotAuthenticated`: after the greeting
//! - `Authenticated`: after LOGIN / AUTHENTICATE (or a PREAUTH greeting)
//! - `Selected`: after SELECT / EXAMINE
//!
//! Methods take `&mut self` for same-state commands and `self` for
//! transitions, so one connection never carries two interleaved commands.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod idle;
mod not_authenticated;
mod selected_client;
mod states;

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::idle::{IdleEvent, IdleHandle};
pub use self::not_authenticated::Connected;
pub use self::selected_client::SearchResult;
pub use self::states::{Authenticated, NotAuthenticated, Selected};

use crate::command::{Command, TagGenerator};
use crate::framing::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::qresync::QresyncEvent;
use crate::selected::SelectedState;
use crate::types::{Capabilities, ResponseCode, Status};
use crate::{Error, Result};

/// IMAP client connection; `State` tracks the protocol state.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tags: TagGenerator,
    pub(crate) caps: Capabilities,
    pub(crate) selected: Option<SelectedState>,
    pub(crate) sync_events: Vec<QresyncEvent>,
    pub(crate) _state: PhantomData<State>,
}

impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("capabilities", &self.caps)
            .field("selected", &self.selected.as_ref().map(|s| &s.mailbox))
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the server capability set.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// True when the server advertises `token`.
    #[must_use]
    pub fn supports(&self, token: &str) -> bool {
        self.caps.supports(token)
    }

    /// Drains QRESYNC-visible events collected since the last call.
    pub fn take_sync_events(&mut self) -> Vec<QresyncEvent> {
        std::mem::take(&mut self.sync_events)
    }

    /// Sends NOOP; any untagged updates are folded into local state.
    pub async fn noop(&mut self) -> Result<()> {
        self.run_command(&Command::Noop).await?;
        Ok(())
    }

    /// Requests a fresh CAPABILITY listing.
    pub async fn capability(&mut self) -> Result<()> {
        self.run_command(&Command::Capability).await?;
        Ok(())
    }

    /// Sends LOGOUT and consumes the connection.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tags.next();
        let line = Command::Logout.serialize(&tag);
        self.stream.write_command(&line).await?;

        // BYE followed by the tagged OK; tolerate the server closing first.
        loop {
            match self.stream.read_message().await {
                Ok(message) => {
                    let Ok(response) = ResponseParser::parse(&message.flattened()) else {
                        continue;
                    };
                    if let Response::Tagged { tag: got, .. } = &response {
                        if got.as_str() == tag {
                            return Ok(());
                        }
                    }
                }
                Err(Error::ConnectionClosed) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    /// Issues a command, waits for its tagged completion, and returns all
    /// responses observed (the tagged one last).
    pub(crate) async fn run_command(&mut self, command: &Command) -> Result<Vec<Response>> {
        let tag = self.tags.next();
        let line = command.serialize(&tag);
        log_command(&tag, command);
        self.stream.write_command(&line).await?;
        self.read_until_tagged(&tag).await
    }

    /// Reads responses until the tagged completion for `tag`, routing
    /// untagged responses into capability and selected-mailbox state.
    ///
    /// Returns all responses on OK; maps NO/BAD to errors carrying the
    /// server text; surfaces BYE-then-close as `ConnectionClosed`.
    pub(crate) async fn read_until_tagged(&mut self, tag: &str) -> Result<Vec<Response>> {
        let mut responses = Vec::new();
        let mut saw_bye = false;

        loop {
            let message = match self.stream.read_message().await {
                Ok(m) => m,
                Err(Error::ConnectionClosed) if saw_bye => return Err(Error::ConnectionClosed),
                Err(e) => return Err(e),
            };
            let response = ResponseParser::parse(&message.flattened())?;

            match response {
                Response::Untagged(untagged) => {
                    if matches!(untagged, UntaggedResponse::Bye { .. }) {
                        saw_bye = true;
                    }
                    self.route_untagged(&untagged);
                    responses.push(Response::Untagged(untagged));
                }
                Response::Tagged {
                    tag: got,
                    status,
                    code,
                    text,
                } => {
                    let matches_tag = got.as_str() == tag;
                    if matches_tag {
                        if let Some(ResponseCode::Capability(caps)) = &code {
                            self.caps.replace(caps.iter());
                        }
                        match status {
                            Status::Ok => {
                                responses.push(Response::Tagged {
                                    tag: got,
                                    status,
                                    code,
                                    text,
                                });
                                return Ok(responses);
                            }
                            Status::No => return Err(Error::No(with_code(code.as_ref(), text))),
                            Status::Bad => {
                                return Err(Error::Bad(with_code(code.as_ref(), text)));
                            }
                            Status::Bye | Status::PreAuth => {
                                return Err(Error::Protocol(format!(
                                    "unexpected {status:?} in tagged response"
                                )));
                            }
                        }
                    }
                    // A stale tag from a previous pipeline slot; keep it
                    // with the rest.
                    responses.push(Response::Tagged {
                        tag: got,
                        status,
                        code,
                        text,
                    });
                }
                Response::Continuation { .. } => {
                    return Err(Error::Protocol(
                        "unexpected continuation request".to_string(),
                    ));
                }
            }
        }
    }

    /// Folds one untagged response into shared state.
    pub(crate) fn route_untagged(&mut self, untagged: &UntaggedResponse) {
        match untagged {
            UntaggedResponse::Capability(caps) => self.caps.replace(caps.iter()),
            UntaggedResponse::Ok {
                code: Some(ResponseCode::Capability(caps)),
                ..
            }
            | UntaggedResponse::PreAuth {
                code: Some(ResponseCode::Capability(caps)),
                ..
            } => self.caps.replace(caps.iter()),
            _ => {}
        }

        if let Some(selected) = &mut self.selected {
            let events = selected.apply(untagged);
            self.sync_events.extend(events);
        }
    }

    /// Finds the tagged completion in a response batch.
    pub(crate) fn tagged_code(responses: &[Response]) -> Option<&ResponseCode> {
        responses.iter().rev().find_map(|r| match r {
            Response::Tagged { code, .. } => code.as_ref(),
            _ => None,
        })
    }

    /// Rebuilds the client with a new state marker.
    pub(crate) fn transition<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tags: self.tags,
            caps: self.caps,
            selected: self.selected,
            sync_events: self.sync_events,
            _state: PhantomData,
        }
    }
}

/// Prefixes the server text with its response code, so rejection reasons
/// like `COMPRESSIONACTIVE` survive into the error.
fn with_code(code: Option<&ResponseCode>, text: String) -> String {
    match code {
        Some(code) => format!("[{code:?}] {text}"),
        None => text,
    }
}

/// Logs an outgoing command without exposing credentials.
fn log_command(tag: &str, command: &Command) {
    match command {
        Command::Login { username, .. } => {
            tracing::debug!(tag, %username, "sending LOGIN (password redacted)");
        }
        Command::Authenticate { mechanism, .. } => {
            tracing::debug!(tag, %mechanism, "sending AUTHENTICATE (response redacted)");
        }
        other => {
            tracing::trace!(tag, command = ?other, "sending command");
        }
    }
}
