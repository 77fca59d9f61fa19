//! IDLE mode (RFC 2177).
//!
//! IDLE is a distinct session mode: after the continuation is received,
//! the server pushes untagged updates until the client writes `DONE` as
//! raw framing (not a new tagged command). The handle keeps exclusive use
//! of the client, so no other command can be issued mid-IDLE.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;

use super::states::Selected;
use super::Client;
use crate::command::Command;
use crate::parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
use crate::types::{SeqNum, UidSet};
use crate::{Error, Result};

/// Event received while idling.
#[derive(Debug, Clone, PartialEq)]
pub enum IdleEvent {
    /// New message count.
    Exists(u32),
    /// Recent count changed.
    Recent(u32),
    /// A message was expunged.
    Expunge(SeqNum),
    /// Messages vanished (QRESYNC).
    Vanished(UidSet),
    /// Message metadata changed.
    Fetch {
        /// Sequence number.
        seq: SeqNum,
        /// Changed items.
        items: Vec<FetchItem>,
    },
    /// No event within the wait window.
    Timeout,
    /// The server ended IDLE on its own; issue `done` and re-enter.
    Ended,
}

/// Handle for an active IDLE session.
pub struct IdleHandle<'a, S> {
    client: &'a mut Client<S, Selected>,
    tag: String,
    ended: bool,
}

impl<S> std::fmt::Debug for IdleHandle<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleHandle")
            .field("client", &self.client)
            .field("tag", &self.tag)
            .field("ended", &self.ended)
            .finish()
    }
}

impl<'a, S> IdleHandle<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(client: &'a mut Client<S, Selected>, tag: String) -> Self {
        Self {
            client,
            tag,
            ended: false,
        }
    }

    /// Waits up to `duration` for a server event.
    ///
    /// Untagged responses also update the selected-mailbox state, so
    /// counters stay correct even if the caller ignores events.
    ///
    /// RFC 2177 recommends re-issuing IDLE at least every 29 minutes;
    /// most servers drop idle connections sooner.
    pub async fn wait(&mut self, duration: Duration) -> Result<IdleEvent> {
        if self.ended {
            return Ok(IdleEvent::Ended);
        }
        match timeout(duration, self.client.stream.read_message()).await {
            Ok(Ok(message)) => self.handle_message(&message.flattened()),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(IdleEvent::Timeout),
        }
    }

    fn handle_message(&mut self, raw: &[u8]) -> Result<IdleEvent> {
        match ResponseParser::parse(raw)? {
            Response::Untagged(untagged) => {
                self.client.route_untagged(&untagged);
                Ok(match untagged {
                    UntaggedResponse::Exists(n) => IdleEvent::Exists(n),
                    UntaggedResponse::Recent(n) => IdleEvent::Recent(n),
                    UntaggedResponse::Expunge(seq) => IdleEvent::Expunge(seq),
                    UntaggedResponse::Vanished { uids, .. } => IdleEvent::Vanished(uids),
                    UntaggedResponse::Fetch { seq, items } => IdleEvent::Fetch { seq, items },
                    UntaggedResponse::Bye { text, .. } => return Err(Error::Bye(text)),
                    _ => IdleEvent::Timeout,
                })
            }
            Response::Tagged { tag, status, text, .. } => {
                if tag.as_str() == self.tag {
                    self.ended = true;
                    match status {
                        crate::types::Status::Ok => Ok(IdleEvent::Ended),
                        crate::types::Status::No => Err(Error::No(text)),
                        crate::types::Status::Bad => Err(Error::Bad(text)),
                        _ => Err(Error::Protocol("unexpected status ending IDLE".to_string())),
                    }
                } else {
                    Err(Error::Protocol(format!(
                        "unexpected tag {} during IDLE",
                        tag.as_str()
                    )))
                }
            }
            Response::Continuation { .. } => Err(Error::Protocol(
                "unexpected continuation during IDLE".to_string(),
            )),
        }
    }

    /// Ends IDLE by writing `DONE` and consuming the tagged completion.
    pub async fn done(self) -> Result<()> {
        if self.ended {
            return Ok(());
        }
        let done = Command::Done.serialize("");
        self.client.stream.write_raw(&done).await?;

        loop {
            let message = self.client.stream.read_message().await?;
            match ResponseParser::parse(&message.flattened())? {
                Response::Untagged(untagged) => self.client.route_untagged(&untagged),
                Response::Tagged { tag, status, text, .. } => {
                    if tag.as_str() != self.tag {
                        return Err(Error::Protocol(format!(
                            "unexpected tag {} completing IDLE",
                            tag.as_str()
                        )));
                    }
                    return match status {
                        crate::types::Status::Ok => Ok(()),
                        crate::types::Status::No => Err(Error::No(text)),
                        crate::types::Status::Bad => Err(Error::Bad(text)),
                        _ => Err(Error::Protocol("unexpected status ending IDLE".to_string())),
                    };
                }
                Response::Continuation { .. } => {
                    return Err(Error::Protocol(
                        "unexpected continuation completing IDLE".to_string(),
                    ));
                }
            }
        }
    }
}
