//! Type-state SMTP client.

#![allow(clippy::missing_errors_doc)]

use std::marker::PhantomData;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncRead, AsyncWrite};

use mailwire_net::{NetStream, TlsConfig};
use mailwire_sasl::{Mechanism, Plain, Scram, ScramVariant, Step, select_mechanism};

use super::stream::SmtpStream;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, Capabilities, EnhancedCode, Envelope, Reply, ReplyCode};

/// Type-state marker for the connected (pre-auth) state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for the authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Outcome of submitting one envelope.
#[derive(Debug, Clone)]
pub struct SendResult {
    /// Recipients the server accepted.
    pub accepted: Vec<Address>,
    /// Recipients the server rejected, with their replies.
    pub rejected: Vec<(Address, Reply)>,
    /// Final reply to DATA/BDAT.
    pub reply: Reply,
    /// Enhanced status code of the final reply, when advertised.
    pub enhanced: Option<EnhancedCode>,
}

/// SMTP client; `State` tracks authentication.
pub struct Client<S, State> {
    stream: SmtpStream<S>,
    caps: Capabilities,
    _state: PhantomData<State>,
}

impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("capabilities", &self.caps)
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// The server's advertised capabilities.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let line = self.stream.read_line().await?;
            let last = is_last_reply_line(&line);
            lines.push(line);
            if last {
                break;
            }
        }
        parse_reply(&lines)
    }

    async fn send_command(&mut self, command: &Command) -> Result<Reply> {
        self.stream.write_all(&command.serialize()).await?;
        self.read_reply().await
    }

    fn fail(&self, reply: &Reply) -> Error {
        Error::from_reply(reply, self.caps.enhanced_status_codes())
    }

    fn check_success(&self, reply: Reply) -> Result<Reply> {
        if reply.is_success() {
            Ok(reply)
        } else {
            Err(self.fail(&reply))
        }
    }

    /// Re-runs EHLO, falling back to HELO on a 5xx rejection (which also
    /// clears the extension set).
    async fn do_ehlo(&mut self, hostname: &str) -> Result<()> {
        let reply = self
            .send_command(&Command::Ehlo {
                hostname: hostname.to_string(),
            })
            .await?;

        if reply.is_success() {
            self.caps.update_from_ehlo(&reply.message);
            return Ok(());
        }

        if reply.is_permanent_error() {
            tracing::debug!("EHLO rejected, falling back to HELO");
            let reply = self
                .send_command(&Command::Helo {
                    hostname: hostname.to_string(),
                })
                .await?;
            self.check_success(reply)?;
            self.caps.clear();
            return Ok(());
        }

        Err(self.fail(&reply))
    }

    /// Sends NOOP.
    pub async fn noop(&mut self) -> Result<()> {
        let reply = self.send_command(&Command::Noop).await?;
        self.check_success(reply)?;
        Ok(())
    }

    /// Resets any in-progress transaction.
    pub async fn rset(&mut self) -> Result<()> {
        let reply = self.send_command(&Command::Rset).await?;
        self.check_success(reply)?;
        Ok(())
    }

    /// Verifies an address (VRFY).
    pub async fn vrfy(&mut self, address: &str) -> Result<Reply> {
        let reply = self
            .send_command(&Command::Vrfy {
                address: address.to_string(),
            })
            .await?;
        self.check_success(reply)
    }

    /// Expands a mailing list (EXPN).
    pub async fn expn(&mut self, list: &str) -> Result<Reply> {
        let reply = self
            .send_command(&Command::Expn {
                list: list.to_string(),
            })
            .await?;
        self.check_success(reply)
    }

    /// Requests help text.
    pub async fn help(&mut self, topic: Option<&str>) -> Result<Reply> {
        let reply = self
            .send_command(&Command::Help {
                topic: topic.map(ToString::to_string),
            })
            .await?;
        self.check_success(reply)
    }

    /// Sends QUIT and closes the connection.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(&Command::Quit).await?;
        if reply.is_success() || reply.code == ReplyCode::CLOSING {
            Ok(())
        } else {
            Err(self.fail(&reply))
        }
    }

    /// Submits an envelope and message payload.
    ///
    /// Uses PIPELINING for the MAIL/RCPT/DATA batch and CHUNKING (BDAT)
    /// for the payload when advertised. A recipient rejection does not
    /// abort the transaction unless every recipient is rejected.
    #[allow(clippy::too_many_lines)]
    pub async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<SendResult> {
        let from = envelope.validate()?.clone();

        // SMTPUTF8 is opt-in: required by content, permitted by the server.
        let utf8 = if envelope.needs_utf8() {
            if !self.caps.smtputf8() {
                return Err(Error::InternationalNotSupported);
            }
            true
        } else {
            false
        };

        // SIZE is advisory but a known-over-limit message fails locally.
        if let Some(limit) = self.caps.max_size() {
            if message.len() > limit {
                return Err(Error::MessageTooLarge {
                    size: message.len(),
                    limit,
                });
            }
        }

        let declared_size = self.caps.max_size().map(|_| message.len());
        let chunking = self.caps.chunking();
        let pipelining = self.caps.pipelining();

        let mail = Command::mail_from(envelope, from.as_str(), declared_size, utf8);
        let rcpts: Vec<Command> = envelope.recipients.iter().map(Command::rcpt_to).collect();

        let (mail_reply, rcpt_replies, data_reply) = if pipelining {
            // One batch: MAIL, all RCPTs, and DATA (unless chunking).
            let mut batch = mail.serialize();
            for rcpt in &rcpts {
                batch.extend_from_slice(&rcpt.serialize());
            }
            if !chunking {
                batch.extend_from_slice(&Command::Data.serialize());
            }
            self.stream.write_all(&batch).await?;

            let mail_reply = self.read_reply().await?;
            let mut rcpt_replies = Vec::with_capacity(rcpts.len());
            for _ in &rcpts {
                rcpt_replies.push(self.read_reply().await?);
            }
            let data_reply = if chunking {
                None
            } else {
                Some(self.read_reply().await?)
            };
            (mail_reply, rcpt_replies, data_reply)
        } else {
            let mail_reply = self.send_command(&mail).await?;
            if !mail_reply.is_success() {
                return Err(self.fail(&mail_reply));
            }
            let mut rcpt_replies = Vec::with_capacity(rcpts.len());
            for rcpt in &rcpts {
                rcpt_replies.push(self.send_command(rcpt).await?);
            }
            (mail_reply, rcpt_replies, None)
        };

        if !mail_reply.is_success() {
            return Err(self.fail(&mail_reply));
        }

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for (recipient, reply) in envelope.recipients.iter().zip(rcpt_replies) {
            if reply.is_success() {
                accepted.push(recipient.address.clone());
            } else {
                tracing::debug!(
                    recipient = recipient.address.as_str(),
                    code = reply.code.as_u16(),
                    "recipient rejected"
                );
                rejected.push((recipient.address.clone(), reply));
            }
        }

        if accepted.is_empty() {
            // Nothing left to deliver to; unwind the transaction.
            if let Some(reply) = data_reply {
                if reply.is_intermediate() {
                    // The pipelined DATA was already accepted; terminate
                    // the (empty) payload before resetting.
                    self.stream.write_all(b".\r\n").await?;
                    let _ = self.read_reply().await?;
                }
            }
            self.rset().await?;
            return Err(Error::AllRecipientsRejected);
        }

        let final_reply = if chunking {
            // Single BDAT chunk carrying the whole message, sent raw.
            let bdat = Command::Bdat {
                length: message.len(),
                last: true,
            };
            let mut payload = bdat.serialize();
            payload.extend_from_slice(message);
            self.stream.write_all(&payload).await?;
            self.read_reply().await?
        } else {
            let data_reply = match data_reply {
                Some(reply) => reply,
                None => self.send_command(&Command::Data).await?,
            };
            if !data_reply.is_intermediate() {
                return Err(self.fail(&data_reply));
            }
            self.stream.write_all(&dot_stuff(message)).await?;
            self.read_reply().await?
        };

        if !final_reply.is_success() {
            return Err(self.fail(&final_reply));
        }

        let enhanced = if self.caps.enhanced_status_codes() {
            final_reply.enhanced_code()
        } else {
            None
        };

        Ok(SendResult {
            accepted,
            rejected,
            reply: final_reply,
            enhanced,
        })
    }
}

impl<S> Client<S, Connected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a connected stream and reads the greeting.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut stream = SmtpStream::new(stream);

        let mut lines = Vec::new();
        loop {
            let line = stream.read_line().await?;
            let last = is_last_reply_line(&line);
            lines.push(line);
            if last {
                break;
            }
        }
        let greeting = parse_reply(&lines)?;
        if !greeting.is_success() {
            return Err(Error::Smtp {
                code: greeting.code.as_u16(),
                enhanced: None,
                message: greeting.message_text(),
            });
        }

        let mut caps = Capabilities::default();
        if let Some(first) = greeting.message.first() {
            if let Some(host) = first.split_whitespace().next() {
                caps.hostname = host.to_string();
            }
        }

        Ok(Self {
            stream,
            caps,
            _state: PhantomData,
        })
    }

    /// Sends EHLO (with HELO fallback) and learns capabilities.
    pub async fn ehlo(mut self, hostname: &str) -> Result<Self> {
        self.do_ehlo(hostname).await?;
        Ok(self)
    }

    /// Authenticates with an explicit SASL mechanism.
    pub async fn auth<M: Mechanism + ?Sized>(
        mut self,
        mechanism: &mut M,
    ) -> Result<Client<S, Authenticated>> {
        let offered = self.caps.auth_mechanisms();
        if !offered.iter().any(|m| m.eq_ignore_ascii_case(mechanism.name())) {
            return Err(Error::NotSupported("the requested AUTH mechanism"));
        }

        // SMTP AUTH always allows an initial response.
        let initial = mechanism.initial_response().map(|bytes| {
            if bytes.is_empty() {
                "=".to_string()
            } else {
                STANDARD.encode(bytes)
            }
        });

        let mut reply = self
            .send_command(&Command::Auth {
                mechanism: mechanism.name().to_string(),
                initial_response: initial,
            })
            .await?;

        while reply.code == ReplyCode::AUTH_CONTINUE {
            let challenge = reply
                .message
                .first()
                .map(|line| STANDARD.decode(line.trim()))
                .transpose()
                .map_err(mailwire_sasl::Error::from)?
                .unwrap_or_default();

            match mechanism.step(&challenge) {
                Ok(Step::Response(bytes)) => {
                    let mut line = STANDARD.encode(bytes).into_bytes();
                    line.extend_from_slice(b"\r\n");
                    self.stream.write_all(&line).await?;
                }
                Ok(Step::Done) => {
                    self.stream.write_all(b"\r\n").await?;
                }
                Err(e) => {
                    // Cancel so the server completes the AUTH command.
                    self.stream.write_all(b"*\r\n").await?;
                    let _ = self.read_reply().await;
                    return Err(e.into());
                }
            }
            reply = self.read_reply().await?;
        }

        if reply.is_success() {
            Ok(Client {
                stream: self.stream,
                caps: self.caps,
                _state: PhantomData,
            })
        } else {
            Err(self.fail(&reply))
        }
    }

    /// Authenticates by picking the strongest mutually supported
    /// mechanism.
    pub async fn auth_auto(
        self,
        username: &str,
        password: &str,
        channel_binding: Option<Vec<u8>>,
    ) -> Result<Client<S, Authenticated>> {
        let offered = self.caps.auth_mechanisms();
        let Some(name) = select_mechanism(&offered, channel_binding.is_some()) else {
            return Err(Error::NotSupported("any offered AUTH mechanism"));
        };

        match name {
            "SCRAM-SHA-256-PLUS" | "SCRAM-SHA-1-PLUS" => {
                let variant = if name.starts_with("SCRAM-SHA-256") {
                    ScramVariant::Sha256Plus
                } else {
                    ScramVariant::Sha1Plus
                };
                let binding = channel_binding
                    .ok_or(Error::Sasl(mailwire_sasl::Error::ChannelBindingUnavailable))?;
                let mut mech = Scram::new(variant, username, password).channel_binding(binding);
                self.auth(&mut mech).await
            }
            "SCRAM-SHA-256" => {
                let mut mech = Scram::new(ScramVariant::Sha256, username, password);
                self.auth(&mut mech).await
            }
            "SCRAM-SHA-1" => {
                let mut mech = Scram::new(ScramVariant::Sha1, username, password);
                self.auth(&mut mech).await
            }
            "CRAM-MD5" => {
                let mut mech = mailwire_sasl::CramMd5::new(username, password);
                self.auth(&mut mech).await
            }
            "LOGIN" => {
                let mut mech = mailwire_sasl::Login::new(username, password);
                self.auth(&mut mech).await
            }
            _ => {
                let mut mech = Plain::new(username, password);
                self.auth(&mut mech).await
            }
        }
    }
}

impl Client<NetStream, Connected> {
    /// Performs STARTTLS, upgrades the transport, and re-issues EHLO
    /// (capabilities are always reparsed after the upgrade).
    pub async fn starttls(
        mut self,
        host: &str,
        config: &TlsConfig,
        ehlo_hostname: &str,
    ) -> Result<Self> {
        if !self.caps.starttls() {
            return Err(Error::NotSupported("STARTTLS"));
        }

        let reply = self.send_command(&Command::StartTls).await?;
        self.check_success(reply)?;

        let plain = self.stream.into_inner();
        let tls = plain.upgrade_to_tls(host, config).await?;
        self.stream = SmtpStream::new(tls);
        self.caps.clear();

        self.do_ehlo(ehlo_hostname).await?;
        Ok(self)
    }

    /// The tls-server-end-point channel binding of the transport.
    #[must_use]
    pub fn channel_binding(&mut self) -> Option<Vec<u8>> {
        self.stream.get_mut().channel_binding()
    }
}

/// Dot-stuffs a message body and appends the terminating sequence.
///
/// Lines beginning with `.` get a second `.`; line endings normalize to
/// CRLF; the terminator is `CRLF . CRLF`.
fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 8);

    for line in message.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    // Drop the trailing blank line produced by a final newline in input.
    if message.last() == Some(&b'\n') {
        out.truncate(out.len() - 2);
    }

    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::BodyType;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[test]
    fn dot_stuffing() {
        assert_eq!(dot_stuff(b"hello\r\nworld"), b"hello\r\nworld\r\n.\r\n");
        assert_eq!(dot_stuff(b".leading dot"), b"..leading dot\r\n.\r\n");
        assert_eq!(dot_stuff(b"a\nb\n"), b"a\r\nb\r\n.\r\n");
        assert_eq!(dot_stuff(b""), b"\r\n.\r\n");
    }

    async fn connected(mock: tokio_test::io::Mock) -> Client<tokio_test::io::Mock, Connected> {
        Client::from_stream(mock).await.unwrap()
    }

    #[tokio::test]
    async fn greeting_and_ehlo() {
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail.example.com ESMTP ready\r\n")
            .write(b"EHLO client.local\r\n")
            .read(b"250-mail.example.com\r\n250-PIPELINING\r\n250 SIZE 1000\r\n")
            .build();
        let client = connected(mock).await.ehlo("client.local").await.unwrap();
        assert!(client.capabilities().pipelining());
        assert_eq!(client.capabilities().max_size(), Some(1000));
    }

    #[tokio::test]
    async fn ehlo_falls_back_to_helo() {
        let mock = tokio_test::io::Builder::new()
            .read(b"220 old.example.com ready\r\n")
            .write(b"EHLO client.local\r\n")
            .read(b"502 command not implemented\r\n")
            .write(b"HELO client.local\r\n")
            .read(b"250 old.example.com\r\n")
            .build();
        let client = connected(mock).await.ehlo("client.local").await.unwrap();
        assert!(!client.capabilities().pipelining());
        assert!(client.capabilities().auth_mechanisms().is_empty());
    }

    #[tokio::test]
    async fn pipelined_send_with_enhanced_code() {
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail.example.com ready\r\n")
            .write(b"EHLO client.local\r\n")
            .read(b"250-mail.example.com\r\n250-PIPELINING\r\n250 ENHANCEDSTATUSCODES\r\n")
            .write(b"MAIL FROM:<a@x.com>\r\nRCPT TO:<b@y.com>\r\nDATA\r\n")
            .read(b"250 OK\r\n250 OK\r\n354 End data with <CR><LF>.<CR><LF>\r\n")
            .write(b"Subject: t\r\n\r\nbody\r\n.\r\n")
            .read(b"250 2.0.0 Ok: queued\r\n")
            .build();
        let mut client = connected(mock).await.ehlo("client.local").await.unwrap();

        let envelope = Envelope::new()
            .sender(addr("a@x.com"))
            .recipient(addr("b@y.com"));
        let result = client
            .send(&envelope, b"Subject: t\r\n\r\nbody")
            .await
            .unwrap();

        assert_eq!(result.accepted.len(), 1);
        assert!(result.rejected.is_empty());
        let enhanced = result.enhanced.unwrap();
        assert_eq!((enhanced.class, enhanced.subject, enhanced.detail), (2, 0, 0));
    }

    #[tokio::test]
    async fn partial_recipient_rejection_continues() {
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail ready\r\n")
            .write(b"EHLO c\r\n")
            .read(b"250-mail\r\n250 PIPELINING\r\n")
            .write(b"MAIL FROM:<a@x.com>\r\nRCPT TO:<b@y.com>\r\nRCPT TO:<c@z.com>\r\nDATA\r\n")
            .read(b"250 OK\r\n250 OK\r\n550 no such user\r\n354 go\r\n")
            .write(b"hi\r\n.\r\n")
            .read(b"250 OK\r\n")
            .build();
        let mut client = connected(mock).await.ehlo("c").await.unwrap();

        let envelope = Envelope::new()
            .sender(addr("a@x.com"))
            .recipient(addr("b@y.com"))
            .recipient(addr("c@z.com"));
        let result = client.send(&envelope, b"hi").await.unwrap();

        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].1.code.as_u16(), 550);
    }

    #[tokio::test]
    async fn all_recipients_rejected_aborts() {
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail ready\r\n")
            .write(b"EHLO c\r\n")
            .read(b"250-mail\r\n250 PIPELINING\r\n")
            .write(b"MAIL FROM:<a@x.com>\r\nRCPT TO:<b@y.com>\r\nDATA\r\n")
            .read(b"250 OK\r\n550 no\r\n554 no valid recipients\r\n")
            .write(b"RSET\r\n")
            .read(b"250 OK\r\n")
            .build();
        let mut client = connected(mock).await.ehlo("c").await.unwrap();

        let envelope = Envelope::new()
            .sender(addr("a@x.com"))
            .recipient(addr("b@y.com"));
        let err = client.send(&envelope, b"hi").await.unwrap_err();
        assert!(matches!(err, Error::AllRecipientsRejected));
    }

    #[tokio::test]
    async fn chunking_uses_bdat() {
        let mut expected = b"BDAT 2 LAST\r\n".to_vec();
        expected.extend_from_slice(b"hi");
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail ready\r\n")
            .write(b"EHLO c\r\n")
            .read(b"250-mail\r\n250 CHUNKING\r\n")
            .write(b"MAIL FROM:<a@x.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<b@y.com>\r\n")
            .read(b"250 OK\r\n")
            .write(&expected)
            .read(b"250 OK\r\n")
            .build();
        let mut client = connected(mock).await.ehlo("c").await.unwrap();

        let envelope = Envelope::new()
            .sender(addr("a@x.com"))
            .recipient(addr("b@y.com"));
        let result = client.send(&envelope, b"hi").await.unwrap();
        assert_eq!(result.accepted.len(), 1);
    }

    #[tokio::test]
    async fn oversized_message_rejected_locally() {
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail ready\r\n")
            .write(b"EHLO c\r\n")
            .read(b"250-mail\r\n250 SIZE 4\r\n")
            .build();
        let mut client = connected(mock).await.ehlo("c").await.unwrap();

        let envelope = Envelope::new()
            .sender(addr("a@x.com"))
            .recipient(addr("b@y.com"));
        let err = client.send(&envelope, b"too large").await.unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { .. }));
    }

    #[tokio::test]
    async fn smtputf8_required_but_missing() {
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail ready\r\n")
            .write(b"EHLO c\r\n")
            .read(b"250 mail\r\n")
            .build();
        let mut client = connected(mock).await.ehlo("c").await.unwrap();

        let envelope = Envelope::new()
            .sender(addr("usér@x.com"))
            .recipient(addr("b@y.com"));
        let err = client.send(&envelope, b"hi").await.unwrap_err();
        assert!(matches!(err, Error::InternationalNotSupported));
    }

    #[tokio::test]
    async fn smtputf8_and_8bitmime_parameters_emitted() {
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail ready\r\n")
            .write(b"EHLO c\r\n")
            .read(b"250-mail\r\n250-SMTPUTF8\r\n250-8BITMIME\r\n250 SIZE 1000\r\n")
            .write("MAIL FROM:<usér@x.com> SIZE=2 BODY=8BITMIME SMTPUTF8\r\n".as_bytes())
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<b@y.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"DATA\r\n")
            .read(b"354 go\r\n")
            .write(b"hi\r\n.\r\n")
            .read(b"250 OK\r\n")
            .build();
        let mut client = connected(mock).await.ehlo("c").await.unwrap();

        let envelope = Envelope::new()
            .sender(addr("usér@x.com"))
            .recipient(addr("b@y.com"))
            .body(BodyType::EightBitMime);
        let result = client.send(&envelope, b"hi").await.unwrap();
        assert_eq!(result.accepted.len(), 1);
    }

    #[tokio::test]
    async fn auth_plain_initial_response() {
        let ir = STANDARD.encode(b"\0u\0p");
        let line = format!("AUTH PLAIN {ir}\r\n");
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail ready\r\n")
            .write(b"EHLO c\r\n")
            .read(b"250-mail\r\n250 AUTH PLAIN LOGIN\r\n")
            .write(line.as_bytes())
            .read(b"235 2.7.0 accepted\r\n")
            .build();
        let client = connected(mock).await.ehlo("c").await.unwrap();

        let mut mech = Plain::new("u", "p");
        client.auth(&mut mech).await.unwrap();
    }

    #[tokio::test]
    async fn auth_login_challenge_loop() {
        let user = STANDARD.encode(b"u");
        let pass = STANDARD.encode(b"p");
        let user_line = format!("{user}\r\n");
        let pass_line = format!("{pass}\r\n");
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail ready\r\n")
            .write(b"EHLO c\r\n")
            .read(b"250-mail\r\n250 AUTH LOGIN\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(user_line.as_bytes())
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(pass_line.as_bytes())
            .read(b"235 accepted\r\n")
            .build();
        let client = connected(mock).await.ehlo("c").await.unwrap();

        let mut mech = mailwire_sasl::Login::new("u", "p");
        client.auth(&mut mech).await.unwrap();
    }

    #[tokio::test]
    async fn auth_failure_surfaces_code() {
        let ir = STANDARD.encode(b"\0u\0bad");
        let line = format!("AUTH PLAIN {ir}\r\n");
        let mock = tokio_test::io::Builder::new()
            .read(b"220 mail ready\r\n")
            .write(b"EHLO c\r\n")
            .read(b"250-mail\r\n250 AUTH PLAIN\r\n")
            .write(line.as_bytes())
            .read(b"535 5.7.8 authentication failed\r\n")
            .build();
        let client = connected(mock).await.ehlo("c").await.unwrap();

        let mut mech = Plain::new("u", "bad");
        let err = client.auth(&mut mech).await.unwrap_err();
        assert!(matches!(err, Error::Smtp { code: 535, .. }));
    }
}
