//! POP3 connection and type-state client.

#![allow(clippy::missing_errors_doc)]

use std::marker::PhantomData;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use mailwire_net::{NetStream, TlsConfig};
use mailwire_sasl::{Mechanism, Plain, Step, select_mechanism};

use crate::error::{Error, Result};
use crate::types::{Capabilities, ListEntry, Stat, StatusLine, UidlEntry, apop_timestamp};

/// Maximum response line length.
const MAX_LINE_LENGTH: usize = 16 * 1024;

/// Type-state marker for the authorization state (pre-login).
#[derive(Debug)]
pub struct Authorization;

/// Type-state marker for the transaction state (post-login).
#[derive(Debug)]
pub struct Transaction;

/// POP3 client; `State` tracks the protocol state.
///
/// DELE only marks messages; RSET clears the marks and QUIT commits them
/// server-side. Marks are discarded on abrupt disconnect.
pub struct Client<S, State> {
    reader: BufReader<S>,
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
    /// The server's advertised capabilities (empty until CAPA succeeds).
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::ConnectionClosed);
            }
            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..pos]);
                self.reader.consume(pos + 1);
                break;
            }
            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);
            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("response line too long".into()));
            }
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        String::from_utf8(line).map_err(|_| Error::Protocol("non-UTF-8 response".into()))
    }

    async fn read_status(&mut self) -> Result<StatusLine> {
        let line = self.read_line().await?;
        StatusLine::parse(&line)
            .ok_or_else(|| Error::Protocol(format!("malformed status line: {line:?}")))
    }

    /// Reads a status line, mapping `-ERR` to an error.
    async fn read_ok(&mut self) -> Result<String> {
        match self.read_status().await? {
            StatusLine::Ok(text) => Ok(text),
            StatusLine::Err(text) => Err(Error::Err(text)),
            StatusLine::Continuation(_) => {
                Err(Error::Protocol("unexpected continuation".into()))
            }
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\r\n").await?;
        stream.flush().await?;
        Ok(())
    }

    async fn command(&mut self, line: &str) -> Result<String> {
        tracing::trace!(command = line.split_whitespace().next(), "sending command");
        self.write_line(line).await?;
        self.read_ok().await
    }

    /// Reads a dot-stuffed multiline body terminated by a lone `.`.
    ///
    /// Lines beginning with `.` have one dot stripped.
    async fn read_multiline(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line == "." {
                break;
            }
            if let Some(stripped) = line.strip_prefix('.') {
                lines.push(stripped.to_string());
            } else {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// Sends NOOP.
    pub async fn noop(&mut self) -> Result<()> {
        self.command("NOOP").await?;
        Ok(())
    }

    /// Sends QUIT. In the transaction state this commits DELE marks.
    pub async fn quit(mut self) -> Result<()> {
        self.command("QUIT").await?;
        Ok(())
    }

    fn transition<Next>(self) -> Client<S, Next> {
        Client {
            reader: self.reader,
            caps: self.caps,
            _state: PhantomData,
        }
    }
}

impl<S> Client<S, Authorization>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the greeting from a connected stream and builds a client.
    ///
    /// An APOP timestamp in the greeting is captured for [`Self::apop`].
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut client = Self {
            reader: BufReader::new(stream),
            caps: Capabilities::default(),
            _state: PhantomData,
        };

        let greeting = client.read_ok().await?;
        client.caps.apop_timestamp = apop_timestamp(&greeting);
        tracing::debug!(
            apop = client.caps.apop_timestamp.is_some(),
            "POP3 greeting received"
        );
        Ok(client)
    }

    /// Requests the capability list (RFC 2449). Missing CAPA support is
    /// not an error; the set simply stays empty.
    pub async fn capa(&mut self) -> Result<()> {
        self.write_line("CAPA").await?;
        match self.read_status().await? {
            StatusLine::Ok(_) => {
                let lines = self.read_multiline().await?;
                self.caps.update(&lines);
                Ok(())
            }
            StatusLine::Err(text) => {
                tracing::debug!(text, "CAPA unsupported, assuming minimal feature set");
                Ok(())
            }
            StatusLine::Continuation(_) => {
                Err(Error::Protocol("unexpected continuation after CAPA".into()))
            }
        }
    }

    /// Authenticates with USER/PASS.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Transaction>> {
        self.command(&format!("USER {username}")).await?;
        // PASS is logged by command name only; the line itself never is.
        self.write_line(&format!("PASS {password}")).await?;
        self.read_ok().await?;
        Ok(self.transition())
    }

    /// Authenticates with APOP (MD5 of greeting timestamp + password).
    pub async fn apop(mut self, username: &str, password: &str) -> Result<Client<S, Transaction>> {
        let Some(timestamp) = self.caps.apop_timestamp.clone() else {
            return Err(Error::NotSupported("APOP (no greeting timestamp)"));
        };

        let digest = Md5::digest(format!("{timestamp}{password}").as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.command(&format!("APOP {username} {hex}")).await?;
        Ok(self.transition())
    }

    /// Authenticates with a SASL mechanism over AUTH (RFC 5034).
    pub async fn auth<M: Mechanism + ?Sized>(
        mut self,
        mechanism: &mut M,
    ) -> Result<Client<S, Transaction>> {
        let initial = mechanism.initial_response().map(|bytes| {
            if bytes.is_empty() {
                "=".to_string()
            } else {
                STANDARD.encode(bytes)
            }
        });

        let line = match &initial {
            Some(ir) => format!("AUTH {} {ir}", mechanism.name()),
            None => format!("AUTH {}", mechanism.name()),
        };
        self.write_line(&line).await?;

        loop {
            match self.read_status().await? {
                StatusLine::Continuation(data) => {
                    let challenge = STANDARD
                        .decode(data.trim())
                        .map_err(mailwire_sasl::Error::from)?;
                    match mechanism.step(&challenge) {
                        Ok(Step::Response(bytes)) => {
                            let encoded = STANDARD.encode(bytes);
                            self.write_line(&encoded).await?;
                        }
                        Ok(Step::Done) => {
                            self.write_line("").await?;
                        }
                        Err(e) => {
                            self.write_line("*").await?;
                            let _ = self.read_status().await;
                            return Err(e.into());
                        }
                    }
                }
                StatusLine::Ok(_) => return Ok(self.transition()),
                StatusLine::Err(text) => return Err(Error::Err(text)),
            }
        }
    }

    /// Authenticates by picking the strongest mutually supported SASL
    /// mechanism, falling back to APOP then USER/PASS.
    pub async fn auth_auto(
        self,
        username: &str,
        password: &str,
        channel_binding: Option<Vec<u8>>,
    ) -> Result<Client<S, Transaction>> {
        let offered = self.caps.sasl_mechanisms();
        if let Some(name) = select_mechanism(&offered, channel_binding.is_some()) {
            use mailwire_sasl::{CramMd5, Login, Scram, ScramVariant};
            return match name {
                "SCRAM-SHA-256-PLUS" | "SCRAM-SHA-1-PLUS" => {
                    let variant = if name.starts_with("SCRAM-SHA-256") {
                        ScramVariant::Sha256Plus
                    } else {
                        ScramVariant::Sha1Plus
                    };
                    let binding = channel_binding.ok_or(Error::Sasl(
                        mailwire_sasl::Error::ChannelBindingUnavailable,
                    ))?;
                    let mut mech =
                        Scram::new(variant, username, password).channel_binding(binding);
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
                    let mut mech = CramMd5::new(username, password);
                    self.auth(&mut mech).await
                }
                "LOGIN" => {
                    let mut mech = Login::new(username, password);
                    self.auth(&mut mech).await
                }
                _ => {
                    let mut mech = Plain::new(username, password);
                    self.auth(&mut mech).await
                }
            };
        }

        if self.caps.apop_timestamp.is_some() {
            return self.apop(username, password).await;
        }
        self.login(username, password).await
    }
}

impl Client<NetStream, Authorization> {
    /// Performs STLS (RFC 2595), upgrading to TLS and resetting the
    /// capability cache.
    pub async fn stls(mut self, host: &str, config: &TlsConfig) -> Result<Self> {
        if !self.caps.is_empty() && !self.caps.stls() {
            return Err(Error::NotSupported("STLS"));
        }

        self.command("STLS").await?;

        let plain = self.reader.into_inner();
        let tls = plain.upgrade_to_tls(host, config).await?;
        self.reader = BufReader::new(tls);
        self.caps.clear();
        Ok(self)
    }

    /// The tls-server-end-point channel binding of the transport.
    #[must_use]
    pub fn channel_binding(&mut self) -> Option<Vec<u8>> {
        self.reader.get_mut().channel_binding()
    }
}

impl<S> Client<S, Transaction>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Requests maildrop statistics.
    pub async fn stat(&mut self) -> Result<Stat> {
        let text = self.command("STAT").await?;
        let mut parts = text.split_whitespace();
        let count = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::Protocol(format!("malformed STAT reply: {text:?}")))?;
        let size = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::Protocol(format!("malformed STAT reply: {text:?}")))?;
        Ok(Stat { count, size })
    }

    /// Lists all messages with sizes.
    pub async fn list(&mut self) -> Result<Vec<ListEntry>> {
        self.command("LIST").await?;
        let lines = self.read_multiline().await?;
        lines
            .iter()
            .map(|line| {
                let mut parts = line.split_whitespace();
                let message = parts.next().and_then(|s| s.parse().ok());
                let size = parts.next().and_then(|s| s.parse().ok());
                match (message, size) {
                    (Some(message), Some(size)) => Ok(ListEntry { message, size }),
                    _ => Err(Error::Protocol(format!("malformed LIST line: {line:?}"))),
                }
            })
            .collect()
    }

    /// Lists one message's size.
    pub async fn list_one(&mut self, message: u32) -> Result<ListEntry> {
        let text = self.command(&format!("LIST {message}")).await?;
        let mut parts = text.split_whitespace();
        let message = parts.next().and_then(|s| s.parse().ok());
        let size = parts.next().and_then(|s| s.parse().ok());
        match (message, size) {
            (Some(message), Some(size)) => Ok(ListEntry { message, size }),
            _ => Err(Error::Protocol(format!("malformed LIST reply: {text:?}"))),
        }
    }

    /// Lists all unique ids (UIDL).
    pub async fn uidl(&mut self) -> Result<Vec<UidlEntry>> {
        self.command("UIDL").await?;
        let lines = self.read_multiline().await?;
        lines
            .iter()
            .map(|line| {
                let mut parts = line.split_whitespace();
                let message = parts.next().and_then(|s| s.parse().ok());
                let uid = parts.next();
                match (message, uid) {
                    (Some(message), Some(uid)) => Ok(UidlEntry {
                        message,
                        uid: uid.to_string(),
                    }),
                    _ => Err(Error::Protocol(format!("malformed UIDL line: {line:?}"))),
                }
            })
            .collect()
    }

    /// Fetches one unique id.
    pub async fn uidl_one(&mut self, message: u32) -> Result<UidlEntry> {
        let text = self.command(&format!("UIDL {message}")).await?;
        let mut parts = text.split_whitespace();
        let message = parts.next().and_then(|s| s.parse().ok());
        let uid = parts.next();
        match (message, uid) {
            (Some(message), Some(uid)) => Ok(UidlEntry {
                message,
                uid: uid.to_string(),
            }),
            _ => Err(Error::Protocol(format!("malformed UIDL reply: {text:?}"))),
        }
    }

    /// Retrieves a full message as dot-unstuffed lines.
    pub async fn retr_lines(&mut self, message: u32) -> Result<Vec<String>> {
        self.command(&format!("RETR {message}")).await?;
        self.read_multiline().await
    }

    /// Retrieves a full message as CRLF-joined bytes.
    pub async fn retr(&mut self, message: u32) -> Result<Vec<u8>> {
        let lines = self.retr_lines(message).await?;
        let mut out = Vec::new();
        for line in lines {
            out.extend_from_slice(line.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Ok(out)
    }

    /// Retrieves the headers plus the first `lines` body lines (TOP).
    pub async fn top(&mut self, message: u32, lines: u32) -> Result<Vec<String>> {
        if !self.caps.is_empty() && !self.caps.top() {
            return Err(Error::NotSupported("TOP"));
        }
        self.command(&format!("TOP {message} {lines}")).await?;
        self.read_multiline().await
    }

    /// Marks a message for deletion (committed by QUIT).
    pub async fn dele(&mut self, message: u32) -> Result<()> {
        self.command(&format!("DELE {message}")).await?;
        Ok(())
    }

    /// Clears all deletion marks.
    pub async fn rset(&mut self) -> Result<()> {
        self.command("RSET").await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn authorized(
        mock: tokio_test::io::Mock,
    ) -> Client<tokio_test::io::Mock, Authorization> {
        Client::from_stream(mock).await.unwrap()
    }

    #[tokio::test]
    async fn greeting_captures_apop_timestamp() {
        let mock = tokio_test::io::Builder::new()
            .read(b"+OK POP3 ready <123.456@host>\r\n")
            .build();
        let client = authorized(mock).await;
        assert_eq!(
            client.capabilities().apop_timestamp.as_deref(),
            Some("<123.456@host>")
        );
    }

    #[tokio::test]
    async fn capa_parses_and_missing_capa_tolerated() {
        let mock = tokio_test::io::Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"CAPA\r\n")
            .read(b"+OK capability list follows\r\nTOP\r\nUIDL\r\nSASL PLAIN\r\n.\r\n")
            .build();
        let mut client = authorized(mock).await;
        client.capa().await.unwrap();
        assert!(client.capabilities().top());
        assert_eq!(client.capabilities().sasl_mechanisms(), vec!["PLAIN"]);

        let mock = tokio_test::io::Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"CAPA\r\n")
            .read(b"-ERR not implemented\r\n")
            .build();
        let mut client = authorized(mock).await;
        client.capa().await.unwrap();
        assert!(client.capabilities().is_empty());
    }

    #[tokio::test]
    async fn user_pass_login() {
        let mock = tokio_test::io::Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER alice\r\n")
            .read(b"+OK send PASS\r\n")
            .write(b"PASS secret\r\n")
            .read(b"+OK logged in\r\n")
            .build();
        let client = authorized(mock).await;
        client.login("alice", "secret").await.unwrap();
    }

    #[tokio::test]
    async fn apop_uses_rfc_digest() {
        // RFC 1939 section 7 example.
        let mock = tokio_test::io::Builder::new()
            .read(b"+OK POP3 server ready <1896.697170952@dbc.mtview.ca.us>\r\n")
            .write(b"APOP mrose c4c9334bac560ecc979e58001b3e22fb\r\n")
            .read(b"+OK maildrop has 1 message\r\n")
            .build();
        let client = authorized(mock).await;
        client.apop("mrose", "tanstaaf").await.unwrap();
    }

    #[tokio::test]
    async fn apop_without_timestamp_fails() {
        let mock = tokio_test::io::Builder::new().read(b"+OK ready\r\n").build();
        let client = authorized(mock).await;
        let err = client.apop("u", "p").await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
    }

    #[tokio::test]
    async fn auth_plain_challenge_loop() {
        let ir = STANDARD.encode(b"\0u\0p");
        let line = format!("AUTH PLAIN {ir}\r\n");
        let mock = tokio_test::io::Builder::new()
            .read(b"+OK ready\r\n")
            .write(line.as_bytes())
            .read(b"+OK authenticated\r\n")
            .build();
        let client = authorized(mock).await;
        let mut mech = Plain::new("u", "p");
        client.auth(&mut mech).await.unwrap();
    }

    #[tokio::test]
    async fn stat_and_list() {
        let mock = tokio_test::io::Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER u\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS p\r\n")
            .read(b"+OK\r\n")
            .write(b"STAT\r\n")
            .read(b"+OK 2 320\r\n")
            .write(b"LIST\r\n")
            .read(b"+OK 2 messages\r\n1 120\r\n2 200\r\n.\r\n")
            .build();
        let client = authorized(mock).await;
        let mut client = client.login("u", "p").await.unwrap();

        let stat = client.stat().await.unwrap();
        assert_eq!(stat.count, 2);
        assert_eq!(stat.size, 320);

        let list = client.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].size, 200);
    }

    #[tokio::test]
    async fn retr_unstuffs_dots() {
        let mock = tokio_test::io::Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER u\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS p\r\n")
            .read(b"+OK\r\n")
            .write(b"RETR 1\r\n")
            .read(b"+OK 5 octets\r\nhi\r\n..dot-start\r\n.\r\n")
            .build();
        let client = authorized(mock).await;
        let mut client = client.login("u", "p").await.unwrap();

        let lines = client.retr_lines(1).await.unwrap();
        assert_eq!(lines, vec!["hi".to_string(), ".dot-start".to_string()]);
    }

    #[tokio::test]
    async fn uidl_and_top() {
        let mock = tokio_test::io::Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER u\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS p\r\n")
            .read(b"+OK\r\n")
            .write(b"UIDL\r\n")
            .read(b"+OK\r\n1 whqtswO00WBw418f9t5JxYwZ\r\n.\r\n")
            .write(b"TOP 1 2\r\n")
            .read(b"+OK\r\nSubject: x\r\n\r\nline1\r\nline2\r\n.\r\n")
            .build();
        let client = authorized(mock).await;
        let mut client = client.login("u", "p").await.unwrap();

        let uidl = client.uidl().await.unwrap();
        assert_eq!(uidl[0].uid, "whqtswO00WBw418f9t5JxYwZ");

        let top = client.top(1, 2).await.unwrap();
        assert_eq!(top.len(), 4);
    }

    #[tokio::test]
    async fn dele_rset_quit_cycle() {
        let mock = tokio_test::io::Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER u\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS p\r\n")
            .read(b"+OK\r\n")
            .write(b"DELE 1\r\n")
            .read(b"+OK marked\r\n")
            .write(b"RSET\r\n")
            .read(b"+OK unmarked\r\n")
            .write(b"QUIT\r\n")
            .read(b"+OK bye\r\n")
            .build();
        let client = authorized(mock).await;
        let mut client = client.login("u", "p").await.unwrap();

        client.dele(1).await.unwrap();
        client.rset().await.unwrap();
        client.quit().await.unwrap();
    }

    #[tokio::test]
    async fn err_response_surfaces() {
        let mock = tokio_test::io::Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER u\r\n")
            .read(b"-ERR unknown user\r\n")
            .build();
        let client = authorized(mock).await;
        let err = client.login("u", "p").await.unwrap_err();
        assert!(matches!(err, Error::Err(_)));
    }
}
