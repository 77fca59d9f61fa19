//! Pre-authentication operations: greeting, STARTTLS, LOGIN, AUTHENTICATE.

use std::marker::PhantomData;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncRead, AsyncWrite};

use mailwire_net::{NetStream, TlsConfig};
use mailwire_sasl::{
    CramMd5, Login, Mechanism, Plain, Scram, ScramVariant, Step, select_mechanism,
};

use super::states::{Authenticated, NotAuthenticated};
use super::Client;
use crate::command::{Command, TagGenerator};
use crate::framing::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::Capabilities;
use crate::{Error, Result};

/// Result of reading the server greeting.
pub enum Connected<S> {
    /// Normal greeting; authentication required.
    NotAuthenticated(Client<S, NotAuthenticated>),
    /// PREAUTH greeting; the session starts authenticated.
    PreAuthenticated(Client<S, Authenticated>),
}

impl<S> std::fmt::Debug for Connected<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated(client) => {
                f.debug_tuple("NotAuthenticated").field(client).finish()
            }
            Self::PreAuthenticated(client) => {
                f.debug_tuple("PreAuthenticated").field(client).finish()
            }
        }
    }
}

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the greeting from a connected stream and builds a client.
    ///
    /// A PREAUTH greeting yields an already-authenticated client; a BYE
    /// greeting is an error.
    pub async fn from_stream(stream: S) -> Result<Connected<S>> {
        let mut framed = FramedStream::new(stream);

        let greeting = framed.read_message().await?;
        let response = ResponseParser::parse(&greeting.flattened())?;

        let mut caps = Capabilities::new();
        let preauth = match response {
            Response::Untagged(UntaggedResponse::Ok { code, .. }) => {
                if let Some(crate::types::ResponseCode::Capability(tokens)) = code {
                    caps.replace(tokens.iter());
                }
                false
            }
            Response::Untagged(UntaggedResponse::PreAuth { code, .. }) => {
                if let Some(crate::types::ResponseCode::Capability(tokens)) = code {
                    caps.replace(tokens.iter());
                }
                true
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text));
            }
            other => {
                return Err(Error::Protocol(format!(
                    "unexpected greeting: {other:?}"
                )));
            }
        };

        let client = Client {
            stream: framed,
            tags: TagGenerator::default(),
            caps,
            selected: None,
            sync_events: Vec::new(),
            _state: PhantomData,
        };

        if preauth {
            tracing::debug!("server greeted with PREAUTH");
            Ok(Connected::PreAuthenticated(client.transition()))
        } else {
            Ok(Connected::NotAuthenticated(client))
        }
    }

    /// Authenticates with LOGIN.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        if self.caps.supports("LOGINDISABLED") {
            return Err(Error::InvalidState(
                "server has LOGIN disabled; use STARTTLS or AUTHENTICATE".to_string(),
            ));
        }

        self.run_command(&Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;

        self.refresh_caps_if_empty().await?;
        Ok(self.transition())
    }

    /// Authenticates with an explicit SASL mechanism.
    ///
    /// Uses SASL-IR when the server advertises it; otherwise the initial
    /// response is sent after the first continuation.
    pub async fn authenticate<M: Mechanism + ?Sized>(
        mut self,
        mechanism: &mut M,
    ) -> Result<Client<S, Authenticated>> {
        let offered = self.caps.sasl_mechanisms();
        if !self.caps.is_empty()
            && !offered.iter().any(|m| m.eq_ignore_ascii_case(mechanism.name()))
        {
            return Err(Error::MissingCapability("the requested AUTH= mechanism"));
        }

        let initial_response = if self.caps.supports("SASL-IR") {
            mechanism.initial_response().map(|bytes| {
                if bytes.is_empty() {
                    "=".to_string()
                } else {
                    STANDARD.encode(bytes)
                }
            })
        } else {
            None
        };

        let tag = self.tags.next();
        let command = Command::Authenticate {
            mechanism: mechanism.name().to_string(),
            initial_response,
        };
        tracing::debug!(%tag, mechanism = mechanism.name(), "starting AUTHENTICATE");
        self.stream.write_command(&command.serialize(&tag)).await?;

        loop {
            let message = self.stream.read_message().await?;
            let response = ResponseParser::parse(&message.flattened())?;

            match response {
                Response::Continuation { text } => {
                    let challenge = match &text {
                        Some(data) => STANDARD
                            .decode(data.trim())
                            .map_err(mailwire_sasl::Error::from)?,
                        None => Vec::new(),
                    };
                    match mechanism.step(&challenge) {
                        Ok(Step::Response(bytes)) => {
                            let mut line = STANDARD.encode(bytes).into_bytes();
                            line.extend_from_slice(b"\r\n");
                            self.stream.write_raw(&line).await?;
                        }
                        Ok(Step::Done) => {
                            self.stream.write_raw(b"\r\n").await?;
                        }
                        Err(e) => {
                            // Cancel the exchange so the server completes
                            // the command before we surface the error.
                            self.stream.write_raw(b"*\r\n").await?;
                            let _ = self.read_until_tagged(&tag).await;
                            return Err(e.into());
                        }
                    }
                }
                Response::Untagged(untagged) => self.route_untagged(&untagged),
                Response::Tagged {
                    tag: got,
                    status,
                    code,
                    text,
                } => {
                    if got.as_str() != tag {
                        return Err(Error::Protocol(format!(
                            "unexpected tag {} during AUTHENTICATE",
                            got.as_str()
                        )));
                    }
                    if let Some(crate::types::ResponseCode::Capability(tokens)) = &code {
                        self.caps.replace(tokens.iter());
                    }
                    return match status {
                        crate::types::Status::Ok => {
                            self.refresh_caps_if_empty().await?;
                            Ok(self.transition())
                        }
                        crate::types::Status::No => Err(Error::No(text)),
                        crate::types::Status::Bad => Err(Error::Bad(text)),
                        _ => Err(Error::Protocol("unexpected status".to_string())),
                    };
                }
            }
        }
    }

    /// Authenticates by picking the strongest mutually supported
    /// mechanism.
    ///
    /// `channel_binding` carries the tls-server-end-point digest when the
    /// transport can provide one, unlocking the SCRAM `-PLUS` variants.
    pub async fn authenticate_auto(
        self,
        username: &str,
        password: &str,
        channel_binding: Option<Vec<u8>>,
    ) -> Result<Client<S, Authenticated>> {
        let offered = self.caps.sasl_mechanisms();
        let Some(name) = select_mechanism(&offered, channel_binding.is_some()) else {
            // Nothing advertised; fall back to LOGIN.
            return self.login(username, password).await;
        };

        tracing::debug!(mechanism = name, "auto-selected SASL mechanism");
        match name {
            "SCRAM-SHA-256-PLUS" | "SCRAM-SHA-1-PLUS" => {
                let variant = if name.starts_with("SCRAM-SHA-256") {
                    ScramVariant::Sha256Plus
                } else {
                    ScramVariant::Sha1Plus
                };
                let binding = channel_binding.ok_or(Error::Sasl(
                    mailwire_sasl::Error::ChannelBindingUnavailable,
                ))?;
                let mut mech = Scram::new(variant, username, password).channel_binding(binding);
                self.authenticate(&mut mech).await
            }
            "SCRAM-SHA-256" => {
                let mut mech = Scram::new(ScramVariant::Sha256, username, password);
                self.authenticate(&mut mech).await
            }
            "SCRAM-SHA-1" => {
                let mut mech = Scram::new(ScramVariant::Sha1, username, password);
                self.authenticate(&mut mech).await
            }
            "CRAM-MD5" => {
                let mut mech = CramMd5::new(username, password);
                self.authenticate(&mut mech).await
            }
            "LOGIN" => {
                let mut mech = Login::new(username, password);
                self.authenticate(&mut mech).await
            }
            _ => {
                let mut mech = Plain::new(username, password);
                self.authenticate(&mut mech).await
            }
        }
    }

    /// Requests capabilities when none were learned during the greeting
    /// or authentication exchange.
    async fn refresh_caps_if_empty(&mut self) -> Result<()> {
        if self.caps.is_empty() {
            self.capability().await?;
        }
        Ok(())
    }
}

impl Client<NetStream, NotAuthenticated> {
    /// Performs STARTTLS and upgrades the transport in place.
    ///
    /// Capabilities are invalidated; the caller should re-request them
    /// (authentication refreshes them automatically).
    pub async fn starttls(mut self, host: &str, config: &TlsConfig) -> Result<Self> {
        if !self.caps.supports("STARTTLS") {
            return Err(Error::MissingCapability("STARTTLS"));
        }

        self.run_command(&Command::StartTls).await?;

        let plain = self.stream.into_inner();
        let tls = plain.upgrade_to_tls(host, config).await?;
        self.stream = FramedStream::new(tls);
        self.caps.invalidate();

        Ok(self)
    }

    /// The tls-server-end-point channel binding of the current transport.
    #[must_use]
    pub fn channel_binding(&mut self) -> Option<Vec<u8>> {
        self.stream.get_mut().channel_binding()
    }
}
