//! SMTP command builder.

use crate::types::{Envelope, Recipient};

/// An SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// HELO fallback greeting.
    Helo {
        /// Client hostname.
        hostname: String,
    },
    /// EHLO extended greeting.
    Ehlo {
        /// Client hostname.
        hostname: String,
    },
    /// STARTTLS.
    StartTls,
    /// AUTH with a SASL mechanism.
    Auth {
        /// Mechanism name.
        mechanism: String,
        /// Base64 initial response.
        initial_response: Option<String>,
    },
    /// MAIL FROM with envelope parameters.
    MailFrom {
        /// Sender address.
        from: String,
        /// BODY parameter.
        body: Option<&'static str>,
        /// SIZE declaration.
        size: Option<usize>,
        /// SMTPUTF8 flag.
        utf8: bool,
        /// DSN RET parameter.
        ret: Option<&'static str>,
        /// DSN ENVID parameter.
        envid: Option<String>,
        /// REQUIRETLS flag.
        require_tls: bool,
    },
    /// RCPT TO with DSN parameters.
    RcptTo {
        /// Recipient address.
        to: String,
        /// NOTIFY values.
        notify: Vec<&'static str>,
        /// ORCPT value.
        orcpt: Option<String>,
    },
    /// DATA.
    Data,
    /// BDAT chunk header (CHUNKING); payload bytes follow raw.
    Bdat {
        /// Chunk length.
        length: usize,
        /// Final chunk marker.
        last: bool,
    },
    /// RSET.
    Rset,
    /// VRFY.
    Vrfy {
        /// Address to verify.
        address: String,
    },
    /// EXPN.
    Expn {
        /// Mailing list to expand.
        list: String,
    },
    /// HELP.
    Help {
        /// Optional topic.
        topic: Option<String>,
    },
    /// NOOP.
    Noop,
    /// QUIT.
    Quit,
}

impl Command {
    /// Builds a MAIL FROM command from a validated envelope.
    ///
    /// `declared_size` carries the encoded message size when the server
    /// advertises SIZE; `utf8` is set when SMTPUTF8 is in play.
    #[must_use]
    pub fn mail_from(envelope: &Envelope, from: &str, declared_size: Option<usize>, utf8: bool) -> Self {
        Self::MailFrom {
            from: from.to_string(),
            body: envelope.body.map(super::types::BodyType::as_param),
            size: declared_size,
            utf8,
            ret: envelope.ret.map(super::types::DsnReturn::as_param),
            envid: envelope.envid.clone(),
            require_tls: envelope.require_tls,
        }
    }

    /// Builds an RCPT TO command for one recipient.
    #[must_use]
    pub fn rcpt_to(recipient: &Recipient) -> Self {
        Self::RcptTo {
            to: recipient.address.as_str().to_string(),
            notify: recipient
                .notify
                .iter()
                .map(|n| n.as_param())
                .collect(),
            orcpt: recipient.orcpt.clone(),
        }
    }

    /// Serializes the command line including CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Self::Helo { hostname } => {
                buf.extend_from_slice(b"HELO ");
                buf.extend_from_slice(hostname.as_bytes());
            }
            Self::Ehlo { hostname } => {
                buf.extend_from_slice(b"EHLO ");
                buf.extend_from_slice(hostname.as_bytes());
            }
            Self::StartTls => buf.extend_from_slice(b"STARTTLS"),
            Self::Auth {
                mechanism,
                initial_response,
            } => {
                buf.extend_from_slice(b"AUTH ");
                buf.extend_from_slice(mechanism.as_bytes());
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    buf.extend_from_slice(resp.as_bytes());
                }
            }
            Self::MailFrom {
                from,
                body,
                size,
                utf8,
                ret,
                envid,
                require_tls,
            } => {
                buf.extend_from_slice(b"MAIL FROM:<");
                buf.extend_from_slice(from.as_bytes());
                buf.push(b'>');
                if let Some(declared) = size {
                    buf.extend_from_slice(format!(" SIZE={declared}").as_bytes());
                }
                if let Some(body_type) = body {
                    buf.extend_from_slice(b" BODY=");
                    buf.extend_from_slice(body_type.as_bytes());
                }
                if *utf8 {
                    buf.extend_from_slice(b" SMTPUTF8");
                }
                if let Some(ret) = ret {
                    buf.extend_from_slice(b" RET=");
                    buf.extend_from_slice(ret.as_bytes());
                }
                if let Some(envid) = envid {
                    buf.extend_from_slice(b" ENVID=");
                    buf.extend_from_slice(envid.as_bytes());
                }
                if *require_tls {
                    buf.extend_from_slice(b" REQUIRETLS");
                }
            }
            Self::RcptTo { to, notify, orcpt } => {
                buf.extend_from_slice(b"RCPT TO:<");
                buf.extend_from_slice(to.as_bytes());
                buf.push(b'>');
                if !notify.is_empty() {
                    buf.extend_from_slice(b" NOTIFY=");
                    buf.extend_from_slice(notify.join(",").as_bytes());
                }
                if let Some(orcpt) = orcpt {
                    buf.extend_from_slice(b" ORCPT=");
                    buf.extend_from_slice(orcpt.as_bytes());
                }
            }
            Self::Data => buf.extend_from_slice(b"DATA"),
            Self::Bdat { length, last } => {
                buf.extend_from_slice(format!("BDAT {length}").as_bytes());
                if *last {
                    buf.extend_from_slice(b" LAST");
                }
            }
            Self::Rset => buf.extend_from_slice(b"RSET"),
            Self::Vrfy { address } => {
                buf.extend_from_slice(b"VRFY ");
                buf.extend_from_slice(address.as_bytes());
            }
            Self::Expn { list } => {
                buf.extend_from_slice(b"EXPN ");
                buf.extend_from_slice(list.as_bytes());
            }
            Self::Help { topic } => {
                buf.extend_from_slice(b"HELP");
                if let Some(topic) = topic {
                    buf.push(b' ');
                    buf.extend_from_slice(topic.as_bytes());
                }
            }
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Quit => buf.extend_from_slice(b"QUIT"),
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}
