//! Mail envelope: sender, recipients, and transmission parameters.

use super::Address;
use crate::error::{Error, Result};

/// BODY parameter values (RFC 6152 / RFC 3030).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// 8-bit MIME content.
    EightBitMime,
    /// Binary MIME content (requires CHUNKING).
    BinaryMime,
}

impl BodyType {
    pub(crate) const fn as_param(self) -> &'static str {
        match self {
            Self::EightBitMime => "8BITMIME",
            Self::BinaryMime => "BINARYMIME",
        }
    }
}

/// DSN RET parameter (RFC 3461).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsnReturn {
    /// Return the full message in status notifications.
    Full,
    /// Return headers only.
    Headers,
}

impl DsnReturn {
    pub(crate) const fn as_param(self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Headers => "HDRS",
        }
    }
}

/// DSN NOTIFY values (RFC 3461).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsnNotify {
    /// Never notify.
    Never,
    /// Notify on successful delivery.
    Success,
    /// Notify on failure.
    Failure,
    /// Notify on delays.
    Delay,
}

impl DsnNotify {
    pub(crate) const fn as_param(self) -> &'static str {
        match self {
            Self::Never => "NEVER",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Delay => "DELAY",
        }
    }
}

/// One envelope recipient with optional DSN parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Recipient address.
    pub address: Address,
    /// NOTIFY values; empty means server default.
    pub notify: Vec<DsnNotify>,
    /// ORCPT original-recipient value.
    pub orcpt: Option<String>,
}

impl Recipient {
    /// Creates a plain recipient.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self {
            address,
            notify: Vec::new(),
            orcpt: None,
        }
    }

    /// Sets NOTIFY values.
    #[must_use]
    pub fn notify(mut self, values: Vec<DsnNotify>) -> Self {
        self.notify = values;
        self
    }

    /// Sets the ORCPT value.
    #[must_use]
    pub fn orcpt(mut self, value: impl Into<String>) -> Self {
        self.orcpt = Some(value.into());
        self
    }
}

/// A mail envelope under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Sender (MAIL FROM).
    pub from: Option<Address>,
    /// Recipients (RCPT TO).
    pub recipients: Vec<Recipient>,
    /// BODY parameter.
    pub body: Option<BodyType>,
    /// DSN envelope id.
    pub envid: Option<String>,
    /// DSN RET parameter.
    pub ret: Option<DsnReturn>,
    /// REQUIRETLS flag (RFC 8689).
    pub require_tls: bool,
}

impl Envelope {
    /// Creates an empty envelope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender.
    #[must_use]
    pub fn sender(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Adds a plain recipient.
    #[must_use]
    pub fn recipient(mut self, to: Address) -> Self {
        self.recipients.push(Recipient::new(to));
        self
    }

    /// Adds a recipient with DSN parameters.
    #[must_use]
    pub fn recipient_with(mut self, recipient: Recipient) -> Self {
        self.recipients.push(recipient);
        self
    }

    /// Sets the BODY parameter.
    #[must_use]
    pub const fn body(mut self, body: BodyType) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the DSN envelope id.
    #[must_use]
    pub fn envid(mut self, envid: impl Into<String>) -> Self {
        self.envid = Some(envid.into());
        self
    }

    /// Sets the DSN RET parameter.
    #[must_use]
    pub const fn ret(mut self, ret: DsnReturn) -> Self {
        self.ret = Some(ret);
        self
    }

    /// Requests REQUIRETLS transmission.
    #[must_use]
    pub const fn require_tls(mut self) -> Self {
        self.require_tls = true;
        self
    }

    /// Validates structural completeness.
    ///
    /// # Errors
    ///
    /// Returns `MissingSender` or `MissingRecipients`.
    pub fn validate(&self) -> Result<&Address> {
        let from = self.from.as_ref().ok_or(Error::MissingSender)?;
        if self.recipients.is_empty() {
            return Err(Error::MissingRecipients);
        }
        Ok(from)
    }

    /// True when any address in the envelope needs SMTPUTF8.
    #[must_use]
    pub fn needs_utf8(&self) -> bool {
        self.from.as_ref().is_some_and(Address::needs_utf8)
            || self.recipients.iter().any(|r| r.address.needs_utf8())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[test]
    fn validation() {
        let empty = Envelope::new();
        assert!(matches!(empty.validate(), Err(Error::MissingSender)));

        let no_rcpt = Envelope::new().sender(addr("a@x.com"));
        assert!(matches!(no_rcpt.validate(), Err(Error::MissingRecipients)));

        let ok = Envelope::new()
            .sender(addr("a@x.com"))
            .recipient(addr("b@y.com"));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn utf8_detection_covers_all_addresses() {
        let ascii = Envelope::new()
            .sender(addr("a@x.com"))
            .recipient(addr("b@y.com"));
        assert!(!ascii.needs_utf8());

        let intl = Envelope::new()
            .sender(addr("a@x.com"))
            .recipient(addr("bé@y.com"));
        assert!(intl.needs_utf8());
    }

    #[test]
    fn recipient_builders() {
        let r = Recipient::new(addr("b@y.com"))
            .notify(vec![DsnNotify::Failure, DsnNotify::Delay])
            .orcpt("rfc822;b@y.com");
        assert_eq!(r.notify.len(), 2);
        assert_eq!(r.orcpt.as_deref(), Some("rfc822;b@y.com"));
    }
}
