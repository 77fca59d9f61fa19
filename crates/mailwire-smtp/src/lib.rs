//! # mailwire-smtp
//!
//! An ESMTP (RFC 5321) client library: EHLO capability negotiation with
//! HELO fallback, STARTTLS, SASL authentication, PIPELINING, CHUNKING
//! (BDAT), SIZE, 8BITMIME/BINARYMIME, SMTPUTF8, DSN parameters,
//! REQUIRETLS, and enhanced status codes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailwire_net::{NetStream, TlsConfig};
//! use mailwire_smtp::{Address, Client, Envelope};
//!
//! let stream = NetStream::connect_plain("smtp.example.com", 587).await?;
//! let client = Client::from_stream(stream).await?;
//! let client = client.ehlo("client.example.org").await?;
//! let client = client
//!     .starttls("smtp.example.com", &TlsConfig::default(), "client.example.org")
//!     .await?;
//! let mut client = client.auth_auto("user", "password", None).await?;
//!
//! let envelope = Envelope::new()
//!     .sender(Address::new("user@example.org")?)
//!     .recipient(Address::new("dest@example.com")?);
//! let result = client.send(&envelope, b"Subject: hi\r\n\r\nhello").await?;
//! println!("accepted: {:?}", result.accepted);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::Command;
pub use connection::{Authenticated, Client, Connected, SendResult, SmtpStream};
pub use error::{Error, Result};
pub use types::{
    Address, BodyType, Capabilities, DsnNotify, DsnReturn, EnhancedCode, Envelope, Extension,
    Recipient, Reply, ReplyCode,
};
