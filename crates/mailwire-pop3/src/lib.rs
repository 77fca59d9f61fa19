//! # mailwire-pop3
//!
//! A POP3 (RFC 1939) client library with APOP, SASL AUTH (RFC 5034),
//! STLS (RFC 2595), and CAPA (RFC 2449) support.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailwire_net::{NetStream, TlsConfig};
//! use mailwire_pop3::Client;
//!
//! let stream = NetStream::connect_tls("pop.example.com", 995, &TlsConfig::default()).await?;
//! let mut client = Client::from_stream(stream).await?;
//! client.capa().await?;
//!
//! let mut client = client.auth_auto("user", "password", None).await?;
//! let stat = client.stat().await?;
//! for entry in client.list().await? {
//!     let message = client.retr(entry.message).await?;
//!     println!("message {}: {} bytes", entry.message, message.len());
//! }
//! client.quit().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod connection;
mod error;
mod types;

pub use connection::{Authorization, Client, Transaction};
pub use error::{Error, Result};
pub use types::{Capabilities, ListEntry, Stat, StatusLine, UidlEntry};
