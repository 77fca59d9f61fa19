//! # mailwire-net
//!
//! Byte transport for mail protocol clients: plain TCP, implicit TLS,
//! in-place STARTTLS upgrades, COMPRESS=DEFLATE wrapping, TLS channel
//! binding, and proxy tunneling (HTTP CONNECT, SOCKS4/4a, SOCKS5).
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailwire_net::{NetStream, TlsConfig};
//!
//! // Implicit TLS (e.g. IMAP on 993)
//! let stream = NetStream::connect_tls("imap.example.com", 993, &TlsConfig::default()).await?;
//!
//! // Plaintext first, then STARTTLS
//! let stream = NetStream::connect_plain("smtp.example.com", 587).await?;
//! // ... negotiate STARTTLS with the server ...
//! let stream = stream.upgrade_to_tls("smtp.example.com", &TlsConfig::default()).await?;
//!
//! // Channel binding for SCRAM-*-PLUS
//! let binding = stream.channel_binding();
//! ```
//!
//! ## Modules
//!
//! - [`proxy`]: HTTP CONNECT and SOCKS tunnel handshakes
//! - [`stream`]: the [`NetStream`] transport enum
//! - [`tls`]: TLS configuration and connector construction

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod compress;
mod error;
pub mod proxy;
pub mod stream;
pub mod tls;

pub use compress::DeflateStream;
pub use error::{Error, Result};
pub use proxy::{ProxyKind, ProxySettings};
pub use stream::NetStream;
pub use tls::TlsConfig;
