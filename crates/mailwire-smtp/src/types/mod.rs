//! SMTP protocol types.

mod address;
mod envelope;
mod extension;
mod reply;

pub use address::Address;
pub use envelope::{BodyType, DsnNotify, DsnReturn, Envelope, Recipient};
pub use extension::{Capabilities, Extension};
pub use reply::{EnhancedCode, Reply, ReplyCode};
