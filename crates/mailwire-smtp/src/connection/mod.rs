//! SMTP connection management with the type-state pattern.

mod client;
mod stream;

pub use client::{Authenticated, Client, Connected, SendResult};
pub use stream::SmtpStream;
