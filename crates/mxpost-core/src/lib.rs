//! MxPost Core - direct-to-MX outbound mail delivery
//!
//! This crate builds RFC 5322 messages, signs them with DKIM (RFC 6376,
//! relaxed/relaxed, rsa-sha256), resolves destination mail exchangers via
//! DNS MX and delivers over SMTP with opportunistic STARTTLS.

pub mod delivery;
pub mod dkim;
pub mod message;

pub use delivery::{Mailer, MxResolver, RecipientGroup, SmtpClient};
pub use dkim::{DkimSigner, DEFAULT_SIGNED_HEADERS};
pub use message::MessageBuilder;
