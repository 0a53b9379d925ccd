//! Delivery orchestration
//!
//! Groups recipients by mail exchanger, builds and signs one message per
//! group, and runs one SMTP session per group, sequentially and fail-fast.

pub mod client;
pub mod mx;
pub mod response;

pub use client::{SessionState, SmtpClient};
pub use mx::{MxResolver, RecipientGroup};
pub use response::Response;

use mxpost_common::{DeliveryConfig, Envelope, Error, Result};
use std::time::Duration;
use tracing::{debug, info};

use crate::dkim::DkimSigner;
use crate::message::MessageBuilder;

/// Sends envelopes straight to their recipients' mail exchangers
pub struct Mailer {
    config: DeliveryConfig,
}

impl Mailer {
    pub fn new(config: DeliveryConfig) -> Self {
        Self { config }
    }

    /// Deliver one envelope.
    ///
    /// Groups are attempted in order; the first failing group aborts the
    /// whole send and the error is returned to the caller. Success means
    /// every group's session reached QUIT after a `250 2.0.0` DATA
    /// acknowledgement.
    pub async fn send(&self, envelope: &Envelope) -> Result<()> {
        if envelope.to.is_empty() {
            return Err(Error::Validation(
                "Envelope has no primary recipients".to_string(),
            ));
        }

        let signer = match &self.config.dkim {
            Some(dkim) => Some(DkimSigner::new(dkim)?),
            None => None,
        };

        let resolver = MxResolver::new(Duration::from_millis(self.config.mx_lookup_timeout_ms));
        let groups = resolver.group_recipients(envelope).await?;

        for group in groups {
            debug!(
                "Delivering to {} ({} recipients)",
                group.mx_host,
                group.recipients.len()
            );

            let message = build_signed(envelope, signer.as_ref()).await?;
            let mut client = SmtpClient::connect(&group.mx_host, &self.config).await?;
            client
                .deliver(&envelope.from, &group.recipients, message.as_bytes())
                .await?;

            info!(
                "Delivered to {} recipient(s) via {}",
                group.recipients.len(),
                group.mx_host
            );
        }

        Ok(())
    }
}

/// Build the RFC 822 document for this envelope, prepending a
/// DKIM-Signature header when signing is configured.
async fn build_signed(envelope: &Envelope, signer: Option<&DkimSigner>) -> Result<String> {
    let message = MessageBuilder::new(envelope).build().await?;
    match signer {
        Some(signer) => {
            let header = signer.sign(&message)?;
            Ok(format!("{}\r\n{}", header, message))
        }
        None => Ok(message),
    }
}
