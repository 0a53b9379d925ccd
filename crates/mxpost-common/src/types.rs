//! Common types for MxPost

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress {
    pub local: String,
    pub domain: String,
}

impl EmailAddress {
    /// Create a new email address
    pub fn new(local: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            domain: domain.into(),
        }
    }

    /// Parse an email address from a string
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.splitn(2, '@').collect();
        if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() {
            Some(Self::new(parts[0], parts[1]))
        } else {
            None
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

impl std::str::FromStr for EmailAddress {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::Error::Validation("Invalid email address".to_string()))
    }
}

/// Producer of attachment bytes
///
/// Reading bytes may suspend (filesystem, object store). Implementations
/// surface failures as `Error::Attachment`.
#[async_trait]
pub trait AttachmentData: Send + Sync {
    /// Produce the attachment payload
    async fn bytes(&self) -> crate::Result<Vec<u8>>;
}

/// Attachment bytes held in memory
pub struct InMemoryData(Vec<u8>);

impl InMemoryData {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }
}

#[async_trait]
impl AttachmentData for InMemoryData {
    async fn bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

/// A file attached to an outgoing message
#[derive(Clone)]
pub struct Attachment {
    /// Filename presented to the recipient
    pub filename: String,

    /// MIME content type, e.g. `application/pdf`
    pub content_type: String,

    /// Payload producer
    pub data: Arc<dyn AttachmentData>,
}

impl Attachment {
    /// Create an attachment backed by an in-memory buffer
    pub fn from_bytes(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: Arc::new(InMemoryData::new(bytes)),
        }
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// What to send: sender, recipients, subject, bodies and attachments
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Sender mailbox
    pub from: EmailAddress,

    /// Primary recipients; must be non-empty
    pub to: Vec<EmailAddress>,

    /// Carbon-copy recipients
    pub cc: Vec<EmailAddress>,

    /// Blind-carbon recipients; delivered but never shown in headers
    pub bcc: Vec<EmailAddress>,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub text: String,

    /// Optional HTML body
    pub html: Option<String>,

    /// Ordered attachments
    pub attachments: Vec<Attachment>,
}

impl Envelope {
    /// Create an envelope with the required fields
    pub fn new(from: EmailAddress, to: Vec<EmailAddress>) -> Self {
        Self {
            from,
            to,
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: String::new(),
            text: String::new(),
            html: None,
            attachments: Vec::new(),
        }
    }

    /// All recipients across to, cc and bcc, in that order
    pub fn all_recipients(&self) -> impl Iterator<Item = &EmailAddress> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }
}
