//! Error types for MxPost

use thiserror::Error;

/// Main error type for MxPost
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("MX resolution failed: {0}")]
    MxResolution(String),

    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Remote did not advertise STARTTLS: {0}")]
    TlsRequired(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("SMTP permanent failure ({code}): {message}")]
    SmtpPermanent { code: u16, message: String },

    #[error("SMTP transient failure ({code}): {message}")]
    SmtpTransient { code: u16, message: String },

    #[error("DKIM signing failed: {0}")]
    DkimSign(String),

    #[error("Attachment unavailable: {0}")]
    Attachment(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MxPost
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether retrying the send later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::MxResolution(_)
                | Error::Connect(_)
                | Error::Timeout(_)
                | Error::SmtpTransient { .. }
        )
    }
}
