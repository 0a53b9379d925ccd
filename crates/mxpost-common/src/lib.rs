//! MxPost Common - shared types, configuration and errors
//!
//! This crate provides the pieces shared by the mxpost delivery engine:
//! the configuration surface, the error type, and the envelope model.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DeliveryConfig, DkimConfig};
pub use error::{Error, Result};
pub use types::{Attachment, AttachmentData, EmailAddress, Envelope, InMemoryData};
