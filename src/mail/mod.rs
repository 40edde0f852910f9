//! Outbound mail
//!
//! The contact form hands a finished [`OutboundMessage`] to a [`MailDispatcher`].
//! Production uses [`SmtpDispatcher`], a thin layer over lettre's async SMTP
//! transport; tests substitute their own dispatchers.

mod smtp;

pub use smtp::SmtpDispatcher;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing mail configuration: {0}")]
    MissingConfig(&'static str),

    #[error("invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("{0}")]
    Smtp(String),
}

/// A message ready for delivery to the site owner's mailbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Display name of the person who filled in the form
    pub sender_name: String,
    /// Address the visitor gave; used as the From mailbox
    pub sender_email: String,
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Delivers one message; one call is one delivery attempt
#[async_trait]
pub trait MailDispatcher: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), MailError>;
}
