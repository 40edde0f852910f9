// SMTP dispatcher
// Sends contact messages through an authenticated STARTTLS relay (Gmail by default)

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{MailDispatcher, MailError, OutboundMessage};
use crate::config::MailConfig;

pub struct SmtpDispatcher {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// `None` when neither `mail.recipient` nor `GMAIL_USER` is set
    recipient: Option<String>,
}

impl SmtpDispatcher {
    /// Build the transport; no connection is made until the first send.
    /// Must be called from within a tokio runtime.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| MailError::Smtp(e.to_string()))?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            recipient: config.recipient().map(ToString::to_string),
        })
    }
}

#[async_trait]
impl MailDispatcher for SmtpDispatcher {
    async fn send(&self, message: &OutboundMessage) -> Result<(), MailError> {
        let recipient = self
            .recipient
            .as_deref()
            .ok_or(MailError::MissingConfig("no recipients defined"))?;
        let email = build_message(message, recipient)?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| MailError::Smtp(e.to_string()))
    }
}

/// Convert the outbound message into a lettre `Message` addressed to `recipient`
fn build_message(message: &OutboundMessage, recipient: &str) -> Result<Message, MailError> {
    let from = Mailbox::new(
        Some(message.sender_name.clone()),
        parse_address(&message.sender_email)?,
    );
    let to = Mailbox::new(None, parse_address(recipient)?);

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

fn parse_address(address: &str) -> Result<Address, MailError> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|e| MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}
