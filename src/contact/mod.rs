//! Contact form submissions
//!
//! A [`Submission`] lives for one request: it is decoded from the form body,
//! checked, turned into an [`OutboundMessage`] and handed to the mail
//! dispatcher exactly once. Nothing is stored.

use thiserror::Error;

use crate::mail::{MailDispatcher, MailError, OutboundMessage};

/// Shown to the visitor when a field is left blank
pub const VALIDATION_MESSAGE: &str = "All fields are required. Please fill out the form completely.";

#[derive(Debug, Error)]
pub enum ContactError {
    /// A required field was missing or blank; nothing was sent
    #[error("{}", VALIDATION_MESSAGE)]
    Validation { missing: Vec<&'static str> },

    /// The mail dispatcher refused or failed the single delivery attempt
    #[error(transparent)]
    Delivery(#[from] MailError),
}

/// The three fields posted by the contact form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl Submission {
    /// Decode an `application/x-www-form-urlencoded` body.
    /// Unknown keys are ignored; for repeated keys the first value wins.
    pub fn from_form(body: &[u8]) -> Self {
        let mut name = None;
        let mut email = None;
        let mut message = None;

        for (key, value) in url::form_urlencoded::parse(body) {
            let slot = match key.as_ref() {
                "name" => &mut name,
                "email" => &mut email,
                "message" => &mut message,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        Self {
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            message: message.unwrap_or_default(),
        }
    }

    /// Names of the fields that are absent or empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    pub fn validate(&self) -> Result<(), ContactError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContactError::Validation { missing })
        }
    }

    /// Build the email the site owner receives
    pub fn compose(&self) -> OutboundMessage {
        let Self {
            name,
            email,
            message,
        } = self;
        OutboundMessage {
            sender_name: name.clone(),
            sender_email: email.clone(),
            subject: format!("Message from {name}"),
            body: format!(
                "You have received a new message from {name} ({email}):\n\n{message}"
            ),
        }
    }
}

/// Validate, compose and dispatch. At most one delivery attempt is made.
pub async fn submit(
    submission: &Submission,
    mailer: &dyn MailDispatcher,
) -> Result<OutboundMessage, ContactError> {
    submission.validate()?;
    let message = submission.compose();
    mailer.send(&message).await?;
    Ok(message)
}
