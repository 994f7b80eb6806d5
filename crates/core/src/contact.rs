use serde::{Deserialize, Serialize};

pub const CONTACT_MESSAGE_MAX_CHARS: usize = 4000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    #[error("name is required")]
    MissingName,
    #[error("`{0}` is not a valid email address")]
    InvalidEmail(String),
    #[error("message is required")]
    MissingMessage,
    #[error("message is longer than 4000 characters")]
    MessageTooLong,
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A validated name/email/message triple from the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    name: String,
    email: String,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactReceipt {
    pub id: i64,
}

/// Delivery backend for contact submissions.
pub trait ContactService {
    fn submit(&mut self, message: &ContactMessage) -> Result<ContactReceipt, ContactError>;
}

impl ContactMessage {
    pub fn new(name: &str, email: &str, message: &str) -> Result<Self, ContactError> {
        let name = name.trim();
        let email = email.trim();
        let message = message.trim();

        if name.is_empty() {
            return Err(ContactError::MissingName);
        }
        if !is_plausible_email(email) {
            return Err(ContactError::InvalidEmail(email.to_string()));
        }
        if message.is_empty() {
            return Err(ContactError::MissingMessage);
        }
        if message.chars().count() > CONTACT_MESSAGE_MAX_CHARS {
            return Err(ContactError::MessageTooLong);
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
