use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

pub const DEFAULT_SUBJECT: &str = "To Do List! 🧠";

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// One generated email, ready to hand to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub body: String,
}

impl EmailDraft {
    pub fn to_message(&self) -> Result<Message, MailError> {
        let message = Message::builder()
            .from(parse_mailbox(&self.from)?)
            .to(parse_mailbox(&self.to)?)
            .subject(self.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())?;
        Ok(message)
    }
}

fn parse_mailbox(address: &str) -> Result<lettre::message::Mailbox, MailError> {
    address.parse().map_err(|source| MailError::InvalidAddress {
        address: address.to_string(),
        source,
    })
}

/// Delivers a finished draft. Confirmation beyond success or failure is not
/// inspected.
pub trait Mailer {
    fn deliver(&self, draft: &EmailDraft) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    /// STARTTLS relay with username/password login, e.g. Gmail on port 587
    /// with an app password.
    pub fn new(server: &str, port: u16, username: String, password: String) -> Result<Self, MailError> {
        let creds = Credentials::new(username, password);
        let transport = SmtpTransport::starttls_relay(server)?
            .port(port)
            .credentials(creds)
            .build();

        Ok(SmtpMailer { transport })
    }
}

impl Mailer for SmtpMailer {
    fn deliver(&self, draft: &EmailDraft) -> Result<(), MailError> {
        let message = draft.to_message()?;
        self.transport.send(&message)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> EmailDraft {
        EmailDraft {
            subject: DEFAULT_SUBJECT.to_string(),
            from: "pixel@example.com".to_string(),
            to: "Amy <amy@example.com>".to_string(),
            body: "Good morning!".to_string(),
        }
    }

    #[test]
    fn test_draft_to_message() {
        let message = draft().to_message().unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("From: pixel@example.com"));
        assert!(formatted.contains("amy@example.com"));
        assert!(formatted.contains("Good morning!"));
    }

    #[test]
    fn test_invalid_recipient() {
        let mut bad = draft();
        bad.to = "not an address".to_string();
        let err = bad.to_message().unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress { ref address, .. } if address == "not an address"));
    }

    #[test]
    fn test_smtp_mailer_builds_without_connecting() {
        assert!(SmtpMailer::new("smtp.gmail.com", 587, "user".into(), "secret".into()).is_ok());
    }
}
