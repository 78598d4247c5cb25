/// Email delivery
///
/// The notifier hands every outbox row to a [`Mailer`]. Three implementations
/// exist:
///
/// - [`HttpMailer`]: transactional email provider over HTTPS
/// - [`LogMailer`]: logs the email instead of sending it (no API key configured)
/// - [`MemoryMailer`]: records emails in memory for tests
///
/// # Example
///
/// ```no_run
/// use docketly_worker::mailer::{Email, LogMailer, Mailer};
///
/// # async fn example() -> Result<(), docketly_worker::mailer::MailerError> {
/// let mailer = LogMailer;
/// mailer
///     .send(&Email::new("pay@example.com", "jo@example.com", "Paid", "Your invoice was paid."))
///     .await?;
/// # Ok(())
/// # }
/// ```

mod http;
mod log;
mod memory;

pub use http::HttpMailer;
pub use log::LogMailer;
pub use memory::MemoryMailer;

use crate::config::EmailConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Mailer error types
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// Request never got a response
    #[error("Email request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Mailer could not be built or the message is unusable
    #[error("Invalid email: {0}")]
    Invalid(String),
}

pub type MailerResult<T> = Result<T, MailerError>;

/// A file attached to an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "application/pdf".to_string(),
            content,
        }
    }
}

/// One outgoing plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl Email {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Delivers emails
///
/// Implementations must be safe to call concurrently; the notifier sends
/// several emails at once.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Sends one email; an error leaves the outbox row for retry
    async fn send(&self, email: &Email) -> MailerResult<()>;
}

/// Picks the HTTP mailer when an API key is configured, the log mailer otherwise
pub fn from_config(config: &EmailConfig) -> MailerResult<Arc<dyn Mailer>> {
    match &config.api_key {
        Some(api_key) => Ok(Arc::new(HttpMailer::new(&config.api_url, api_key)?)),
        None => {
            tracing::warn!("EMAIL_API_KEY not set; emails will be logged, not sent");
            Ok(Arc::new(LogMailer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_config(api_key: Option<&str>) -> EmailConfig {
        EmailConfig {
            api_key: api_key.map(str::to_string),
            api_url: "https://mail.example.com".to_string(),
            from: "pay@example.com".to_string(),
        }
    }

    #[test]
    fn test_from_config_picks_mailer() {
        assert_eq!(from_config(&email_config(None)).unwrap().name(), "log");
        assert_eq!(from_config(&email_config(Some("key"))).unwrap().name(), "http");
    }

    #[test]
    fn test_email_builder() {
        let email = Email::new("a@example.com", "b@example.com", "Hi", "Body")
            .with_attachment(Attachment::pdf("INV-1.pdf", b"%PDF-1.7".to_vec()));

        assert_eq!(email.attachments.len(), 1);
        assert_eq!(email.attachments[0].content_type, "application/pdf");
    }
}
