use super::{Email, Mailer, MailerResult};
use async_trait::async_trait;

/// Logs emails instead of sending them
///
/// Used when no provider API key is configured, so development setups drain
/// the outbox without credentials.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, email: &Email) -> MailerResult<()> {
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Email logged (no provider configured)"
        );
        Ok(())
    }
}
