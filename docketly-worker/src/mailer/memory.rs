use super::{Email, Mailer, MailerError, MailerResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records emails in memory
///
/// Clones share the same outbox. `failing(n)` rejects the first `n` sends.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<Email>>>,
    failures_left: Arc<AtomicUsize>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failures: usize) -> Self {
        let mailer = Self::default();
        mailer.failures_left.store(failures, Ordering::SeqCst);
        mailer
    }

    /// Emails accepted so far
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send(&self, email: &Email) -> MailerResult<()> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(MailerError::Rejected {
                status: 503,
                body: "simulated outage".to_string(),
            });
        }

        self.sent
            .lock()
            .map_err(|_| MailerError::Invalid("memory mailer poisoned".to_string()))?
            .push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_emails() {
        let mailer = MemoryMailer::new();
        let observer = mailer.clone();

        mailer
            .send(&Email::new("a@example.com", "b@example.com", "Hi", "Body"))
            .await
            .unwrap();

        assert_eq!(observer.sent().len(), 1);
        assert_eq!(observer.sent()[0].to, "b@example.com");
    }

    #[tokio::test]
    async fn test_failing_rejects_then_recovers() {
        let mailer = MemoryMailer::failing(1);
        let email = Email::new("a@example.com", "b@example.com", "Hi", "Body");

        assert!(matches!(
            mailer.send(&email).await,
            Err(MailerError::Rejected { status: 503, .. })
        ));
        assert!(mailer.send(&email).await.is_ok());
        assert_eq!(mailer.sent().len(), 1);
    }
}
