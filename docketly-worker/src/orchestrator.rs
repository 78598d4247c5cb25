/// Notification worker loop
///
/// Drains the notification outbox: claims a batch, delivers each row through
/// the configured [`Mailer`], and records the outcome.
///
/// # Architecture
///
/// ```text
/// Notifier
///   ├─> NotificationQueue: reclaim stale SENDING rows
///   ├─> NotificationQueue: claim PENDING rows (→ SENDING)
///   ├─> InvoiceService: render the invoice PDF for invoice emails
///   ├─> Mailer: send
///   └─> NotificationQueue: mark SENT, or retry / FAILED
/// ```
///
/// # Concurrency
///
/// Each claimed batch is delivered with at most `max_concurrency` sends in
/// flight. On shutdown the current batch finishes so no row is left in
/// SENDING.
///
/// # Example
///
/// ```no_run
/// use docketly_worker::{mailer::LogMailer, orchestrator::{Notifier, NotifierConfig}};
/// use docketly_shared::{crypto::FieldCipher, services::InvoiceService};
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example(pool: PgPool, cipher: FieldCipher) -> anyhow::Result<()> {
/// let invoices = InvoiceService::new(pool.clone(), cipher);
/// let notifier = Notifier::new(pool, invoices, Arc::new(LogMailer), NotifierConfig::default());
///
/// let shutdown = notifier.shutdown_token();
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     shutdown.cancel();
/// });
///
/// notifier.run().await?;
/// # Ok(())
/// # }
/// ```

use crate::config::WorkerConfig;
use crate::mailer::{Attachment, Email, Mailer, MailerError};
use crate::queue::{NotificationQueue, QueueError};
use docketly_shared::error::ServiceError;
use docketly_shared::models::notification::{Notification, NotificationKind, NotificationStatus};
use docketly_shared::services::InvoiceService;
use futures::stream::{self, StreamExt};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Notifier configuration
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Sleep between polls when the outbox is empty
    pub poll_interval: Duration,

    /// Rows claimed per poll
    pub batch_size: usize,

    /// Emails in flight at once
    pub max_concurrency: usize,

    /// Deliveries before a row is FAILED
    pub max_attempts: i32,

    /// Per-attempt wait before a failed row is retried
    pub retry_delay: Duration,

    /// SENDING rows older than this are reclaimed
    pub stale_after: Duration,

    /// Sender address
    pub from: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfig {
            poll_interval: Duration::from_secs(1),
            batch_size: 10,
            max_concurrency: 4,
            max_attempts: 5,
            retry_delay: Duration::from_secs(30),
            stale_after: Duration::from_secs(600),
            from: crate::config::DEFAULT_EMAIL_FROM.to_string(),
        }
    }
}

impl From<&WorkerConfig> for NotifierConfig {
    fn from(config: &WorkerConfig) -> Self {
        NotifierConfig {
            poll_interval: config.poll_interval,
            batch_size: config.batch_size,
            max_concurrency: config.max_concurrency,
            max_attempts: config.max_attempts,
            retry_delay: config.retry_delay,
            stale_after: config.stale_after,
            from: config.email.from.clone(),
        }
    }
}

/// Why a single delivery failed
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Could not render invoice attachment: {0}")]
    Attachment(#[from] ServiceError),

    #[error(transparent)]
    Mailer(#[from] MailerError),
}

/// Outcome of one processed row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Retrying,
    Failed,
}

/// Per-batch tally
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub sent: usize,
    pub retrying: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.sent + self.retrying + self.failed
    }

    fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Sent => self.sent += 1,
            Delivery::Retrying => self.retrying += 1,
            Delivery::Failed => self.failed += 1,
        }
    }
}

/// Notification worker
pub struct Notifier {
    queue: NotificationQueue,
    invoices: InvoiceService,
    mailer: Arc<dyn Mailer>,
    config: NotifierConfig,
    shutdown_token: CancellationToken,
}

impl Notifier {
    pub fn new(
        db: PgPool,
        invoices: InvoiceService,
        mailer: Arc<dyn Mailer>,
        config: NotifierConfig,
    ) -> Self {
        Notifier {
            queue: NotificationQueue::new(db, config.max_attempts, config.retry_delay),
            invoices,
            mailer,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Gets shutdown token
    ///
    /// Cancelling it stops the loop after the current batch.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs until the shutdown token is cancelled
    ///
    /// Database errors are logged and retried after the poll interval; the
    /// loop itself does not give up.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            mailer = self.mailer.name(),
            batch_size = self.config.batch_size,
            max_concurrency = self.config.max_concurrency,
            "Notifier starting"
        );

        let mut last_reclaim: Option<Instant> = None;

        while !self.shutdown_token.is_cancelled() {
            let reclaim_due = last_reclaim
                .map(|at| at.elapsed() >= self.config.stale_after / 2)
                .unwrap_or(true);
            if reclaim_due {
                match self.queue.reclaim_stale(self.config.stale_after).await {
                    Ok(_) => last_reclaim = Some(Instant::now()),
                    Err(e) => tracing::error!(error = %e, "Failed to reclaim stale notifications"),
                }
            }

            match self.process_batch().await {
                // A full batch suggests more rows are waiting
                Ok(report) if report.total() >= self.config.batch_size => continue,
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Failed to claim notifications"),
            }

            tokio::select! {
                _ = self.shutdown_token.cancelled() => {}
                _ = sleep(self.config.poll_interval) => {}
            }
        }

        tracing::info!("Notifier shut down");
        Ok(())
    }

    /// Claims one batch and delivers it
    pub async fn process_batch(&self) -> Result<BatchReport, QueueError> {
        let batch = self.queue.claim(self.config.batch_size).await?;

        let deliveries: Vec<Delivery> = stream::iter(batch)
            .map(|notification| self.process(notification))
            .buffer_unordered(self.config.max_concurrency)
            .collect()
            .await;

        let mut report = BatchReport::default();
        for delivery in deliveries {
            report.record(delivery);
        }

        if report.total() > 0 {
            tracing::info!(
                sent = report.sent,
                retrying = report.retrying,
                failed = report.failed,
                "Notification batch processed"
            );
        }
        Ok(report)
    }

    async fn process(&self, notification: Notification) -> Delivery {
        let id = notification.id;

        let outcome = match self.compose(&notification).await {
            Ok(email) => self.mailer.send(&email).await.map_err(DeliveryError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => match self.queue.mark_sent(id).await {
                Ok(()) => {
                    tracing::info!(
                        notification_id = %id,
                        kind = %notification.kind,
                        to = %notification.recipient,
                        "Notification sent"
                    );
                    Delivery::Sent
                }
                Err(e) => {
                    // Email is out; the row will be reclaimed and sent again
                    tracing::error!(notification_id = %id, error = %e, "Failed to mark notification sent");
                    Delivery::Retrying
                }
            },
            Err(delivery_error) => {
                let message = delivery_error.to_string();
                match self.queue.mark_failed(id, &message).await {
                    Ok(NotificationStatus::Failed) => {
                        tracing::error!(
                            notification_id = %id,
                            attempts = notification.attempts + 1,
                            error = %message,
                            "Notification failed permanently"
                        );
                        Delivery::Failed
                    }
                    Ok(_) => {
                        tracing::warn!(
                            notification_id = %id,
                            attempts = notification.attempts + 1,
                            error = %message,
                            "Notification delivery failed, will retry"
                        );
                        Delivery::Retrying
                    }
                    Err(e) => {
                        tracing::error!(notification_id = %id, error = %e, "Failed to record delivery failure");
                        Delivery::Retrying
                    }
                }
            }
        }
    }

    /// Builds the email for one outbox row, rendering the invoice PDF when
    /// the row carries one
    async fn compose(&self, notification: &Notification) -> Result<Email, DeliveryError> {
        let mut email = Email::new(
            self.config.from.as_str(),
            notification.recipient.as_str(),
            notification.subject.as_str(),
            notification.body.as_str(),
        );

        if let Some(invoice_id) = attached_invoice(notification) {
            let detail = self.invoices.get(notification.tenant_id, invoice_id).await?;
            let pdf = self
                .invoices
                .render_pdf(notification.tenant_id, invoice_id)
                .await?;
            email = email.with_attachment(Attachment::pdf(
                format!("{}.pdf", detail.invoice.invoice_number),
                pdf,
            ));
        }

        Ok(email)
    }
}

/// Invoice whose PDF goes with this notification, if any
///
/// Only invoice emails carry an attachment. Unknown kinds are sent as plain
/// text.
pub fn attached_invoice(notification: &Notification) -> Option<Uuid> {
    match notification.kind() {
        Some(NotificationKind::InvoiceSubmitted) | Some(NotificationKind::InvoicePaid) => {
            notification.invoice_id
        }
        Some(NotificationKind::AccountCreated) | None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notification(kind: &str, invoice_id: Option<Uuid>) -> Notification {
        let now = Utc::now();
        Notification {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            kind: kind.to_string(),
            recipient: "jo@example.com".to_string(),
            subject: "Subject".to_string(),
            body: "Body".to_string(),
            invoice_id,
            status: NotificationStatus::Sending,
            attempts: 0,
            last_error: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_notifier_config_default() {
        let config = NotifierConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.stale_after, Duration::from_secs(600));
    }

    #[test]
    fn test_invoice_emails_carry_the_pdf() {
        let invoice_id = Uuid::new_v4();

        assert_eq!(
            attached_invoice(&notification("invoice_submitted", Some(invoice_id))),
            Some(invoice_id)
        );
        assert_eq!(
            attached_invoice(&notification("invoice_paid", Some(invoice_id))),
            Some(invoice_id)
        );
        // Invoice deleted after the row was queued
        assert_eq!(attached_invoice(&notification("invoice_paid", None)), None);
    }

    #[test]
    fn test_other_kinds_have_no_attachment() {
        let invoice_id = Uuid::new_v4();
        assert_eq!(
            attached_invoice(&notification("account_created", Some(invoice_id))),
            None
        );
        assert_eq!(attached_invoice(&notification("weekly_digest", Some(invoice_id))), None);
    }

    #[test]
    fn test_batch_report() {
        let mut report = BatchReport::default();
        report.record(Delivery::Sent);
        report.record(Delivery::Sent);
        report.record(Delivery::Retrying);
        report.record(Delivery::Failed);

        assert_eq!(report, BatchReport { sent: 2, retrying: 1, failed: 1 });
        assert_eq!(report.total(), 4);
    }

    // Database-backed tests are in tests/notifier_tests.rs
}
