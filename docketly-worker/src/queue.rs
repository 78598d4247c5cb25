/// Notification outbox reader
///
/// Claims PENDING notifications for delivery and records the outcome.
///
/// # Claiming
///
/// Rows are claimed with `FOR UPDATE SKIP LOCKED`, so several workers can
/// drain the same table without sending an email twice. A claimed row is
/// SENDING until the worker reports back. A worker that dies mid-send leaves
/// rows in SENDING; [`NotificationQueue::reclaim_stale`] puts them back.
///
/// # Retries
///
/// A failed delivery returns the row to PENDING with `attempts + 1`. It is
/// not claimed again until `retry_delay * attempts` has passed. Once
/// `attempts` reaches `max_attempts` the row is FAILED and left alone.
///
/// # Example
///
/// ```no_run
/// use docketly_worker::queue::NotificationQueue;
/// use sqlx::PgPool;
/// use std::time::Duration;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let queue = NotificationQueue::new(pool, 5, Duration::from_secs(30));
///
/// for notification in queue.claim(10).await? {
///     // deliver...
///     queue.mark_sent(notification.id).await?;
/// }
/// # Ok(())
/// # }
/// ```

use docketly_shared::models::notification::{Notification, NotificationStatus, COLUMNS};
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Queue error
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Row is gone or no longer SENDING
    #[error("Notification not found or not claimed: {0}")]
    NotClaimed(Uuid),
}

/// Notification outbox reader
#[derive(Clone)]
pub struct NotificationQueue {
    db: PgPool,
    max_attempts: i32,
    retry_delay: Duration,
}

impl NotificationQueue {
    pub fn new(db: PgPool, max_attempts: i32, retry_delay: Duration) -> Self {
        NotificationQueue {
            db,
            max_attempts,
            retry_delay,
        }
    }

    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }

    /// Claims up to `limit` due notifications, oldest first
    ///
    /// Claimed rows move to SENDING.
    pub async fn claim(&self, limit: usize) -> Result<Vec<Notification>, QueueError> {
        let sql = format!(
            r#"
            UPDATE notifications
            SET status = $1, updated_at = NOW()
            WHERE id IN (
                SELECT id
                FROM notifications
                WHERE status = $2
                  AND updated_at <= NOW() - make_interval(secs => $3 * attempts)
                ORDER BY created_at ASC
                LIMIT $4
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {COLUMNS}
            "#
        );

        let mut claimed = sqlx::query_as::<_, Notification>(&sql)
            .bind(NotificationStatus::Sending)
            .bind(NotificationStatus::Pending)
            .bind(self.retry_delay.as_secs_f64())
            .bind(limit as i64)
            .fetch_all(&self.db)
            .await?;

        // RETURNING does not preserve the subquery order
        claimed.sort_by_key(|n| n.created_at);

        if !claimed.is_empty() {
            tracing::info!(count = claimed.len(), "Claimed notifications");
        }

        Ok(claimed)
    }

    /// Records a successful delivery
    pub async fn mark_sent(&self, id: Uuid) -> Result<(), QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = $2,
                attempts = attempts + 1,
                last_error = NULL,
                sent_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(id)
        .bind(NotificationStatus::Sent)
        .bind(NotificationStatus::Sending)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::NotClaimed(id));
        }
        Ok(())
    }

    /// Records a failed delivery
    ///
    /// Returns the row's new status: PENDING while attempts remain, FAILED
    /// once they are used up.
    pub async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
    ) -> Result<NotificationStatus, QueueError> {
        let status = sqlx::query_scalar::<_, NotificationStatus>(
            r#"
            UPDATE notifications
            SET attempts = attempts + 1,
                last_error = $2,
                status = CASE WHEN attempts + 1 >= $3 THEN $4 ELSE $5 END,
                updated_at = NOW()
            WHERE id = $1 AND status = $6
            RETURNING status
            "#,
        )
        .bind(id)
        .bind(truncate_error(error))
        .bind(self.max_attempts)
        .bind(NotificationStatus::Failed)
        .bind(NotificationStatus::Pending)
        .bind(NotificationStatus::Sending)
        .fetch_optional(&self.db)
        .await?;

        status.ok_or(QueueError::NotClaimed(id))
    }

    /// Returns SENDING rows untouched for `older_than` to PENDING
    ///
    /// Returns how many rows were reclaimed.
    pub async fn reclaim_stale(&self, older_than: Duration) -> Result<u64, QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = $1, updated_at = NOW()
            WHERE status = $2
              AND updated_at < NOW() - make_interval(secs => $3)
            "#,
        )
        .bind(NotificationStatus::Pending)
        .bind(NotificationStatus::Sending)
        .bind(older_than.as_secs_f64())
        .execute(&self.db)
        .await?;

        let reclaimed = result.rows_affected();
        if reclaimed > 0 {
            tracing::warn!(count = reclaimed, "Reclaimed stale SENDING notifications");
        }
        Ok(reclaimed)
    }

    /// Number of rows in each status
    pub async fn counts(&self) -> Result<Vec<(NotificationStatus, i64)>, QueueError> {
        let counts = sqlx::query_as::<_, (NotificationStatus, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM notifications
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(counts)
    }
}

const MAX_ERROR_LEN: usize = 1000;

/// Cuts provider error bodies down to something worth storing
fn truncate_error(error: &str) -> &str {
    if error.len() <= MAX_ERROR_LEN {
        return error;
    }
    let mut end = MAX_ERROR_LEN;
    while !error.is_char_boundary(end) {
        end -= 1;
    }
    &error[..end]
}
