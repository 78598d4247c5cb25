/// Notification outbox
///
/// State changes that must email someone insert a row here inside their own
/// transaction. The worker drains the table, so an email is queued exactly
/// when the change commits.
///
/// # Status workflow
///
/// ```text
/// PENDING ──claim──▶ SENDING ──ok──▶ SENT
///    ▲                  │
///    └──── retry ───────┤
///                       └──attempts exhausted──▶ FAILED
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE notification_status AS ENUM ('PENDING', 'SENDING', 'SENT', 'FAILED');
///
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     kind VARCHAR(64) NOT NULL,
///     recipient VARCHAR(255) NOT NULL,
///     subject VARCHAR(255) NOT NULL,
///     body TEXT NOT NULL,
///     invoice_id UUID REFERENCES worker_invoices(id) ON DELETE SET NULL,
///     status notification_status NOT NULL DEFAULT 'PENDING',
///     attempts INTEGER NOT NULL DEFAULT 0,
///     last_error TEXT,
///     sent_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationStatus {
    Pending,
    Sending,
    Sent,
    Failed,
}

/// What caused the email; stored as text in `kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// New login created by an admin, carries the temporary password
    AccountCreated,

    /// Worker submitted an invoice; sent to every active admin
    InvoiceSubmitted,

    /// Admin marked an invoice paid; sent to the contractor
    InvoicePaid,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::AccountCreated => "account_created",
            NotificationKind::InvoiceSubmitted => "invoice_submitted",
            NotificationKind::InvoicePaid => "invoice_paid",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "account_created" => Ok(NotificationKind::AccountCreated),
            "invoice_submitted" => Ok(NotificationKind::InvoiceSubmitted),
            "invoice_paid" => Ok(NotificationKind::InvoicePaid),
            _ => Err(format!("Unknown notification kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub kind: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub invoice_id: Option<Uuid>,
    pub status: NotificationStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An email to queue
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub tenant_id: Uuid,
    pub kind: NotificationKind,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// Invoice whose PDF is attached on delivery
    pub invoice_id: Option<Uuid>,
}

pub const COLUMNS: &str = "id, tenant_id, kind, recipient, subject, body, invoice_id, status, \
                           attempts, last_error, sent_at, created_at, updated_at";

impl Notification {
    /// Parsed `kind`, `None` for rows written by a newer release
    pub fn kind(&self) -> Option<NotificationKind> {
        self.kind.parse().ok()
    }

    /// Queues one email
    pub async fn enqueue(
        executor: impl PgExecutor<'_>,
        notification: &NewNotification,
    ) -> Result<Uuid, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO notifications (tenant_id, kind, recipient, subject, body, invoice_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(notification.tenant_id)
        .bind(notification.kind.as_str())
        .bind(&notification.recipient)
        .bind(&notification.subject)
        .bind(&notification.body)
        .bind(notification.invoice_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1");
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
