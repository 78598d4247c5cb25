/// Worker invoice model
///
/// One invoice per contractor per ISO week. Hours and rates are snapshotted
/// when the draft is prepared, so later rate changes never alter an invoice
/// that has left DRAFT.
///
/// # Status workflow
///
/// ```text
/// DRAFT ──submit──▶ SUBMITTED ──mark paid──▶ PAID
/// ```
///
/// Transitions are conditional updates (`WHERE status = ...`), so two
/// concurrent requests cannot both move the same invoice.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invoice_status AS ENUM ('DRAFT', 'SUBMITTED', 'PAID');
///
/// CREATE TABLE worker_invoices (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     contractor_id UUID NOT NULL REFERENCES contractors(id) ON DELETE RESTRICT,
///     invoice_number VARCHAR(96) NOT NULL,
///     week_start DATE NOT NULL,
///     week_end DATE NOT NULL,
///     tonnage_hours DOUBLE PRECISION NOT NULL DEFAULT 0,
///     day_labour_hours DOUBLE PRECISION NOT NULL DEFAULT 0,
///     tonnage_rate_cents BIGINT NOT NULL DEFAULT 0,
///     day_labour_rate_cents BIGINT NOT NULL DEFAULT 0,
///     subtotal_cents BIGINT NOT NULL DEFAULT 0,
///     gst_cents BIGINT NOT NULL DEFAULT 0,
///     total_cents BIGINT NOT NULL DEFAULT 0,
///     status invoice_status NOT NULL DEFAULT 'DRAFT',
///     submitted_at TIMESTAMPTZ,
///     paid_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT worker_invoices_week_key UNIQUE (contractor_id, week_start)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::pagination::PageParams;

/// Invoice lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    /// Prepared from dockets; still recomputed on refresh
    Draft,

    /// Sent by the worker for payment; dockets of the week are locked
    Submitted,

    /// Paid by an admin (terminal)
    Paid,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] =
        [InvoiceStatus::Draft, InvoiceStatus::Submitted, InvoiceStatus::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Submitted => "SUBMITTED",
            InvoiceStatus::Paid => "PAID",
        }
    }

    /// Whether the workflow allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (InvoiceStatus::Draft, InvoiceStatus::Submitted)
                | (InvoiceStatus::Submitted, InvoiceStatus::Paid)
        )
    }

    /// Whether dockets feeding an invoice in this state are frozen
    pub fn locks_dockets(&self) -> bool {
        !matches!(self, InvoiceStatus::Draft)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(InvoiceStatus::Draft),
            "SUBMITTED" => Ok(InvoiceStatus::Submitted),
            "PAID" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkerInvoice {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub contractor_id: Uuid,
    pub invoice_number: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub tonnage_rate_cents: i64,
    pub day_labour_rate_cents: i64,
    pub subtotal_cents: i64,
    pub gst_cents: i64,
    pub total_cents: i64,
    pub status: InvoiceStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Computed values written by [`WorkerInvoice::upsert_draft`]
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub contractor_id: Uuid,
    pub invoice_number: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub tonnage_rate_cents: i64,
    pub day_labour_rate_cents: i64,
    pub subtotal_cents: i64,
    pub gst_cents: i64,
    pub total_cents: i64,
}

/// Invoice list row with the contractor's names
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InvoiceSummary {
    pub id: Uuid,
    pub contractor_id: Uuid,
    pub contractor_nickname: String,
    pub contractor_full_name: String,
    pub invoice_number: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub total_cents: i64,
    pub status: InvoiceStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub contractor_id: Option<Uuid>,
    pub week_start: Option<NaiveDate>,
}

/// Count and summed total for one status
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusTotals {
    pub status: InvoiceStatus,
    pub count: i64,
    pub total_cents: i64,
}

/// SUBMITTED invoice joined with the contractor's encrypted bank details
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub week_start: NaiveDate,
    pub total_cents: i64,
    pub contractor_full_name: String,
    pub contractor_nickname: String,
    pub abn: Option<String>,
    pub bank_account_name: Option<String>,
    pub bank_bsb: Option<String>,
    pub bank_account_number: Option<String>,
}

const COLUMNS: &str = "id, tenant_id, contractor_id, invoice_number, week_start, week_end, \
                       tonnage_hours, day_labour_hours, tonnage_rate_cents, day_labour_rate_cents, \
                       subtotal_cents, gst_cents, total_cents, status, submitted_at, paid_at, \
                       created_at, updated_at";

impl WorkerInvoice {
    pub async fn find(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM worker_invoices WHERE id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, WorkerInvoice>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await
    }

    /// Loads an invoice and locks its row for the rest of the transaction
    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM worker_invoices WHERE id = $1 AND tenant_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, WorkerInvoice>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_for_week(
        executor: impl PgExecutor<'_>,
        contractor_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM worker_invoices WHERE contractor_id = $1 AND week_start = $2"
        );
        sqlx::query_as::<_, WorkerInvoice>(&sql)
            .bind(contractor_id)
            .bind(week_start)
            .fetch_optional(executor)
            .await
    }

    /// Creates the week's draft or refreshes an existing one
    ///
    /// Returns `None` when the week already has an invoice past DRAFT; that
    /// row is left untouched.
    pub async fn upsert_draft(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        draft: &InvoiceDraft,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO worker_invoices (
                tenant_id, contractor_id, invoice_number, week_start, week_end,
                tonnage_hours, day_labour_hours, tonnage_rate_cents, day_labour_rate_cents,
                subtotal_cents, gst_cents, total_cents
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (contractor_id, week_start) DO UPDATE
            SET invoice_number = EXCLUDED.invoice_number,
                tonnage_hours = EXCLUDED.tonnage_hours,
                day_labour_hours = EXCLUDED.day_labour_hours,
                tonnage_rate_cents = EXCLUDED.tonnage_rate_cents,
                day_labour_rate_cents = EXCLUDED.day_labour_rate_cents,
                subtotal_cents = EXCLUDED.subtotal_cents,
                gst_cents = EXCLUDED.gst_cents,
                total_cents = EXCLUDED.total_cents,
                updated_at = NOW()
            WHERE worker_invoices.status = 'DRAFT'
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, WorkerInvoice>(&sql)
            .bind(tenant_id)
            .bind(draft.contractor_id)
            .bind(&draft.invoice_number)
            .bind(draft.week_start)
            .bind(draft.week_end)
            .bind(draft.tonnage_hours)
            .bind(draft.day_labour_hours)
            .bind(draft.tonnage_rate_cents)
            .bind(draft.day_labour_rate_cents)
            .bind(draft.subtotal_cents)
            .bind(draft.gst_cents)
            .bind(draft.total_cents)
            .fetch_optional(executor)
            .await
    }

    /// DRAFT → SUBMITTED; `None` when the invoice is not a draft
    pub async fn submit(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE worker_invoices
            SET status = 'SUBMITTED', submitted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'DRAFT'
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, WorkerInvoice>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await
    }

    /// SUBMITTED → PAID; `None` when the invoice is not submitted
    pub async fn mark_paid(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE worker_invoices
            SET status = 'PAID', paid_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'SUBMITTED'
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, WorkerInvoice>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await
    }

    /// Lists invoices newest week first
    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        filter: &InvoiceFilter,
        page: &PageParams,
    ) -> Result<(Vec<InvoiceSummary>, i64), sqlx::Error> {
        let predicate = r#"
            i.tenant_id = $1
            AND ($2::invoice_status IS NULL OR i.status = $2)
            AND ($3::UUID IS NULL OR i.contractor_id = $3)
            AND ($4::DATE IS NULL OR i.week_start = $4)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM worker_invoices i WHERE {predicate}"
        ))
        .bind(tenant_id)
        .bind(filter.status)
        .bind(filter.contractor_id)
        .bind(filter.week_start)
        .fetch_one(pool)
        .await?;

        let sql = format!(
            r#"
            SELECT i.id, i.contractor_id, c.nickname AS contractor_nickname,
                   c.full_name AS contractor_full_name, i.invoice_number, i.week_start,
                   i.week_end, i.tonnage_hours, i.day_labour_hours, i.total_cents,
                   i.status, i.submitted_at, i.paid_at
            FROM worker_invoices i
            JOIN contractors c ON c.id = i.contractor_id
            WHERE {predicate}
            ORDER BY i.week_start DESC, c.nickname
            LIMIT $5 OFFSET $6
            "#
        );
        let invoices = sqlx::query_as::<_, InvoiceSummary>(&sql)
            .bind(tenant_id)
            .bind(filter.status)
            .bind(filter.contractor_id)
            .bind(filter.week_start)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((invoices, total))
    }

    /// Nicknames of the given contractors whose invoice for the week has
    /// left DRAFT
    pub async fn locked_contractors(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        contractor_ids: &[Uuid],
        week_start: NaiveDate,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT c.nickname
            FROM worker_invoices i
            JOIN contractors c ON c.id = i.contractor_id
            WHERE i.tenant_id = $1 AND i.contractor_id = ANY($2)
              AND i.week_start = $3 AND i.status IN ('SUBMITTED', 'PAID')
            ORDER BY c.nickname
            "#,
        )
        .bind(tenant_id)
        .bind(contractor_ids)
        .bind(week_start)
        .fetch_all(executor)
        .await
    }

    /// Count and total per status, optionally for one contractor and a
    /// range of week starts
    pub async fn status_totals(
        pool: &PgPool,
        tenant_id: Uuid,
        contractor_id: Option<Uuid>,
        weeks: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<StatusTotals>, sqlx::Error> {
        let (from, to) = weeks.unzip();
        sqlx::query_as::<_, StatusTotals>(
            r#"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(total_cents), 0)::BIGINT AS total_cents
            FROM worker_invoices
            WHERE tenant_id = $1
              AND ($2::UUID IS NULL OR contractor_id = $2)
              AND ($3::DATE IS NULL OR week_start >= $3)
              AND ($4::DATE IS NULL OR week_start <= $4)
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(tenant_id)
        .bind(contractor_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// A contractor's invoices with week starts in a range, newest first
    pub async fn for_contractor(
        pool: &PgPool,
        tenant_id: Uuid,
        contractor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM worker_invoices
            WHERE tenant_id = $1 AND contractor_id = $2 AND week_start BETWEEN $3 AND $4
            ORDER BY week_start DESC
            "#
        );
        sqlx::query_as::<_, WorkerInvoice>(&sql)
            .bind(tenant_id)
            .bind(contractor_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Every invoice of the tenant for one week
    pub async fn for_week(
        pool: &PgPool,
        tenant_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM worker_invoices WHERE tenant_id = $1 AND week_start = $2"
        );
        sqlx::query_as::<_, WorkerInvoice>(&sql)
            .bind(tenant_id)
            .bind(week_start)
            .fetch_all(pool)
            .await
    }

    /// Every SUBMITTED invoice awaiting payment, oldest week first
    pub async fn awaiting_payment(
        pool: &PgPool,
        tenant_id: Uuid,
    ) -> Result<Vec<PaymentRow>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT i.id AS invoice_id, i.invoice_number, i.week_start, i.total_cents,
                   c.full_name AS contractor_full_name, c.nickname AS contractor_nickname,
                   c.abn, c.bank_account_name, c.bank_bsb, c.bank_account_number
            FROM worker_invoices i
            JOIN contractors c ON c.id = i.contractor_id
            WHERE i.tenant_id = $1 AND i.status = 'SUBMITTED'
            ORDER BY i.week_start, c.nickname
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }
}
