/// Docket entry model and hour aggregations
///
/// An entry records one contractor's hours on one docket, split between
/// tonnage work and day labour. Every weekly figure in the system (weekly
/// views, invoices, history, dashboard) is summed from these rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE docket_entries (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     docket_id UUID NOT NULL REFERENCES dockets(id) ON DELETE CASCADE,
///     contractor_id UUID NOT NULL REFERENCES contractors(id) ON DELETE RESTRICT,
///     tonnage_hours DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (tonnage_hours >= 0),
///     day_labour_hours DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (day_labour_hours >= 0),
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT docket_entries_hours_check CHECK (
///         tonnage_hours + day_labour_hours > 0 AND tonnage_hours + day_labour_hours <= 24
///     ),
///     CONSTRAINT docket_entries_contractor_key UNIQUE (docket_id, contractor_id)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocketEntry {
    pub id: Uuid,
    pub docket_id: Uuid,
    pub contractor_id: Uuid,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Entry values for insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocketEntry {
    pub contractor_id: Uuid,
    #[serde(default)]
    pub tonnage_hours: f64,
    #[serde(default)]
    pub day_labour_hours: f64,
    pub notes: Option<String>,
}

/// Entry with the contractor's names for display
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocketEntryDetail {
    pub id: Uuid,
    pub contractor_id: Uuid,
    pub contractor_nickname: String,
    pub contractor_full_name: String,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub notes: Option<String>,
}

/// One entry of a contractor seen from the contractor's week
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeekLine {
    pub work_date: NaiveDate,
    pub docket_id: Uuid,
    pub builder_name: String,
    pub company_code: String,
    pub location_name: String,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub notes: Option<String>,
}

/// Summed hours
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HoursTotals {
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
}

impl HoursTotals {
    pub fn total(&self) -> f64 {
        self.tonnage_hours + self.day_labour_hours
    }

    pub fn is_zero(&self) -> bool {
        self.total() <= 0.0
    }

    pub fn add(&mut self, tonnage_hours: f64, day_labour_hours: f64) {
        self.tonnage_hours += tonnage_hours;
        self.day_labour_hours += day_labour_hours;
    }
}

/// One contractor's hours within a date range
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContractorHours {
    pub contractor_id: Uuid,
    pub nickname: String,
    pub full_name: String,
    pub docket_count: i64,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
}

/// One contractor's hours for one ISO week
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeekHours {
    pub week_start: NaiveDate,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
}

/// Flat entry row feeding the admin dashboard
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DashboardRow {
    pub docket_id: Uuid,
    pub builder_id: Uuid,
    pub builder_name: String,
    pub contractor_id: Uuid,
    pub contractor_active: bool,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
}

impl DocketEntry {
    /// Inserts all entries of a docket in one statement
    pub async fn insert_many(
        executor: impl PgExecutor<'_>,
        docket_id: Uuid,
        entries: &[NewDocketEntry],
    ) -> Result<u64, sqlx::Error> {
        let contractor_ids: Vec<Uuid> = entries.iter().map(|e| e.contractor_id).collect();
        let tonnage: Vec<f64> = entries.iter().map(|e| e.tonnage_hours).collect();
        let day_labour: Vec<f64> = entries.iter().map(|e| e.day_labour_hours).collect();
        let notes: Vec<Option<String>> = entries.iter().map(|e| e.notes.clone()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO docket_entries (docket_id, contractor_id, tonnage_hours, day_labour_hours, notes)
            SELECT $1, * FROM UNNEST($2::UUID[], $3::FLOAT8[], $4::FLOAT8[], $5::TEXT[])
            "#,
        )
        .bind(docket_id)
        .bind(&contractor_ids)
        .bind(&tonnage)
        .bind(&day_labour)
        .bind(&notes)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_for_docket(
        executor: impl PgExecutor<'_>,
        docket_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM docket_entries WHERE docket_id = $1")
            .bind(docket_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Entries of a docket ordered by contractor nickname
    pub async fn list_for_docket(
        pool: &PgPool,
        docket_id: Uuid,
    ) -> Result<Vec<DocketEntryDetail>, sqlx::Error> {
        sqlx::query_as::<_, DocketEntryDetail>(
            r#"
            SELECT e.id, e.contractor_id, c.nickname AS contractor_nickname,
                   c.full_name AS contractor_full_name, e.tonnage_hours,
                   e.day_labour_hours, e.notes
            FROM docket_entries e
            JOIN contractors c ON c.id = e.contractor_id
            WHERE e.docket_id = $1
            ORDER BY c.nickname
            "#,
        )
        .bind(docket_id)
        .fetch_all(pool)
        .await
    }

    /// Contractors currently on a docket
    pub async fn contractor_ids(
        executor: impl PgExecutor<'_>,
        docket_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT contractor_id FROM docket_entries WHERE docket_id = $1")
            .bind(docket_id)
            .fetch_all(executor)
            .await
    }

    /// A contractor's entries between two dates, oldest first
    pub async fn week_lines(
        pool: &PgPool,
        tenant_id: Uuid,
        contractor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WeekLine>, sqlx::Error> {
        sqlx::query_as::<_, WeekLine>(
            r#"
            SELECT d.work_date, d.id AS docket_id, b.name AS builder_name, b.company_code,
                   l.name AS location_name, e.tonnage_hours, e.day_labour_hours, e.notes
            FROM docket_entries e
            JOIN dockets d ON d.id = e.docket_id
            JOIN builders b ON b.id = d.builder_id
            JOIN builder_locations l ON l.id = d.location_id
            WHERE d.tenant_id = $1 AND e.contractor_id = $2
              AND d.work_date BETWEEN $3 AND $4
            ORDER BY d.work_date, b.name, l.name
            "#,
        )
        .bind(tenant_id)
        .bind(contractor_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// A contractor's summed hours between two dates
    pub async fn totals_for_contractor(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        contractor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HoursTotals, sqlx::Error> {
        sqlx::query_as::<_, HoursTotals>(
            r#"
            SELECT COALESCE(SUM(e.tonnage_hours), 0) AS tonnage_hours,
                   COALESCE(SUM(e.day_labour_hours), 0) AS day_labour_hours
            FROM docket_entries e
            JOIN dockets d ON d.id = e.docket_id
            WHERE d.tenant_id = $1 AND e.contractor_id = $2
              AND d.work_date BETWEEN $3 AND $4
            "#,
        )
        .bind(tenant_id)
        .bind(contractor_id)
        .bind(from)
        .bind(to)
        .fetch_one(executor)
        .await
    }

    /// Per-contractor totals between two dates, sorted by nickname
    ///
    /// Only contractors with at least one entry in the range appear.
    pub async fn totals_by_contractor(
        pool: &PgPool,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ContractorHours>, sqlx::Error> {
        sqlx::query_as::<_, ContractorHours>(
            r#"
            SELECT c.id AS contractor_id, c.nickname, c.full_name,
                   COUNT(DISTINCT d.id) AS docket_count,
                   COALESCE(SUM(e.tonnage_hours), 0) AS tonnage_hours,
                   COALESCE(SUM(e.day_labour_hours), 0) AS day_labour_hours
            FROM docket_entries e
            JOIN dockets d ON d.id = e.docket_id
            JOIN contractors c ON c.id = e.contractor_id
            WHERE d.tenant_id = $1 AND d.work_date BETWEEN $2 AND $3
            GROUP BY c.id, c.nickname, c.full_name
            ORDER BY c.nickname
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// A contractor's hours grouped by ISO week (Monday start)
    ///
    /// Weeks without entries are absent; callers fill the gaps.
    pub async fn weekly_totals(
        pool: &PgPool,
        tenant_id: Uuid,
        contractor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WeekHours>, sqlx::Error> {
        sqlx::query_as::<_, WeekHours>(
            r#"
            SELECT date_trunc('week', d.work_date)::DATE AS week_start,
                   COALESCE(SUM(e.tonnage_hours), 0) AS tonnage_hours,
                   COALESCE(SUM(e.day_labour_hours), 0) AS day_labour_hours
            FROM docket_entries e
            JOIN dockets d ON d.id = e.docket_id
            WHERE d.tenant_id = $1 AND e.contractor_id = $2
              AND d.work_date BETWEEN $3 AND $4
            GROUP BY 1
            ORDER BY 1 DESC
            "#,
        )
        .bind(tenant_id)
        .bind(contractor_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Every entry between two dates with builder and contractor context
    pub async fn dashboard_rows(
        pool: &PgPool,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DashboardRow>, sqlx::Error> {
        sqlx::query_as::<_, DashboardRow>(
            r#"
            SELECT d.id AS docket_id, b.id AS builder_id, b.name AS builder_name,
                   e.contractor_id, c.active AS contractor_active,
                   e.tonnage_hours, e.day_labour_hours
            FROM docket_entries e
            JOIN dockets d ON d.id = e.docket_id
            JOIN builders b ON b.id = d.builder_id
            JOIN contractors c ON c.id = e.contractor_id
            WHERE d.tenant_id = $1 AND d.work_date BETWEEN $2 AND $3
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}
