/// Docket model
///
/// A docket is one supervisor's report of a day on one site. The hours live
/// in [`super::docket_entry::DocketEntry`] rows; listing queries join them
/// back in as per-docket totals.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE dockets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     builder_id UUID NOT NULL REFERENCES builders(id) ON DELETE RESTRICT,
///     location_id UUID NOT NULL REFERENCES builder_locations(id) ON DELETE RESTRICT,
///     supervisor_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     work_date DATE NOT NULL,
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT dockets_location_date_supervisor_key
///         UNIQUE (location_id, work_date, supervisor_id)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::pagination::PageParams;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Docket {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub builder_id: Uuid,
    pub location_id: Uuid,
    pub supervisor_id: Uuid,
    pub work_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Docket header values for insert
#[derive(Debug, Clone)]
pub struct NewDocket {
    pub builder_id: Uuid,
    pub location_id: Uuid,
    pub supervisor_id: Uuid,
    pub work_date: NaiveDate,
    pub notes: Option<String>,
}

/// Docket with display names and hour totals
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocketSummary {
    pub id: Uuid,
    pub work_date: NaiveDate,
    pub builder_id: Uuid,
    pub builder_name: String,
    pub company_code: String,
    pub location_id: Uuid,
    pub location_name: String,
    pub supervisor_id: Uuid,
    pub supervisor_name: String,
    pub notes: Option<String>,
    pub entry_count: i64,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List filters for `/v1/dockets`; all bounds inclusive
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocketFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub builder_id: Option<Uuid>,
    pub supervisor_id: Option<Uuid>,
}

/// One CSV line: a docket entry with its docket's context
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocketExportRow {
    pub work_date: NaiveDate,
    pub company_code: String,
    pub location_name: String,
    pub supervisor_name: String,
    pub contractor_nickname: String,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub notes: Option<String>,
}

const COLUMNS: &str =
    "id, tenant_id, builder_id, location_id, supervisor_id, work_date, notes, created_at, updated_at";

const SUMMARY_SELECT: &str = r#"
    SELECT d.id, d.work_date, d.builder_id, b.name AS builder_name, b.company_code,
           d.location_id, l.name AS location_name, d.supervisor_id,
           u.name AS supervisor_name, d.notes,
           COUNT(e.id) AS entry_count,
           COALESCE(SUM(e.tonnage_hours), 0) AS tonnage_hours,
           COALESCE(SUM(e.day_labour_hours), 0) AS day_labour_hours,
           d.created_at, d.updated_at
    FROM dockets d
    JOIN builders b ON b.id = d.builder_id
    JOIN builder_locations l ON l.id = d.location_id
    JOIN users u ON u.id = d.supervisor_id
    LEFT JOIN docket_entries e ON e.docket_id = d.id
"#;

const SUMMARY_GROUP: &str =
    "GROUP BY d.id, b.name, b.company_code, l.name, u.name";

const FILTER_PREDICATE: &str = r#"
    d.tenant_id = $1
    AND ($2::DATE IS NULL OR d.work_date >= $2)
    AND ($3::DATE IS NULL OR d.work_date <= $3)
    AND ($4::UUID IS NULL OR d.builder_id = $4)
    AND ($5::UUID IS NULL OR d.supervisor_id = $5)
"#;

impl Docket {
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        data: &NewDocket,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO dockets (tenant_id, builder_id, location_id, supervisor_id, work_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Docket>(&sql)
            .bind(tenant_id)
            .bind(data.builder_id)
            .bind(data.location_id)
            .bind(data.supervisor_id)
            .bind(data.work_date)
            .bind(&data.notes)
            .fetch_one(executor)
            .await
    }

    /// Loads a docket and locks its row for the rest of the transaction
    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM dockets WHERE id = $1 AND tenant_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, Docket>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_summary(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<DocketSummary>, sqlx::Error> {
        let sql = format!("{SUMMARY_SELECT} WHERE d.id = $1 AND d.tenant_id = $2 {SUMMARY_GROUP}");
        sqlx::query_as::<_, DocketSummary>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists dockets newest first with per-docket totals
    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        filter: &DocketFilter,
        page: &PageParams,
    ) -> Result<(Vec<DocketSummary>, i64), sqlx::Error> {
        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM dockets d WHERE {FILTER_PREDICATE}"))
                .bind(tenant_id)
                .bind(filter.from)
                .bind(filter.to)
                .bind(filter.builder_id)
                .bind(filter.supervisor_id)
                .fetch_one(pool)
                .await?;

        let sql = format!(
            r#"
            {SUMMARY_SELECT}
            WHERE {FILTER_PREDICATE}
            {SUMMARY_GROUP}
            ORDER BY d.work_date DESC, d.created_at DESC
            LIMIT $6 OFFSET $7
            "#
        );
        let dockets = sqlx::query_as::<_, DocketSummary>(&sql)
            .bind(tenant_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.builder_id)
            .bind(filter.supervisor_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((dockets, total))
    }

    /// Entry-level rows for CSV export, oldest first
    pub async fn export_rows(
        pool: &PgPool,
        tenant_id: Uuid,
        filter: &DocketFilter,
    ) -> Result<Vec<DocketExportRow>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT d.work_date, b.company_code, l.name AS location_name,
                   u.name AS supervisor_name, c.nickname AS contractor_nickname,
                   e.tonnage_hours, e.day_labour_hours, e.notes
            FROM dockets d
            JOIN builders b ON b.id = d.builder_id
            JOIN builder_locations l ON l.id = d.location_id
            JOIN users u ON u.id = d.supervisor_id
            JOIN docket_entries e ON e.docket_id = d.id
            JOIN contractors c ON c.id = e.contractor_id
            WHERE {FILTER_PREDICATE}
            ORDER BY d.work_date, b.company_code, l.name, c.nickname
            "#
        );

        sqlx::query_as::<_, DocketExportRow>(&sql)
            .bind(tenant_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.builder_id)
            .bind(filter.supervisor_id)
            .fetch_all(pool)
            .await
    }

    /// Writes the header columns
    pub async fn save(&self, executor: impl PgExecutor<'_>) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE dockets
            SET builder_id = $3, location_id = $4, work_date = $5, notes = $6, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Docket>(&sql)
            .bind(self.id)
            .bind(self.tenant_id)
            .bind(self.builder_id)
            .bind(self.location_id)
            .bind(self.work_date)
            .bind(&self.notes)
            .fetch_one(executor)
            .await
    }

    /// Deletes a docket; entries cascade
    pub async fn delete(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dockets WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
