/// Contractor model
///
/// A contractor is the paid party on dockets and invoices. It may be linked
/// to one WORKER login through `user_id`. `bank_bsb` and
/// `bank_account_number` hold ciphertext produced by
/// [`crate::crypto::FieldCipher`]. This type is not `Serialize`; responses
/// are built by the contractor service, which masks or decrypts.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE contractors (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     full_name VARCHAR(255) NOT NULL,
///     nickname VARCHAR(64) NOT NULL,
///     email VARCHAR(255),
///     phone VARCHAR(64),
///     abn VARCHAR(32),
///     gst_registered BOOLEAN NOT NULL DEFAULT FALSE,
///     tonnage_rate_cents BIGINT NOT NULL DEFAULT 0,
///     day_labour_rate_cents BIGINT NOT NULL DEFAULT 0,
///     bank_account_name VARCHAR(255),
///     bank_bsb TEXT,
///     bank_account_number TEXT,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT contractors_nickname_key UNIQUE (tenant_id, nickname),
///     CONSTRAINT contractors_user_id_key UNIQUE (user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::pagination::PageParams;

/// Contractor row as stored, bank fields encrypted
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Contractor {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub nickname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub abn: Option<String>,
    pub gst_registered: bool,
    pub tonnage_rate_cents: i64,
    pub day_labour_rate_cents: i64,
    pub bank_account_name: Option<String>,
    /// Ciphertext
    pub bank_bsb: Option<String>,
    /// Ciphertext
    pub bank_account_number: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values for insert, bank fields already encrypted
#[derive(Debug, Clone)]
pub struct NewContractor {
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub nickname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub abn: Option<String>,
    pub gst_registered: bool,
    pub tonnage_rate_cents: i64,
    pub day_labour_rate_cents: i64,
    pub bank_account_name: Option<String>,
    pub bank_bsb: Option<String>,
    pub bank_account_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractorFilter {
    /// Matches full name, nickname or email
    pub search: Option<String>,
    pub active: Option<bool>,
}

const COLUMNS: &str = "id, tenant_id, user_id, full_name, nickname, email, phone, abn, \
                       gst_registered, tonnage_rate_cents, day_labour_rate_cents, \
                       bank_account_name, bank_bsb, bank_account_number, active, \
                       created_at, updated_at";

impl Contractor {
    pub async fn create(
        pool: &PgPool,
        tenant_id: Uuid,
        data: &NewContractor,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO contractors (
                tenant_id, user_id, full_name, nickname, email, phone, abn, gst_registered,
                tonnage_rate_cents, day_labour_rate_cents, bank_account_name, bank_bsb,
                bank_account_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Contractor>(&sql)
            .bind(tenant_id)
            .bind(data.user_id)
            .bind(&data.full_name)
            .bind(&data.nickname)
            .bind(&data.email)
            .bind(&data.phone)
            .bind(&data.abn)
            .bind(data.gst_registered)
            .bind(data.tonnage_rate_cents)
            .bind(data.day_labour_rate_cents)
            .bind(&data.bank_account_name)
            .bind(&data.bank_bsb)
            .bind(&data.bank_account_number)
            .fetch_one(pool)
            .await
    }

    pub async fn find(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM contractors WHERE id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, Contractor>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await
    }

    /// Takes a share lock on the given contractor rows until the transaction ends
    ///
    /// Held while dockets are written so a concurrent invoice submission for
    /// the same contractor waits for the commit.
    pub async fn lock_shared(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM contractors WHERE tenant_id = $1 AND id = ANY($2) ORDER BY id FOR SHARE",
        )
        .bind(tenant_id)
        .bind(ids)
        .fetch_all(executor)
        .await
    }

    /// Locks one contractor row exclusively until the transaction ends
    pub async fn lock_for_update(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM contractors WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(row.is_some())
    }

    /// Finds the contractor linked to a WORKER login
    pub async fn find_by_user(
        pool: &PgPool,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql =
            format!("SELECT {COLUMNS} FROM contractors WHERE user_id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, Contractor>(&sql)
            .bind(user_id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// Loads every contractor in `ids` that belongs to the tenant
    pub async fn find_many(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM contractors WHERE tenant_id = $1 AND id = ANY($2) ORDER BY nickname"
        );
        sqlx::query_as::<_, Contractor>(&sql)
            .bind(tenant_id)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// Lists contractors ordered by nickname
    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        filter: &ContractorFilter,
        page: &PageParams,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let search = super::like_pattern(filter.search.as_deref());
        let predicate = r#"
            tenant_id = $1
            AND ($2::BOOLEAN IS NULL OR active = $2)
            AND ($3::TEXT IS NULL OR full_name ILIKE $3 OR nickname ILIKE $3 OR email ILIKE $3)
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM contractors WHERE {predicate}"))
                .bind(tenant_id)
                .bind(filter.active)
                .bind(search.as_deref())
                .fetch_one(pool)
                .await?;

        let sql = format!(
            "SELECT {COLUMNS} FROM contractors WHERE {predicate} ORDER BY nickname LIMIT $4 OFFSET $5"
        );
        let contractors = sqlx::query_as::<_, Contractor>(&sql)
            .bind(tenant_id)
            .bind(filter.active)
            .bind(search.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((contractors, total))
    }

    /// Every contractor in the tenant, for exports
    pub async fn list_all(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM contractors WHERE tenant_id = $1 ORDER BY nickname");
        sqlx::query_as::<_, Contractor>(&sql)
            .bind(tenant_id)
            .fetch_all(pool)
            .await
    }

    /// Writes every mutable column
    pub async fn save(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE contractors
            SET user_id = $3, full_name = $4, nickname = $5, email = $6, phone = $7, abn = $8,
                gst_registered = $9, tonnage_rate_cents = $10, day_labour_rate_cents = $11,
                bank_account_name = $12, bank_bsb = $13, bank_account_number = $14,
                active = $15, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Contractor>(&sql)
            .bind(self.id)
            .bind(self.tenant_id)
            .bind(self.user_id)
            .bind(&self.full_name)
            .bind(&self.nickname)
            .bind(&self.email)
            .bind(&self.phone)
            .bind(&self.abn)
            .bind(self.gst_registered)
            .bind(self.tonnage_rate_cents)
            .bind(self.day_labour_rate_cents)
            .bind(&self.bank_account_name)
            .bind(&self.bank_bsb)
            .bind(&self.bank_account_number)
            .bind(self.active)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contractors WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether any docket entry references the contractor
    pub async fn has_dockets(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM docket_entries WHERE contractor_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
