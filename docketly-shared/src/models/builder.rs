/// Builder model
///
/// A builder is a client construction company. `company_code` is the short
/// code printed on dockets and exports; it is stored upper-case and unique
/// within a tenant.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE builders (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     company_code VARCHAR(32) NOT NULL,
///     contact_name VARCHAR(255),
///     contact_email VARCHAR(255),
///     phone VARCHAR(64),
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT builders_company_code_key UNIQUE (tenant_id, company_code)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::pagination::PageParams;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Builder {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub company_code: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values for insert
#[derive(Debug, Clone)]
pub struct NewBuilder {
    pub name: String,
    pub company_code: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
}

/// List filters for `/v1/builders`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuilderFilter {
    /// Matches name or company code
    pub search: Option<String>,
    pub active: Option<bool>,
}

const COLUMNS: &str = "id, tenant_id, name, company_code, contact_name, contact_email, phone, \
                       active, created_at, updated_at";

impl Builder {
    pub async fn create(
        pool: &PgPool,
        tenant_id: Uuid,
        data: &NewBuilder,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO builders (tenant_id, name, company_code, contact_name, contact_email, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Builder>(&sql)
            .bind(tenant_id)
            .bind(&data.name)
            .bind(&data.company_code)
            .bind(&data.contact_name)
            .bind(&data.contact_email)
            .bind(&data.phone)
            .fetch_one(pool)
            .await
    }

    pub async fn find(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM builders WHERE id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, Builder>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists builders ordered by name
    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        filter: &BuilderFilter,
        page: &PageParams,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let search = super::like_pattern(filter.search.as_deref());
        let predicate = r#"
            tenant_id = $1
            AND ($2::BOOLEAN IS NULL OR active = $2)
            AND ($3::TEXT IS NULL OR name ILIKE $3 OR company_code ILIKE $3)
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM builders WHERE {predicate}"))
                .bind(tenant_id)
                .bind(filter.active)
                .bind(search.as_deref())
                .fetch_one(pool)
                .await?;

        let sql = format!(
            "SELECT {COLUMNS} FROM builders WHERE {predicate} ORDER BY name LIMIT $4 OFFSET $5"
        );
        let builders = sqlx::query_as::<_, Builder>(&sql)
            .bind(tenant_id)
            .bind(filter.active)
            .bind(search.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((builders, total))
    }

    /// Writes every mutable column
    pub async fn save(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE builders
            SET name = $3, company_code = $4, contact_name = $5, contact_email = $6,
                phone = $7, active = $8, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Builder>(&sql)
            .bind(self.id)
            .bind(self.tenant_id)
            .bind(&self.name)
            .bind(&self.company_code)
            .bind(&self.contact_name)
            .bind(&self.contact_email)
            .bind(&self.phone)
            .bind(self.active)
            .fetch_one(pool)
            .await
    }

    /// Deletes a builder and, by cascade, its locations
    ///
    /// Fails with a foreign-key violation while dockets reference it.
    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM builders WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether any docket references the builder
    pub async fn has_dockets(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM dockets WHERE builder_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}

/// Trims and upper-cases a company code
pub fn normalize_company_code(code: &str) -> String {
    code.trim().to_uppercase()
}
