/// Builder location model
///
/// A site of a builder. Location names are unique per builder; deleting a
/// builder cascades to its locations, deleting a location referenced by a
/// docket is refused by the foreign key.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE builder_locations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     builder_id UUID NOT NULL REFERENCES builders(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     address TEXT,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT builder_locations_name_key UNIQUE (builder_id, name)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BuilderLocation {
    pub id: Uuid,
    pub builder_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, builder_id, name, address, active, created_at, updated_at";

impl BuilderLocation {
    pub async fn create(
        pool: &PgPool,
        builder_id: Uuid,
        name: &str,
        address: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO builder_locations (builder_id, name, address)
            VALUES ($1, $2, $3)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, BuilderLocation>(&sql)
            .bind(builder_id)
            .bind(name)
            .bind(address)
            .fetch_one(pool)
            .await
    }

    /// Finds a location of the given builder
    pub async fn find(
        executor: impl PgExecutor<'_>,
        builder_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM builder_locations WHERE id = $1 AND builder_id = $2");
        sqlx::query_as::<_, BuilderLocation>(&sql)
            .bind(id)
            .bind(builder_id)
            .fetch_optional(executor)
            .await
    }

    /// All locations of a builder ordered by name
    pub async fn list_for_builder(
        pool: &PgPool,
        builder_id: Uuid,
        active: Option<bool>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM builder_locations
            WHERE builder_id = $1 AND ($2::BOOLEAN IS NULL OR active = $2)
            ORDER BY name
            "#
        );

        sqlx::query_as::<_, BuilderLocation>(&sql)
            .bind(builder_id)
            .bind(active)
            .fetch_all(pool)
            .await
    }

    /// Writes name, address and active flag
    pub async fn save(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE builder_locations
            SET name = $3, address = $4, active = $5, updated_at = NOW()
            WHERE id = $1 AND builder_id = $2
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, BuilderLocation>(&sql)
            .bind(self.id)
            .bind(self.builder_id)
            .bind(&self.name)
            .bind(&self.address)
            .bind(self.active)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, builder_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM builder_locations WHERE id = $1 AND builder_id = $2")
            .bind(id)
            .bind(builder_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether any docket references the location
    pub async fn has_dockets(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM dockets WHERE location_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
