/// User model and roles
///
/// A user is a login identity inside one tenant. Email addresses are unique
/// across the whole system (CITEXT, so case-insensitive) because login
/// happens before the tenant is known.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('ADMIN', 'SUPERVISOR', 'WORKER');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     email CITEXT NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'WORKER',
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     last_login_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_email_key UNIQUE (email)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use docketly_shared::models::user::{CreateUser, Role, User};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, tenant_id: Uuid) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     tenant_id,
///     email: "site.boss@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "Site Boss".to_string(),
///     role: Role::Supervisor,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "SITE.BOSS@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::pagination::PageParams;

/// Access level of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Manages builders, contractors, users, invoices
    Admin,

    /// Records dockets
    Supervisor,

    /// Linked to a contractor; reviews hours and submits invoices
    Worker,
}

impl Role {
    /// Converts role to its stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Supervisor => "SUPERVISOR",
            Role::Worker => "WORKER",
        }
    }

    /// Whether this role meets or exceeds `required`
    ///
    /// Hierarchy: Admin > Supervisor > Worker
    pub fn has_permission(&self, required: Role) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Supervisor => 2,
            Role::Worker => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "SUPERVISOR" => Ok(Role::Supervisor),
            "WORKER" => Ok(Role::Worker),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// User account
///
/// `password_hash` is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub tenant_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
}

/// List filters for `/v1/users`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub search: Option<String>,
}

/// Name and address of a notification recipient
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

const COLUMNS: &str = "id, tenant_id, email::TEXT AS email, password_hash, name, role, active, \
                       last_login_at, created_at, updated_at";

impl User {
    /// Inserts a user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` if the email is taken.
    pub async fn create(executor: impl PgExecutor<'_>, data: CreateUser) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO users (tenant_id, email, password_hash, name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(data.tenant_id)
            .bind(data.email.trim())
            .bind(data.password_hash)
            .bind(data.name.trim())
            .bind(data.role)
            .fetch_one(executor)
            .await
    }

    /// Finds a user by ID regardless of tenant (token refresh, `/me`)
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user inside a tenant
    pub async fn find_in_tenant(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a user by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE email = $1::CITEXT");
        sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }

    /// Lists users in a tenant ordered by name
    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        filter: &UserFilter,
        page: &PageParams,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let search = super::like_pattern(filter.search.as_deref());
        let predicate = r#"
            tenant_id = $1
            AND ($2::user_role IS NULL OR role = $2)
            AND ($3::BOOLEAN IS NULL OR active = $3)
            AND ($4::TEXT IS NULL OR name ILIKE $4 OR email::TEXT ILIKE $4)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {predicate}"))
            .bind(tenant_id)
            .bind(filter.role)
            .bind(filter.active)
            .bind(search.as_deref())
            .fetch_one(pool)
            .await?;

        let sql = format!(
            "SELECT {COLUMNS} FROM users WHERE {predicate} ORDER BY name, email LIMIT $5 OFFSET $6"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(tenant_id)
            .bind(filter.role)
            .bind(filter.active)
            .bind(search.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((users, total))
    }

    /// Writes name, email, role and active flag
    pub async fn save(&self, executor: impl PgExecutor<'_>) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = $3, email = $4, role = $5, active = $6, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(self.id)
            .bind(self.tenant_id)
            .bind(&self.name)
            .bind(&self.email)
            .bind(self.role)
            .bind(self.active)
            .fetch_one(executor)
            .await
    }

    /// Replaces the password hash
    pub async fn set_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stamps `last_login_at`
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Deletes a user
    ///
    /// Fails with a foreign-key violation when the user supervised dockets.
    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Active admins of a tenant, for invoice notifications
    pub async fn active_admins(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        sqlx::query_as::<_, Recipient>(
            r#"
            SELECT name, email::TEXT AS email
            FROM users
            WHERE tenant_id = $1 AND role = 'ADMIN' AND active
            ORDER BY name
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await
    }

    /// Number of active admins in a tenant
    pub async fn count_active_admins(pool: &PgPool, tenant_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE tenant_id = $1 AND role = 'ADMIN' AND active",
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await
    }
}
