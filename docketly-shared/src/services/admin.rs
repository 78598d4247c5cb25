/// Admin dashboard and user management
///
/// Dashboard figures are aggregated in one pass over the entry rows of the
/// requested range ([`DashboardStats::from_rows`]); invoice figures come
/// from a grouped query over the same weeks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;
use validator::Validate;

use super::required_text;
use crate::auth::middleware::AuthContext;
use crate::auth::password::{generate_temporary_password, hash_password, validate_password_strength};
use crate::error::{ServiceError, ServiceResult};
use crate::models::contractor::Contractor;
use crate::models::docket_entry::{DashboardRow, DocketEntry};
use crate::models::notification::{NewNotification, Notification, NotificationKind};
use crate::models::user::{CreateUser, Role, User, UserFilter};
use crate::models::worker_invoice::{InvoiceStatus, StatusTotals, WorkerInvoice};
use crate::pagination::{Page, PageParams};
use crate::weekly::WeekRange;

/// Longest range the dashboard aggregates over
pub const MAX_DASHBOARD_DAYS: i64 = 366;

/// Hours booked against one builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderHours {
    pub builder_id: Uuid,
    pub builder_name: String,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub total_hours: f64,
}

/// Docket KPIs for a date range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub docket_count: usize,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub active_contractors: usize,
    /// Sorted by total hours, highest first
    pub hours_by_builder: Vec<BuilderHours>,
}

impl DashboardStats {
    pub fn from_rows(rows: &[DashboardRow]) -> Self {
        let mut dockets = HashSet::new();
        let mut contractors = HashSet::new();
        let mut builders: HashMap<Uuid, BuilderHours> = HashMap::new();
        let mut stats = DashboardStats::default();

        for row in rows {
            dockets.insert(row.docket_id);
            if row.contractor_active {
                contractors.insert(row.contractor_id);
            }
            stats.tonnage_hours += row.tonnage_hours;
            stats.day_labour_hours += row.day_labour_hours;

            let builder = builders.entry(row.builder_id).or_insert_with(|| BuilderHours {
                builder_id: row.builder_id,
                builder_name: row.builder_name.clone(),
                tonnage_hours: 0.0,
                day_labour_hours: 0.0,
                total_hours: 0.0,
            });
            builder.tonnage_hours += row.tonnage_hours;
            builder.day_labour_hours += row.day_labour_hours;
            builder.total_hours += row.tonnage_hours + row.day_labour_hours;
        }

        stats.docket_count = dockets.len();
        stats.active_contractors = contractors.len();
        stats.hours_by_builder = builders.into_values().collect();
        stats.hours_by_builder.sort_by(|a, b| {
            b.total_hours
                .total_cmp(&a.total_hours)
                .then_with(|| a.builder_name.cmp(&b.builder_name))
        });

        stats
    }
}

/// Invoice count and total for every status, zeros included
pub fn invoice_totals(found: Vec<StatusTotals>) -> Vec<StatusTotals> {
    InvoiceStatus::ALL
        .iter()
        .map(|status| {
            found
                .iter()
                .find(|t| t.status == *status)
                .cloned()
                .unwrap_or(StatusTotals {
                    status: *status,
                    count: 0,
                    total_cents: 0,
                })
        })
        .collect()
}

/// Query of `GET /v1/dashboard`; defaults to the current ISO week
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DashboardQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DashboardQuery {
    /// Resolves the inclusive range against `today`
    pub fn resolve(&self, today: NaiveDate) -> ServiceResult<(NaiveDate, NaiveDate)> {
        let current = WeekRange::containing(today);
        let (from, to) = match (self.from, self.to) {
            (Some(from), Some(to)) => (from, to),
            (Some(from), None) => (from, WeekRange::containing(from).end),
            (None, Some(to)) => (WeekRange::containing(to).start, to),
            (None, None) => (current.start, current.end),
        };

        if from > to {
            return Err(ServiceError::validation("from", "must not be after `to`"));
        }
        if (to - from).num_days() >= MAX_DASHBOARD_DAYS {
            return Err(ServiceError::validation(
                "to",
                format!("Range cannot exceed {} days", MAX_DASHBOARD_DAYS),
            ));
        }

        Ok((from, to))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(flatten)]
    pub stats: DashboardStats,
    /// Invoices whose week starts in the range
    pub invoices: Vec<StatusTotals>,
}

/// Body of `POST /v1/users`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub role: Role,

    /// Generated when absent
    pub password: Option<String>,
}

/// Body of `PATCH /v1/users/:id`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserPatch {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    pub role: Option<Role>,

    pub active: Option<bool>,
}

/// A created account; `temporary_password` is set only when generated
#[derive(Debug, Clone, Serialize)]
pub struct CreatedUser {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

#[derive(Clone)]
pub struct AdminService {
    pool: PgPool,
}

impl AdminService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn dashboard(&self, tenant_id: Uuid, from: NaiveDate, to: NaiveDate) -> ServiceResult<Dashboard> {
        let rows = DocketEntry::dashboard_rows(&self.pool, tenant_id, from, to).await?;
        let stats = DashboardStats::from_rows(&rows);

        let first_week = WeekRange::containing(from).start;
        let invoices =
            WorkerInvoice::status_totals(&self.pool, tenant_id, None, Some((first_week, to))).await?;

        Ok(Dashboard {
            from,
            to,
            stats,
            invoices: invoice_totals(invoices),
        })
    }

    pub async fn list_users(
        &self,
        tenant_id: Uuid,
        filter: &UserFilter,
        page: &PageParams,
    ) -> ServiceResult<Page<User>> {
        let (users, total) = User::list(&self.pool, tenant_id, filter, page).await?;
        Ok(Page::new(users, total, page))
    }

    pub async fn get_user(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<User> {
        User::find_in_tenant(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    /// Creates a login and queues the account email
    pub async fn create_user(&self, tenant_id: Uuid, input: CreateUserInput) -> ServiceResult<CreatedUser> {
        let name = required_text("name", &input.name)?;
        let email = required_text("email", &input.email)?;

        let (password, temporary) = match input.password {
            Some(password) => {
                validate_password_strength(&password)
                    .map_err(|message| ServiceError::validation("password", message))?;
                (password, false)
            }
            None => (generate_temporary_password(), true),
        };
        let password_hash = hash_password(&password)?;

        let mut tx = self.pool.begin().await?;

        let user = User::create(
            &mut *tx,
            CreateUser {
                tenant_id,
                email,
                password_hash,
                name,
                role: input.role,
            },
        )
        .await?;

        let password_line = if temporary {
            format!("Your temporary password is: {}\nPlease change it after signing in.", password)
        } else {
            "Your administrator will give you your password.".to_string()
        };
        Notification::enqueue(
            &mut *tx,
            &NewNotification {
                tenant_id,
                kind: NotificationKind::AccountCreated,
                recipient: user.email.clone(),
                subject: "Your Docketly account".to_string(),
                body: format!(
                    "Hi {},\n\nAn account has been created for you with the {} role.\n\
                     Sign in with {}.\n{}",
                    user.name, user.role, user.email, password_line
                ),
                invoice_id: None,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            user_id = %user.id,
            role = %user.role,
            "User created"
        );

        Ok(CreatedUser {
            user,
            temporary_password: temporary.then_some(password),
        })
    }

    /// Updates a user; admins cannot demote or deactivate themselves
    ///
    /// A WORKER linked to a contractor keeps its role until the link is
    /// removed.
    pub async fn update_user(&self, auth: &AuthContext, id: Uuid, patch: UserPatch) -> ServiceResult<User> {
        let mut user = self.get_user(auth.tenant_id, id).await?;
        let is_self = user.id == auth.user_id;

        if let Some(name) = patch.name {
            user.name = required_text("name", &name)?;
        }
        if let Some(email) = patch.email {
            user.email = required_text("email", &email)?;
        }
        if let Some(role) = patch.role {
            if is_self && role != user.role {
                return Err(ServiceError::conflict("You cannot change your own role"));
            }
            if role != user.role && user.role == Role::Worker {
                let linked = Contractor::find_by_user(&self.pool, auth.tenant_id, user.id).await?;
                check_role_change(user.role, role, linked.as_ref().map(|c| c.nickname.as_str()))?;
            }
            user.role = role;
        }
        if let Some(active) = patch.active {
            if is_self && !active {
                return Err(ServiceError::conflict("You cannot deactivate your own account"));
            }
            user.active = active;
        }

        Ok(user.save(&self.pool).await?)
    }

    /// Deletes a user; refused for the caller and for supervisors with dockets
    pub async fn delete_user(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<()> {
        if id == auth.user_id {
            return Err(ServiceError::conflict("You cannot delete your own account"));
        }

        if !User::delete(&self.pool, auth.tenant_id, id).await? {
            return Err(ServiceError::not_found("User"));
        }

        tracing::info!(tenant_id = %auth.tenant_id, user_id = %id, "User deleted");
        Ok(())
    }
}

/// Refuses moving a contractor's login off the WORKER role
fn check_role_change(current: Role, requested: Role, linked_contractor: Option<&str>) -> ServiceResult<()> {
    match linked_contractor {
        Some(nickname) if current == Role::Worker && requested != Role::Worker => {
            Err(ServiceError::conflict(format!(
                "User is linked to contractor {}; unlink it before changing the role",
                nickname
            )))
        }
        _ => Ok(()),
    }
}
