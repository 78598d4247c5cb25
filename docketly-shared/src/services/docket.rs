/// Docket recording
///
/// Supervisors record what each contractor did on a site on a given day.
/// A docket and its entries are always written together in one
/// transaction. Once a contractor's invoice for a week has been submitted,
/// no docket touching that contractor in that week may change.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

use super::optional_text;
use crate::auth::authorization::{docket_scope, require_docket_access, require_role};
use crate::auth::middleware::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::export::csv::{to_csv, CsvRow};
use crate::export::format_hours;
use crate::models::builder::Builder;
use crate::models::builder_location::BuilderLocation;
use crate::models::contractor::Contractor;
use crate::models::docket::{Docket, DocketExportRow, DocketFilter, DocketSummary, NewDocket};
use crate::models::docket_entry::{DocketEntry, DocketEntryDetail, NewDocketEntry};
use crate::models::user::{Role, User};
use crate::models::worker_invoice::WorkerInvoice;
use crate::pagination::{Page, PageParams};
use crate::weekly::WeekRange;

/// Most hours one contractor can log on one docket
pub const MAX_HOURS_PER_ENTRY: f64 = 24.0;

/// Body of `POST /v1/dockets` and `PUT /v1/dockets/:id`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DocketInput {
    pub builder_id: Uuid,
    pub location_id: Uuid,
    pub work_date: NaiveDate,

    /// Admins may record on behalf of a supervisor; ignored on replace
    pub supervisor_id: Option<Uuid>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    #[validate(length(min = 1, message = "At least one entry is required"))]
    pub entries: Vec<NewDocketEntry>,
}

/// A docket with its entries
#[derive(Debug, Clone, Serialize)]
pub struct DocketDetail {
    #[serde(flatten)]
    pub docket: DocketSummary,
    pub entries: Vec<DocketEntryDetail>,
}

impl CsvRow for DocketExportRow {
    fn headers() -> &'static [&'static str] {
        &[
            "date",
            "builder_code",
            "location",
            "supervisor",
            "contractor",
            "tonnage_hours",
            "day_labour_hours",
            "notes",
        ]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.work_date.to_string(),
            self.company_code.clone(),
            self.location_name.clone(),
            self.supervisor_name.clone(),
            self.contractor_nickname.clone(),
            format_hours(self.tonnage_hours),
            format_hours(self.day_labour_hours),
            self.notes.clone().unwrap_or_default(),
        ]
    }
}

/// Checks entry hours and contractor uniqueness, trimming notes
pub fn validate_entries(entries: &[NewDocketEntry]) -> ServiceResult<Vec<NewDocketEntry>> {
    if entries.is_empty() {
        return Err(ServiceError::validation("entries", "At least one entry is required"));
    }

    let mut seen = HashSet::with_capacity(entries.len());
    let mut cleaned = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let field = format!("entries[{}]", i);

        if !seen.insert(entry.contractor_id) {
            return Err(ServiceError::validation(
                &field,
                "Contractor appears more than once on the docket",
            ));
        }

        let hours = [entry.tonnage_hours, entry.day_labour_hours];
        if hours.iter().any(|h| !h.is_finite() || *h < 0.0) {
            return Err(ServiceError::validation(&field, "Hours must be zero or positive"));
        }

        let total = entry.tonnage_hours + entry.day_labour_hours;
        if total <= 0.0 {
            return Err(ServiceError::validation(&field, "Entry must record some hours"));
        }
        if total > MAX_HOURS_PER_ENTRY {
            return Err(ServiceError::validation(
                &field,
                format!("Entry cannot exceed {} hours", MAX_HOURS_PER_ENTRY),
            ));
        }

        cleaned.push(NewDocketEntry {
            contractor_id: entry.contractor_id,
            tonnage_hours: entry.tonnage_hours,
            day_labour_hours: entry.day_labour_hours,
            notes: optional_text(entry.notes.clone()),
        });
    }

    Ok(cleaned)
}

#[derive(Clone)]
pub struct DocketService {
    pool: PgPool,
}

impl DocketService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists dockets newest first; supervisors only see their own
    pub async fn list(
        &self,
        auth: &AuthContext,
        filter: DocketFilter,
        page: &PageParams,
    ) -> ServiceResult<Page<DocketSummary>> {
        require_role(auth, Role::Supervisor)?;
        let filter = scoped(auth, filter);

        let (dockets, total) = Docket::list(&self.pool, auth.tenant_id, &filter, page).await?;
        Ok(Page::new(dockets, total, page))
    }

    pub async fn get(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<DocketDetail> {
        require_role(auth, Role::Supervisor)?;

        let docket = Docket::find_summary(&self.pool, auth.tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Docket"))?;
        require_docket_access(auth, docket.supervisor_id)?;

        let entries = DocketEntry::list_for_docket(&self.pool, id).await?;
        Ok(DocketDetail { docket, entries })
    }

    pub async fn create(&self, auth: &AuthContext, input: DocketInput) -> ServiceResult<DocketDetail> {
        require_role(auth, Role::Supervisor)?;
        let tenant_id = auth.tenant_id;

        let supervisor_id = match input.supervisor_id {
            Some(id) if id != auth.user_id => {
                if !auth.is_admin() {
                    return Err(ServiceError::forbidden(
                        "Supervisors can only record their own dockets",
                    ));
                }
                self.check_supervisor(tenant_id, id).await?;
                id
            }
            _ => auth.user_id,
        };

        let entries = validate_entries(&input.entries)?;
        self.check_site(tenant_id, input.builder_id, input.location_id).await?;

        let mut tx = self.pool.begin().await?;

        let contractor_ids: Vec<Uuid> = entries.iter().map(|e| e.contractor_id).collect();
        check_contractors(&mut tx, tenant_id, &contractor_ids).await?;
        check_unlocked(&mut tx, tenant_id, &contractor_ids, input.work_date).await?;

        let docket = Docket::insert(
            &mut *tx,
            tenant_id,
            &NewDocket {
                builder_id: input.builder_id,
                location_id: input.location_id,
                supervisor_id,
                work_date: input.work_date,
                notes: optional_text(input.notes),
            },
        )
        .await?;
        DocketEntry::insert_many(&mut *tx, docket.id, &entries).await?;

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            docket_id = %docket.id,
            supervisor_id = %supervisor_id,
            work_date = %docket.work_date,
            entries = entries.len(),
            "Docket created"
        );

        self.get(auth, docket.id).await
    }

    /// Replaces a docket's header and all of its entries
    pub async fn replace(
        &self,
        auth: &AuthContext,
        id: Uuid,
        input: DocketInput,
    ) -> ServiceResult<DocketDetail> {
        require_role(auth, Role::Supervisor)?;
        let tenant_id = auth.tenant_id;

        let entries = validate_entries(&input.entries)?;

        let mut tx = self.pool.begin().await?;

        let mut docket = Docket::find_for_update(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Docket"))?;
        require_docket_access(auth, docket.supervisor_id)?;

        let previous_ids = DocketEntry::contractor_ids(&mut *tx, id).await?;
        check_unlocked(&mut tx, tenant_id, &previous_ids, docket.work_date).await?;

        if docket.builder_id != input.builder_id || docket.location_id != input.location_id {
            self.check_site(tenant_id, input.builder_id, input.location_id).await?;
        }

        let contractor_ids: Vec<Uuid> = entries.iter().map(|e| e.contractor_id).collect();
        check_contractors(&mut tx, tenant_id, &contractor_ids).await?;
        check_unlocked(&mut tx, tenant_id, &contractor_ids, input.work_date).await?;

        docket.builder_id = input.builder_id;
        docket.location_id = input.location_id;
        docket.work_date = input.work_date;
        docket.notes = optional_text(input.notes);
        docket.save(&mut *tx).await?;

        DocketEntry::delete_for_docket(&mut *tx, id).await?;
        DocketEntry::insert_many(&mut *tx, id, &entries).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, docket_id = %id, "Docket replaced");
        self.get(auth, id).await
    }

    pub async fn delete(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<()> {
        require_role(auth, Role::Supervisor)?;
        let tenant_id = auth.tenant_id;

        let mut tx = self.pool.begin().await?;

        let docket = Docket::find_for_update(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Docket"))?;
        require_docket_access(auth, docket.supervisor_id)?;

        let contractor_ids = DocketEntry::contractor_ids(&mut *tx, id).await?;
        check_unlocked(&mut tx, tenant_id, &contractor_ids, docket.work_date).await?;

        Docket::delete(&mut *tx, tenant_id, id).await?;
        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, docket_id = %id, "Docket deleted");
        Ok(())
    }

    /// One CSV line per entry
    pub async fn export_csv(&self, auth: &AuthContext, filter: DocketFilter) -> ServiceResult<Vec<u8>> {
        require_role(auth, Role::Supervisor)?;
        let filter = scoped(auth, filter);

        let rows = Docket::export_rows(&self.pool, auth.tenant_id, &filter).await?;
        Ok(to_csv(&rows)?)
    }

    /// Builder and location must exist, be active, and belong together
    async fn check_site(&self, tenant_id: Uuid, builder_id: Uuid, location_id: Uuid) -> ServiceResult<()> {
        let builder = Builder::find(&self.pool, tenant_id, builder_id)
            .await?
            .ok_or_else(|| ServiceError::validation("builder_id", "Builder does not exist"))?;
        if !builder.active {
            return Err(ServiceError::validation("builder_id", "Builder is inactive"));
        }

        let location = BuilderLocation::find(&self.pool, builder_id, location_id)
            .await?
            .ok_or_else(|| {
                ServiceError::validation("location_id", "Location does not belong to the builder")
            })?;
        if !location.active {
            return Err(ServiceError::validation("location_id", "Location is inactive"));
        }

        Ok(())
    }

    async fn check_supervisor(&self, tenant_id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let user = User::find_in_tenant(&self.pool, tenant_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::validation("supervisor_id", "User does not exist"))?;

        if !user.active || !user.role.has_permission(Role::Supervisor) {
            return Err(ServiceError::validation(
                "supervisor_id",
                "Dockets must be recorded by an active supervisor or admin",
            ));
        }

        Ok(())
    }
}

/// Pins the supervisor filter for non-admins
fn scoped(auth: &AuthContext, mut filter: DocketFilter) -> DocketFilter {
    if let Some(supervisor_id) = docket_scope(auth) {
        filter.supervisor_id = Some(supervisor_id);
    }
    filter
}

/// Every contractor must exist in the tenant and be active
async fn check_contractors(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    ids: &[Uuid],
) -> ServiceResult<()> {
    let found = Contractor::find_many(&mut **tx, tenant_id, ids).await?;

    if found.len() != ids.len() {
        return Err(ServiceError::validation("entries", "Unknown contractor"));
    }
    if let Some(inactive) = found.iter().find(|c| !c.active) {
        return Err(ServiceError::validation(
            "entries",
            format!("Contractor {} is inactive", inactive.nickname),
        ));
    }

    Ok(())
}

/// Refuses the change when any contractor's invoice for the week has left DRAFT
///
/// The contractor rows stay share-locked until the caller commits, so an
/// invoice submission for one of them either sees this docket or makes the
/// status check here fail.
async fn check_unlocked(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    contractor_ids: &[Uuid],
    work_date: NaiveDate,
) -> ServiceResult<()> {
    if contractor_ids.is_empty() {
        return Ok(());
    }

    Contractor::lock_shared(&mut **tx, tenant_id, contractor_ids).await?;

    let week = WeekRange::containing(work_date);
    let locked =
        WorkerInvoice::locked_contractors(&mut **tx, tenant_id, contractor_ids, week.start).await?;

    if !locked.is_empty() {
        return Err(ServiceError::conflict(format!(
            "Week {} is locked: invoices already submitted for {}",
            week.label(),
            locked.join(", ")
        )));
    }

    Ok(())
}
