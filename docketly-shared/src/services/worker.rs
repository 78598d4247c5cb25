/// Worker self-service
///
/// Everything here acts on the contractor linked to the caller's login.
/// A WORKER without a linked contractor gets 404 from every call.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::admin::invoice_totals;
use super::contractor::{BankDetailsPatch, ContractorService, ContractorView};
use super::history::{ContractorHistory, HistoryService};
use super::invoice::{InvoiceDetail, InvoiceService};
use super::weekly::{ContractorRef, ContractorWeek, InvoiceRef, WeeklyService};
use super::{optional_email, optional_text};
use crate::auth::authorization::require_any;
use crate::auth::middleware::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::contractor::Contractor;
use crate::models::docket_entry::{DocketEntry, HoursTotals};
use crate::models::double_option;
use crate::models::user::Role;
use crate::models::worker_invoice::{
    InvoiceFilter, InvoiceStatus, InvoiceSummary, StatusTotals, WorkerInvoice,
};
use crate::pagination::{Page, PageParams};
use crate::weekly::WeekRange;

/// Body of `PATCH /v1/worker/profile`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfilePatch {
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,

    #[serde(flatten)]
    pub bank: BankDetailsPatch,
}

/// Hours and invoice state for one week
#[derive(Debug, Clone, Serialize)]
pub struct WeekSnapshot {
    pub week: WeekRange,
    pub totals: HoursTotals,
    pub invoice: Option<InvoiceRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerDashboard {
    pub contractor: ContractorRef,
    pub current_week: WeekSnapshot,
    pub previous_week: WeekSnapshot,
    pub invoices: Vec<StatusTotals>,
}

/// Body of `POST /v1/worker/invoices`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrepareInvoiceInput {
    /// `YYYY-Www` or a date in the week; defaults to the current week
    pub week: Option<String>,
}

#[derive(Clone)]
pub struct WorkerService {
    pool: PgPool,
    contractors: ContractorService,
    weekly: WeeklyService,
    invoices: InvoiceService,
    history: HistoryService,
}

impl WorkerService {
    pub fn new(
        pool: PgPool,
        contractors: ContractorService,
        weekly: WeeklyService,
        invoices: InvoiceService,
        history: HistoryService,
    ) -> Self {
        Self {
            pool,
            contractors,
            weekly,
            invoices,
            history,
        }
    }

    /// The contractor linked to the caller
    pub async fn contractor_for(&self, auth: &AuthContext) -> ServiceResult<Contractor> {
        require_any(auth, &[Role::Worker])?;

        Contractor::find_by_user(&self.pool, auth.tenant_id, auth.user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contractor profile"))
    }

    /// Own contractor record, bank details masked
    pub async fn profile(&self, auth: &AuthContext) -> ServiceResult<ContractorView> {
        let contractor = self.contractor_for(auth).await?;
        self.contractors.view(contractor, false)
    }

    /// Updates contact and bank details
    pub async fn update_profile(
        &self,
        auth: &AuthContext,
        patch: ProfilePatch,
    ) -> ServiceResult<ContractorView> {
        let mut contractor = self.contractor_for(auth).await?;

        if let Some(email) = patch.email {
            contractor.email = optional_email("email", email)?;
        }
        if let Some(phone) = patch.phone {
            contractor.phone = optional_text(phone);
        }
        self.contractors.apply_bank_patch(&mut contractor, patch.bank)?;

        let contractor = contractor.save(&self.pool).await?;
        tracing::info!(contractor_id = %contractor.id, "Worker profile updated");
        self.contractors.view(contractor, false)
    }

    /// Current and previous week at a glance
    pub async fn dashboard(&self, auth: &AuthContext) -> ServiceResult<WorkerDashboard> {
        let contractor = self.contractor_for(auth).await?;
        let current = WeekRange::current();

        let current_week = self.snapshot(auth.tenant_id, contractor.id, current).await?;
        let previous_week = self
            .snapshot(auth.tenant_id, contractor.id, current.previous())
            .await?;
        let invoices = WorkerInvoice::status_totals(
            &self.pool,
            auth.tenant_id,
            Some(contractor.id),
            None,
        )
        .await?;

        Ok(WorkerDashboard {
            contractor: ContractorRef::from(&contractor),
            current_week,
            previous_week,
            invoices: invoice_totals(invoices),
        })
    }

    pub async fn weekly(&self, auth: &AuthContext, week: WeekRange) -> ServiceResult<ContractorWeek> {
        let contractor = self.contractor_for(auth).await?;
        self.weekly
            .contractor_week(auth.tenant_id, contractor.id, week)
            .await
    }

    pub async fn history(&self, auth: &AuthContext, weeks: Option<u32>) -> ServiceResult<ContractorHistory> {
        let contractor = self.contractor_for(auth).await?;
        self.history
            .contractor_history(auth.tenant_id, contractor.id, weeks)
            .await
    }

    /// Own invoices, newest week first
    pub async fn invoices(
        &self,
        auth: &AuthContext,
        status: Option<InvoiceStatus>,
        page: &PageParams,
    ) -> ServiceResult<Page<InvoiceSummary>> {
        let contractor = self.contractor_for(auth).await?;
        let filter = InvoiceFilter {
            status,
            contractor_id: Some(contractor.id),
            week_start: None,
        };
        self.invoices.list(auth.tenant_id, &filter, page).await
    }

    /// Prepares or refreshes the DRAFT for a week
    pub async fn prepare_invoice(&self, auth: &AuthContext, week: WeekRange) -> ServiceResult<InvoiceDetail> {
        let contractor = self.contractor_for(auth).await?;
        let invoice = self
            .invoices
            .prepare(auth.tenant_id, contractor.id, week)
            .await?;

        Ok(InvoiceDetail {
            contractor: ContractorRef::from(&contractor),
            invoice,
        })
    }

    /// Submits one of the caller's own drafts
    pub async fn submit_invoice(&self, auth: &AuthContext, invoice_id: Uuid) -> ServiceResult<InvoiceDetail> {
        let contractor = self.contractor_for(auth).await?;
        let invoice = self.invoices.find(auth.tenant_id, invoice_id).await?;
        if invoice.contractor_id != contractor.id {
            return Err(ServiceError::forbidden("Not authorized to access this invoice"));
        }

        let invoice = self.invoices.submit(auth.tenant_id, invoice_id).await?;
        Ok(InvoiceDetail {
            contractor: ContractorRef::from(&contractor),
            invoice,
        })
    }

    async fn snapshot(&self, tenant_id: Uuid, contractor_id: Uuid, week: WeekRange) -> ServiceResult<WeekSnapshot> {
        let totals = DocketEntry::totals_for_contractor(
            &self.pool,
            tenant_id,
            contractor_id,
            week.start,
            week.end,
        )
        .await?;
        let invoice = WorkerInvoice::find_for_week(&self.pool, contractor_id, week.start).await?;

        Ok(WeekSnapshot {
            week,
            totals,
            invoice: invoice.as_ref().map(InvoiceRef::from),
        })
    }
}
