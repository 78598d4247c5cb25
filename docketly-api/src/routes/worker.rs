/// Worker self-service
///
/// Every route acts on the contractor linked to the caller's login. Only the
/// WORKER role is admitted; a worker without a linked contractor gets 404.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::WeekQuery,
};
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use docketly_shared::{
    auth::middleware::AuthContext,
    error::ServiceError,
    models::worker_invoice::{InvoiceStatus, InvoiceSummary},
    pagination::{Page, PageParams},
    services::{
        contractor::ContractorView,
        history::ContractorHistory,
        invoice::InvoiceDetail,
        weekly::ContractorWeek,
        worker::{PrepareInvoiceInput, ProfilePatch, WorkerDashboard},
    },
    weekly::WeekRange,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::history::HistoryQuery;

#[derive(Debug, Default, Deserialize)]
pub struct WorkerInvoiceQuery {
    pub status: Option<InvoiceStatus>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile).patch(update_profile))
        .route("/dashboard", get(dashboard))
        .route("/weekly", get(weekly))
        .route("/history", get(history))
        .route("/invoices", get(list_invoices).post(prepare_invoice))
        .route("/invoices/:id/submit", post(submit_invoice))
}

/// Own record, bank details masked
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ContractorView>> {
    Ok(Json(state.services.worker.profile(&auth).await?))
}

/// Contact and bank details; `null` clears a field
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> ApiResult<Json<ContractorView>> {
    patch.validate()?;

    Ok(Json(state.services.worker.update_profile(&auth, patch).await?))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<WorkerDashboard>> {
    Ok(Json(state.services.worker.dashboard(&auth).await?))
}

pub async fn weekly(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> ApiResult<Json<ContractorWeek>> {
    let week = query.resolve()?;

    Ok(Json(state.services.worker.weekly(&auth, week).await?))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<ContractorHistory>> {
    Ok(Json(state.services.worker.history(&auth, query.weeks).await?))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(query): ApiQuery<WorkerInvoiceQuery>,
) -> ApiResult<Json<Page<InvoiceSummary>>> {
    Ok(Json(
        state
            .services
            .worker
            .invoices(&auth, query.status, &page)
            .await?,
    ))
}

/// Prepares or refreshes the DRAFT for `week` (default current week)
pub async fn prepare_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<PrepareInvoiceInput>,
) -> ApiResult<Json<InvoiceDetail>> {
    let week = WeekRange::parse_or_current(input.week.as_deref()).map_err(ServiceError::from)?;

    Ok(Json(state.services.worker.prepare_invoice(&auth, week).await?))
}

/// DRAFT → SUBMITTED; admins are notified by email
pub async fn submit_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<InvoiceDetail>> {
    Ok(Json(state.services.worker.submit_invoice(&auth, id).await?))
}
