/// Weekly invoices
///
/// - `GET /v1/invoices`: List, filter by `status`, `contractor_id`, `week` (ADMIN)
/// - `GET /v1/invoices/export.csv`: Payment run of SUBMITTED invoices with
///   full bank details (ADMIN)
/// - `GET /v1/invoices/:id` and `/:id/pdf`: ADMIN or the owning WORKER
/// - `POST /v1/invoices/:id/paid`: SUBMITTED → PAID (ADMIN)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ApiQuery},
    routes::{bad_query, csv_download, pdf_download},
};
use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use docketly_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    models::worker_invoice::{InvoiceSummary, WorkerInvoice},
    pagination::{Page, PageParams},
    services::invoice::{InvoiceDetail, InvoiceQuery},
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices))
        .route("/export.csv", get(export_payment_run))
        .route("/:id", get(get_invoice))
        .route("/:id/pdf", get(invoice_pdf))
        .route("/:id/paid", post(mark_paid))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(query): ApiQuery<InvoiceQuery>,
) -> ApiResult<Json<Page<InvoiceSummary>>> {
    require_admin(&auth)?;

    let filter = query.into_filter().map_err(bad_query)?;
    Ok(Json(state.services.invoices.list(auth.tenant_id, &filter, &page).await?))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<InvoiceDetail>> {
    state.services.invoices.authorize(&auth, id).await?;

    Ok(Json(state.services.invoices.get(auth.tenant_id, id).await?))
}

pub async fn invoice_pdf(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Response> {
    state.services.invoices.authorize(&auth, id).await?;

    let detail = state.services.invoices.get(auth.tenant_id, id).await?;
    let pdf = state.services.invoices.render_pdf(auth.tenant_id, id).await?;
    pdf_download(&format!("{}.pdf", detail.invoice.invoice_number), pdf)
}

pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<WorkerInvoice>> {
    require_admin(&auth)?;

    Ok(Json(state.services.invoices.mark_paid(auth.tenant_id, id).await?))
}

pub async fn export_payment_run(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    require_admin(&auth)?;

    let csv = state.services.invoices.payment_run_csv(auth.tenant_id).await?;
    let filename = format!("payment-run-{}.csv", Utc::now().date_naive());
    csv_download(&filename, csv)
}
