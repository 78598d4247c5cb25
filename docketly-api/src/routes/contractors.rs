/// Contractors
///
/// Bank details are masked in every response except `GET /:id` for an
/// ADMIN. The CSV export carries masked values too; full details only leave
/// the system through the invoice payment run.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::csv_download,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use docketly_shared::{
    auth::{
        authorization::{require_admin, require_role},
        middleware::AuthContext,
    },
    models::{contractor::ContractorFilter, user::Role},
    pagination::{Page, PageParams},
    services::contractor::{ContractorInput, ContractorPatch, ContractorView},
};
use uuid::Uuid;
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contractors).post(create_contractor))
        .route("/export.csv", get(export_contractors))
        .route(
            "/:id",
            get(get_contractor)
                .patch(update_contractor)
                .delete(delete_contractor),
        )
}

pub async fn list_contractors(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<ContractorFilter>,
) -> ApiResult<Json<Page<ContractorView>>> {
    require_role(&auth, Role::Supervisor)?;

    Ok(Json(state.services.contractors.list(auth.tenant_id, &filter, &page).await?))
}

pub async fn create_contractor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<ContractorInput>,
) -> ApiResult<(StatusCode, Json<ContractorView>)> {
    require_admin(&auth)?;
    input.validate()?;

    let contractor = state.services.contractors.create(auth.tenant_id, input).await?;
    Ok((StatusCode::CREATED, Json(contractor)))
}

pub async fn get_contractor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ContractorView>> {
    require_role(&auth, Role::Supervisor)?;

    let contractor = state
        .services
        .contractors
        .get(auth.tenant_id, id, auth.is_admin())
        .await?;
    Ok(Json(contractor))
}

pub async fn update_contractor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ContractorPatch>,
) -> ApiResult<Json<ContractorView>> {
    require_admin(&auth)?;
    patch.validate()?;

    Ok(Json(state.services.contractors.update(auth.tenant_id, id, patch).await?))
}

/// 409 once the contractor appears on a docket; deactivate instead
pub async fn delete_contractor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    state.services.contractors.delete(auth.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn export_contractors(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    require_admin(&auth)?;

    let csv = state.services.contractors.export_csv(auth.tenant_id).await?;
    csv_download("contractors.csv", csv)
}
