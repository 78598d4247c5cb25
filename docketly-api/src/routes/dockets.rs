/// Daily dockets
///
/// Supervisors see and change only the dockets they recorded; admins see
/// all. Changes are refused with 409 once any contractor on the docket has a
/// SUBMITTED or PAID invoice for that week.

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
    auth::{authorization::require_admin, middleware::AuthContext},
    models::docket::{DocketFilter, DocketSummary},
    pagination::{Page, PageParams},
    services::docket::{DocketDetail, DocketInput},
};
use uuid::Uuid;
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_dockets).post(create_docket))
        .route("/export.csv", get(export_dockets))
        .route(
            "/:id",
            get(get_docket).put(replace_docket).delete(delete_docket),
        )
}

/// Newest first; filter by `from`, `to`, `builder_id`, `supervisor_id`
pub async fn list_dockets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<DocketFilter>,
) -> ApiResult<Json<Page<DocketSummary>>> {
    Ok(Json(state.services.dockets.list(&auth, filter, &page).await?))
}

pub async fn create_docket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<DocketInput>,
) -> ApiResult<(StatusCode, Json<DocketDetail>)> {
    input.validate()?;

    let docket = state.services.dockets.create(&auth, input).await?;
    Ok((StatusCode::CREATED, Json(docket)))
}

pub async fn get_docket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DocketDetail>> {
    Ok(Json(state.services.dockets.get(&auth, id).await?))
}

/// Replaces header fields and the full entry list
pub async fn replace_docket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<DocketInput>,
) -> ApiResult<Json<DocketDetail>> {
    input.validate()?;

    Ok(Json(state.services.dockets.replace(&auth, id, input).await?))
}

pub async fn delete_docket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.dockets.delete(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// One row per docket entry, same filters as the list
pub async fn export_dockets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(filter): ApiQuery<DocketFilter>,
) -> ApiResult<Response> {
    require_admin(&auth)?;

    let csv = state.services.dockets.export_csv(&auth, filter).await?;
    csv_download("dockets.csv", csv)
}
