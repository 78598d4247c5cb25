/// Contractor history (ADMIN)
///
/// `GET /v1/history/contractors/:id?weeks=` returns the last `weeks` ISO
/// weeks (default 12, at most 52), newest first.

use crate::{app::AppState, error::ApiResult, extract::{ApiPath, ApiQuery}};
use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use docketly_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    services::history::ContractorHistory,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub weeks: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/contractors/:id", get(contractor_history))
}

pub async fn contractor_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<ContractorHistory>> {
    require_admin(&auth)?;

    Ok(Json(
        state
            .services
            .history
            .contractor_history(auth.tenant_id, id, query.weeks)
            .await?,
    ))
}
