/// Admin dashboard
///
/// `GET /v1/dashboard?from=&to=` defaults to the current ISO week.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ApiQuery,
    routes::bad_query,
};
use axum::{extract::State, Extension, Json};
use chrono::Utc;
use docketly_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    services::admin::{Dashboard, DashboardQuery},
};

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> ApiResult<Json<Dashboard>> {
    require_admin(&auth)?;

    let (from, to) = query.resolve(Utc::now().date_naive()).map_err(bad_query)?;
    Ok(Json(state.services.admin.dashboard(auth.tenant_id, from, to).await?))
}
