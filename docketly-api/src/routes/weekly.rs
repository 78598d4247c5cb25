/// Weekly views
///
/// - `GET /v1/weekly?week=`: every contractor's hours for the week, with
///   invoice status (ADMIN, SUPERVISOR)
/// - `GET /v1/weekly/contractors/:id?week=`: one contractor's days (ADMIN)

use crate::{app::AppState, error::ApiResult, extract::{ApiPath, ApiQuery}, routes::WeekQuery};
use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use docketly_shared::{
    auth::{
        authorization::{require_admin, require_role},
        middleware::AuthContext,
    },
    models::user::Role,
    services::weekly::{ContractorWeek, WeekOverview},
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(week_overview))
        .route("/contractors/:id", get(contractor_week))
}

pub async fn week_overview(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> ApiResult<Json<WeekOverview>> {
    require_role(&auth, Role::Supervisor)?;
    let week = query.resolve()?;

    Ok(Json(state.services.weekly.week_overview(auth.tenant_id, week).await?))
}

pub async fn contractor_week(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> ApiResult<Json<ContractorWeek>> {
    require_admin(&auth)?;
    let week = query.resolve()?;

    Ok(Json(
        state
            .services
            .weekly
            .contractor_week(auth.tenant_id, id, week)
            .await?,
    ))
}
