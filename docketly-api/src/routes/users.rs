/// User management (ADMIN)
///
/// - `GET /v1/users`: List users, filter by `role`, `active`, `search`
/// - `POST /v1/users`: Create a user; a temporary password is generated and
///   emailed when none is given
/// - `GET/PATCH/DELETE /v1/users/:id`

use crate::{app::AppState, error::ApiResult, extract::{ApiJson, ApiPath, ApiQuery}};
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use docketly_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    models::user::{User, UserFilter},
    pagination::{Page, PageParams},
    services::admin::{CreateUserInput, CreatedUser, UserPatch},
};
use uuid::Uuid;
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> ApiResult<Json<Page<User>>> {
    require_admin(&auth)?;

    let users = state.services.admin.list_users(auth.tenant_id, &filter, &page).await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<CreateUserInput>,
) -> ApiResult<(StatusCode, Json<CreatedUser>)> {
    require_admin(&auth)?;
    input.validate()?;

    let created = state.services.admin.create_user(auth.tenant_id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<User>> {
    require_admin(&auth)?;

    Ok(Json(state.services.admin.get_user(auth.tenant_id, id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> ApiResult<Json<User>> {
    require_admin(&auth)?;
    patch.validate()?;

    Ok(Json(state.services.admin.update_user(&auth, id, patch).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    state.services.admin.delete_user(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
