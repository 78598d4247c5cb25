/// Builders and their work locations
///
/// Reads are open to ADMIN and SUPERVISOR (supervisors pick a site when
/// recording a docket); changes are ADMIN only.

use crate::{app::AppState, error::ApiResult, extract::{ApiJson, ApiPath, ApiQuery}};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use docketly_shared::{
    auth::{
        authorization::{require_admin, require_role},
        middleware::AuthContext,
    },
    models::{
        builder::{Builder, BuilderFilter},
        builder_location::BuilderLocation,
        user::Role,
    },
    pagination::{Page, PageParams},
    services::builder::{BuilderDetail, BuilderInput, BuilderPatch, LocationInput, LocationPatch},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub active: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_builders).post(create_builder))
        .route(
            "/:id",
            get(get_builder).patch(update_builder).delete(delete_builder),
        )
        .route("/:id/locations", get(list_locations).post(create_location))
        .route(
            "/:id/locations/:location_id",
            patch(update_location).delete(delete_location),
        )
}

pub async fn list_builders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<BuilderFilter>,
) -> ApiResult<Json<Page<Builder>>> {
    require_role(&auth, Role::Supervisor)?;

    Ok(Json(state.services.builders.list(auth.tenant_id, &filter, &page).await?))
}

pub async fn create_builder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<BuilderInput>,
) -> ApiResult<(StatusCode, Json<Builder>)> {
    require_admin(&auth)?;
    input.validate()?;

    let builder = state.services.builders.create(auth.tenant_id, input).await?;
    Ok((StatusCode::CREATED, Json(builder)))
}

/// Builder with all its locations
pub async fn get_builder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<BuilderDetail>> {
    require_role(&auth, Role::Supervisor)?;

    Ok(Json(state.services.builders.get(auth.tenant_id, id).await?))
}

pub async fn update_builder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<BuilderPatch>,
) -> ApiResult<Json<Builder>> {
    require_admin(&auth)?;
    patch.validate()?;

    Ok(Json(state.services.builders.update(auth.tenant_id, id, patch).await?))
}

/// 409 while dockets reference the builder; deactivate instead
pub async fn delete_builder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    state.services.builders.delete(auth.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_locations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<LocationQuery>,
) -> ApiResult<Json<Vec<BuilderLocation>>> {
    require_role(&auth, Role::Supervisor)?;

    let locations = state
        .services
        .builders
        .list_locations(auth.tenant_id, id, query.active)
        .await?;
    Ok(Json(locations))
}

pub async fn create_location(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<LocationInput>,
) -> ApiResult<(StatusCode, Json<BuilderLocation>)> {
    require_admin(&auth)?;
    input.validate()?;

    let location = state
        .services
        .builders
        .create_location(auth.tenant_id, id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn update_location(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath((id, location_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(patch): ApiJson<LocationPatch>,
) -> ApiResult<Json<BuilderLocation>> {
    require_admin(&auth)?;
    patch.validate()?;

    let location = state
        .services
        .builders
        .update_location(auth.tenant_id, id, location_id, patch)
        .await?;
    Ok(Json(location))
}

pub async fn delete_location(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath((id, location_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    state
        .services
        .builders
        .delete_location(auth.tenant_id, id, location_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
