/// Authentication endpoints
///
/// - `POST /v1/auth/register`: Create a tenant and its first ADMIN
/// - `POST /v1/auth/login`: Exchange email and password for tokens
/// - `POST /v1/auth/refresh`: Exchange a refresh token for a new pair
/// - `GET /v1/auth/me`: Current user and tenant
/// - `POST /v1/auth/change-password`: Change own password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use docketly_shared::{
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password,
    },
    error::ServiceError,
    models::{
        tenant::Tenant,
        user::{CreateUser, Role, User},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Trading name shown on invoices
    #[validate(length(min = 1, max = 255, message = "Business name must be 1-255 characters"))]
    pub business_name: String,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    pub new_password: String,
}

/// Tokens plus the account they belong to
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub tenant: Tenant,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub tenant: Tenant,
}

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Register a new business
///
/// Creates the tenant and its first ADMIN in one transaction.
///
/// # Errors
///
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed or weak password
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    req.validate()?;
    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::invalid("password", e))?;

    let password_hash = password::hash_password(&req.password)?;

    let mut tx = state.db.begin().await?;
    let tenant = Tenant::create(&mut *tx, req.business_name.trim()).await?;
    let user = User::create(
        &mut *tx,
        CreateUser {
            tenant_id: tenant.id,
            email: req.email.trim().to_string(),
            password_hash,
            name: req.name.trim().to_string(),
            role: Role::Admin,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(tenant_id = %tenant.id, user_id = %user.id, "Tenant registered");

    let tokens = jwt::issue_token_pair(user.id, tenant.id, user.role, state.jwt_secret())?;
    Ok((StatusCode::CREATED, Json(SessionResponse { user, tenant, tokens })))
}

/// Login
///
/// Unknown emails and wrong passwords get the same 401.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
/// - `403 Forbidden`: Account deactivated
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    if !user.active {
        return Err(ApiError::Forbidden("Account is deactivated".to_string()));
    }

    let tenant = load_tenant(&state, &user).await?;
    User::update_last_login(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, tenant_id = %tenant.id, role = %user.role, "User logged in");

    let tokens = jwt::issue_token_pair(user.id, tenant.id, user.role, state.jwt_secret())?;
    Ok(Json(SessionResponse { user, tenant, tokens }))
}

/// Token refresh
///
/// The user is reloaded so a deactivated account or a changed role takes
/// effect on the next refresh.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .filter(|u| u.active && u.tenant_id == claims.tenant_id)
        .ok_or_else(|| ApiError::Unauthorized("Account is no longer active".to_string()))?;

    let tokens = jwt::issue_token_pair(user.id, user.tenant_id, user.role, state.jwt_secret())?;
    Ok(Json(tokens))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_in_tenant(&state.db, auth.tenant_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::from(ServiceError::not_found("User")))?;
    let tenant = load_tenant(&state, &user).await?;

    Ok(Json(MeResponse { user, tenant }))
}

/// Change own password
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
/// - `422 Unprocessable Entity`: New password fails the policy
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;
    password::validate_password_strength(&req.new_password)
        .map_err(|e| ApiError::invalid("new_password", e))?;

    let user = User::find_in_tenant(&state.db, auth.tenant_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::from(ServiceError::not_found("User")))?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    let password_hash = password::hash_password(&req.new_password)?;
    User::set_password_hash(&state.db, user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_tenant(state: &AppState, user: &User) -> ApiResult<Tenant> {
    Tenant::find_by_id(&state.db, user.tenant_id)
        .await?
        .ok_or_else(|| ApiError::InternalError(format!("User {} has no tenant", user.id)))
}
