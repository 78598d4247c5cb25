/// JWT authentication layer
///
/// Validates the bearer access token and inserts the caller's
/// [`AuthContext`] into request extensions. Handlers then extract it with
/// `Extension<AuthContext>` and apply role checks themselves.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use docketly_shared::auth::middleware::{authenticate, AuthContext};

use crate::{app::AppState, error::ApiError};

/// Rejects requests without a valid access token with 401
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth: AuthContext = authenticate(req.headers(), state.jwt_secret())?;

    tracing::debug!(
        user_id = %auth.user_id,
        tenant_id = %auth.tenant_id,
        role = %auth.role,
        "Authenticated request"
    );
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
