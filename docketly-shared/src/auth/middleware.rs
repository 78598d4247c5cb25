/// Request authentication
///
/// Extracts the bearer token from the `Authorization` header, validates it as
/// an access token and produces the [`AuthContext`] that handlers receive
/// through request extensions.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use docketly_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User {} ({}) in tenant {}", auth.user_id, auth.role, auth.tenant_id)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};
use crate::models::user::Role;

/// Identity of the caller, inserted into request extensions by the JWT layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Tenant every query is scoped to
    pub tenant_id: Uuid,

    /// Role from the access token
    pub role: Role,
}

impl AuthContext {
    /// Builds the context from validated claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
            role: claims.role,
        }
    }

    /// Whether the caller is an admin
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authentication failures, all of which end up as 401 except `InvalidFormat`
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Token failed validation
    #[error("{0}")]
    InvalidToken(String),
}

/// Returns the bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty bearer token".to_string()));
    }

    Ok(token)
}

/// Validates the request's access token and returns the caller's context
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        JwtError::WrongType { .. } => {
            AuthError::InvalidToken("Refresh tokens cannot be used for API calls".to_string())
        }
        other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
    })?;

    Ok(AuthContext::from_claims(&claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, TokenType};
    use axum::http::HeaderValue;

    const SECRET: &str = "middleware-test-secret-32-bytes-long!";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            authenticate(&HeaderMap::new(), SECRET),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_wrong_scheme() {
        assert!(matches!(
            bearer_token(&headers_with("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            bearer_token(&headers_with("Bearer ")),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_valid_access_token() {
        let user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let claims = Claims::new(user_id, tenant_id, Role::Supervisor, TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        let auth = authenticate(&headers_with(&format!("Bearer {}", token)), SECRET).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.tenant_id, tenant_id);
        assert_eq!(auth.role, Role::Supervisor);
        assert!(!auth.is_admin());
    }

    #[test]
    fn test_refresh_token_rejected() {
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), Role::Admin, TokenType::Refresh);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            authenticate(&headers_with(&format!("Bearer {}", token)), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            authenticate(&headers_with("Bearer not.a.jwt"), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
