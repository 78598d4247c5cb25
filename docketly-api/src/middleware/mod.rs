/// Middleware for the API server
///
/// - `auth`: Bearer token validation, inserts the caller's `AuthContext`
/// - `security`: Security response headers

pub mod auth;
pub mod security;
