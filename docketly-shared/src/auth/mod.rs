/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing, password policy, temporary passwords
/// - [`jwt`]: HS256 access and refresh tokens carrying tenant and role
/// - [`middleware`]: Bearer token extraction and the request [`middleware::AuthContext`]
/// - [`authorization`]: Role hierarchy and ownership checks
///
/// # Example
///
/// ```no_run
/// use docketly_shared::auth::jwt::issue_token_pair;
/// use docketly_shared::auth::password::{hash_password, verify_password};
/// use docketly_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Formwork7")?;
/// assert!(verify_password("Formwork7", &hash)?);
///
/// let tokens = issue_token_pair(Uuid::new_v4(), Uuid::new_v4(), Role::Admin, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
