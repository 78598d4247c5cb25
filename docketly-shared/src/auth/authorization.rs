/// Role and ownership checks
///
/// Roles form a hierarchy, ADMIN > SUPERVISOR > WORKER, so a route that
/// requires SUPERVISOR also admits admins. Ownership rules sit on top of the
/// role check:
///
/// - a supervisor may only read or change dockets they recorded
/// - a worker may only read invoices and profile data of the contractor
///   linked to their login
///
/// # Example
///
/// ```
/// use docketly_shared::auth::authorization::{require_admin, require_role};
/// use docketly_shared::auth::middleware::AuthContext;
/// use docketly_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let auth = AuthContext { user_id: Uuid::new_v4(), tenant_id: Uuid::new_v4(), role: Role::Supervisor };
/// assert!(require_role(&auth, Role::Worker).is_ok());
/// assert!(require_role(&auth, Role::Supervisor).is_ok());
/// assert!(require_admin(&auth).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::error::ServiceError;
use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller's role is below the required one
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: Role, actual: Role },

    /// Caller's role is not in the allowed set
    #[error("Role {0} may not perform this action")]
    RoleNotAllowed(Role),

    /// Caller does not own the record
    #[error("Not authorized to access this resource")]
    NotOwner,
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        ServiceError::Forbidden(err.to_string())
    }
}

/// Requires the caller's role to be at least `required`
pub fn require_role(auth: &AuthContext, required: Role) -> Result<(), AuthzError> {
    if !auth.role.has_permission(required) {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: auth.role,
        });
    }

    Ok(())
}

/// Requires ADMIN
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    require_role(auth, Role::Admin)
}

/// Requires the caller's role to be one of `allowed`, with no hierarchy
///
/// Worker self-service routes use this so that admins, who have no linked
/// contractor, are turned away with 403 rather than 404.
pub fn require_any(auth: &AuthContext, allowed: &[Role]) -> Result<(), AuthzError> {
    if !allowed.contains(&auth.role) {
        return Err(AuthzError::RoleNotAllowed(auth.role));
    }

    Ok(())
}

/// Admins see every docket; supervisors only their own
pub fn require_docket_access(auth: &AuthContext, supervisor_id: Uuid) -> Result<(), AuthzError> {
    match auth.role {
        Role::Admin => Ok(()),
        Role::Supervisor if auth.user_id == supervisor_id => Ok(()),
        Role::Supervisor => Err(AuthzError::NotOwner),
        Role::Worker => Err(AuthzError::RoleNotAllowed(Role::Worker)),
    }
}

/// Admins see every contractor record; workers only the one linked to them
pub fn require_contractor_access(
    auth: &AuthContext,
    contractor_user_id: Option<Uuid>,
) -> Result<(), AuthzError> {
    match auth.role {
        Role::Admin => Ok(()),
        Role::Worker if contractor_user_id == Some(auth.user_id) => Ok(()),
        Role::Worker => Err(AuthzError::NotOwner),
        Role::Supervisor => Err(AuthzError::RoleNotAllowed(Role::Supervisor)),
    }
}

/// Supervisors scoped to their own dockets get their user ID as a filter
pub fn docket_scope(auth: &AuthContext) -> Option<Uuid> {
    match auth.role {
        Role::Admin => None,
        _ => Some(auth.user_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_role_hierarchy() {
        let admin = ctx(Role::Admin);
        let supervisor = ctx(Role::Supervisor);
        let worker = ctx(Role::Worker);

        assert!(require_role(&admin, Role::Supervisor).is_ok());
        assert!(require_role(&supervisor, Role::Supervisor).is_ok());
        assert!(require_role(&worker, Role::Supervisor).is_err());
        assert!(require_admin(&admin).is_ok());
        assert!(require_admin(&supervisor).is_err());
    }

    #[test]
    fn test_require_any_has_no_hierarchy() {
        assert!(require_any(&ctx(Role::Worker), &[Role::Worker]).is_ok());
        assert!(matches!(
            require_any(&ctx(Role::Admin), &[Role::Worker]),
            Err(AuthzError::RoleNotAllowed(Role::Admin))
        ));
    }

    #[test]
    fn test_docket_access() {
        let supervisor = ctx(Role::Supervisor);
        assert!(require_docket_access(&supervisor, supervisor.user_id).is_ok());
        assert!(matches!(
            require_docket_access(&supervisor, Uuid::new_v4()),
            Err(AuthzError::NotOwner)
        ));
        assert!(require_docket_access(&ctx(Role::Admin), Uuid::new_v4()).is_ok());
        assert!(require_docket_access(&ctx(Role::Worker), Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_contractor_access() {
        let worker = ctx(Role::Worker);
        assert!(require_contractor_access(&worker, Some(worker.user_id)).is_ok());
        assert!(require_contractor_access(&worker, Some(Uuid::new_v4())).is_err());
        assert!(require_contractor_access(&worker, None).is_err());
        assert!(require_contractor_access(&ctx(Role::Admin), None).is_ok());
        assert!(require_contractor_access(&ctx(Role::Supervisor), None).is_err());
    }

    #[test]
    fn test_docket_scope() {
        let supervisor = ctx(Role::Supervisor);
        assert_eq!(docket_scope(&supervisor), Some(supervisor.user_id));
        assert_eq!(docket_scope(&ctx(Role::Admin)), None);
    }

    #[test]
    fn test_authz_error_becomes_forbidden() {
        let err: ServiceError = AuthzError::NotOwner.into();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = AuthzError::InsufficientRole {
            required: Role::Admin,
            actual: Role::Worker,
        };
        assert_eq!(err.to_string(), "Insufficient permissions: requires ADMIN, has WORKER");
    }
}
