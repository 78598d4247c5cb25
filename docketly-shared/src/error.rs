/// Service error taxonomy
///
/// Every service operation returns `ServiceResult<T>`. The variants carry
/// enough information for the API layer to pick an HTTP status without
/// inspecting message text.
///
/// # Example
///
/// ```
/// use docketly_shared::error::ServiceError;
///
/// let err = ServiceError::not_found("Builder");
/// assert_eq!(err.to_string(), "Builder not found");
/// ```

use crate::crypto::CryptoError;
use crate::export::ExportError;
use crate::weekly::WeekParseError;

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Record does not exist in the caller's tenant
    #[error("{0} not found")]
    NotFound(String),

    /// Uniqueness violation or a change that conflicts with current state
    #[error("{0}")]
    Conflict(String),

    /// Caller is authenticated but not allowed to touch this record
    #[error("{0}")]
    Forbidden(String),

    /// Operation is not allowed in the record's current state
    #[error("{0}")]
    InvalidState(String),

    /// Input failed a business validation rule
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Bank field could not be encrypted or decrypted
    #[error("Field encryption failed: {0}")]
    Crypto(#[from] CryptoError),

    /// CSV or PDF rendering failed
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    /// Password hashing failed
    #[error("Password operation failed: {0}")]
    Password(#[from] crate::auth::password::PasswordError),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl ServiceError {
    /// Builds a `NotFound` for the named entity
    pub fn not_found(entity: &str) -> Self {
        ServiceError::NotFound(entity.to_string())
    }

    /// Builds a `Validation` error for one field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Builds a `Conflict` error
    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    /// Builds an `InvalidState` error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        ServiceError::InvalidState(message.into())
    }

    /// Builds a `Forbidden` error
    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }
}

/// Maps unique and foreign-key violations to conflicts by constraint name
///
/// Constraint names come from the migrations; anything unrecognised stays a
/// database error.
impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ServiceError::NotFound("Record".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(message) = db_err.constraint().and_then(constraint_message) {
                    return ServiceError::Conflict(message.to_string());
                }
                // 23503 = foreign_key_violation
                if db_err.code().as_deref() == Some("23503") {
                    return ServiceError::Conflict(
                        "Record is still referenced by other records".to_string(),
                    );
                }
                ServiceError::Database(err)
            }
            _ => ServiceError::Database(err),
        }
    }
}

impl From<WeekParseError> for ServiceError {
    fn from(err: WeekParseError) -> Self {
        ServiceError::validation("week", err.to_string())
    }
}

fn constraint_message(constraint: &str) -> Option<&'static str> {
    match constraint {
        "users_email_key" => Some("Email already exists"),
        "builders_company_code_key" => Some("Company code already exists"),
        "builder_locations_name_key" => Some("Location name already exists for this builder"),
        "contractors_nickname_key" => Some("Nickname already exists"),
        "contractors_user_id_key" => Some("User is already linked to another contractor"),
        "dockets_location_date_supervisor_key" => {
            Some("A docket already exists for this location, date and supervisor")
        }
        "docket_entries_contractor_key" => Some("Contractor appears twice on the docket"),
        "worker_invoices_week_key" => Some("An invoice already exists for this week"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ServiceError::not_found("Docket").to_string(), "Docket not found");
        assert_eq!(
            ServiceError::validation("nickname", "must not be empty").to_string(),
            "nickname: must not be empty"
        );
        assert_eq!(ServiceError::conflict("Locked").to_string(), "Locked");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_week_parse_error_is_validation() {
        let err: ServiceError = WeekParseError::Format("soon".to_string()).into();
        assert!(matches!(err, ServiceError::Validation { ref field, .. } if field == "week"));
    }

    #[test]
    fn test_constraint_messages() {
        assert_eq!(constraint_message("users_email_key"), Some("Email already exists"));
        assert_eq!(
            constraint_message("builders_company_code_key"),
            Some("Company code already exists")
        );
        assert_eq!(constraint_message("contractors_nickname_key"), Some("Nickname already exists"));
        assert_eq!(constraint_message("something_else"), None);
    }
}
