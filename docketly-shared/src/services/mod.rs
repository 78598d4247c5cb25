/// Business services
///
/// Handlers in the API crate authenticate and authorize, then delegate to
/// one of these services. Each service owns a clone of the pool (and the
/// field cipher where bank details are involved) and returns
/// [`ServiceResult`]. Every call takes the caller's tenant ID; no service
/// ever reads or writes across tenants.
///
/// # Example
///
/// ```no_run
/// use docketly_shared::crypto::FieldCipher;
/// use docketly_shared::pagination::PageParams;
/// use docketly_shared::services::Services;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, tenant_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let cipher = FieldCipher::new(&[7u8; 32])?;
/// let services = Services::new(pool, cipher);
///
/// let page = services.builders.list(tenant_id, &Default::default(), &PageParams::default()).await?;
/// println!("{} builders", page.total);
/// # Ok(())
/// # }
/// ```

pub mod admin;
pub mod builder;
pub mod contractor;
pub mod docket;
pub mod history;
pub mod invoice;
pub mod weekly;
pub mod worker;

use sqlx::PgPool;
use validator::ValidateEmail;

use crate::crypto::FieldCipher;
use crate::error::{ServiceError, ServiceResult};

pub use admin::AdminService;
pub use builder::BuilderService;
pub use contractor::ContractorService;
pub use docket::DocketService;
pub use history::HistoryService;
pub use invoice::InvoiceService;
pub use weekly::WeeklyService;
pub use worker::WorkerService;

/// Every service, built once at startup and shared through app state
#[derive(Clone)]
pub struct Services {
    pub builders: BuilderService,
    pub contractors: ContractorService,
    pub dockets: DocketService,
    pub weekly: WeeklyService,
    pub invoices: InvoiceService,
    pub history: HistoryService,
    pub admin: AdminService,
    pub worker: WorkerService,
}

impl Services {
    pub fn new(pool: PgPool, cipher: FieldCipher) -> Self {
        let contractors = ContractorService::new(pool.clone(), cipher.clone());
        let weekly = WeeklyService::new(pool.clone());
        let invoices = InvoiceService::new(pool.clone(), cipher);
        let history = HistoryService::new(pool.clone());

        Self {
            builders: BuilderService::new(pool.clone()),
            dockets: DocketService::new(pool.clone()),
            admin: AdminService::new(pool.clone()),
            worker: WorkerService::new(
                pool,
                contractors.clone(),
                weekly.clone(),
                invoices.clone(),
                history.clone(),
            ),
            contractors,
            weekly,
            invoices,
            history,
        }
    }
}

/// Trims a required text field, rejecting blanks
pub(crate) fn required_text(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; blank becomes `None`
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims an optional email and checks its format
pub(crate) fn optional_email(field: &str, value: Option<String>) -> ServiceResult<Option<String>> {
    match optional_text(value) {
        Some(email) if !email.validate_email() => {
            Err(ServiceError::validation(field, "Invalid email format"))
        }
        other => Ok(other),
    }
}

/// Rejects negative money amounts
pub(crate) fn non_negative_cents(field: &str, cents: i64) -> ServiceResult<i64> {
    if cents < 0 {
        return Err(ServiceError::validation(field, "must not be negative"));
    }
    Ok(cents)
}
