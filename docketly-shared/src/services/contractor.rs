/// Contractor management
///
/// Bank details are encrypted on the way in and come back out either
/// masked (`•••678`) or, for admins asking for it, in clear. Lists and the
/// CSV export are always masked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{non_negative_cents, optional_email, optional_text, required_text};
use crate::crypto::{mask, FieldCipher};
use crate::error::{ServiceError, ServiceResult};
use crate::export::csv::{to_csv, CsvRow};
use crate::export::format_cents;
use crate::models::contractor::{Contractor, ContractorFilter, NewContractor};
use crate::models::double_option;
use crate::models::user::{Role, User};
use crate::pagination::{Page, PageParams};

/// Body of `POST /v1/contractors`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContractorInput {
    pub user_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Full name must be 1-255 characters"))]
    pub full_name: String,

    #[validate(length(min = 1, max = 64, message = "Nickname must be 1-64 characters"))]
    pub nickname: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 64))]
    pub phone: Option<String>,

    #[validate(length(max = 32))]
    pub abn: Option<String>,

    #[serde(default)]
    pub gst_registered: bool,

    #[serde(default)]
    #[validate(range(min = 0, message = "Rate must not be negative"))]
    pub tonnage_rate_cents: i64,

    #[serde(default)]
    #[validate(range(min = 0, message = "Rate must not be negative"))]
    pub day_labour_rate_cents: i64,

    #[serde(flatten)]
    pub bank: BankDetailsInput,
}

/// Body of `PATCH /v1/contractors/:id`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContractorPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub user_id: Option<Option<Uuid>>,

    #[validate(length(min = 1, max = 255, message = "Full name must be 1-255 characters"))]
    pub full_name: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Nickname must be 1-64 characters"))]
    pub nickname: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub abn: Option<Option<String>>,

    pub gst_registered: Option<bool>,

    #[validate(range(min = 0, message = "Rate must not be negative"))]
    pub tonnage_rate_cents: Option<i64>,

    #[validate(range(min = 0, message = "Rate must not be negative"))]
    pub day_labour_rate_cents: Option<i64>,

    #[serde(flatten)]
    pub bank: BankDetailsPatch,

    pub active: Option<bool>,
}

/// Clear-text bank details as supplied on create
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BankDetailsInput {
    pub bank_account_name: Option<String>,
    pub bank_bsb: Option<String>,
    pub bank_account_number: Option<String>,
}

/// Bank detail changes; `null` clears a field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BankDetailsPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub bank_account_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub bank_bsb: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub bank_account_number: Option<Option<String>>,
}

/// Contractor as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorView {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub nickname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub abn: Option<String>,
    pub gst_registered: bool,
    pub tonnage_rate_cents: i64,
    pub day_labour_rate_cents: i64,
    pub bank_account_name: Option<String>,
    pub bank_bsb: Option<String>,
    pub bank_account_number: Option<String>,
    /// Whether the bank fields above are in clear
    pub bank_revealed: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CsvRow for ContractorView {
    fn headers() -> &'static [&'static str] {
        &[
            "nickname",
            "full_name",
            "email",
            "phone",
            "abn",
            "gst_registered",
            "tonnage_rate",
            "day_labour_rate",
            "bank_account_name",
            "bank_bsb",
            "bank_account_number",
            "active",
        ]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.nickname.clone(),
            self.full_name.clone(),
            self.email.clone().unwrap_or_default(),
            self.phone.clone().unwrap_or_default(),
            self.abn.clone().unwrap_or_default(),
            yes_no(self.gst_registered),
            format_cents(self.tonnage_rate_cents),
            format_cents(self.day_labour_rate_cents),
            self.bank_account_name.clone().unwrap_or_default(),
            self.bank_bsb.clone().unwrap_or_default(),
            self.bank_account_number.clone().unwrap_or_default(),
            yes_no(self.active),
        ]
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

/// Normalizes a BSB to `NNN-NNN`
pub fn normalize_bsb(value: &str) -> ServiceResult<String> {
    let digits: String = value.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::validation("bank_bsb", "BSB must be 6 digits"));
    }
    Ok(format!("{}-{}", &digits[..3], &digits[3..]))
}

/// Strips spaces and dashes from an account number and checks its length
pub fn normalize_account_number(value: &str) -> ServiceResult<String> {
    let digits: String = value.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if !(4..=12).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::validation(
            "bank_account_number",
            "Account number must be 4-12 digits",
        ));
    }
    Ok(digits)
}

#[derive(Clone)]
pub struct ContractorService {
    pool: PgPool,
    cipher: FieldCipher,
}

impl ContractorService {
    pub fn new(pool: PgPool, cipher: FieldCipher) -> Self {
        Self { pool, cipher }
    }

    /// Lists contractors with masked bank fields
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &ContractorFilter,
        page: &PageParams,
    ) -> ServiceResult<Page<ContractorView>> {
        let (contractors, total) = Contractor::list(&self.pool, tenant_id, filter, page).await?;
        Page::new(contractors, total, page).try_map(|c| self.view(c, false))
    }

    /// Loads one contractor, bank fields in clear when `reveal`
    pub async fn get(&self, tenant_id: Uuid, id: Uuid, reveal: bool) -> ServiceResult<ContractorView> {
        let contractor = self.find(tenant_id, id).await?;
        self.view(contractor, reveal)
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        input: ContractorInput,
    ) -> ServiceResult<ContractorView> {
        if let Some(user_id) = input.user_id {
            self.check_linkable_user(tenant_id, user_id).await?;
        }

        let data = NewContractor {
            user_id: input.user_id,
            full_name: required_text("full_name", &input.full_name)?,
            nickname: required_text("nickname", &input.nickname)?,
            email: optional_email("email", input.email)?,
            phone: optional_text(input.phone),
            abn: optional_text(input.abn),
            gst_registered: input.gst_registered,
            tonnage_rate_cents: non_negative_cents("tonnage_rate_cents", input.tonnage_rate_cents)?,
            day_labour_rate_cents: non_negative_cents(
                "day_labour_rate_cents",
                input.day_labour_rate_cents,
            )?,
            bank_account_name: optional_text(input.bank.bank_account_name),
            bank_bsb: self.seal(input.bank.bank_bsb, normalize_bsb)?,
            bank_account_number: self
                .seal(input.bank.bank_account_number, normalize_account_number)?,
        };

        let contractor = Contractor::create(&self.pool, tenant_id, &data).await?;
        tracing::info!(
            tenant_id = %tenant_id,
            contractor_id = %contractor.id,
            nickname = %contractor.nickname,
            "Contractor created"
        );
        self.view(contractor, false)
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: ContractorPatch,
    ) -> ServiceResult<ContractorView> {
        let mut contractor = self.find(tenant_id, id).await?;

        if let Some(user_id) = patch.user_id {
            if let Some(user_id) = user_id {
                if contractor.user_id != Some(user_id) {
                    self.check_linkable_user(tenant_id, user_id).await?;
                }
            }
            contractor.user_id = user_id;
        }
        if let Some(full_name) = patch.full_name {
            contractor.full_name = required_text("full_name", &full_name)?;
        }
        if let Some(nickname) = patch.nickname {
            contractor.nickname = required_text("nickname", &nickname)?;
        }
        if let Some(email) = patch.email {
            contractor.email = optional_email("email", email)?;
        }
        if let Some(phone) = patch.phone {
            contractor.phone = optional_text(phone);
        }
        if let Some(abn) = patch.abn {
            contractor.abn = optional_text(abn);
        }
        if let Some(gst_registered) = patch.gst_registered {
            contractor.gst_registered = gst_registered;
        }
        if let Some(rate) = patch.tonnage_rate_cents {
            contractor.tonnage_rate_cents = non_negative_cents("tonnage_rate_cents", rate)?;
        }
        if let Some(rate) = patch.day_labour_rate_cents {
            contractor.day_labour_rate_cents = non_negative_cents("day_labour_rate_cents", rate)?;
        }
        if let Some(active) = patch.active {
            contractor.active = active;
        }
        self.apply_bank_patch(&mut contractor, patch.bank)?;

        let contractor = contractor.save(&self.pool).await?;
        self.view(contractor, false)
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<()> {
        self.find(tenant_id, id).await?;

        if Contractor::has_dockets(&self.pool, id).await? {
            return Err(ServiceError::conflict(
                "Contractor appears on dockets and cannot be deleted; deactivate instead",
            ));
        }

        Contractor::delete(&self.pool, tenant_id, id).await?;
        tracing::info!(tenant_id = %tenant_id, contractor_id = %id, "Contractor deleted");
        Ok(())
    }

    /// Every contractor as CSV, bank fields masked
    pub async fn export_csv(&self, tenant_id: Uuid) -> ServiceResult<Vec<u8>> {
        let views = Contractor::list_all(&self.pool, tenant_id)
            .await?
            .into_iter()
            .map(|c| self.view(c, false))
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(to_csv(&views)?)
    }

    /// Merges bank detail changes into a row, encrypting new values
    pub(crate) fn apply_bank_patch(
        &self,
        contractor: &mut Contractor,
        bank: BankDetailsPatch,
    ) -> ServiceResult<()> {
        if let Some(name) = bank.bank_account_name {
            contractor.bank_account_name = optional_text(name);
        }
        if let Some(bsb) = bank.bank_bsb {
            contractor.bank_bsb = self.seal(bsb, normalize_bsb)?;
        }
        if let Some(number) = bank.bank_account_number {
            contractor.bank_account_number = self.seal(number, normalize_account_number)?;
        }
        Ok(())
    }

    /// Builds the API view, decrypting bank fields and masking unless `reveal`
    pub(crate) fn view(&self, c: Contractor, reveal: bool) -> ServiceResult<ContractorView> {
        let bsb = self.cipher.decrypt_opt(c.bank_bsb.as_deref())?;
        let account = self.cipher.decrypt_opt(c.bank_account_number.as_deref())?;
        let shown = |v: Option<String>| if reveal { v } else { v.map(|v| mask(&v)) };

        Ok(ContractorView {
            id: c.id,
            user_id: c.user_id,
            full_name: c.full_name,
            nickname: c.nickname,
            email: c.email,
            phone: c.phone,
            abn: c.abn,
            gst_registered: c.gst_registered,
            tonnage_rate_cents: c.tonnage_rate_cents,
            day_labour_rate_cents: c.day_labour_rate_cents,
            bank_account_name: c.bank_account_name,
            bank_bsb: shown(bsb),
            bank_account_number: shown(account),
            bank_revealed: reveal,
            active: c.active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        })
    }

    pub(crate) async fn find(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<Contractor> {
        Contractor::find(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contractor"))
    }

    /// Normalizes and encrypts an optional bank value; blank clears it
    fn seal(
        &self,
        value: Option<String>,
        normalize: fn(&str) -> ServiceResult<String>,
    ) -> ServiceResult<Option<String>> {
        match optional_text(value) {
            Some(v) => Ok(Some(self.cipher.encrypt(&normalize(&v)?)?)),
            None => Ok(None),
        }
    }

    /// A linked login must be a WORKER of the same tenant
    async fn check_linkable_user(&self, tenant_id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let user = User::find_in_tenant(&self.pool, tenant_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::validation("user_id", "User does not exist"))?;

        if user.role != Role::Worker {
            return Err(ServiceError::validation(
                "user_id",
                "Only WORKER users can be linked to a contractor",
            ));
        }

        if Contractor::find_by_user(&self.pool, tenant_id, user_id).await?.is_some() {
            return Err(ServiceError::conflict(
                "User is already linked to another contractor",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bsb() {
        assert_eq!(normalize_bsb("062000").unwrap(), "062-000");
        assert_eq!(normalize_bsb("062-000").unwrap(), "062-000");
        assert_eq!(normalize_bsb(" 062 000 ").unwrap(), "062-000");
        assert!(normalize_bsb("06200").is_err());
        assert!(normalize_bsb("06200A").is_err());
    }

    #[test]
    fn test_normalize_account_number() {
        assert_eq!(normalize_account_number("1234 5678").unwrap(), "12345678");
        assert!(normalize_account_number("123").is_err());
        assert!(normalize_account_number("1234567890123").is_err());
        assert!(normalize_account_number("12ab5678").is_err());
    }

    #[test]
    fn test_patch_distinguishes_clear_from_absent() {
        let patch: ContractorPatch =
            serde_json::from_str(r#"{"bank_bsb": null, "phone": "0400 111 222"}"#).unwrap();
        assert_eq!(patch.bank.bank_bsb, Some(None));
        assert_eq!(patch.bank.bank_account_number, None);
        assert_eq!(patch.phone, Some(Some("0400 111 222".to_string())));
        assert_eq!(patch.user_id, None);
    }

    #[test]
    fn test_csv_row_uses_view_values() {
        let view = ContractorView {
            id: Uuid::nil(),
            user_id: None,
            full_name: "Barry Ziggurat".to_string(),
            nickname: "BAZ".to_string(),
            email: None,
            phone: Some("0400 000 000".to_string()),
            abn: None,
            gst_registered: true,
            tonnage_rate_cents: 5250,
            day_labour_rate_cents: 4500,
            bank_account_name: Some("B Ziggurat".to_string()),
            bank_bsb: Some(mask("062-000")),
            bank_account_number: Some(mask("12345678")),
            bank_revealed: false,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let record = view.record();
        assert_eq!(record.len(), ContractorView::headers().len());
        assert_eq!(record[0], "BAZ");
        assert_eq!(record[5], "yes");
        assert_eq!(record[6], "52.50");
        assert_eq!(record[9], "•••000");
        assert_eq!(record[10], "•••678");
    }
}
