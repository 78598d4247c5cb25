/// Builder and location management
///
/// Admins maintain builders and their sites; supervisors read them to
/// record dockets. Deleting either is refused while dockets reference it.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{optional_email, optional_text, required_text};
use crate::error::{ServiceError, ServiceResult};
use crate::models::builder::{normalize_company_code, Builder, BuilderFilter, NewBuilder};
use crate::models::builder_location::BuilderLocation;
use crate::models::double_option;
use crate::pagination::{Page, PageParams};

/// Body of `POST /v1/builders`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BuilderInput {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 32, message = "Company code must be 1-32 characters"))]
    pub company_code: String,

    #[validate(length(max = 255))]
    pub contact_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub contact_email: Option<String>,

    #[validate(length(max = 64))]
    pub phone: Option<String>,
}

/// Body of `PATCH /v1/builders/:id`; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BuilderPatch {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 32, message = "Company code must be 1-32 characters"))]
    pub company_code: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub contact_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub contact_email: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,

    pub active: Option<bool>,
}

/// Body of `POST /v1/builders/:id/locations`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub address: Option<String>,
}

/// Body of `PATCH /v1/builders/:id/locations/:location_id`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LocationPatch {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,

    pub active: Option<bool>,
}

/// A builder with its sites
#[derive(Debug, Clone, Serialize)]
pub struct BuilderDetail {
    #[serde(flatten)]
    pub builder: Builder,
    pub locations: Vec<BuilderLocation>,
}

#[derive(Clone)]
pub struct BuilderService {
    pool: PgPool,
}

impl BuilderService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &BuilderFilter,
        page: &PageParams,
    ) -> ServiceResult<Page<Builder>> {
        let (builders, total) = Builder::list(&self.pool, tenant_id, filter, page).await?;
        Ok(Page::new(builders, total, page))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<BuilderDetail> {
        let builder = self.find(tenant_id, id).await?;
        let locations = BuilderLocation::list_for_builder(&self.pool, id, None).await?;
        Ok(BuilderDetail { builder, locations })
    }

    pub async fn create(&self, tenant_id: Uuid, input: BuilderInput) -> ServiceResult<Builder> {
        let company_code = normalize_company_code(&input.company_code);
        if company_code.is_empty() {
            return Err(ServiceError::validation("company_code", "must not be empty"));
        }

        let data = NewBuilder {
            name: required_text("name", &input.name)?,
            company_code,
            contact_name: optional_text(input.contact_name),
            contact_email: optional_email("contact_email", input.contact_email)?,
            phone: optional_text(input.phone),
        };

        let builder = Builder::create(&self.pool, tenant_id, &data).await?;
        tracing::info!(
            tenant_id = %tenant_id,
            builder_id = %builder.id,
            company_code = %builder.company_code,
            "Builder created"
        );
        Ok(builder)
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: BuilderPatch,
    ) -> ServiceResult<Builder> {
        let mut builder = self.find(tenant_id, id).await?;

        if let Some(name) = patch.name {
            builder.name = required_text("name", &name)?;
        }
        if let Some(code) = patch.company_code {
            let code = normalize_company_code(&code);
            if code.is_empty() {
                return Err(ServiceError::validation("company_code", "must not be empty"));
            }
            builder.company_code = code;
        }
        if let Some(contact_name) = patch.contact_name {
            builder.contact_name = optional_text(contact_name);
        }
        if let Some(contact_email) = patch.contact_email {
            builder.contact_email = optional_email("contact_email", contact_email)?;
        }
        if let Some(phone) = patch.phone {
            builder.phone = optional_text(phone);
        }
        if let Some(active) = patch.active {
            builder.active = active;
        }

        Ok(builder.save(&self.pool).await?)
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<()> {
        self.find(tenant_id, id).await?;

        if Builder::has_dockets(&self.pool, id).await? {
            return Err(ServiceError::conflict(
                "Builder has dockets and cannot be deleted; deactivate it instead",
            ));
        }

        Builder::delete(&self.pool, tenant_id, id).await?;
        tracing::info!(tenant_id = %tenant_id, builder_id = %id, "Builder deleted");
        Ok(())
    }

    pub async fn list_locations(
        &self,
        tenant_id: Uuid,
        builder_id: Uuid,
        active: Option<bool>,
    ) -> ServiceResult<Vec<BuilderLocation>> {
        self.find(tenant_id, builder_id).await?;
        Ok(BuilderLocation::list_for_builder(&self.pool, builder_id, active).await?)
    }

    pub async fn create_location(
        &self,
        tenant_id: Uuid,
        builder_id: Uuid,
        input: LocationInput,
    ) -> ServiceResult<BuilderLocation> {
        self.find(tenant_id, builder_id).await?;

        let name = required_text("name", &input.name)?;
        let address = optional_text(input.address);
        let location =
            BuilderLocation::create(&self.pool, builder_id, &name, address.as_deref()).await?;

        tracing::info!(
            builder_id = %builder_id,
            location_id = %location.id,
            "Builder location created"
        );
        Ok(location)
    }

    pub async fn update_location(
        &self,
        tenant_id: Uuid,
        builder_id: Uuid,
        location_id: Uuid,
        patch: LocationPatch,
    ) -> ServiceResult<BuilderLocation> {
        let mut location = self.find_location(tenant_id, builder_id, location_id).await?;

        if let Some(name) = patch.name {
            location.name = required_text("name", &name)?;
        }
        if let Some(address) = patch.address {
            location.address = optional_text(address);
        }
        if let Some(active) = patch.active {
            location.active = active;
        }

        Ok(location.save(&self.pool).await?)
    }

    pub async fn delete_location(
        &self,
        tenant_id: Uuid,
        builder_id: Uuid,
        location_id: Uuid,
    ) -> ServiceResult<()> {
        self.find_location(tenant_id, builder_id, location_id).await?;

        if BuilderLocation::has_dockets(&self.pool, location_id).await? {
            return Err(ServiceError::conflict(
                "Location has dockets and cannot be deleted; deactivate it instead",
            ));
        }

        BuilderLocation::delete(&self.pool, builder_id, location_id).await?;
        Ok(())
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<Builder> {
        Builder::find(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Builder"))
    }

    async fn find_location(
        &self,
        tenant_id: Uuid,
        builder_id: Uuid,
        location_id: Uuid,
    ) -> ServiceResult<BuilderLocation> {
        self.find(tenant_id, builder_id).await?;
        BuilderLocation::find(&self.pool, builder_id, location_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Location"))
    }
}
