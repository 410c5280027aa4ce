use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::identity::Identity;
use crate::pagination::{PageQuery, Paginated};
use crate::sorting;

use super::repository::{FindServices, ServiceFields, ServicePatch, ServiceRecord, ServicesRepository};

/// Business rules for the service resource: identity-derived tenant scoping,
/// payload validation, and not-found translation over the repository.
pub struct ServicesService<R: ServicesRepository> {
    repo: Arc<R>,
}

impl<R: ServicesRepository> ServicesService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    fn validate_fields(fields: &ServiceFields) -> Result<(), ServiceError> {
        models::service::validate_name(&fields.name)?;
        if let Some(description) = fields.description.as_deref() {
            models::service::validate_description(description)?;
        }
        Ok(())
    }

    fn validate_patch(patch: &ServicePatch) -> Result<(), ServiceError> {
        if let Some(name) = patch.name.as_deref() {
            models::service::validate_name(name)?;
        }
        if let Some(description) = patch.description.as_deref() {
            models::service::validate_description(description)?;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(tenant_id = %identity.tenant_id))]
    pub async fn create(&self, identity: &Identity, fields: ServiceFields) -> Result<ServiceRecord, ServiceError> {
        Self::validate_fields(&fields)?;
        let created = self.repo.create_or_replace(&identity.tenant_id, None, fields).await?;
        info!(id = %created.service.id, "service_created");
        Ok(created)
    }

    pub async fn find_all(
        &self,
        identity: &Identity,
        search: Option<String>,
        sort: &[String],
        page: PageQuery,
    ) -> Result<Paginated<ServiceRecord>, ServiceError> {
        let sort = sorting::parse_sort(sort, models::service::SORT_KEYS)?;
        self.repo
            .find(FindServices { tenant_id: identity.tenant_id.clone(), search, sort, page })
            .await
    }

    pub async fn find_one(&self, identity: &Identity, id: Uuid) -> Result<ServiceRecord, ServiceError> {
        self.repo
            .find_one(id, &identity.tenant_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service"))
    }

    /// Idempotent PUT semantics: insert when the id is free, overwrite the
    /// tenant's row when it is not.
    #[instrument(skip_all, fields(tenant_id = %identity.tenant_id, id = %id))]
    pub async fn create_or_replace(&self, identity: &Identity, id: Uuid, fields: ServiceFields) -> Result<ServiceRecord, ServiceError> {
        Self::validate_fields(&fields)?;
        self.repo.create_or_replace(&identity.tenant_id, Some(id), fields).await
    }

    pub async fn update(&self, identity: &Identity, id: Uuid, patch: ServicePatch) -> Result<ServiceRecord, ServiceError> {
        Self::validate_patch(&patch)?;
        self.repo
            .update(id, &identity.tenant_id, patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service"))
    }

    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), ServiceError> {
        if !self.repo.delete(id, &identity.tenant_id).await? {
            return Err(ServiceError::not_found("Service"));
        }
        info!(id = %id, tenant_id = %identity.tenant_id, "service_deleted");
        Ok(())
    }
}
