use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use models::version;

use crate::errors::ServiceError;
use crate::identity::Identity;
use crate::pagination::{PageQuery, Paginated};
use crate::services::repository::{ServiceRecord, ServicesRepository};

use super::repository::{FindVersions, VersionFields, VersionPatch, VersionsRepository};

/// Business rules for the version resource. Create, list, and replace resolve
/// the parent service under the caller's tenant before touching the version
/// repository, so orphaned or cross-tenant-linked rows cannot appear through
/// this layer. Get, update, and delete address rows by the compound key,
/// which subsumes the parent check.
pub struct VersionsService<S: ServicesRepository, V: VersionsRepository> {
    services: Arc<S>,
    versions: Arc<V>,
}

impl<S: ServicesRepository, V: VersionsRepository> VersionsService<S, V> {
    pub fn new(services: Arc<S>, versions: Arc<V>) -> Self {
        Self { services, versions }
    }

    fn validate_fields(fields: &VersionFields) -> Result<(), ServiceError> {
        models::version::validate_name(&fields.name)?;
        if let Some(description) = fields.description.as_deref() {
            models::version::validate_description(description)?;
        }
        Ok(())
    }

    fn validate_patch(patch: &VersionPatch) -> Result<(), ServiceError> {
        if let Some(name) = patch.name.as_deref() {
            models::version::validate_name(name)?;
        }
        if let Some(description) = patch.description.as_deref() {
            models::version::validate_description(description)?;
        }
        Ok(())
    }

    async fn resolve_service(&self, identity: &Identity, service_id: Uuid) -> Result<ServiceRecord, ServiceError> {
        self.services
            .find_one(service_id, &identity.tenant_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service"))
    }

    #[instrument(skip_all, fields(tenant_id = %identity.tenant_id, service_id = %service_id))]
    pub async fn create(&self, identity: &Identity, service_id: Uuid, fields: VersionFields) -> Result<version::Model, ServiceError> {
        Self::validate_fields(&fields)?;
        let parent = self.resolve_service(identity, service_id).await?;
        let created = self
            .versions
            .create_or_replace(parent.service.id, &identity.tenant_id, None, fields)
            .await?;
        info!(id = %created.id, "version_created");
        Ok(created)
    }

    pub async fn find_all(&self, identity: &Identity, service_id: Uuid, page: PageQuery) -> Result<Paginated<version::Model>, ServiceError> {
        let parent = self.resolve_service(identity, service_id).await?;
        self.versions
            .find(FindVersions { service_id: parent.service.id, tenant_id: identity.tenant_id.clone(), page })
            .await
    }

    pub async fn find_one(&self, identity: &Identity, service_id: Uuid, id: Uuid) -> Result<version::Model, ServiceError> {
        self.versions
            .find_one(id, service_id, &identity.tenant_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Version"))
    }

    /// Idempotent PUT semantics scoped below a verified parent.
    #[instrument(skip_all, fields(tenant_id = %identity.tenant_id, service_id = %service_id, id = %id))]
    pub async fn create_or_replace(&self, identity: &Identity, service_id: Uuid, id: Uuid, fields: VersionFields) -> Result<version::Model, ServiceError> {
        Self::validate_fields(&fields)?;
        let parent = self.resolve_service(identity, service_id).await?;
        self.versions
            .create_or_replace(parent.service.id, &identity.tenant_id, Some(id), fields)
            .await
    }

    pub async fn update(&self, identity: &Identity, service_id: Uuid, id: Uuid, patch: VersionPatch) -> Result<version::Model, ServiceError> {
        Self::validate_patch(&patch)?;
        self.versions
            .update(id, service_id, &identity.tenant_id, patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("Version"))
    }

    pub async fn delete(&self, identity: &Identity, service_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if !self.versions.delete(id, service_id, &identity.tenant_id).await? {
            return Err(ServiceError::not_found("Version"));
        }
        info!(id = %id, service_id = %service_id, tenant_id = %identity.tenant_id, "version_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::repository::mock::MockServicesRepository;
    use crate::services::repository::{ServiceFields, ServicesRepository};
    use crate::versions::repository::mock::MockVersionsRepository;

    fn identity(tenant: &str) -> Identity {
        Identity { id: "user_1".into(), tenant_id: tenant.into(), role: "admin".into() }
    }

    struct Fixture {
        services: Arc<MockServicesRepository>,
        versions: Arc<MockVersionsRepository>,
        svc: VersionsService<MockServicesRepository, MockVersionsRepository>,
    }

    fn fixture() -> Fixture {
        let services = Arc::new(MockServicesRepository::default());
        let versions = Arc::new(MockVersionsRepository::default());
        let svc = VersionsService::new(Arc::clone(&services), Arc::clone(&versions));
        Fixture { services, versions, svc }
    }

    async fn seed_service(services: &MockServicesRepository, tenant: &str, name: &str) -> Uuid {
        services
            .create_or_replace(tenant, None, ServiceFields { name: name.into(), description: None })
            .await
            .unwrap()
            .service
            .id
    }

    fn fields(name: &str) -> VersionFields {
        VersionFields { name: name.to_string(), description: None }
    }

    #[tokio::test]
    async fn create_requires_an_existing_parent() {
        let f = fixture();
        let err = f
            .svc
            .create(&identity("tenant_a"), Uuid::new_v4(), fields("v1.0.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg.contains("Service")));
        // nothing was persisted
        assert!(f.versions.is_empty());
    }

    #[tokio::test]
    async fn parent_under_another_tenant_does_not_count() {
        let f = fixture();
        let parent = seed_service(&f.services, "tenant_a", "theirs").await;

        let err = f
            .svc
            .create(&identity("tenant_b"), parent, fields("v1.0.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(f.versions.is_empty());
    }

    #[tokio::test]
    async fn create_binds_parent_and_tenant() {
        let f = fixture();
        let ident = identity("tenant_a");
        let parent = seed_service(&f.services, "tenant_a", "mine").await;

        let created = f.svc.create(&ident, parent, fields("v1.0.0")).await.unwrap();
        assert_eq!(created.service_id, parent);
        assert_eq!(created.tenant_id, "tenant_a");

        let listed = f.svc.find_all(&ident, parent, PageQuery::default()).await.unwrap();
        assert_eq!(listed.meta.total, 1);
    }

    #[tokio::test]
    async fn list_of_missing_parent_is_not_found() {
        let f = fixture();
        let err = f
            .svc
            .find_all(&identity("tenant_a"), Uuid::new_v4(), PageQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn replace_is_idempotent_below_the_parent() {
        let f = fixture();
        let ident = identity("tenant_a");
        let parent = seed_service(&f.services, "tenant_a", "mine").await;
        let id = Uuid::new_v4();

        let first = f.svc.create_or_replace(&ident, parent, id, fields("v2.0.0")).await.unwrap();
        let second = f.svc.create_or_replace(&ident, parent, id, fields("v2.0.0")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(f.versions.len(), 1);
    }

    #[tokio::test]
    async fn get_update_delete_use_the_compound_key() {
        let f = fixture();
        let ident = identity("tenant_a");
        let parent = seed_service(&f.services, "tenant_a", "mine").await;
        let decoy = seed_service(&f.services, "tenant_a", "decoy").await;

        let created = f.svc.create(&ident, parent, fields("v1.0.0")).await.unwrap();

        // addressing through the wrong parent misses
        let err = f.svc.find_one(&ident, decoy, created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let updated = f
            .svc
            .update(&ident, parent, created.id, VersionPatch { name: Some("v1.0.1".into()), description: None })
            .await
            .unwrap();
        assert_eq!(updated.name, "v1.0.1");

        f.svc.delete(&ident, parent, created.id).await.unwrap();
        let err = f.svc.delete(&ident, parent, created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
