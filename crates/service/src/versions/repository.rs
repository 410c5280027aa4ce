use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use models::version;

use crate::errors::ServiceError;
use crate::pagination::{PageQuery, Paginated};

/// Query for one page of a service's versions.
#[derive(Debug, Clone)]
pub struct FindVersions {
    pub service_id: Uuid,
    pub tenant_id: String,
    pub page: PageQuery,
}

/// Full payload for create and replace writes.
#[derive(Debug, Clone)]
pub struct VersionFields {
    pub name: String,
    pub description: Option<String>,
}

/// Partial payload for updates; absent fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct VersionPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Rows are addressed by the compound key `(id, service_id, tenant_id)`; a
/// version id alone never selects a row.
#[async_trait]
pub trait VersionsRepository: Send + Sync {
    async fn find(&self, query: FindVersions) -> Result<Paginated<version::Model>, ServiceError>;
    async fn find_one(&self, id: Uuid, service_id: Uuid, tenant_id: &str) -> Result<Option<version::Model>, ServiceError>;
    async fn create_or_replace(&self, service_id: Uuid, tenant_id: &str, id: Option<Uuid>, fields: VersionFields) -> Result<version::Model, ServiceError>;
    async fn update(&self, id: Uuid, service_id: Uuid, tenant_id: &str, patch: VersionPatch) -> Result<Option<version::Model>, ServiceError>;
    async fn delete(&self, id: Uuid, service_id: Uuid, tenant_id: &str) -> Result<bool, ServiceError>;
}

/// SeaORM-backed repository implementation. Callers must have verified that
/// the parent service exists under the same tenant; the foreign key is the
/// only backstop here.
pub struct SeaOrmVersionsRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmVersionsRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait]
impl VersionsRepository for SeaOrmVersionsRepository {
    async fn find(&self, query: FindVersions) -> Result<Paginated<version::Model>, ServiceError> {
        let select = version::Entity::find()
            .filter(version::Column::ServiceId.eq(query.service_id))
            .filter(version::Column::TenantId.eq(query.tenant_id.as_str()));

        let count_select = select.clone();
        let page_select = select
            .order_by_desc(version::Column::UpdatedAt)
            .offset(query.page.offset)
            .limit(query.page.limit);
        let db = &self.db;
        let (rows, total) = tokio::try_join!(
            async move { page_select.all(db).await.map_err(ServiceError::db) },
            async move { count_select.count(db).await.map_err(ServiceError::db) },
        )?;
        Ok(Paginated::new(rows, total))
    }

    async fn find_one(&self, id: Uuid, service_id: Uuid, tenant_id: &str) -> Result<Option<version::Model>, ServiceError> {
        version::Entity::find_by_id(id)
            .filter(version::Column::ServiceId.eq(service_id))
            .filter(version::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(ServiceError::db)
    }

    async fn create_or_replace(&self, service_id: Uuid, tenant_id: &str, id: Option<Uuid>, fields: VersionFields) -> Result<version::Model, ServiceError> {
        let now = Utc::now().into();
        if let Some(id) = id {
            let existing = self.find_one(id, service_id, tenant_id).await?;
            if let Some(current) = existing {
                let mut am: version::ActiveModel = current.into();
                am.name = Set(fields.name);
                if let Some(description) = fields.description {
                    am.description = Set(Some(description));
                }
                am.updated_at = Set(now);
                return am.update(&self.db).await.map_err(ServiceError::db);
            }
        }
        let am = version::ActiveModel {
            id: Set(id.unwrap_or_else(Uuid::new_v4)),
            tenant_id: Set(tenant_id.to_string()),
            name: Set(fields.name),
            description: Set(fields.description),
            service_id: Set(service_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        am.insert(&self.db).await.map_err(ServiceError::db)
    }

    async fn update(&self, id: Uuid, service_id: Uuid, tenant_id: &str, patch: VersionPatch) -> Result<Option<version::Model>, ServiceError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let mut update = version::Entity::update_many()
            .filter(version::Column::Id.eq(id))
            .filter(version::Column::ServiceId.eq(service_id))
            .filter(version::Column::TenantId.eq(tenant_id))
            .col_expr(version::Column::UpdatedAt, Expr::value(now));
        if let Some(name) = patch.name {
            update = update.col_expr(version::Column::Name, Expr::value(name));
        }
        if let Some(description) = patch.description {
            update = update.col_expr(version::Column::Description, Expr::value(description));
        }
        let result = update.exec(&self.db).await.map_err(ServiceError::db)?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_one(id, service_id, tenant_id).await
    }

    async fn delete(&self, id: Uuid, service_id: Uuid, tenant_id: &str) -> Result<bool, ServiceError> {
        let result = version::Entity::delete_many()
            .filter(version::Column::Id.eq(id))
            .filter(version::Column::ServiceId.eq(service_id))
            .filter(version::Column::TenantId.eq(tenant_id))
            .exec(&self.db)
            .await
            .map_err(ServiceError::db)?;
        Ok(result.rows_affected > 0)
    }
}

/// Simple in-memory mock repository for tests and doc examples.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockVersionsRepository {
        rows: Mutex<HashMap<Uuid, version::Model>>,
    }

    impl MockVersionsRepository {
        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn addressed(row: &version::Model, id: Uuid, service_id: Uuid, tenant_id: &str) -> bool {
            row.id == id && row.service_id == service_id && row.tenant_id == tenant_id
        }
    }

    #[async_trait]
    impl VersionsRepository for MockVersionsRepository {
        async fn find(&self, query: FindVersions) -> Result<Paginated<version::Model>, ServiceError> {
            let mut matched: Vec<version::Model> = {
                let rows = self.rows.lock().unwrap();
                rows.values()
                    .filter(|row| row.service_id == query.service_id && row.tenant_id == query.tenant_id)
                    .cloned()
                    .collect()
            };
            matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            let total = matched.len() as u64;
            let data = matched
                .into_iter()
                .skip(query.page.offset as usize)
                .take(query.page.limit as usize)
                .collect();
            Ok(Paginated::new(data, total))
        }

        async fn find_one(&self, id: Uuid, service_id: Uuid, tenant_id: &str) -> Result<Option<version::Model>, ServiceError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .values()
                .find(|row| Self::addressed(row, id, service_id, tenant_id))
                .cloned())
        }

        async fn create_or_replace(&self, service_id: Uuid, tenant_id: &str, id: Option<Uuid>, fields: VersionFields) -> Result<version::Model, ServiceError> {
            let now = Utc::now().into();
            let mut rows = self.rows.lock().unwrap();
            if let Some(id) = id {
                if let Some(current) = rows
                    .get_mut(&id)
                    .filter(|row| row.service_id == service_id && row.tenant_id == tenant_id)
                {
                    current.name = fields.name;
                    if let Some(description) = fields.description {
                        current.description = Some(description);
                    }
                    current.updated_at = now;
                    return Ok(current.clone());
                }
            }
            let row = version::Model {
                id: id.unwrap_or_else(Uuid::new_v4),
                tenant_id: tenant_id.to_string(),
                name: fields.name,
                description: fields.description,
                service_id,
                created_at: now,
                updated_at: now,
            };
            rows.insert(row.id, row.clone());
            Ok(row)
        }

        async fn update(&self, id: Uuid, service_id: Uuid, tenant_id: &str, patch: VersionPatch) -> Result<Option<version::Model>, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            Ok(match rows
                .get_mut(&id)
                .filter(|row| row.service_id == service_id && row.tenant_id == tenant_id)
            {
                Some(current) => {
                    if let Some(name) = patch.name {
                        current.name = name;
                    }
                    if let Some(description) = patch.description {
                        current.description = Some(description);
                    }
                    current.updated_at = Utc::now().into();
                    Some(current.clone())
                }
                None => None,
            })
        }

        async fn delete(&self, id: Uuid, service_id: Uuid, tenant_id: &str) -> Result<bool, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let owned = rows
                .get(&id)
                .map(|row| row.service_id == service_id && row.tenant_id == tenant_id)
                .unwrap_or(false);
            if owned {
                rows.remove(&id);
            }
            Ok(owned)
        }
    }
}
