use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use models::{service, version};

use crate::errors::ServiceError;
use crate::pagination::{PageQuery, Paginated};
use crate::sorting::SortSpec;

/// Query for one page of a tenant's services.
#[derive(Debug, Clone)]
pub struct FindServices {
    pub tenant_id: String,
    pub search: Option<String>,
    pub sort: SortSpec,
    pub page: PageQuery,
}

/// A service row annotated with the live count of its versions.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecord {
    pub service: service::Model,
    pub versions_count: u64,
}

/// Full payload for create and replace writes.
#[derive(Debug, Clone)]
pub struct ServiceFields {
    pub name: String,
    pub description: Option<String>,
}

/// Partial payload for updates; absent fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[async_trait]
pub trait ServicesRepository: Send + Sync {
    async fn find(&self, query: FindServices) -> Result<Paginated<ServiceRecord>, ServiceError>;
    async fn find_one(&self, id: Uuid, tenant_id: &str) -> Result<Option<ServiceRecord>, ServiceError>;
    async fn create_or_replace(&self, tenant_id: &str, id: Option<Uuid>, fields: ServiceFields) -> Result<ServiceRecord, ServiceError>;
    async fn update(&self, id: Uuid, tenant_id: &str, patch: ServicePatch) -> Result<Option<ServiceRecord>, ServiceError>;
    async fn delete(&self, id: Uuid, tenant_id: &str) -> Result<bool, ServiceError>;
}

/// SeaORM-backed repository implementation.
pub struct SeaOrmServicesRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmServicesRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    /// One grouped COUNT over the child table for a set of parent ids.
    async fn versions_counts(&self, ids: &[Uuid], tenant_id: &str) -> Result<HashMap<Uuid, u64>, ServiceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = version::Entity::find()
            .select_only()
            .column(version::Column::ServiceId)
            .column_as(version::Column::Id.count(), "count")
            .filter(version::Column::TenantId.eq(tenant_id))
            .filter(version::Column::ServiceId.is_in(ids.iter().copied()))
            .group_by(version::Column::ServiceId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(ServiceError::db)?;
        Ok(rows.into_iter().map(|(id, count)| (id, count as u64)).collect())
    }

    async fn versions_count(&self, id: Uuid, tenant_id: &str) -> Result<u64, ServiceError> {
        version::Entity::find()
            .filter(version::Column::ServiceId.eq(id))
            .filter(version::Column::TenantId.eq(tenant_id))
            .count(&self.db)
            .await
            .map_err(ServiceError::db)
    }
}

#[async_trait]
impl ServicesRepository for SeaOrmServicesRepository {
    async fn find(&self, query: FindServices) -> Result<Paginated<ServiceRecord>, ServiceError> {
        let mut select =
            service::Entity::find().filter(service::Column::TenantId.eq(query.tenant_id.as_str()));

        if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
            let pattern = format!("%{}%", term);
            select = select.filter(
                Condition::any()
                    .add(Expr::col(service::Column::Name).ilike(pattern.clone()))
                    .add(Expr::col(service::Column::Description).ilike(pattern)),
            );
        }

        if query.sort.is_empty() {
            select = select.order_by_desc(service::Column::UpdatedAt);
        } else {
            for (key, order) in &query.sort {
                let column = service::sort_column(key)
                    .ok_or_else(|| ServiceError::InvalidSort(key.clone()))?;
                select = select.order_by_with_nulls(column, order.clone(), NullOrdering::Last);
            }
        }

        // Page and total are independent reads; under concurrent writes they
        // may observe slightly different snapshots.
        let count_select = select.clone();
        let page_select = select.offset(query.page.offset).limit(query.page.limit);
        let db = &self.db;
        let (rows, total) = tokio::try_join!(
            async move { page_select.all(db).await.map_err(ServiceError::db) },
            async move { count_select.count(db).await.map_err(ServiceError::db) },
        )?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let counts = self.versions_counts(&ids, &query.tenant_id).await?;
        let data = rows
            .into_iter()
            .map(|row| {
                let versions_count = counts.get(&row.id).copied().unwrap_or(0);
                ServiceRecord { service: row, versions_count }
            })
            .collect();
        Ok(Paginated::new(data, total))
    }

    async fn find_one(&self, id: Uuid, tenant_id: &str) -> Result<Option<ServiceRecord>, ServiceError> {
        let found = service::Entity::find_by_id(id)
            .filter(service::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(ServiceError::db)?;
        let Some(row) = found else { return Ok(None) };
        let versions_count = self.versions_count(row.id, tenant_id).await?;
        Ok(Some(ServiceRecord { service: row, versions_count }))
    }

    async fn create_or_replace(&self, tenant_id: &str, id: Option<Uuid>, fields: ServiceFields) -> Result<ServiceRecord, ServiceError> {
        let now = Utc::now().into();
        if let Some(id) = id {
            let existing = service::Entity::find_by_id(id)
                .filter(service::Column::TenantId.eq(tenant_id))
                .one(&self.db)
                .await
                .map_err(ServiceError::db)?;
            if let Some(current) = existing {
                let mut am: service::ActiveModel = current.into();
                am.name = Set(fields.name);
                if let Some(description) = fields.description {
                    am.description = Set(Some(description));
                }
                am.updated_at = Set(now);
                let updated = am.update(&self.db).await.map_err(ServiceError::db)?;
                let versions_count = self.versions_count(updated.id, tenant_id).await?;
                return Ok(ServiceRecord { service: updated, versions_count });
            }
        }
        let am = service::ActiveModel {
            id: Set(id.unwrap_or_else(Uuid::new_v4)),
            tenant_id: Set(tenant_id.to_string()),
            name: Set(fields.name),
            description: Set(fields.description),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = am.insert(&self.db).await.map_err(ServiceError::db)?;
        Ok(ServiceRecord { service: inserted, versions_count: 0 })
    }

    async fn update(&self, id: Uuid, tenant_id: &str, patch: ServicePatch) -> Result<Option<ServiceRecord>, ServiceError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let mut update = service::Entity::update_many()
            .filter(service::Column::Id.eq(id))
            .filter(service::Column::TenantId.eq(tenant_id))
            .col_expr(service::Column::UpdatedAt, Expr::value(now));
        if let Some(name) = patch.name {
            update = update.col_expr(service::Column::Name, Expr::value(name));
        }
        if let Some(description) = patch.description {
            update = update.col_expr(service::Column::Description, Expr::value(description));
        }
        let result = update.exec(&self.db).await.map_err(ServiceError::db)?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_one(id, tenant_id).await
    }

    async fn delete(&self, id: Uuid, tenant_id: &str) -> Result<bool, ServiceError> {
        let result = service::Entity::delete_many()
            .filter(service::Column::Id.eq(id))
            .filter(service::Column::TenantId.eq(tenant_id))
            .exec(&self.db)
            .await
            .map_err(ServiceError::db)?;
        Ok(result.rows_affected > 0)
    }
}

/// Simple in-memory mock repository for tests and doc examples.
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockServicesRepository {
        rows: Mutex<HashMap<Uuid, service::Model>>,
        counts: Mutex<HashMap<Uuid, u64>>,
    }

    impl MockServicesRepository {
        pub fn set_versions_count(&self, id: Uuid, count: u64) {
            self.counts.lock().unwrap().insert(id, count);
        }

        fn record(&self, row: service::Model) -> ServiceRecord {
            let versions_count = self.counts.lock().unwrap().get(&row.id).copied().unwrap_or(0);
            ServiceRecord { service: row, versions_count }
        }

        fn matches_search(row: &service::Model, term: &str) -> bool {
            let term = term.to_lowercase();
            row.name.to_lowercase().contains(&term)
                || row
                    .description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&term))
                    .unwrap_or(false)
        }
    }

    #[async_trait]
    impl ServicesRepository for MockServicesRepository {
        async fn find(&self, query: FindServices) -> Result<Paginated<ServiceRecord>, ServiceError> {
            let mut matched: Vec<service::Model> = {
                let rows = self.rows.lock().unwrap();
                rows.values()
                    .filter(|row| row.tenant_id == query.tenant_id)
                    .filter(|row| match query.search.as_deref() {
                        Some(term) if !term.trim().is_empty() => Self::matches_search(row, term),
                        _ => true,
                    })
                    .cloned()
                    .collect()
            };
            matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            let total = matched.len() as u64;
            let data = matched
                .into_iter()
                .skip(query.page.offset as usize)
                .take(query.page.limit as usize)
                .map(|row| self.record(row))
                .collect();
            Ok(Paginated::new(data, total))
        }

        async fn find_one(&self, id: Uuid, tenant_id: &str) -> Result<Option<ServiceRecord>, ServiceError> {
            let row = {
                let rows = self.rows.lock().unwrap();
                rows.get(&id).filter(|row| row.tenant_id == tenant_id).cloned()
            };
            Ok(row.map(|row| self.record(row)))
        }

        async fn create_or_replace(&self, tenant_id: &str, id: Option<Uuid>, fields: ServiceFields) -> Result<ServiceRecord, ServiceError> {
            let now = Utc::now().into();
            let mut rows = self.rows.lock().unwrap();
            if let Some(id) = id {
                if let Some(current) = rows.get_mut(&id).filter(|row| row.tenant_id == tenant_id) {
                    current.name = fields.name;
                    if let Some(description) = fields.description {
                        current.description = Some(description);
                    }
                    current.updated_at = now;
                    let row = current.clone();
                    drop(rows);
                    return Ok(self.record(row));
                }
            }
            let row = service::Model {
                id: id.unwrap_or_else(Uuid::new_v4),
                tenant_id: tenant_id.to_string(),
                name: fields.name,
                description: fields.description,
                created_at: now,
                updated_at: now,
            };
            rows.insert(row.id, row.clone());
            drop(rows);
            Ok(self.record(row))
        }

        async fn update(&self, id: Uuid, tenant_id: &str, patch: ServicePatch) -> Result<Option<ServiceRecord>, ServiceError> {
            let row = {
                let mut rows = self.rows.lock().unwrap();
                match rows.get_mut(&id).filter(|row| row.tenant_id == tenant_id) {
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
                }
            };
            Ok(row.map(|row| self.record(row)))
        }

        async fn delete(&self, id: Uuid, tenant_id: &str) -> Result<bool, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let owned = rows.get(&id).map(|row| row.tenant_id == tenant_id).unwrap_or(false);
            if owned {
                rows.remove(&id);
            }
            Ok(owned)
        }
    }
}
