use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors;

/// Sort keys accepted by the service list operation, in documented order.
pub const SORT_KEYS: &[&str] = &["updatedAt", "createdAt", "name"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Versions }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Versions => Entity::has_many(super::version::Entity).into(),
        }
    }
}

impl Related<super::version::Entity> for Entity {
    fn to() -> RelationDef { Relation::Versions.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Map a public sort key onto its column.
pub fn sort_column(key: &str) -> Option<Column> {
    match key {
        "name" => Some(Column::Name),
        "createdAt" => Some(Column::CreatedAt),
        "updatedAt" => Some(Column::UpdatedAt),
        _ => None,
    }
}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::Validation("name required".into()));
    }
    if name.chars().count() > 256 {
        return Err(errors::ModelError::Validation("name longer than 256 characters".into()));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), errors::ModelError> {
    if description.is_empty() {
        return Err(errors::ModelError::Validation("description must not be empty".into()));
    }
    if description.chars().count() > 1024 {
        return Err(errors::ModelError::Validation("description longer than 1024 characters".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_limits() {
        assert!(validate_name("payments").is_ok());
        assert!(validate_name("  ").is_err());
        assert!(validate_name(&"x".repeat(257)).is_err());
    }

    #[test]
    fn sort_column_known_keys_only() {
        assert!(sort_column("updatedAt").is_some());
        assert!(sort_column("createdAt").is_some());
        assert!(sort_column("name").is_some());
        assert!(sort_column("tenantId").is_none());
    }
}
