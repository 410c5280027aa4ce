//! Create `services` table.
//!
//! Parent resource of the catalog; every row is owned by exactly one tenant.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(uuid(Services::Id).primary_key())
                    .col(string_len(Services::TenantId, 64).not_null())
                    .col(string_len(Services::Name, 256).not_null())
                    .col(string_len_null(Services::Description, 1024))
                    .col(timestamp_with_time_zone(Services::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Services::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Services::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub enum Services {
    Table,
    Id,
    TenantId,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}
