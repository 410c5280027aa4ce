//! Create `versions` table.
//!
//! Child of `services`; the FK cascades so deleting a service removes its
//! versions at the storage layer.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Versions::Table)
                    .if_not_exists()
                    .col(uuid(Versions::Id).primary_key())
                    .col(string_len(Versions::TenantId, 64).not_null())
                    .col(string_len(Versions::Name, 256).not_null())
                    .col(string_len_null(Versions::Description, 1024))
                    .col(uuid(Versions::ServiceId).not_null())
                    .col(timestamp_with_time_zone(Versions::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Versions::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_version_service")
                            .from(Versions::Table, Versions::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Versions::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub enum Versions {
    Table,
    Id,
    TenantId,
    Name,
    Description,
    ServiceId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Services { Table, Id }
