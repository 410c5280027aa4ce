//! Secondary indexes for list/search/sort access paths.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_services_tenant")
                    .table(Services::Table)
                    .col(Services::TenantId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_services_name")
                    .table(Services::Table)
                    .col(Services::Name)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_services_created_at")
                    .table(Services::Table)
                    .col(Services::CreatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_services_updated_at")
                    .table(Services::Table)
                    .col(Services::UpdatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_versions_tenant")
                    .table(Versions::Table)
                    .col(Versions::TenantId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_versions_tenant_service")
                    .table(Versions::Table)
                    .col(Versions::TenantId)
                    .col(Versions::ServiceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_versions_tenant_service").table(Versions::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_versions_tenant").table(Versions::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_services_updated_at").table(Services::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_services_created_at").table(Services::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_services_name").table(Services::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_services_tenant").table(Services::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Services { Table, TenantId, Name, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Versions { Table, TenantId, ServiceId }
