//! Create `distributor_product`: products a location has selected for its shelf.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DistributorProduct::Table)
                    .if_not_exists()
                    .col(uuid(DistributorProduct::Id).primary_key())
                    .col(uuid(DistributorProduct::DistributorId).not_null())
                    .col(uuid(DistributorProduct::ProductId).not_null())
                    .col(boolean(DistributorProduct::IsActive).not_null())
                    .col(timestamp_with_time_zone(DistributorProduct::AssignedAt).not_null())
                    .col(timestamp_with_time_zone_null(DistributorProduct::RemovedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_distributor_product_distributor")
                            .from(DistributorProduct::Table, DistributorProduct::DistributorId)
                            .to(Distributor::Table, Distributor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_distributor_product_product")
                            .from(DistributorProduct::Table, DistributorProduct::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DistributorProduct::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DistributorProduct { Table, Id, DistributorId, ProductId, IsActive, AssignedAt, RemovedAt }

#[derive(DeriveIden)]
enum Distributor { Table, Id }

#[derive(DeriveIden)]
enum Product { Table, Id }
