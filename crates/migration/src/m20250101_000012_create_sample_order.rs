//! Create `sample_order`: product samples a distributor orders for its shelf.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SampleOrder::Table)
                    .if_not_exists()
                    .col(uuid(SampleOrder::Id).primary_key())
                    .col(uuid(SampleOrder::DistributorId).not_null())
                    .col(uuid(SampleOrder::ProductId).not_null())
                    .col(integer(SampleOrder::Quantity).not_null())
                    .col(big_integer(SampleOrder::Cost).not_null())
                    .col(big_integer(SampleOrder::ShippingFee).not_null())
                    .col(big_integer(SampleOrder::ServiceFee).not_null())
                    .col(big_integer(SampleOrder::TotalAmount).not_null())
                    .col(string_len(SampleOrder::OrderType, 32).not_null())
                    .col(string_len(SampleOrder::Status, 32).not_null())
                    .col(string_len_null(SampleOrder::Notes, 500))
                    .col(timestamp_with_time_zone(SampleOrder::CreatedAt).not_null())
                    .col(timestamp_with_time_zone_null(SampleOrder::ShippedAt))
                    .col(timestamp_with_time_zone_null(SampleOrder::DeliveredAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sample_order_distributor")
                            .from(SampleOrder::Table, SampleOrder::DistributorId)
                            .to(Distributor::Table, Distributor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sample_order_product")
                            .from(SampleOrder::Table, SampleOrder::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SampleOrder::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SampleOrder {
    Table,
    Id,
    DistributorId,
    ProductId,
    Quantity,
    Cost,
    ShippingFee,
    ServiceFee,
    TotalAmount,
    OrderType,
    Status,
    Notes,
    CreatedAt,
    ShippedAt,
    DeliveredAt,
}

#[derive(DeriveIden)]
enum Distributor { Table, Id }

#[derive(DeriveIden)]
enum Product { Table, Id }
