//! Create `orders` and `order_item` tables.
//!
//! Orders survive distributor removal (`distributor_id` set null); items go
//! with their order but block product deletion.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(uuid(Orders::Id).primary_key())
                    .col(uuid(Orders::UserId).not_null())
                    .col(uuid_null(Orders::DistributorId))
                    .col(string_len(Orders::OrderNumber, 50).unique_key().not_null())
                    .col(big_integer(Orders::TotalAmount).not_null())
                    .col(big_integer(Orders::ShippingFee).not_null())
                    .col(big_integer(Orders::PaymentFee).not_null())
                    .col(string_len(Orders::Status, 32).not_null())
                    .col(string_len_null(Orders::PaymentIntentId, 100))
                    .col(string_len_null(Orders::ShippingAddress, 500))
                    .col(string_len_null(Orders::ShippingName, 100))
                    .col(string_len_null(Orders::ShippingPhone, 20))
                    .col(string_len_null(Orders::TrackingNumber, 100))
                    .col(timestamp_with_time_zone(Orders::CreatedAt).not_null())
                    .col(timestamp_with_time_zone_null(Orders::ShippedAt))
                    .col(timestamp_with_time_zone_null(Orders::DeliveredAt))
                    .col(timestamp_with_time_zone_null(Orders::CancelledAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_user")
                            .from(Orders::Table, Orders::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_distributor")
                            .from(Orders::Table, Orders::DistributorId)
                            .to(Distributor::Table, Distributor::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItem::Table)
                    .if_not_exists()
                    .col(uuid(OrderItem::Id).primary_key())
                    .col(uuid(OrderItem::OrderId).not_null())
                    .col(uuid(OrderItem::ProductId).not_null())
                    .col(integer(OrderItem::Quantity).not_null())
                    .col(big_integer(OrderItem::UnitPrice).not_null())
                    .col(big_integer(OrderItem::TotalPrice).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_item_order")
                            .from(OrderItem::Table, OrderItem::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_item_product")
                            .from(OrderItem::Table, OrderItem::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OrderItem::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Orders::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    UserId,
    DistributorId,
    OrderNumber,
    TotalAmount,
    ShippingFee,
    PaymentFee,
    Status,
    PaymentIntentId,
    ShippingAddress,
    ShippingName,
    ShippingPhone,
    TrackingNumber,
    CreatedAt,
    ShippedAt,
    DeliveredAt,
    CancelledAt,
}

#[derive(DeriveIden)]
enum OrderItem { Table, Id, OrderId, ProductId, Quantity, UnitPrice, TotalPrice }

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Distributor { Table, Id }

#[derive(DeriveIden)]
enum Product { Table, Id }
