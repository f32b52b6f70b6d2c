//! Create `sale` and `settlement` bookkeeping tables.
//!
//! Both keep nullable party references so history survives removal of a
//! distributor, QR code or manufacturer.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sale::Table)
                    .if_not_exists()
                    .col(uuid(Sale::Id).primary_key())
                    .col(uuid(Sale::OrderId).not_null())
                    .col(uuid_null(Sale::DistributorId))
                    .col(uuid_null(Sale::QrCodeId))
                    .col(big_integer(Sale::TotalAmount).not_null())
                    .col(big_integer(Sale::DistributorCommission).not_null())
                    .col(big_integer(Sale::PlatformFee).not_null())
                    .col(timestamp_with_time_zone(Sale::SaleDate).not_null())
                    .col(boolean(Sale::IsSettled).not_null())
                    .col(timestamp_with_time_zone_null(Sale::SettlementDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_order")
                            .from(Sale::Table, Sale::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_distributor")
                            .from(Sale::Table, Sale::DistributorId)
                            .to(Distributor::Table, Distributor::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_qr_code")
                            .from(Sale::Table, Sale::QrCodeId)
                            .to(QrCode::Table, QrCode::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Settlement::Table)
                    .if_not_exists()
                    .col(uuid(Settlement::Id).primary_key())
                    .col(uuid_null(Settlement::ManufacturerId))
                    .col(uuid_null(Settlement::DistributorId))
                    .col(big_integer(Settlement::Amount).not_null())
                    .col(string_len(Settlement::SettlementType, 32).not_null())
                    .col(timestamp_with_time_zone(Settlement::PeriodStart).not_null())
                    .col(timestamp_with_time_zone(Settlement::PeriodEnd).not_null())
                    .col(string_len(Settlement::Status, 32).not_null())
                    .col(timestamp_with_time_zone_null(Settlement::ProcessedDate))
                    .col(string_len_null(Settlement::Notes, 500))
                    .col(timestamp_with_time_zone(Settlement::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_settlement_manufacturer")
                            .from(Settlement::Table, Settlement::ManufacturerId)
                            .to(Manufacturer::Table, Manufacturer::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_settlement_distributor")
                            .from(Settlement::Table, Settlement::DistributorId)
                            .to(Distributor::Table, Distributor::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Settlement::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Sale::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Sale {
    Table,
    Id,
    OrderId,
    DistributorId,
    QrCodeId,
    TotalAmount,
    DistributorCommission,
    PlatformFee,
    SaleDate,
    IsSettled,
    SettlementDate,
}

#[derive(DeriveIden)]
enum Settlement {
    Table,
    Id,
    ManufacturerId,
    DistributorId,
    Amount,
    SettlementType,
    PeriodStart,
    PeriodEnd,
    Status,
    ProcessedDate,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Orders { Table, Id }

#[derive(DeriveIden)]
enum Distributor { Table, Id }

#[derive(DeriveIden)]
enum QrCode { Table, Id }

#[derive(DeriveIden)]
enum Manufacturer { Table, Id }
