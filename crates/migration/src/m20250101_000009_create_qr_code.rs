//! Create `qr_code` and `qr_code_product`.
//!
//! Deleting a QR code hard-deletes its product assignments.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QrCode::Table)
                    .if_not_exists()
                    .col(uuid(QrCode::Id).primary_key())
                    .col(uuid(QrCode::DistributorId).not_null())
                    .col(string_len(QrCode::Code, 50).unique_key().not_null())
                    .col(string_len_null(QrCode::Location, 200))
                    .col(string_len_null(QrCode::ImageUrl, 500))
                    .col(boolean(QrCode::IsActive).not_null())
                    .col(timestamp_with_time_zone(QrCode::CreatedAt).not_null())
                    .col(timestamp_with_time_zone_null(QrCode::DeactivatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_qr_code_distributor")
                            .from(QrCode::Table, QrCode::DistributorId)
                            .to(Distributor::Table, Distributor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QrCodeProduct::Table)
                    .if_not_exists()
                    .col(uuid(QrCodeProduct::Id).primary_key())
                    .col(uuid(QrCodeProduct::QrCodeId).not_null())
                    .col(uuid(QrCodeProduct::ProductId).not_null())
                    .col(boolean(QrCodeProduct::IsActive).not_null())
                    .col(integer(QrCodeProduct::DisplayOrder).not_null())
                    .col(timestamp_with_time_zone(QrCodeProduct::AssignedAt).not_null())
                    .col(timestamp_with_time_zone_null(QrCodeProduct::RemovedAt))
                    .col(string_len_null(QrCodeProduct::Notes, 500))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_qr_code_product_qr_code")
                            .from(QrCodeProduct::Table, QrCodeProduct::QrCodeId)
                            .to(QrCode::Table, QrCode::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_qr_code_product_product")
                            .from(QrCodeProduct::Table, QrCodeProduct::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(QrCodeProduct::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(QrCode::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum QrCode { Table, Id, DistributorId, Code, Location, ImageUrl, IsActive, CreatedAt, DeactivatedAt }

#[derive(DeriveIden)]
enum QrCodeProduct { Table, Id, QrCodeId, ProductId, IsActive, DisplayOrder, AssignedAt, RemovedAt, Notes }

#[derive(DeriveIden)]
enum Distributor { Table, Id }

#[derive(DeriveIden)]
enum Product { Table, Id }
