//! Create `product` table; products are removed with their manufacturer.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(uuid(Product::Id).primary_key())
                    .col(uuid(Product::ManufacturerId).not_null())
                    .col(string_len(Product::Name, 200).not_null())
                    .col(string_len_null(Product::Description, 1000))
                    .col(big_integer(Product::WholesalePrice).not_null())
                    .col(big_integer(Product::RetailPrice).not_null())
                    .col(big_integer_null(Product::FreeShippingThreshold))
                    .col(string_len_null(Product::Category, 100))
                    .col(string_len_null(Product::ImageUrl, 500))
                    .col(boolean(Product::RequiresRefrigeration).not_null())
                    .col(boolean(Product::RequiresFreezing).not_null())
                    .col(big_integer(Product::ShippingFee).not_null())
                    .col(integer(Product::StockQuantity).not_null())
                    .col(integer(Product::MinimumOrderQuantity).not_null())
                    .col(boolean(Product::IsActive).not_null())
                    .col(timestamp_with_time_zone(Product::CreatedAt).not_null())
                    .col(timestamp_with_time_zone_null(Product::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_manufacturer")
                            .from(Product::Table, Product::ManufacturerId)
                            .to(Manufacturer::Table, Manufacturer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Product::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
    ManufacturerId,
    Name,
    Description,
    WholesalePrice,
    RetailPrice,
    FreeShippingThreshold,
    Category,
    ImageUrl,
    RequiresRefrigeration,
    RequiresFreezing,
    ShippingFee,
    StockQuantity,
    MinimumOrderQuantity,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Manufacturer { Table, Id }
