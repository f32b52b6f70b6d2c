//! Create `manufacturer` table (vendor profile owned by a Manufacturer user).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Manufacturer::Table)
                    .if_not_exists()
                    .col(uuid(Manufacturer::Id).primary_key())
                    .col(uuid(Manufacturer::UserId).unique_key().not_null())
                    .col(string_len(Manufacturer::CompanyName, 200).not_null())
                    .col(string_len_null(Manufacturer::Address, 500))
                    .col(string_len_null(Manufacturer::Phone, 20))
                    .col(string_len_null(Manufacturer::CompanyDescription, 1000))
                    .col(string_len_null(Manufacturer::Industry, 100))
                    .col(string_len_null(Manufacturer::Website, 200))
                    .col(integer_null(Manufacturer::EstablishedYear))
                    .col(boolean(Manufacturer::IsActive).not_null())
                    .col(timestamp_with_time_zone(Manufacturer::CreatedAt).not_null())
                    .col(timestamp_with_time_zone_null(Manufacturer::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_manufacturer_user")
                            .from(Manufacturer::Table, Manufacturer::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Manufacturer::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Manufacturer {
    Table,
    Id,
    UserId,
    CompanyName,
    Address,
    Phone,
    CompanyDescription,
    Industry,
    Website,
    EstablishedYear,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
