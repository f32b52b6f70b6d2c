//! Create `company` table.
//!
//! A company groups distributor locations; chains share one company and the
//! 8-digit head office code lets stores join it.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Company::Table)
                    .if_not_exists()
                    .col(uuid(Company::Id).primary_key())
                    .col(string_len(Company::Name, 200).not_null())
                    .col(string_len_null(Company::HeadquartersAddress, 500))
                    .col(string_len_null(Company::Phone, 20))
                    .col(string_len_null(Company::Email, 100))
                    .col(string_len(Company::CompanyType, 32).not_null())
                    .col(string_len(Company::HeadOfficeCode, 8).unique_key().not_null())
                    .col(uuid(Company::OwnerUserId).not_null())
                    .col(boolean(Company::IsActive).not_null())
                    .col(timestamp_with_time_zone(Company::CreatedAt).not_null())
                    .col(timestamp_with_time_zone_null(Company::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_owner")
                            .from(Company::Table, Company::OwnerUserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Company::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Company {
    Table,
    Id,
    Name,
    HeadquartersAddress,
    Phone,
    Email,
    CompanyType,
    HeadOfficeCode,
    OwnerUserId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
