//! Create `distributor` table: one row per shelf location with its contract state.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Distributor::Table)
                    .if_not_exists()
                    .col(uuid(Distributor::Id).primary_key())
                    .col(uuid(Distributor::UserId).not_null())
                    .col(string_len(Distributor::CompanyName, 200).not_null())
                    .col(string_len_null(Distributor::Address, 500))
                    .col(string_len_null(Distributor::Phone, 20))
                    .col(string_len_null(Distributor::LocationName, 100))
                    .col(boolean(Distributor::IsHeadquarters).not_null())
                    .col(uuid_null(Distributor::CompanyId))
                    .col(string_len(Distributor::DistributorType, 32).not_null())
                    .col(uuid_null(Distributor::ParentDistributorId))
                    .col(integer(Distributor::ShelfCount).not_null())
                    .col(integer(Distributor::ProductSelectionCount).not_null())
                    .col(big_integer(Distributor::MonthlyFee).not_null())
                    .col(timestamp_with_time_zone_null(Distributor::ContractStartDate))
                    .col(timestamp_with_time_zone_null(Distributor::ContractEndDate))
                    .col(timestamp_with_time_zone_null(Distributor::CancellationRequestDate))
                    .col(timestamp_with_time_zone_null(Distributor::ShelfReturnDueDate))
                    .col(timestamp_with_time_zone_null(Distributor::ShelfReturnedDate))
                    .col(string_len(Distributor::ShelfReturnStatus, 32).not_null())
                    .col(string_len(Distributor::ContractStatus, 32).not_null())
                    .col(boolean(Distributor::IsActive).not_null())
                    .col(timestamp_with_time_zone(Distributor::CreatedAt).not_null())
                    .col(timestamp_with_time_zone_null(Distributor::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_distributor_user")
                            .from(Distributor::Table, Distributor::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_distributor_company")
                            .from(Distributor::Table, Distributor::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_distributor_parent")
                            .from(Distributor::Table, Distributor::ParentDistributorId)
                            .to(Distributor::Table, Distributor::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Distributor::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Distributor {
    Table,
    Id,
    UserId,
    CompanyName,
    Address,
    Phone,
    LocationName,
    IsHeadquarters,
    CompanyId,
    DistributorType,
    ParentDistributorId,
    ShelfCount,
    ProductSelectionCount,
    MonthlyFee,
    ContractStartDate,
    ContractEndDate,
    CancellationRequestDate,
    ShelfReturnDueDate,
    ShelfReturnedDate,
    ShelfReturnStatus,
    ContractStatus,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Company { Table, Id }
