//! Create `system_setting` key/value store and seed the default tunables.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (category, key, value, description)
const DEFAULTS: &[(&str, &str, &str, &str)] = &[
    ("SHELF", "DEFAULT_SHELF_COUNT", "1", "Shelves provided to a new location"),
    ("SHELF", "DEFAULT_PRODUCT_SELECTION_COUNT", "10", "Products a location may select"),
    ("PRICING", "MONTHLY_FEE_INDIVIDUAL", "5000", "Monthly fee for individual distributors (JPY)"),
    ("PRICING", "MONTHLY_FEE_CHAIN_STORE", "4000", "Monthly fee for chain stores (JPY)"),
    ("PRICING", "MONTHLY_FEE_HEAD_OFFICE", "6000", "Monthly fee for chain head offices (JPY)"),
    ("PRICING", "DISTRIBUTOR_COMMISSION_RATE", "10", "Distributor commission on sales (%)"),
    ("PRICING", "PLATFORM_FEE_RATE", "5", "Platform fee on sales (%)"),
    ("CONTRACT", "DEFAULT_CONTRACT_DURATION_MONTHS", "12", "Minimum contract term in months"),
    ("SYSTEM", "SYSTEM_NAME", "ShelfUp", "Display name"),
    ("SYSTEM", "SYSTEM_VERSION", "1.0.0", "Schema/data version"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemSetting::Table)
                    .if_not_exists()
                    .col(string_len(SystemSetting::Category, 50).not_null())
                    .col(string_len(SystemSetting::Key, 100).not_null())
                    .col(string_len(SystemSetting::Value, 500).not_null())
                    .col(string_len_null(SystemSetting::Description, 500))
                    .col(timestamp_with_time_zone_null(SystemSetting::UpdatedAt))
                    .primary_key(
                        Index::create()
                            .name("pk_system_setting")
                            .col(SystemSetting::Category)
                            .col(SystemSetting::Key),
                    )
                    .to_owned(),
            )
            .await?;

        let mut insert = Query::insert();
        insert.into_table(SystemSetting::Table).columns([
            SystemSetting::Category,
            SystemSetting::Key,
            SystemSetting::Value,
            SystemSetting::Description,
        ]);
        for (category, key, value, description) in DEFAULTS {
            insert.values_panic([(*category).into(), (*key).into(), (*value).into(), (*description).into()]);
        }
        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SystemSetting::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SystemSetting { Table, Category, Key, Value, Description, UpdatedAt }
