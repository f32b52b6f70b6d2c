//! Lookup indexes for the hot query paths (ownership, company membership,
//! per-location selections, QR listings and sales reports).
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (index name, table, column, unique)
const INDEXES: &[(&str, &str, &str, bool)] = &[
    ("idx_distributor_user_id", "distributor", "user_id", false),
    ("idx_distributor_company_id", "distributor", "company_id", false),
    ("idx_product_manufacturer_id", "product", "manufacturer_id", false),
    ("idx_distributor_product_distributor_id", "distributor_product", "distributor_id", false),
    // one QR code per location
    ("idx_qr_code_distributor_id", "qr_code", "distributor_id", true),
    ("idx_qr_code_product_qr_code_id", "qr_code_product", "qr_code_id", false),
    ("idx_order_item_order_id", "order_item", "order_id", false),
    ("idx_sale_distributor_id", "sale", "distributor_id", false),
    ("idx_sale_sale_date", "sale", "sale_date", false),
    ("idx_review_product_id", "review", "product_id", false),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, column, unique) in INDEXES {
            let mut index = Index::create();
            index.if_not_exists().name(*name).table(Alias::new(*table)).col(Alias::new(*column));
            if *unique {
                index.unique();
            }
            manager.create_index(index.to_owned()).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, _, _) in INDEXES {
            manager
                .drop_index(Index::drop().name(*name).table(Alias::new(*table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
