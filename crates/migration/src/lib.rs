//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user;
mod m20250101_000002_create_user_credentials;
mod m20250101_000003_create_company;
mod m20250101_000004_create_distributor;
mod m20250101_000005_create_manufacturer;
mod m20250101_000006_create_product;
mod m20250101_000007_create_orders;
mod m20250101_000008_create_distributor_product;
mod m20250101_000009_create_qr_code;
mod m20250101_000010_create_sale_settlement;
mod m20250101_000011_create_review;
mod m20250101_000012_create_sample_order;
mod m20250101_000013_create_system_setting;
mod m20250101_000020_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user::Migration),
            Box::new(m20250101_000002_create_user_credentials::Migration),
            Box::new(m20250101_000003_create_company::Migration),
            Box::new(m20250101_000004_create_distributor::Migration),
            Box::new(m20250101_000005_create_manufacturer::Migration),
            Box::new(m20250101_000006_create_product::Migration),
            Box::new(m20250101_000007_create_orders::Migration),
            Box::new(m20250101_000008_create_distributor_product::Migration),
            Box::new(m20250101_000009_create_qr_code::Migration),
            Box::new(m20250101_000010_create_sale_settlement::Migration),
            Box::new(m20250101_000011_create_review::Migration),
            Box::new(m20250101_000012_create_sample_order::Migration),
            Box::new(m20250101_000013_create_system_setting::Migration),
            // Indexes should always be applied last
            Box::new(m20250101_000020_add_indexes::Migration),
        ]
    }
}
