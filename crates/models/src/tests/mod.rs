use anyhow::Result;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;

use crate::db::{connect_with_config, memory_config};

/// Database connection and migration tests
pub mod db_tests;

/// CRUD and cascade behaviour of the shelf entities
pub mod crud_tests;

/// Transaction handling tests
pub mod transaction_tests;

/// Fresh in-memory database with the full schema applied.
pub(crate) async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = connect_with_config(&memory_config()).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}
