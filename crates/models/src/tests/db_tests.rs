use anyhow::Result;
use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, ColumnTrait, PaginatorTrait, Statement};

use super::setup_test_db;
use crate::system_setting;

#[tokio::test]
async fn test_basic_connection() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(backend, "SELECT 1 AS test".to_string()))
        .await?
        .expect("one row");
    let v: i32 = row.try_get("", "test")?;
    assert_eq!(v, 1);
    Ok(())
}

#[tokio::test]
async fn test_all_migrations_applied() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let pending = migration::Migrator::get_pending_migrations(&db).await?;
    assert!(pending.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_default_settings_seeded() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let total = system_setting::Entity::find().count(&db).await?;
    assert_eq!(total, 10);

    let quota = system_setting::Entity::find()
        .filter(system_setting::Column::Key.eq(system_setting::keys::DEFAULT_PRODUCT_SELECTION_COUNT))
        .one(&db)
        .await?
        .expect("seeded quota");
    assert_eq!(quota.category, "SHELF");
    assert_eq!(quota.value, "10");
    Ok(())
}
