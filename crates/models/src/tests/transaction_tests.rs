use anyhow::Result;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};

use super::crud_tests::seed_location;
use super::setup_test_db;
use crate::distributor;
use crate::distributor::ContractStatus;

#[tokio::test]
async fn test_transaction_commit() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let (_, d) = seed_location(&db).await?;

    let txn = db.begin().await?;
    let mut am: distributor::ActiveModel = d.clone().into();
    am.contract_status = Set(ContractStatus::Suspended);
    am.update(&txn).await?;
    txn.commit().await?;

    let found = distributor::Entity::find_by_id(d.id).one(&db).await?.unwrap();
    assert_eq!(found.contract_status, ContractStatus::Suspended);
    Ok(())
}

#[tokio::test]
async fn test_transaction_rollback() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let (_, d) = seed_location(&db).await?;

    let txn = db.begin().await?;
    distributor::Entity::delete_by_id(d.id).exec(&txn).await?;
    txn.rollback().await?;

    let found = distributor::Entity::find_by_id(d.id).one(&db).await?;
    assert!(found.is_some());
    Ok(())
}
