use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::setup_test_db;
use crate::{
    company, distributor, manufacturer, product, qr_code, qr_code_product, user, user_credentials,
};
use crate::distributor::{ContractStatus, DistributorType, ShelfReturnStatus};
use crate::user::UserRole;

pub(crate) async fn seed_location(db: &DatabaseConnection) -> Result<(user::Model, distributor::Model)> {
    let u = user::create(db, &format!("loc_{}@example.com", Uuid::new_v4()), "Hanako", "Sato", UserRole::Distributor, Some("Sato Store".into())).await?;
    let d = distributor::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(u.id),
        company_name: Set("Sato Store".into()),
        address: Set(None),
        phone: Set(None),
        location_name: Set(Some("Shibuya".into())),
        is_headquarters: Set(false),
        company_id: Set(None),
        distributor_type: Set(DistributorType::Individual),
        parent_distributor_id: Set(None),
        shelf_count: Set(1),
        product_selection_count: Set(10),
        monthly_fee: Set(5000),
        contract_start_date: Set(Some(Utc::now().into())),
        contract_end_date: Set(None),
        cancellation_request_date: Set(None),
        shelf_return_due_date: Set(None),
        shelf_returned_date: Set(None),
        shelf_return_status: Set(ShelfReturnStatus::NotRequired),
        contract_status: Set(ContractStatus::Active),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(db)
    .await?;
    Ok((u, d))
}

async fn seed_product(db: &DatabaseConnection) -> Result<product::Model> {
    let mu = user::create(db, &format!("mfr_{}@example.com", Uuid::new_v4()), "Ken", "Ito", UserRole::Manufacturer, None).await?;
    let m = manufacturer::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(mu.id),
        company_name: Set("Ito Brewing".into()),
        address: Set(None),
        phone: Set(None),
        company_description: Set(None),
        industry: Set(Some("Food".into())),
        website: Set(None),
        established_year: Set(Some(1921)),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(db)
    .await?;
    let p = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        manufacturer_id: Set(m.id),
        name: Set("Shoyu 500ml".into()),
        description: Set(None),
        wholesale_price: Set(400),
        retail_price: Set(680),
        free_shipping_threshold: Set(None),
        category: Set(Some("Seasoning".into())),
        image_url: Set(None),
        requires_refrigeration: Set(false),
        requires_freezing: Set(false),
        shipping_fee: Set(300),
        stock_quantity: Set(20),
        minimum_order_quantity: Set(1),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(db)
    .await?;
    Ok(p)
}

#[tokio::test]
async fn test_user_and_credentials() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let u = user::create(&db, "Mixed.Case@Example.com", "Aki", "Mori", UserRole::Consumer, None).await?;
    assert_eq!(u.email, "mixed.case@example.com");
    assert!(user::find_by_email(&db, "MIXED.case@example.com").await?.is_some());

    let c1 = user_credentials::upsert_password(&db, u.id, "hash-1".into(), "argon2").await?;
    let c2 = user_credentials::upsert_password(&db, u.id, "hash-2".into(), "argon2").await?;
    assert_eq!(c1.id, c2.id);
    assert_eq!(user_credentials::find_by_user(&db, u.id).await?.unwrap().password_hash, "hash-2");

    // Duplicate email is rejected by the unique index
    assert!(user::create(&db, "mixed.case@example.com", "Aki", "Mori", UserRole::Consumer, None).await.is_err());

    user::lock_out(&db, u.id).await?;
    let locked = user::Entity::find_by_id(u.id).one(&db).await?.unwrap();
    assert!(locked.is_locked_out(Utc::now()));
    Ok(())
}

#[tokio::test]
async fn test_company_distributor_link() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let (u, d) = seed_location(&db).await?;
    let c = company::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Sato Holdings".into()),
        headquarters_address: Set(None),
        phone: Set(None),
        email: Set(None),
        company_type: Set(company::CompanyType::Chain),
        head_office_code: Set("12345678".into()),
        owner_user_id: Set(u.id),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(&db)
    .await?;
    let mut am: distributor::ActiveModel = d.into();
    am.company_id = Set(Some(c.id));
    let d = am.update(&db).await?;

    let (found, comp) = distributor::Entity::find_by_id(d.id)
        .find_also_related(company::Entity)
        .one(&db)
        .await?
        .expect("distributor");
    assert_eq!(found.company_id, Some(c.id));
    assert!(comp.expect("company").is_chain());
    Ok(())
}

#[tokio::test]
async fn test_qr_code_delete_cascades_assignments() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let (_, d) = seed_location(&db).await?;
    let p = seed_product(&db).await?;
    let qr = qr_code::ActiveModel {
        id: Set(Uuid::new_v4()),
        distributor_id: Set(d.id),
        code: Set(qr_code::new_code()),
        location: Set(Some("Register".into())),
        image_url: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        deactivated_at: Set(None),
    }
    .insert(&db)
    .await?;
    qr_code_product::ActiveModel {
        id: Set(Uuid::new_v4()),
        qr_code_id: Set(qr.id),
        product_id: Set(p.id),
        is_active: Set(true),
        display_order: Set(0),
        assigned_at: Set(Utc::now().into()),
        removed_at: Set(None),
        notes: Set(None),
    }
    .insert(&db)
    .await?;

    qr_code::Entity::delete_by_id(qr.id).exec(&db).await?;
    let left = qr_code_product::Entity::find()
        .filter(qr_code_product::Column::QrCodeId.eq(qr.id))
        .all(&db)
        .await?;
    assert!(left.is_empty());
    Ok(())
}

fn qr_for(distributor_id: Uuid, location: &str) -> qr_code::ActiveModel {
    qr_code::ActiveModel {
        id: Set(Uuid::new_v4()),
        distributor_id: Set(distributor_id),
        code: Set(qr_code::new_code()),
        location: Set(Some(location.into())),
        image_url: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        deactivated_at: Set(None),
    }
}

#[tokio::test]
async fn test_second_qr_code_for_location_is_rejected() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let (_, d) = seed_location(&db).await?;
    qr_for(d.id, "Register").insert(&db).await?;
    let err = qr_for(d.id, "Door").insert(&db).await.expect_err("unique distributor_id");
    assert!(matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))));

    let (_, other) = seed_location(&db).await?;
    qr_for(other.id, "Register").insert(&db).await?;
    Ok(())
}
