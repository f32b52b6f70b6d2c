#![cfg(test)]
//! Fixtures shared by the service tests: a fresh in-memory database per test
//! plus helpers that create the usual actors.
use chrono::Utc;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

use models::db::{connect_with_config, memory_config};
use models::product::ProductFields;
use models::user::{self, UserRole};

use crate::contracts::{self, NewContractInput};

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let db = connect_with_config(&memory_config()).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn user_with_role(db: &DatabaseConnection, role: UserRole) -> anyhow::Result<user::Model> {
    let email = format!("{}_{}@example.com", role.as_str().to_lowercase(), &Uuid::new_v4().simple().to_string()[..8]);
    Ok(user::create(db, &email, "Taro", "Yamada", role, Some("Yamada Shoten".into())).await?)
}

/// A distributor user with an active individual contract.
pub async fn individual_location(db: &DatabaseConnection) -> anyhow::Result<(user::Model, models::distributor::Model)> {
    let u = user_with_role(db, UserRole::Distributor).await?;
    let d = contracts::new_contract(db, u.id, NewContractInput {
        company_name: "Yamada Shoten".into(),
        location_name: "Shibuya".into(),
        address: Some("Tokyo".into()),
        phone: None,
        head_office_code: None,
    })
    .await?;
    Ok((u, d))
}

/// Backdate a contract so that the minimum term has passed.
pub async fn backdate_contract(db: &DatabaseConnection, distributor: &models::distributor::Model, months: u32) -> anyhow::Result<models::distributor::Model> {
    let start = Utc::now()
        .checked_sub_months(chrono::Months::new(months))
        .ok_or_else(|| anyhow::anyhow!("date out of range"))?;
    let mut am: models::distributor::ActiveModel = distributor.clone().into();
    am.contract_start_date = Set(Some(start.into()));
    Ok(am.update(db).await?)
}

pub fn product_fields(name: &str) -> ProductFields {
    ProductFields {
        name: name.into(),
        description: Some(format!("{name} from the test kitchen")),
        wholesale_price: 600,
        retail_price: 1000,
        free_shipping_threshold: Some(3000),
        category: Some("Snacks".into()),
        image_url: None,
        requires_refrigeration: false,
        requires_freezing: false,
        shipping_fee: 500,
        stock_quantity: 10,
        minimum_order_quantity: 1,
        is_active: true,
    }
}

/// A manufacturer user with one product per name.
pub async fn manufacturer_with_products(db: &DatabaseConnection, names: &[&str]) -> anyhow::Result<(user::Model, Vec<models::product::Model>)> {
    let u = user_with_role(db, UserRole::Manufacturer).await?;
    let mut out = Vec::new();
    for name in names {
        out.push(crate::manufacturer::create_product(db, u.id, product_fields(name)).await?);
    }
    Ok((u, out))
}

pub struct ShopFixture {
    pub owner: user::Model,
    pub distributor_id: Uuid,
    pub code: String,
    pub products: Vec<models::product::Model>,
    pub qr_dir: std::path::PathBuf,
}

/// A location with a QR code listing two selected products.
pub async fn open_shop(db: &DatabaseConnection) -> anyhow::Result<ShopFixture> {
    use crate::qr_codes::{self, AddQrProductInput, QrOptions};

    let (owner, d) = individual_location(db).await?;
    let (_, products) = manufacturer_with_products(db, &["Green Tea", "Rice Cracker"]).await?;
    let opts = QrOptions {
        base_url: "http://shop.test".into(),
        qr_dir: std::env::temp_dir().join(format!("shelfup-shop-{}", Uuid::new_v4())),
    };
    let qr = qr_codes::generate(db, &opts, owner.id, None, "Entrance".into()).await?;
    for (i, p) in products.iter().enumerate() {
        crate::distributor_products::add(db, owner.id, None, p.id).await?;
        qr_codes::add_product(db, owner.id, qr.qr.id, AddQrProductInput { product_id: p.id, display_order: Some(i as i32), notes: None }).await?;
    }
    Ok(ShopFixture { owner, distributor_id: d.id, code: qr.qr.code, products, qr_dir: opts.qr_dir })
}
