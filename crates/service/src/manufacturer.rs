//! Manufacturer self-service: profile, products, stock and fulfilment.
use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{ServiceError, ServiceResult};
use crate::settlements::month_start;
use models::order::{self, OrderStatus};
use models::product::{self, ProductFields};
use models::settlement::{self, SettlementStatus, SettlementType};
use models::{manufacturer, order_item, user};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub company_description: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub established_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManufacturerStats {
    pub active_products: usize,
    pub order_count: usize,
    pub monthly_settlement_total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManufacturerOrder {
    #[serde(flatten)]
    pub order: order::Model,
    /// Only the lines for this manufacturer's products.
    pub items: Vec<order_item::Model>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusInput {
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// The manufacturer record of a user, created on first access.
pub async fn profile<C: ConnectionTrait>(db: &C, user_id: Uuid) -> ServiceResult<manufacturer::Model> {
    if let Some(m) = manufacturer::Entity::find()
        .filter(manufacturer::Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        return Ok(m);
    }
    let u = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    let company_name = u.company_name.clone().unwrap_or_else(|| u.display_name());
    let created = manufacturer::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        company_name: Set(company_name),
        address: Set(None),
        phone: Set(None),
        company_description: Set(None),
        industry: Set(None),
        website: Set(None),
        established_year: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(db)
    .await?;
    info!(manufacturer_id = %created.id, %user_id, "manufacturer_profile_created");
    Ok(created)
}

#[instrument(skip(db, input))]
pub async fn update_profile(db: &DatabaseConnection, user_id: Uuid, input: ProfileInput) -> ServiceResult<manufacturer::Model> {
    let m = profile(db, user_id).await?;
    let mut am: manufacturer::ActiveModel = m.into();
    if let Some(name) = input.company_name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("company name required"));
        }
        am.company_name = Set(name);
    }
    if let Some(year) = input.established_year {
        if !(1800..=2100).contains(&year) {
            return Err(ServiceError::validation("established_year out of range"));
        }
    }
    am.address = Set(input.address);
    am.phone = Set(input.phone);
    am.company_description = Set(input.company_description);
    am.industry = Set(input.industry);
    am.website = Set(input.website);
    am.established_year = Set(input.established_year);
    am.updated_at = Set(Some(Utc::now().into()));
    Ok(am.update(db).await?)
}

async fn own_product(db: &DatabaseConnection, manufacturer_id: Uuid, product_id: Uuid) -> ServiceResult<product::Model> {
    product::Entity::find_by_id(product_id)
        .filter(product::Column::ManufacturerId.eq(manufacturer_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("product"))
}

pub async fn products(db: &DatabaseConnection, user_id: Uuid) -> ServiceResult<Vec<product::Model>> {
    let m = profile(db, user_id).await?;
    Ok(product::Entity::find()
        .filter(product::Column::ManufacturerId.eq(m.id))
        .filter(product::Column::IsActive.eq(true))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await?)
}

#[instrument(skip(db, fields), fields(name = %fields.name))]
pub async fn create_product(db: &DatabaseConnection, user_id: Uuid, fields: ProductFields) -> ServiceResult<product::Model> {
    fields.validate()?;
    let m = profile(db, user_id).await?;
    let created = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        manufacturer_id: Set(m.id),
        name: Set(fields.name.trim().to_string()),
        description: Set(fields.description),
        wholesale_price: Set(fields.wholesale_price),
        retail_price: Set(fields.retail_price),
        free_shipping_threshold: Set(fields.free_shipping_threshold),
        category: Set(fields.category),
        image_url: Set(fields.image_url),
        requires_refrigeration: Set(fields.requires_refrigeration),
        requires_freezing: Set(fields.requires_freezing),
        shipping_fee: Set(fields.shipping_fee),
        stock_quantity: Set(fields.stock_quantity),
        minimum_order_quantity: Set(fields.minimum_order_quantity),
        is_active: Set(fields.is_active),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(db)
    .await?;
    info!(product_id = %created.id, manufacturer_id = %m.id, "product_created");
    Ok(created)
}

#[instrument(skip(db, fields))]
pub async fn update_product(db: &DatabaseConnection, user_id: Uuid, product_id: Uuid, fields: ProductFields) -> ServiceResult<product::Model> {
    fields.validate()?;
    let m = profile(db, user_id).await?;
    let p = own_product(db, m.id, product_id).await?;
    let mut am: product::ActiveModel = p.into();
    am.name = Set(fields.name.trim().to_string());
    am.description = Set(fields.description);
    am.wholesale_price = Set(fields.wholesale_price);
    am.retail_price = Set(fields.retail_price);
    am.free_shipping_threshold = Set(fields.free_shipping_threshold);
    am.category = Set(fields.category);
    am.image_url = Set(fields.image_url);
    am.requires_refrigeration = Set(fields.requires_refrigeration);
    am.requires_freezing = Set(fields.requires_freezing);
    am.shipping_fee = Set(fields.shipping_fee);
    am.stock_quantity = Set(fields.stock_quantity);
    am.minimum_order_quantity = Set(fields.minimum_order_quantity);
    am.is_active = Set(fields.is_active);
    am.updated_at = Set(Some(Utc::now().into()));
    let updated = am.update(db).await?;
    info!(%product_id, "product_updated");
    Ok(updated)
}

#[instrument(skip(db))]
pub async fn update_stock(db: &DatabaseConnection, user_id: Uuid, product_id: Uuid, quantity: i32) -> ServiceResult<product::Model> {
    if quantity < 0 {
        return Err(ServiceError::validation("stock_quantity must be >= 0"));
    }
    let m = profile(db, user_id).await?;
    let p = own_product(db, m.id, product_id).await?;
    if !p.is_active {
        return Err(ServiceError::not_found("product"));
    }
    let mut am: product::ActiveModel = p.into();
    am.stock_quantity = Set(quantity);
    am.updated_at = Set(Some(Utc::now().into()));
    let updated = am.update(db).await?;
    info!(%product_id, quantity, "stock_updated");
    Ok(updated)
}

/// Order lines touching the manufacturer's products, grouped by order id.
async fn own_lines(db: &DatabaseConnection, manufacturer_id: Uuid) -> ServiceResult<HashMap<Uuid, Vec<order_item::Model>>> {
    let product_ids: Vec<Uuid> = product::Entity::find()
        .filter(product::Column::ManufacturerId.eq(manufacturer_id))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    let mut grouped: HashMap<Uuid, Vec<order_item::Model>> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(grouped);
    }
    let lines = order_item::Entity::find()
        .filter(order_item::Column::ProductId.is_in(product_ids))
        .all(db)
        .await?;
    for line in lines {
        grouped.entry(line.order_id).or_default().push(line);
    }
    Ok(grouped)
}

pub async fn stats(db: &DatabaseConnection, user_id: Uuid) -> ServiceResult<ManufacturerStats> {
    let m = profile(db, user_id).await?;
    let active_products = product::Entity::find()
        .filter(product::Column::ManufacturerId.eq(m.id))
        .filter(product::Column::IsActive.eq(true))
        .all(db)
        .await?
        .len();
    let order_count = own_lines(db, m.id).await?.len();
    let since = month_start(Utc::now());
    let monthly_settlement_total = settlement::Entity::find()
        .filter(settlement::Column::ManufacturerId.eq(m.id))
        .filter(settlement::Column::SettlementType.eq(SettlementType::ManufacturerSales))
        .filter(settlement::Column::Status.eq(SettlementStatus::Completed))
        .filter(settlement::Column::ProcessedDate.gte(DateTimeWithTimeZone::from(since)))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.amount)
        .sum();
    Ok(ManufacturerStats { active_products, order_count, monthly_settlement_total })
}

/// Orders containing the manufacturer's products, newest first.
pub async fn orders(db: &DatabaseConnection, user_id: Uuid) -> ServiceResult<Vec<ManufacturerOrder>> {
    let m = profile(db, user_id).await?;
    let mut lines = own_lines(db, m.id).await?;
    if lines.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = lines.keys().copied().collect();
    let found = order::Entity::find()
        .filter(order::Column::Id.is_in(ids))
        .order_by_desc(order::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(found
        .into_iter()
        .map(|o| ManufacturerOrder { items: lines.remove(&o.id).unwrap_or_default(), order: o })
        .collect())
}

#[instrument(skip(db, input), fields(status = ?input.status))]
pub async fn update_order_status(db: &DatabaseConnection, user_id: Uuid, order_id: Uuid, input: OrderStatusInput) -> ServiceResult<order::Model> {
    let m = profile(db, user_id).await?;
    let mine: HashSet<Uuid> = own_lines(db, m.id).await?.into_keys().collect();
    if !mine.contains(&order_id) {
        return Err(ServiceError::not_found("order"));
    }
    let o = order::Entity::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("order"))?;
    let now = Utc::now();
    let mut am: order::ActiveModel = o.into();
    am.status = Set(input.status);
    match input.status {
        OrderStatus::Shipped => am.shipped_at = Set(Some(now.into())),
        OrderStatus::Delivered => am.delivered_at = Set(Some(now.into())),
        OrderStatus::Cancelled => am.cancelled_at = Set(Some(now.into())),
        _ => {}
    }
    if let Some(tracking) = input.tracking_number.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        am.tracking_number = Set(Some(tracking));
    }
    let updated = am.update(db).await?;
    info!(%order_id, status = ?updated.status, "order_status_updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, product_fields, user_with_role};
    use models::user::UserRole;

    #[tokio::test]
    async fn profile_is_created_once() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let u = user_with_role(&db, UserRole::Manufacturer).await?;
        let a = profile(&db, u.id).await?;
        let b = profile(&db, u.id).await?;
        assert_eq!(a.id, b.id);
        assert_eq!(a.company_name, "Yamada Shoten");

        let updated = update_profile(&db, u.id, ProfileInput {
            company_name: Some("Yamada Foods".into()),
            industry: Some("Confectionery".into()),
            established_year: Some(1950),
            ..Default::default()
        })
        .await?;
        assert_eq!(updated.company_name, "Yamada Foods");
        assert_eq!(updated.industry.as_deref(), Some("Confectionery"));
        Ok(())
    }

    #[tokio::test]
    async fn product_validation_and_stock() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let u = user_with_role(&db, UserRole::Manufacturer).await?;
        let mut bad = product_fields("Expensive");
        bad.retail_price = 1_000_000;
        assert!(matches!(create_product(&db, u.id, bad).await, Err(ServiceError::Model(_))));

        let p = create_product(&db, u.id, product_fields("Kombu")).await?;
        let p = update_stock(&db, u.id, p.id, 42).await?;
        assert_eq!(p.stock_quantity, 42);
        assert!(update_stock(&db, u.id, p.id, -1).await.is_err());

        let other = user_with_role(&db, UserRole::Manufacturer).await?;
        assert!(matches!(update_stock(&db, other.id, p.id, 1).await, Err(ServiceError::NotFound(_))));

        let mut fields = product_fields("Kombu Premium");
        fields.is_active = false;
        update_product(&db, u.id, p.id, fields).await?;
        assert!(products(&db, u.id).await?.is_empty());
        assert!(update_stock(&db, u.id, p.id, 3).await.is_err());
        Ok(())
    }
}
