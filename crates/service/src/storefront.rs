//! Consumer storefront reached by scanning a QR code.
use std::collections::HashSet;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::errors::{ServiceError, ServiceResult};
use crate::reviews;
use crate::settings::{self, keys};
use models::order::{self, OrderStatus};
use models::{distributor, distributor_product, order_item, product, qr_code, qr_code_product, review, sale};

#[derive(Debug, Clone, Serialize)]
pub struct ShopProduct {
    pub display_order: i32,
    pub notes: Option<String>,
    pub product: product::Model,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopView {
    pub code: String,
    pub location: Option<String>,
    pub store_name: String,
    pub products: Vec<ShopProduct>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub code: String,
    pub product: product::Model,
    pub average_rating: Option<f64>,
    pub reviews: Vec<review::Model>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderInput {
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub shipping_name: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub shipping_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
    pub sale: sale::Model,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

async fn active_qr(db: &DatabaseConnection, code: &str) -> ServiceResult<qr_code::Model> {
    qr_code::Entity::find()
        .filter(qr_code::Column::Code.eq(code.trim().to_uppercase()))
        .filter(qr_code::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("shop"))
}

/// In-stock active products listed on an active QR code, in display order.
#[instrument(skip(db))]
pub async fn shop(db: &DatabaseConnection, code: &str) -> ServiceResult<ShopView> {
    let qr = active_qr(db, code).await?;
    let store_name = distributor::Entity::find_by_id(qr.distributor_id)
        .one(db)
        .await?
        .map(|d| d.display_location())
        .unwrap_or_default();
    let rows = qr_code_product::Entity::find()
        .find_also_related(product::Entity)
        .filter(qr_code_product::Column::QrCodeId.eq(qr.id))
        .filter(qr_code_product::Column::IsActive.eq(true))
        .order_by_asc(qr_code_product::Column::DisplayOrder)
        .all(db)
        .await?;
    let products = rows
        .into_iter()
        .filter_map(|(a, p)| p.map(|p| (a, p)))
        .filter(|(_, p)| p.is_active && p.in_stock())
        .map(|(a, p)| ShopProduct { display_order: a.display_order, notes: a.notes, product: p })
        .collect();
    Ok(ShopView { code: qr.code, location: qr.location, store_name, products })
}

#[instrument(skip(db))]
pub async fn product_detail(db: &DatabaseConnection, code: &str, product_id: Uuid) -> ServiceResult<ProductDetail> {
    let qr = active_qr(db, code).await?;
    let carried = distributor_product::Entity::find()
        .filter(distributor_product::Column::DistributorId.eq(qr.distributor_id))
        .filter(distributor_product::Column::ProductId.eq(product_id))
        .filter(distributor_product::Column::IsActive.eq(true))
        .one(db)
        .await?;
    if carried.is_none() {
        return Err(ServiceError::not_found("product"));
    }
    let p = product::Entity::find_by_id(product_id)
        .filter(product::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("product"))?;
    let approved = reviews::approved_for_product(db, p.id).await?;
    let ratings: Vec<i32> = approved.iter().map(|r| r.rating).collect();
    Ok(ProductDetail { code: qr.code, average_rating: review::average_rating(&ratings), reviews: approved, product: p })
}

fn order_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("SU-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

/// Shipping is the highest line fee, waived once the subtotal reaches every
/// line's free-shipping threshold.
pub fn shipping_fee(lines: &[(product::Model, i32)], subtotal: i64) -> i64 {
    let fee = lines.iter().map(|(p, _)| p.shipping_fee).max().unwrap_or(0);
    let waived = !lines.is_empty()
        && lines.iter().all(|(p, _)| matches!(p.free_shipping_threshold, Some(t) if subtotal >= t));
    if waived { 0 } else { fee }
}

/// Decrement stock in place; fails when a concurrent checkout already took it.
pub(crate) async fn take_stock<C: ConnectionTrait>(conn: &C, p: &product::Model, qty: i32) -> ServiceResult<()> {
    let res = product::Entity::update_many()
        .col_expr(product::Column::StockQuantity, Expr::col(product::Column::StockQuantity).sub(qty))
        .col_expr(product::Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
        .filter(product::Column::Id.eq(p.id))
        .filter(product::Column::StockQuantity.gte(qty))
        .exec(conn)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::validation(format!("{} is out of stock", p.name)));
    }
    Ok(())
}

/// Check out a basket from one shop.
///
/// Order, items, stock and the sale record are written in one transaction.
#[instrument(skip(db, input), fields(lines = input.items.len()))]
pub async fn place_order(db: &DatabaseConnection, code: &str, user_id: Uuid, input: PlaceOrderInput) -> ServiceResult<PlacedOrder> {
    if input.items.is_empty() {
        return Err(ServiceError::validation("order has no items"));
    }
    let mut seen = HashSet::new();
    if !input.items.iter().all(|l| seen.insert(l.product_id)) {
        return Err(ServiceError::validation("each product may appear only once"));
    }
    let qr = active_qr(db, code).await?;
    let commission_rate = settings::get_int(db, keys::DISTRIBUTOR_COMMISSION_RATE, 10).await?;
    let platform_rate = settings::get_int(db, keys::PLATFORM_FEE_RATE, 5).await?;

    let txn = db.begin().await?;
    let mut lines = Vec::with_capacity(input.items.len());
    for line in &input.items {
        let listed = qr_code_product::Entity::find()
            .filter(qr_code_product::Column::QrCodeId.eq(qr.id))
            .filter(qr_code_product::Column::ProductId.eq(line.product_id))
            .filter(qr_code_product::Column::IsActive.eq(true))
            .one(&txn)
            .await?;
        let p = match listed {
            Some(_) => product::Entity::find_by_id(line.product_id).one(&txn).await?,
            None => None,
        }
        .filter(|p| p.is_active)
        .ok_or_else(|| ServiceError::not_found("product"))?;
        if !p.in_stock() || line.quantity > p.stock_quantity {
            return Err(ServiceError::validation(format!("{} is out of stock", p.name)));
        }
        if line.quantity < p.minimum_order_quantity {
            return Err(ServiceError::validation(format!("{} requires at least {} per order", p.name, p.minimum_order_quantity)));
        }
        lines.push((p, line.quantity));
    }

    let subtotal: i64 = lines.iter().map(|(p, q)| p.retail_price * *q as i64).sum();
    let shipping = shipping_fee(&lines, subtotal);
    let total = subtotal + shipping;
    let now = Utc::now();

    let created = order::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        distributor_id: Set(Some(qr.distributor_id)),
        order_number: Set(order_number()),
        total_amount: Set(total),
        shipping_fee: Set(shipping),
        payment_fee: Set(0),
        status: Set(OrderStatus::Paid),
        payment_intent_id: Set(None),
        shipping_address: Set(input.shipping_address),
        shipping_name: Set(input.shipping_name),
        shipping_phone: Set(input.shipping_phone),
        tracking_number: Set(None),
        created_at: Set(now.into()),
        shipped_at: Set(None),
        delivered_at: Set(None),
        cancelled_at: Set(None),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (p, qty) in lines {
        items.push(
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(created.id),
                product_id: Set(p.id),
                quantity: Set(qty),
                unit_price: Set(p.retail_price),
                total_price: Set(p.retail_price * qty as i64),
            }
            .insert(&txn)
            .await?,
        );
        take_stock(&txn, &p, qty).await?;
    }

    let recorded = sale::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(created.id),
        distributor_id: Set(Some(qr.distributor_id)),
        qr_code_id: Set(Some(qr.id)),
        total_amount: Set(total),
        distributor_commission: Set(sale::percent_of(total, commission_rate)),
        platform_fee: Set(sale::percent_of(total, platform_rate)),
        sale_date: Set(now.into()),
        is_settled: Set(false),
        settlement_date: Set(None),
    }
    .insert(&txn)
    .await?;

    if let Err(e) = txn.commit().await {
        error!(order_id = %created.id, error = %e, "checkout commit failed");
        return Err(e.into());
    }
    info!(order_id = %created.id, order_number = %created.order_number, total, "order_placed");
    Ok(PlacedOrder { order: created, items, sale: recorded })
}

/// Store a review for moderation.
#[instrument(skip(db, input))]
pub async fn submit_review(db: &DatabaseConnection, user_id: Uuid, product_id: Uuid, input: ReviewInput) -> ServiceResult<review::Model> {
    review::validate_rating(input.rating)?;
    product::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("product"))?;
    let comment = input.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    let created = review::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        user_id: Set(user_id),
        rating: Set(input.rating),
        comment: Set(comment),
        is_approved: Set(false),
        created_at: Set(Utc::now().into()),
        approved_at: Set(None),
    }
    .insert(db)
    .await?;
    info!(review_id = %created.id, %product_id, "review_submitted");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, open_shop, user_with_role};
    use models::user::UserRole;

    #[tokio::test]
    async fn shop_lists_in_stock_products_in_order() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let shop_fixture = open_shop(&db).await?;

        let view = shop(&db, &shop_fixture.code.to_lowercase()).await?;
        assert_eq!(view.products.len(), 2);
        assert_eq!(view.products[0].product.name, "Green Tea");
        assert_eq!(view.store_name, "Shibuya");

        let mut am: product::ActiveModel = shop_fixture.products[0].clone().into();
        am.stock_quantity = Set(0);
        am.update(&db).await?;
        assert_eq!(shop(&db, &shop_fixture.code).await?.products.len(), 1);

        assert!(matches!(shop(&db, "FFFFFFFF").await, Err(ServiceError::NotFound(_))));
        let _ = std::fs::remove_dir_all(&shop_fixture.qr_dir);
        Ok(())
    }

    #[tokio::test]
    async fn checkout_records_order_stock_and_sale() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let s = open_shop(&db).await?;
        let buyer = user_with_role(&db, UserRole::Consumer).await?;

        let placed = place_order(&db, &s.code, buyer.id, PlaceOrderInput {
            items: vec![OrderLine { product_id: s.products[0].id, quantity: 2 }],
            shipping_name: Some("Buyer".into()),
            shipping_address: Some("Osaka".into()),
            shipping_phone: None,
        })
        .await?;
        // 2 x 1000 is below the 3000 threshold, so the 500 fee applies
        assert_eq!(placed.order.shipping_fee, 500);
        assert_eq!(placed.order.total_amount, 2500);
        assert_eq!(placed.order.status, OrderStatus::Paid);
        assert!(placed.order.order_number.starts_with("SU-"));
        assert_eq!(placed.items.len(), 1);
        assert_eq!(placed.sale.distributor_commission, 250);
        assert_eq!(placed.sale.platform_fee, 125);
        assert_eq!(placed.sale.distributor_id, Some(s.distributor_id));

        let p = product::Entity::find_by_id(s.products[0].id).one(&db).await?.unwrap();
        assert_eq!(p.stock_quantity, 8);

        let free = place_order(&db, &s.code, buyer.id, PlaceOrderInput {
            items: vec![OrderLine { product_id: s.products[1].id, quantity: 3 }],
            shipping_name: None,
            shipping_address: None,
            shipping_phone: None,
        })
        .await?;
        assert_eq!(free.order.shipping_fee, 0);
        assert_eq!(free.order.total_amount, 3000);

        let too_many = place_order(&db, &s.code, buyer.id, PlaceOrderInput {
            items: vec![OrderLine { product_id: s.products[0].id, quantity: 99 }],
            shipping_name: None,
            shipping_address: None,
            shipping_phone: None,
        })
        .await;
        assert!(matches!(too_many, Err(ServiceError::Validation(_))));
        let _ = std::fs::remove_dir_all(&s.qr_dir);
        Ok(())
    }

    #[tokio::test]
    async fn stock_is_taken_against_the_current_row() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let s = open_shop(&db).await?;
        // both calls work from the same snapshot with 10 in stock
        let snapshot = s.products[0].clone();
        take_stock(&db, &snapshot, 6).await?;
        assert!(matches!(take_stock(&db, &snapshot, 6).await, Err(ServiceError::Validation(_))));
        let p = product::Entity::find_by_id(snapshot.id).one(&db).await?.unwrap();
        assert_eq!(p.stock_quantity, 4);
        let _ = std::fs::remove_dir_all(&s.qr_dir);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_checkouts_do_not_oversell() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let s = open_shop(&db).await?;
        let buyer = user_with_role(&db, UserRole::Consumer).await?;
        let basket = || PlaceOrderInput {
            items: vec![OrderLine { product_id: s.products[0].id, quantity: 6 }],
            shipping_name: None,
            shipping_address: None,
            shipping_phone: None,
        };

        let (a, b) = tokio::join!(place_order(&db, &s.code, buyer.id, basket()), place_order(&db, &s.code, buyer.id, basket()));
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(a.err().or(b.err()), Some(ServiceError::Validation(_))));
        let p = product::Entity::find_by_id(s.products[0].id).one(&db).await?.unwrap();
        assert_eq!(p.stock_quantity, 4);
        let _ = std::fs::remove_dir_all(&s.qr_dir);
        Ok(())
    }

    #[tokio::test]
    async fn reviews_show_after_approval() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let s = open_shop(&db).await?;
        let buyer = user_with_role(&db, UserRole::Consumer).await?;
        let pid = s.products[0].id;

        assert!(submit_review(&db, buyer.id, pid, ReviewInput { rating: 6, comment: None }).await.is_err());
        let r1 = submit_review(&db, buyer.id, pid, ReviewInput { rating: 5, comment: Some("great".into()) }).await?;
        let r2 = submit_review(&db, buyer.id, pid, ReviewInput { rating: 4, comment: None }).await?;
        assert!(!r1.is_approved);

        let before = product_detail(&db, &s.code, pid).await?;
        assert!(before.reviews.is_empty());
        assert_eq!(before.average_rating, None);

        assert_eq!(reviews::pending(&db).await?.len(), 2);
        reviews::approve(&db, r1.id).await?;
        reviews::approve(&db, r2.id).await?;
        let after = product_detail(&db, &s.code, pid).await?;
        assert_eq!(after.reviews.len(), 2);
        assert_eq!(after.average_rating, Some(4.5));
        let _ = std::fs::remove_dir_all(&s.qr_dir);
        Ok(())
    }
}
