//! Sample stock ordered by distributors for their shelves.
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access;
use crate::errors::{ServiceError, ServiceResult};
use models::product;
use models::sample_order::{self, SampleOrderStatus, SampleOrderType};

#[derive(Debug, Clone, Deserialize)]
pub struct SampleOrderInput {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default = "default_order_type")]
    pub order_type: SampleOrderType,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_order_type() -> SampleOrderType { SampleOrderType::Additional }

#[instrument(skip(db, input), fields(product_id = %input.product_id, quantity = input.quantity))]
pub async fn create(db: &DatabaseConnection, user_id: Uuid, location_id: Option<Uuid>, input: SampleOrderInput) -> ServiceResult<sample_order::Model> {
    if input.quantity < 1 {
        return Err(ServiceError::validation("quantity must be >= 1"));
    }
    let target = access::resolve_target(db, user_id, location_id).await?;
    let p = product::Entity::find_by_id(input.product_id)
        .filter(product::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("product"))?;
    let cost = p.wholesale_price * input.quantity as i64;
    let shipping_fee = p.shipping_fee;
    let service_fee = 0;
    let created = sample_order::ActiveModel {
        id: Set(Uuid::new_v4()),
        distributor_id: Set(target.id),
        product_id: Set(p.id),
        quantity: Set(input.quantity),
        cost: Set(cost),
        shipping_fee: Set(shipping_fee),
        service_fee: Set(service_fee),
        total_amount: Set(cost + shipping_fee + service_fee),
        order_type: Set(input.order_type),
        status: Set(SampleOrderStatus::Pending),
        notes: Set(input.notes),
        created_at: Set(Utc::now().into()),
        shipped_at: Set(None),
        delivered_at: Set(None),
    }
    .insert(db)
    .await?;
    info!(sample_order_id = %created.id, distributor_id = %target.id, "sample_order_created");
    Ok(created)
}

pub async fn list_for_user(db: &DatabaseConnection, user_id: Uuid, location_id: Option<Uuid>) -> ServiceResult<Vec<sample_order::Model>> {
    let target = access::resolve_target(db, user_id, location_id).await?;
    Ok(sample_order::Entity::find()
        .filter(sample_order::Column::DistributorId.eq(target.id))
        .order_by_desc(sample_order::Column::CreatedAt)
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, individual_location, manufacturer_with_products};

    #[tokio::test]
    async fn sample_order_totals() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (u, d) = individual_location(&db).await?;
        let (_, products) = manufacturer_with_products(&db, &["Umeboshi"]).await?;

        let so = create(&db, u.id, None, SampleOrderInput {
            product_id: products[0].id,
            quantity: 3,
            order_type: SampleOrderType::Monthly,
            notes: None,
        })
        .await?;
        assert_eq!(so.cost, 1800);
        assert_eq!(so.shipping_fee, 500);
        assert_eq!(so.total_amount, 2300);
        assert_eq!(so.status, SampleOrderStatus::Pending);
        assert_eq!(so.distributor_id, d.id);

        let zero = SampleOrderInput { product_id: products[0].id, quantity: 0, order_type: SampleOrderType::Additional, notes: None };
        assert!(create(&db, u.id, None, zero).await.is_err());
        assert_eq!(list_for_user(&db, u.id, None).await?.len(), 1);
        Ok(())
    }
}
