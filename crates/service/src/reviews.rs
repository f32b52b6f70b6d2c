use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;
use uuid::Uuid;

use crate::errors::{ServiceError, ServiceResult};
use models::review;

/// Reviews waiting for moderation, oldest first.
pub async fn pending(db: &DatabaseConnection) -> ServiceResult<Vec<review::Model>> {
    Ok(review::Entity::find()
        .filter(review::Column::IsApproved.eq(false))
        .order_by_asc(review::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn approve(db: &DatabaseConnection, id: Uuid) -> ServiceResult<review::Model> {
    let r = review::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("review"))?;
    if r.is_approved {
        return Ok(r);
    }
    let mut am: review::ActiveModel = r.into();
    am.is_approved = Set(true);
    am.approved_at = Set(Some(Utc::now().into()));
    let updated = am.update(db).await?;
    info!(review_id = %id, "review_approved");
    Ok(updated)
}

pub async fn approved_for_product(db: &DatabaseConnection, product_id: Uuid) -> ServiceResult<Vec<review::Model>> {
    Ok(review::Entity::find()
        .filter(review::Column::ProductId.eq(product_id))
        .filter(review::Column::IsApproved.eq(true))
        .order_by_desc(review::Column::CreatedAt)
        .all(db)
        .await?)
}
