//! Product catalog as seen by distributors and the per-location selection.
use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access;
use crate::errors::{ServiceError, ServiceResult};
use models::{distributor, distributor_product, manufacturer, product};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub manufacturer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogProduct {
    #[serde(flatten)]
    pub product: product::Model,
    pub manufacturer_name: String,
    pub profit_margin: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedProduct {
    pub assignment: distributor_product::Model,
    pub product: product::Model,
}

/// Active products of active manufacturers, ordered by name.
#[instrument(skip(db))]
pub async fn catalog(db: &DatabaseConnection, filter: CatalogFilter) -> ServiceResult<Vec<CatalogProduct>> {
    let mut q = product::Entity::find()
        .find_also_related(manufacturer::Entity)
        .filter(product::Column::IsActive.eq(true))
        .filter(manufacturer::Column::IsActive.eq(true));
    if let Some(cat) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
        q = q.filter(product::Column::Category.eq(cat.trim()));
    }
    if let Some(mid) = filter.manufacturer_id {
        q = q.filter(product::Column::ManufacturerId.eq(mid));
    }
    let rows = q.order_by_asc(product::Column::Name).all(db).await?;

    let needle = filter.search.as_deref().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
    Ok(rows
        .into_iter()
        .filter_map(|(p, m)| m.map(|m| (p, m)))
        .filter(|(p, m)| match &needle {
            Some(n) => {
                p.name.to_lowercase().contains(n)
                    || p.description.as_deref().map(|d| d.to_lowercase().contains(n)).unwrap_or(false)
                    || m.company_name.to_lowercase().contains(n)
            }
            None => true,
        })
        .map(|(p, m)| CatalogProduct { profit_margin: p.profit_margin(), manufacturer_name: m.company_name, product: p })
        .collect())
}

/// Distinct non-empty categories of active products, sorted.
pub async fn categories(db: &DatabaseConnection) -> ServiceResult<Vec<String>> {
    let rows = product::Entity::find()
        .filter(product::Column::IsActive.eq(true))
        .all(db)
        .await?;
    let set: BTreeSet<String> = rows
        .into_iter()
        .filter_map(|p| p.category)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    Ok(set.into_iter().collect())
}

pub async fn manufacturers(db: &DatabaseConnection) -> ServiceResult<Vec<manufacturer::Model>> {
    Ok(manufacturer::Entity::find()
        .filter(manufacturer::Column::IsActive.eq(true))
        .order_by_asc(manufacturer::Column::CompanyName)
        .all(db)
        .await?)
}

pub(crate) async fn selected_for<C: ConnectionTrait>(db: &C, distributor_id: Uuid) -> ServiceResult<Vec<SelectedProduct>> {
    let rows = distributor_product::Entity::find()
        .find_also_related(product::Entity)
        .filter(distributor_product::Column::DistributorId.eq(distributor_id))
        .filter(distributor_product::Column::IsActive.eq(true))
        .order_by_asc(distributor_product::Column::AssignedAt)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(a, p)| p.map(|product| SelectedProduct { assignment: a, product }))
        .collect())
}

/// Select a product for a location.
///
/// The location row is locked while the quota is counted so concurrent
/// selections cannot overshoot `product_selection_count`.
pub(crate) async fn add_for(db: &DatabaseConnection, d: &distributor::Model, product_id: Uuid) -> ServiceResult<distributor_product::Model> {
    let p = product::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("product"))?;
    if !p.is_active {
        return Err(ServiceError::validation("product is not available"));
    }

    let txn = db.begin().await?;
    let d = distributor::Entity::find_by_id(d.id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("distributor"))?;
    let active = distributor_product::Entity::find()
        .filter(distributor_product::Column::DistributorId.eq(d.id))
        .filter(distributor_product::Column::IsActive.eq(true))
        .count(&txn)
        .await?;
    if active >= d.product_selection_count.max(0) as u64 {
        return Err(ServiceError::validation(format!("selection limit of {} products reached", d.product_selection_count)));
    }
    let existing = distributor_product::Entity::find()
        .filter(distributor_product::Column::DistributorId.eq(d.id))
        .filter(distributor_product::Column::ProductId.eq(product_id))
        .one(&txn)
        .await?;
    let now = Utc::now();
    let saved = match existing {
        Some(a) if a.is_active => return Err(ServiceError::conflict("product already selected")),
        Some(a) => {
            let mut am: distributor_product::ActiveModel = a.into();
            am.is_active = Set(true);
            am.assigned_at = Set(now.into());
            am.removed_at = Set(None);
            am.update(&txn).await?
        }
        None => {
            distributor_product::ActiveModel {
                id: Set(Uuid::new_v4()),
                distributor_id: Set(d.id),
                product_id: Set(product_id),
                is_active: Set(true),
                assigned_at: Set(now.into()),
                removed_at: Set(None),
            }
            .insert(&txn)
            .await?
        }
    };
    txn.commit().await?;
    info!(distributor_id = %d.id, %product_id, "product_selected");
    Ok(saved)
}

pub(crate) async fn remove_for<C: ConnectionTrait>(db: &C, distributor_id: Uuid, product_id: Uuid) -> ServiceResult<()> {
    let a = distributor_product::Entity::find()
        .filter(distributor_product::Column::DistributorId.eq(distributor_id))
        .filter(distributor_product::Column::ProductId.eq(product_id))
        .filter(distributor_product::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("selected product"))?;
    let mut am: distributor_product::ActiveModel = a.into();
    am.is_active = Set(false);
    am.removed_at = Set(Some(Utc::now().into()));
    am.update(db).await?;
    info!(%distributor_id, %product_id, "product_unselected");
    Ok(())
}

pub async fn selected(db: &DatabaseConnection, user_id: Uuid, location_id: Option<Uuid>) -> ServiceResult<Vec<SelectedProduct>> {
    let target = access::resolve_target(db, user_id, location_id).await?;
    selected_for(db, target.id).await
}

#[instrument(skip(db))]
pub async fn add(db: &DatabaseConnection, user_id: Uuid, location_id: Option<Uuid>, product_id: Uuid) -> ServiceResult<distributor_product::Model> {
    let target = access::resolve_target(db, user_id, location_id).await?;
    add_for(db, &target, product_id).await
}

#[instrument(skip(db))]
pub async fn remove(db: &DatabaseConnection, user_id: Uuid, location_id: Option<Uuid>, product_id: Uuid) -> ServiceResult<()> {
    let target = access::resolve_target(db, user_id, location_id).await?;
    remove_for(db, target.id, product_id).await
}
