//! Platform administration: overview numbers, listings and moderation.
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{ServiceError, ServiceResult};
use crate::pagination::Pagination;
use crate::settlements::month_start;
use models::sample_order::{self, SampleOrderStatus};
use models::{distributor, manufacturer, order, product, qr_code, sale};

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub active_distributors: u64,
    pub active_manufacturers: u64,
    pub active_products: u64,
    pub monthly_platform_fee: i64,
    pub recent_orders: Vec<order::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: i64,
    pub platform_fee: i64,
    pub sales: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analytics {
    pub month_start: DateTime<Utc>,
    pub days: Vec<DailyRevenue>,
    pub total_revenue: i64,
    pub total_platform_fee: i64,
    pub sale_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscriptions {
    pub distributors: Vec<distributor::Model>,
    pub monthly_revenue: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub sales: Vec<sale::Model>,
    pub total_amount: i64,
    pub total_commission: i64,
    pub total_platform_fee: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrCodeReport {
    pub qr_codes: Vec<qr_code::Model>,
    pub active: usize,
    pub inactive: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleOrderStatusInput {
    pub status: SampleOrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Sales dated in `[since, until]`, oldest first.
async fn sales_between(db: &DatabaseConnection, since: DateTime<Utc>, until: Option<DateTime<Utc>>) -> ServiceResult<Vec<sale::Model>> {
    let mut q = sale::Entity::find().filter(sale::Column::SaleDate.gte(DateTimeWithTimeZone::from(since)));
    if let Some(until) = until {
        q = q.filter(sale::Column::SaleDate.lte(DateTimeWithTimeZone::from(until)));
    }
    Ok(q.order_by_asc(sale::Column::SaleDate).all(db).await?)
}

pub async fn dashboard(db: &DatabaseConnection) -> ServiceResult<AdminDashboard> {
    let active_distributors = distributor::Entity::find().filter(distributor::Column::IsActive.eq(true)).count(db).await?;
    let active_manufacturers = manufacturer::Entity::find().filter(manufacturer::Column::IsActive.eq(true)).count(db).await?;
    let active_products = product::Entity::find().filter(product::Column::IsActive.eq(true)).count(db).await?;
    let monthly_platform_fee = sales_between(db, month_start(Utc::now()), None).await?.iter().map(|s| s.platform_fee).sum();
    let recent_orders = order::Entity::find()
        .order_by_desc(order::Column::CreatedAt)
        .limit(10)
        .all(db)
        .await?;
    Ok(AdminDashboard { active_distributors, active_manufacturers, active_products, monthly_platform_fee, recent_orders })
}

/// Per-day revenue for the month containing `now`.
pub async fn analytics(db: &DatabaseConnection, now: DateTime<Utc>) -> ServiceResult<Analytics> {
    let start = month_start(now);
    let sales = sales_between(db, start, Some(now)).await?;
    let mut per_day: BTreeMap<NaiveDate, DailyRevenue> = BTreeMap::new();
    for s in &sales {
        let date = s.sale_date.with_timezone(&Utc).date_naive();
        let entry = per_day.entry(date).or_insert(DailyRevenue { date, revenue: 0, platform_fee: 0, sales: 0 });
        entry.revenue += s.total_amount;
        entry.platform_fee += s.platform_fee;
        entry.sales += 1;
    }
    Ok(Analytics {
        month_start: start,
        total_revenue: sales.iter().map(|s| s.total_amount).sum(),
        total_platform_fee: sales.iter().map(|s| s.platform_fee).sum(),
        sale_count: sales.len(),
        days: per_day.into_values().collect(),
    })
}

/// One page of distributors, newest first.
pub async fn distributors(db: &DatabaseConnection, page: Pagination) -> ServiceResult<Vec<distributor::Model>> {
    let (idx, per_page) = page.normalize();
    Ok(distributor::Entity::find()
        .order_by_desc(distributor::Column::CreatedAt)
        .paginate(db, per_page)
        .fetch_page(idx)
        .await?)
}

pub async fn manufacturers(db: &DatabaseConnection) -> ServiceResult<Vec<manufacturer::Model>> {
    Ok(manufacturer::Entity::find().order_by_asc(manufacturer::Column::CompanyName).all(db).await?)
}

#[instrument(skip(db))]
pub async fn set_distributor_active(db: &DatabaseConnection, id: Uuid, active: bool) -> ServiceResult<distributor::Model> {
    let d = distributor::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("distributor"))?;
    let mut am: distributor::ActiveModel = d.into();
    am.is_active = Set(active);
    am.updated_at = Set(Some(Utc::now().into()));
    let updated = am.update(db).await?;
    info!(distributor_id = %id, active, "distributor_active_changed");
    Ok(updated)
}

pub async fn subscriptions(db: &DatabaseConnection) -> ServiceResult<Subscriptions> {
    let distributors = distributor::Entity::find()
        .filter(distributor::Column::IsActive.eq(true))
        .order_by_desc(distributor::Column::ContractStartDate)
        .all(db)
        .await?;
    Ok(Subscriptions { monthly_revenue: distributors.iter().map(|d| d.monthly_fee).sum(), distributors })
}

/// Latest 100 sales.
pub async fn sales(db: &DatabaseConnection) -> ServiceResult<SalesReport> {
    let sales = sale::Entity::find()
        .order_by_desc(sale::Column::SaleDate)
        .limit(100)
        .all(db)
        .await?;
    Ok(SalesReport {
        total_amount: sales.iter().map(|s| s.total_amount).sum(),
        total_commission: sales.iter().map(|s| s.distributor_commission).sum(),
        total_platform_fee: sales.iter().map(|s| s.platform_fee).sum(),
        sales,
    })
}

pub async fn qr_codes(db: &DatabaseConnection) -> ServiceResult<QrCodeReport> {
    let qr_codes = qr_code::Entity::find().order_by_desc(qr_code::Column::CreatedAt).all(db).await?;
    let active = qr_codes.iter().filter(|q| q.is_active).count();
    Ok(QrCodeReport { inactive: qr_codes.len() - active, active, qr_codes })
}

pub async fn list_sample_orders(db: &DatabaseConnection) -> ServiceResult<Vec<sample_order::Model>> {
    Ok(sample_order::Entity::find().order_by_desc(sample_order::Column::CreatedAt).all(db).await?)
}

#[instrument(skip(db, input), fields(status = ?input.status))]
pub async fn update_sample_order_status(db: &DatabaseConnection, id: Uuid, input: SampleOrderStatusInput) -> ServiceResult<sample_order::Model> {
    let so = sample_order::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("sample order"))?;
    let now = Utc::now();
    let mut am: sample_order::ActiveModel = so.into();
    am.status = Set(input.status);
    match input.status {
        SampleOrderStatus::Shipped => am.shipped_at = Set(Some(now.into())),
        SampleOrderStatus::Delivered => am.delivered_at = Set(Some(now.into())),
        _ => {}
    }
    if input.notes.is_some() {
        am.notes = Set(input.notes);
    }
    let updated = am.update(db).await?;
    info!(sample_order_id = %id, "sample_order_status_updated");
    Ok(updated)
}
