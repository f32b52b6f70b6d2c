//! Payout records for distributors (commission) and manufacturers
//! (wholesale value of sold items).
use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{ServiceError, ServiceResult};
use models::settlement::{self, SettlementStatus, SettlementType};
use models::{order_item, product, sale};

#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    pub settlements: Vec<settlement::Model>,
    pub pending_total: i64,
    pub completed_total: i64,
}

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
        .unwrap_or(now)
}

pub async fn list(db: &DatabaseConnection) -> ServiceResult<SettlementReport> {
    let settlements = settlement::Entity::find()
        .order_by_desc(settlement::Column::CreatedAt)
        .all(db)
        .await?;
    let sum = |status: SettlementStatus| settlements.iter().filter(|s| s.status == status).map(|s| s.amount).sum::<i64>();
    Ok(SettlementReport {
        pending_total: sum(SettlementStatus::Pending),
        completed_total: sum(SettlementStatus::Completed),
        settlements,
    })
}

/// Settle every unsettled sale in `[period_start, period_end)`.
#[instrument(skip(db))]
pub async fn generate(db: &DatabaseConnection, period_start: DateTime<Utc>, period_end: DateTime<Utc>) -> ServiceResult<Vec<settlement::Model>> {
    if period_start >= period_end {
        return Err(ServiceError::validation("period_start must be before period_end"));
    }
    let txn = db.begin().await?;
    let sales = sale::Entity::find()
        .filter(sale::Column::IsSettled.eq(false))
        .filter(sale::Column::SaleDate.gte(DateTimeWithTimeZone::from(period_start)))
        .filter(sale::Column::SaleDate.lt(DateTimeWithTimeZone::from(period_end)))
        .all(&txn)
        .await?;
    if sales.is_empty() {
        txn.commit().await?;
        return Ok(Vec::new());
    }

    let mut commissions: HashMap<Uuid, i64> = HashMap::new();
    for s in &sales {
        if let Some(d) = s.distributor_id {
            *commissions.entry(d).or_default() += s.distributor_commission;
        }
    }

    let order_ids: Vec<Uuid> = sales.iter().map(|s| s.order_id).collect();
    let lines = order_item::Entity::find()
        .find_also_related(product::Entity)
        .filter(order_item::Column::OrderId.is_in(order_ids))
        .all(&txn)
        .await?;
    let mut wholesale: HashMap<Uuid, i64> = HashMap::new();
    for (line, p) in lines {
        if let Some(p) = p {
            *wholesale.entry(p.manufacturer_id).or_default() += p.wholesale_price * line.quantity as i64;
        }
    }

    let now = Utc::now();
    let mut created = Vec::new();
    let entries = commissions
        .into_iter()
        .map(|(id, amount)| (None, Some(id), amount, SettlementType::DistributorCommission))
        .chain(wholesale.into_iter().map(|(id, amount)| (Some(id), None, amount, SettlementType::ManufacturerSales)));
    for (manufacturer_id, distributor_id, amount, kind) in entries {
        created.push(
            settlement::ActiveModel {
                id: Set(Uuid::new_v4()),
                manufacturer_id: Set(manufacturer_id),
                distributor_id: Set(distributor_id),
                amount: Set(amount),
                settlement_type: Set(kind),
                period_start: Set(period_start.into()),
                period_end: Set(period_end.into()),
                status: Set(SettlementStatus::Pending),
                processed_date: Set(None),
                notes: Set(None),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await?,
        );
    }

    let settled = sales.len();
    for s in sales {
        let mut am: sale::ActiveModel = s.into();
        am.is_settled = Set(true);
        am.settlement_date = Set(Some(now.into()));
        am.update(&txn).await?;
    }
    txn.commit().await?;
    info!(settlements = created.len(), sales = settled, "settlements_generated");
    Ok(created)
}

#[instrument(skip(db))]
pub async fn process(db: &DatabaseConnection, id: Uuid) -> ServiceResult<settlement::Model> {
    let s = settlement::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("settlement"))?;
    if s.status != SettlementStatus::Pending {
        return Err(ServiceError::validation("only pending settlements can be processed"));
    }
    let mut am: settlement::ActiveModel = s.into();
    am.status = Set(SettlementStatus::Completed);
    am.processed_date = Set(Some(Utc::now().into()));
    let updated = am.update(db).await?;
    info!(settlement_id = %id, amount = updated.amount, "settlement_processed");
    Ok(updated)
}
