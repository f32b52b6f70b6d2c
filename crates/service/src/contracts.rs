//! Distributor contracts: signup, chain upgrade/downgrade and the
//! cancellation lifecycle (request, shelf return, extension, completion).
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::access;
use crate::errors::{ServiceError, ServiceResult};
use crate::settings::{self, keys};
use models::company::{self, CompanyType};
use models::distributor::{self, ContractStatus, DistributorType, ShelfReturnStatus, SHELF_RETURN_WINDOW_DAYS};
use models::{distributor_product, qr_code, qr_code_product, sale, user};

/// Signup form for a new location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContractInput {
    pub company_name: String,
    pub location_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Joins an existing chain as a store when present.
    #[serde(default)]
    pub head_office_code: Option<String>,
}

/// A location with the contract values derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct ContractView {
    #[serde(flatten)]
    pub distributor: distributor::Model,
    pub contract_maturity_date: Option<DateTime<Utc>>,
    pub can_cancel: bool,
    pub can_extend: bool,
    pub shelf_return_overdue: bool,
    pub effective_shelf_count: i64,
    pub effective_product_selection_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementSummary {
    pub distributor_id: Uuid,
    pub sales_count: u64,
    pub total_sales: i64,
    pub total_commission: i64,
}

pub async fn contract_view<C: ConnectionTrait>(db: &C, d: distributor::Model) -> ServiceResult<ContractView> {
    let now = Utc::now();
    let (company_type, active) = access::company_context(db, &d).await?;
    Ok(ContractView {
        contract_maturity_date: d.contract_maturity_date(),
        can_cancel: d.can_cancel_contract(now),
        can_extend: d.can_extend_contract(),
        shelf_return_overdue: d.is_shelf_return_overdue(now),
        effective_shelf_count: d.effective_shelf_count(company_type, active),
        effective_product_selection_count: d.effective_product_selection_count(company_type, active),
        distributor: d,
    })
}

/// Sign a new location up.
///
/// With a head office code the location joins that chain as a store,
/// otherwise an individual company is opened for it.
#[instrument(skip(db, input), fields(company = %input.company_name))]
pub async fn new_contract(db: &DatabaseConnection, user_id: Uuid, input: NewContractInput) -> ServiceResult<distributor::Model> {
    if !access::user_distributors(db, user_id).await?.is_empty() {
        return Err(ServiceError::conflict("user already has an active contract"));
    }
    let company_name = input.company_name.trim();
    let location_name = input.location_name.trim();
    if company_name.is_empty() {
        return Err(ServiceError::validation("company name required"));
    }
    if location_name.is_empty() {
        return Err(ServiceError::validation("location name required"));
    }

    let shelf_count = settings::get_int(db, keys::DEFAULT_SHELF_COUNT, 1).await?;
    let selection_count = settings::get_int(db, keys::DEFAULT_PRODUCT_SELECTION_COUNT, 10).await?;
    let now = Utc::now();

    let txn = db.begin().await?;
    let (company_id, distributor_type, parent_id, fee) = match input.head_office_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => {
            company::validate_head_office_code(code)?;
            let chain = company::Entity::find()
                .filter(company::Column::HeadOfficeCode.eq(code))
                .filter(company::Column::IsActive.eq(true))
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("company for head office code"))?;
            let parent = distributor::Entity::find()
                .filter(distributor::Column::CompanyId.eq(chain.id))
                .filter(distributor::Column::DistributorType.eq(DistributorType::HeadOffice))
                .one(&txn)
                .await?
                .map(|d| d.id);
            let fee = settings::get_int(&txn, keys::MONTHLY_FEE_CHAIN_STORE, 4000).await?;
            (chain.id, DistributorType::Store, parent, fee)
        }
        _ => {
            let code = access::generate_unique_company_code(&txn).await?;
            let created = company::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(company_name.to_string()),
                headquarters_address: Set(input.address.clone()),
                phone: Set(input.phone.clone()),
                email: Set(None),
                company_type: Set(CompanyType::Individual),
                head_office_code: Set(code),
                owner_user_id: Set(user_id),
                is_active: Set(true),
                created_at: Set(now.into()),
                updated_at: Set(None),
            }
            .insert(&txn)
            .await?;
            let fee = settings::get_int(&txn, keys::MONTHLY_FEE_INDIVIDUAL, 5000).await?;
            (created.id, DistributorType::Individual, None, fee)
        }
    };

    let created = distributor::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        company_name: Set(company_name.to_string()),
        address: Set(input.address),
        phone: Set(input.phone),
        location_name: Set(Some(location_name.to_string())),
        is_headquarters: Set(false),
        company_id: Set(Some(company_id)),
        distributor_type: Set(distributor_type),
        parent_distributor_id: Set(parent_id),
        shelf_count: Set(shelf_count as i32),
        product_selection_count: Set(selection_count as i32),
        monthly_fee: Set(fee),
        contract_start_date: Set(Some(now.into())),
        contract_end_date: Set(None),
        cancellation_request_date: Set(None),
        shelf_return_due_date: Set(None),
        shelf_returned_date: Set(None),
        shelf_return_status: Set(ShelfReturnStatus::NotRequired),
        contract_status: Set(ContractStatus::Active),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(None),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(distributor_id = %created.id, %user_id, kind = ?created.distributor_type, "contract_created");
    Ok(created)
}

/// Turn a location into the head office of a chain.
#[instrument(skip(db))]
pub async fn upgrade_to_chain(db: &DatabaseConnection, user_id: Uuid, location_id: Option<Uuid>) -> ServiceResult<(distributor::Model, company::Model)> {
    let target = access::resolve_target(db, user_id, location_id).await?;
    match target.distributor_type {
        DistributorType::Store => return Err(ServiceError::validation("chain stores cannot become a head office")),
        DistributorType::HeadOffice => return Err(ServiceError::conflict("location is already a head office")),
        DistributorType::Individual => {}
    }
    let fee = settings::get_int(db, keys::MONTHLY_FEE_HEAD_OFFICE, 6000).await?;
    let now = Utc::now();

    let txn = db.begin().await?;
    let existing = match target.company_id {
        Some(id) => company::Entity::find_by_id(id).one(&txn).await?,
        None => None,
    };
    let chain = match existing {
        Some(c) => {
            let mut am: company::ActiveModel = c.into();
            am.company_type = Set(CompanyType::Chain);
            am.updated_at = Set(Some(now.into()));
            am.update(&txn).await?
        }
        None => {
            let code = access::generate_unique_company_code(&txn).await?;
            company::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(target.company_name.clone()),
                headquarters_address: Set(target.address.clone()),
                phone: Set(target.phone.clone()),
                email: Set(None),
                company_type: Set(CompanyType::Chain),
                head_office_code: Set(code),
                owner_user_id: Set(user_id),
                is_active: Set(true),
                created_at: Set(now.into()),
                updated_at: Set(None),
            }
            .insert(&txn)
            .await?
        }
    };
    let mut am: distributor::ActiveModel = target.into();
    am.distributor_type = Set(DistributorType::HeadOffice);
    am.is_headquarters = Set(true);
    am.company_id = Set(Some(chain.id));
    am.monthly_fee = Set(fee);
    am.updated_at = Set(Some(now.into()));
    let updated = am.update(&txn).await?;
    txn.commit().await?;

    info!(distributor_id = %updated.id, company_id = %chain.id, "upgraded_to_chain");
    Ok((updated, chain))
}

/// Turn a head office back into an individual location. Not possible while
/// the chain still has stores.
#[instrument(skip(db))]
pub async fn downgrade_to_individual(db: &DatabaseConnection, user_id: Uuid, location_id: Option<Uuid>) -> ServiceResult<distributor::Model> {
    let target = access::resolve_target(db, user_id, location_id).await?;
    if target.distributor_type != DistributorType::HeadOffice {
        return Err(ServiceError::validation("location is not a head office"));
    }
    if let Some(company_id) = target.company_id {
        let stores = distributor::Entity::find()
            .filter(distributor::Column::CompanyId.eq(company_id))
            .filter(distributor::Column::DistributorType.eq(DistributorType::Store))
            .count(db)
            .await?;
        if stores > 0 {
            return Err(ServiceError::conflict(format!("company still has {stores} store location(s)")));
        }
    }
    let fee = settings::get_int(db, keys::MONTHLY_FEE_INDIVIDUAL, 5000).await?;
    let now = Utc::now();

    let txn = db.begin().await?;
    if let Some(company_id) = target.company_id {
        if let Some(c) = company::Entity::find_by_id(company_id).one(&txn).await? {
            let mut am: company::ActiveModel = c.into();
            am.company_type = Set(CompanyType::Individual);
            am.updated_at = Set(Some(now.into()));
            am.update(&txn).await?;
        }
    }
    let mut am: distributor::ActiveModel = target.into();
    am.distributor_type = Set(DistributorType::Individual);
    am.is_headquarters = Set(false);
    am.monthly_fee = Set(fee);
    am.updated_at = Set(Some(now.into()));
    let updated = am.update(&txn).await?;
    txn.commit().await?;

    info!(distributor_id = %updated.id, "downgraded_to_individual");
    Ok(updated)
}

async fn accessible_distributor(db: &DatabaseConnection, user_id: Uuid, distributor_id: Uuid) -> ServiceResult<distributor::Model> {
    let d = distributor::Entity::find_by_id(distributor_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("distributor"))?;
    if !access::has_access_to_distributor(db, user_id, distributor_id).await? {
        return Err(ServiceError::forbidden("no access to this location"));
    }
    Ok(d)
}

/// Ask for cancellation once the minimum term has passed; opens the
/// shelf-return window.
#[instrument(skip(db))]
pub async fn request_cancellation(db: &DatabaseConnection, user_id: Uuid, distributor_id: Uuid) -> ServiceResult<distributor::Model> {
    let d = accessible_distributor(db, user_id, distributor_id).await?;
    let now = Utc::now();
    if !d.can_cancel_contract(now) {
        let reason = match d.contract_maturity_date() {
            Some(m) if d.contract_status == ContractStatus::Active => format!("contract cannot be cancelled before {}", m.format("%Y-%m-%d")),
            _ => "contract is not active".to_string(),
        };
        return Err(ServiceError::Validation(reason));
    }
    let mut am: distributor::ActiveModel = d.into();
    am.contract_status = Set(ContractStatus::CancellationRequested);
    am.cancellation_request_date = Set(Some(now.into()));
    am.shelf_return_due_date = Set(Some((now + Duration::days(SHELF_RETURN_WINDOW_DAYS)).into()));
    am.shelf_return_status = Set(ShelfReturnStatus::Scheduled);
    am.updated_at = Set(Some(now.into()));
    let updated = am.update(db).await?;
    info!(%distributor_id, "cancellation_requested");
    Ok(updated)
}

#[instrument(skip(db))]
pub async fn confirm_shelf_return(db: &DatabaseConnection, user_id: Uuid, distributor_id: Uuid) -> ServiceResult<distributor::Model> {
    let d = accessible_distributor(db, user_id, distributor_id).await?;
    if d.contract_status != ContractStatus::CancellationRequested {
        return Err(ServiceError::validation("no cancellation has been requested"));
    }
    let now = Utc::now();
    let mut am: distributor::ActiveModel = d.into();
    am.shelf_returned_date = Set(Some(now.into()));
    am.shelf_return_status = Set(ShelfReturnStatus::Completed);
    am.contract_status = Set(ContractStatus::PendingShelfReturn);
    am.updated_at = Set(Some(now.into()));
    let updated = am.update(db).await?;
    info!(%distributor_id, "shelf_returned");
    Ok(updated)
}

/// Withdraw a pending cancellation.
#[instrument(skip(db))]
pub async fn extend_contract(db: &DatabaseConnection, user_id: Uuid, distributor_id: Uuid) -> ServiceResult<distributor::Model> {
    let d = accessible_distributor(db, user_id, distributor_id).await?;
    if !d.can_extend_contract() {
        return Err(ServiceError::validation("contract cannot be extended in its current state"));
    }
    let mut am: distributor::ActiveModel = d.into();
    am.contract_status = Set(ContractStatus::Active);
    am.cancellation_request_date = Set(None);
    am.shelf_return_due_date = Set(None);
    am.shelf_returned_date = Set(None);
    am.shelf_return_status = Set(ShelfReturnStatus::NotRequired);
    am.updated_at = Set(Some(Utc::now().into()));
    let updated = am.update(db).await?;
    info!(%distributor_id, "contract_extended");
    Ok(updated)
}

/// Remove a location and everything hanging off it. Sales stay, detached.
pub(crate) async fn purge_location<C: ConnectionTrait>(db: &C, d: &distributor::Model, lock_owner: bool) -> ServiceResult<()> {
    let qr_ids: Vec<Uuid> = qr_code::Entity::find()
        .filter(qr_code::Column::DistributorId.eq(d.id))
        .all(db)
        .await?
        .into_iter()
        .map(|q| q.id)
        .collect();
    if !qr_ids.is_empty() {
        qr_code_product::Entity::delete_many()
            .filter(qr_code_product::Column::QrCodeId.is_in(qr_ids.clone()))
            .exec(db)
            .await?;
        sale::Entity::update_many()
            .col_expr(sale::Column::QrCodeId, Expr::value(Option::<Uuid>::None))
            .filter(sale::Column::QrCodeId.is_in(qr_ids.clone()))
            .exec(db)
            .await?;
        qr_code::Entity::delete_many()
            .filter(qr_code::Column::Id.is_in(qr_ids))
            .exec(db)
            .await?;
    }
    distributor_product::Entity::delete_many()
        .filter(distributor_product::Column::DistributorId.eq(d.id))
        .exec(db)
        .await?;
    sale::Entity::update_many()
        .col_expr(sale::Column::DistributorId, Expr::value(Option::<Uuid>::None))
        .filter(sale::Column::DistributorId.eq(d.id))
        .exec(db)
        .await?;
    distributor::Entity::update_many()
        .col_expr(distributor::Column::ParentDistributorId, Expr::value(Option::<Uuid>::None))
        .filter(distributor::Column::ParentDistributorId.eq(d.id))
        .exec(db)
        .await?;
    distributor::Entity::delete_by_id(d.id).exec(db).await?;
    if lock_owner {
        user::lock_out(db, d.user_id).await?;
    }
    Ok(())
}

/// Finish a cancellation once the shelf is back. A head office takes its
/// whole company with it. Returns the number of locations removed.
#[instrument(skip(db))]
pub async fn complete_cancellation(db: &DatabaseConnection, distributor_id: Uuid) -> ServiceResult<usize> {
    let d = distributor::Entity::find_by_id(distributor_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("distributor"))?;
    if d.shelf_return_status != ShelfReturnStatus::Completed {
        return Err(ServiceError::validation("shelf has not been returned yet"));
    }

    let txn = db.begin().await?;
    let result: ServiceResult<usize> = async {
        match (d.distributor_type, d.company_id) {
            (DistributorType::HeadOffice, Some(company_id)) => {
                let locations = distributor::Entity::find()
                    .filter(distributor::Column::CompanyId.eq(company_id))
                    .order_by_asc(distributor::Column::CreatedAt)
                    .all(&txn)
                    .await?;
                for loc in &locations {
                    purge_location(&txn, loc, true).await?;
                }
                company::Entity::delete_by_id(company_id).exec(&txn).await?;
                Ok(locations.len())
            }
            _ => {
                purge_location(&txn, &d, true).await?;
                Ok(1)
            }
        }
    }
    .await;

    match result {
        Ok(removed) => {
            txn.commit().await?;
            info!(%distributor_id, removed, "cancellation_completed");
            Ok(removed)
        }
        Err(e) => {
            error!(%distributor_id, error = %e, "cancellation rolled back");
            txn.rollback().await?;
            Err(e)
        }
    }
}

#[instrument(skip(db))]
pub async fn mark_shelf_return_overdue(db: &DatabaseConnection, distributor_id: Uuid) -> ServiceResult<distributor::Model> {
    let d = distributor::Entity::find_by_id(distributor_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("distributor"))?;
    if !d.is_shelf_return_overdue(Utc::now()) {
        return Err(ServiceError::validation("shelf return is not past due"));
    }
    let mut am: distributor::ActiveModel = d.into();
    am.shelf_return_status = Set(ShelfReturnStatus::Overdue);
    am.updated_at = Set(Some(Utc::now().into()));
    let updated = am.update(db).await?;
    warn!(%distributor_id, "shelf_return_overdue");
    Ok(updated)
}

/// Every location, newest contract first.
pub async fn list_contracts(db: &DatabaseConnection) -> ServiceResult<Vec<distributor::Model>> {
    Ok(distributor::Entity::find()
        .order_by_desc(distributor::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn settlement_summary(db: &DatabaseConnection, user_id: Uuid, location_id: Option<Uuid>) -> ServiceResult<SettlementSummary> {
    let target = access::resolve_target(db, user_id, location_id).await?;
    let sales = sale::Entity::find()
        .filter(sale::Column::DistributorId.eq(target.id))
        .all(db)
        .await?;
    Ok(SettlementSummary {
        distributor_id: target.id,
        sales_count: sales.len() as u64,
        total_sales: sales.iter().map(|s| s.total_amount).sum(),
        total_commission: sales.iter().map(|s| s.distributor_commission).sum(),
    })
}
