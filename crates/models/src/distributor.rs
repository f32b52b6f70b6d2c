//! Distributor locations and the pure contract rules evaluated on them.
use chrono::{DateTime, Months, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{company, user};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum DistributorType {
    #[sea_orm(string_value = "Individual")]
    Individual,
    #[sea_orm(string_value = "HeadOffice")]
    HeadOffice,
    #[sea_orm(string_value = "Store")]
    Store,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ShelfReturnStatus {
    #[sea_orm(string_value = "NotRequired")]
    NotRequired,
    #[sea_orm(string_value = "Scheduled")]
    Scheduled,
    #[sea_orm(string_value = "Overdue")]
    Overdue,
    #[sea_orm(string_value = "Completed")]
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ContractStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "CancellationRequested")]
    CancellationRequested,
    #[sea_orm(string_value = "PendingShelfReturn")]
    PendingShelfReturn,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    #[sea_orm(string_value = "Suspended")]
    Suspended,
}

/// Minimum contract term before cancellation may be requested.
pub const MINIMUM_TERM_MONTHS: u32 = 12;
/// Days a location has to return its shelf after requesting cancellation.
pub const SHELF_RETURN_WINDOW_DAYS: i64 = 30;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "distributor")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub location_name: Option<String>,
    pub is_headquarters: bool,
    pub company_id: Option<Uuid>,
    pub distributor_type: DistributorType,
    pub parent_distributor_id: Option<Uuid>,
    pub shelf_count: i32,
    pub product_selection_count: i32,
    pub monthly_fee: i64,
    pub contract_start_date: Option<DateTimeWithTimeZone>,
    pub contract_end_date: Option<DateTimeWithTimeZone>,
    pub cancellation_request_date: Option<DateTimeWithTimeZone>,
    pub shelf_return_due_date: Option<DateTimeWithTimeZone>,
    pub shelf_returned_date: Option<DateTimeWithTimeZone>,
    pub shelf_return_status: ShelfReturnStatus,
    pub contract_status: ContractStatus,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
    Company,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
            Relation::Company => Entity::belongs_to(company::Entity).from(Column::CompanyId).to(company::Column::Id).into(),
        }
    }
}

impl Related<company::Entity> for Entity {
    fn to() -> RelationDef { Relation::Company.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Date from which the contract may be cancelled.
    pub fn contract_maturity_date(&self) -> Option<DateTime<Utc>> {
        self.contract_start_date
            .map(|start| start.with_timezone(&Utc))
            .and_then(|start| start.checked_add_months(Months::new(MINIMUM_TERM_MONTHS)))
    }

    pub fn can_cancel_contract(&self, now: DateTime<Utc>) -> bool {
        self.contract_status == ContractStatus::Active
            && matches!(self.contract_maturity_date(), Some(maturity) if maturity <= now)
    }

    /// The cancellation may be withdrawn while the shelf has not come back.
    pub fn can_extend_contract(&self) -> bool {
        self.contract_status == ContractStatus::CancellationRequested
            && self.shelf_return_status != ShelfReturnStatus::Completed
    }

    pub fn is_shelf_return_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.shelf_return_due_date, Some(due) if due < now)
            && self.shelf_return_status != ShelfReturnStatus::Completed
    }

    pub fn is_head_office(&self) -> bool { self.distributor_type == DistributorType::HeadOffice }

    /// Selection quota across the chain for a head office, otherwise the
    /// location's own quota.
    pub fn effective_product_selection_count(&self, company_type: Option<company::CompanyType>, active_locations: u64) -> i64 {
        if self.is_head_office() && company_type == Some(company::CompanyType::Chain) {
            active_locations as i64 * self.product_selection_count as i64
        } else {
            self.product_selection_count as i64
        }
    }

    pub fn effective_shelf_count(&self, company_type: Option<company::CompanyType>, active_locations: u64) -> i64 {
        if self.is_head_office() && company_type == Some(company::CompanyType::Chain) {
            (active_locations as i64).max(1)
        } else {
            self.shelf_count as i64
        }
    }

    pub fn display_location(&self) -> String {
        self.location_name.clone().unwrap_or_else(|| self.company_name.clone())
    }
}
