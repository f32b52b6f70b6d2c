use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{distributor, order, qr_code};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    /// Null once the selling location has been removed.
    pub distributor_id: Option<Uuid>,
    pub qr_code_id: Option<Uuid>,
    pub total_amount: i64,
    pub distributor_commission: i64,
    pub platform_fee: i64,
    pub sale_date: DateTimeWithTimeZone,
    pub is_settled: bool,
    pub settlement_date: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Order,
    Distributor,
    QrCode,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Order => Entity::belongs_to(order::Entity).from(Column::OrderId).to(order::Column::Id).into(),
            Relation::Distributor => Entity::belongs_to(distributor::Entity)
                .from(Column::DistributorId)
                .to(distributor::Column::Id)
                .into(),
            Relation::QrCode => Entity::belongs_to(qr_code::Entity).from(Column::QrCodeId).to(qr_code::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Integer percentage of an amount in yen, rounded down.
pub fn percent_of(amount: i64, rate_percent: i64) -> i64 {
    amount * rate_percent / 100
}
