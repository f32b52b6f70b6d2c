use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_setting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub category: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match *self {}
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Well-known setting keys.
pub mod keys {
    pub const DEFAULT_SHELF_COUNT: &str = "DEFAULT_SHELF_COUNT";
    pub const DEFAULT_PRODUCT_SELECTION_COUNT: &str = "DEFAULT_PRODUCT_SELECTION_COUNT";
    pub const MONTHLY_FEE_INDIVIDUAL: &str = "MONTHLY_FEE_INDIVIDUAL";
    pub const MONTHLY_FEE_CHAIN_STORE: &str = "MONTHLY_FEE_CHAIN_STORE";
    pub const MONTHLY_FEE_HEAD_OFFICE: &str = "MONTHLY_FEE_HEAD_OFFICE";
    pub const DISTRIBUTOR_COMMISSION_RATE: &str = "DISTRIBUTOR_COMMISSION_RATE";
    pub const PLATFORM_FEE_RATE: &str = "PLATFORM_FEE_RATE";
    pub const DEFAULT_CONTRACT_DURATION_MONTHS: &str = "DEFAULT_CONTRACT_DURATION_MONTHS";
    pub const SYSTEM_NAME: &str = "SYSTEM_NAME";
}
