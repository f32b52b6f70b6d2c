use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::distributor;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "qr_code")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub distributor_id: Uuid,
    pub code: String,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub deactivated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Distributor }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Distributor => Entity::belongs_to(distributor::Entity)
                .from(Column::DistributorId)
                .to(distributor::Column::Id)
                .into(),
        }
    }
}

impl Related<distributor::Entity> for Entity {
    fn to() -> RelationDef { Relation::Distributor.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Short storefront code: the first eight hex digits of a fresh UUID, upper-cased.
pub fn new_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::new_code;

    #[test]
    fn code_is_eight_upper_hex() {
        let c = new_code();
        assert_eq!(c.len(), 8);
        assert!(c.chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_lowercase()));
    }
}
