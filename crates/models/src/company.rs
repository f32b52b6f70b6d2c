use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::ModelError, user};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum CompanyType {
    #[sea_orm(string_value = "Individual")]
    Individual,
    #[sea_orm(string_value = "Chain")]
    Chain,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub headquarters_address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company_type: CompanyType,
    pub head_office_code: String,
    pub owner_user_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Owner }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::OwnerUserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_chain(&self) -> bool { self.company_type == CompanyType::Chain }
}

/// Head office codes are exactly eight ASCII digits without a leading zero.
pub fn validate_head_office_code(code: &str) -> Result<(), ModelError> {
    let ok = code.len() == 8 && code.chars().all(|c| c.is_ascii_digit()) && !code.starts_with('0');
    if !ok { return Err(ModelError::Validation("head office code must be 8 digits".into())); }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_head_office_code;

    #[test]
    fn head_office_code_shape() {
        assert!(validate_head_office_code("12345678").is_ok());
        assert!(validate_head_office_code("02345678").is_err());
        assert!(validate_head_office_code("1234567").is_err());
        assert!(validate_head_office_code("1234567a").is_err());
    }
}
