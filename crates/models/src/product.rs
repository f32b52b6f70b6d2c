use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::ModelError, manufacturer};

pub const MAX_PRICE: i64 = 999_999;
pub const MAX_SHIPPING_FEE: i64 = 9_999;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub manufacturer_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub wholesale_price: i64,
    pub retail_price: i64,
    pub free_shipping_threshold: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub requires_refrigeration: bool,
    pub requires_freezing: bool,
    pub shipping_fee: i64,
    pub stock_quantity: i32,
    pub minimum_order_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Manufacturer }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Manufacturer => Entity::belongs_to(manufacturer::Entity)
                .from(Column::ManufacturerId)
                .to(manufacturer::Column::Id)
                .into(),
        }
    }
}

impl Related<manufacturer::Entity> for Entity {
    fn to() -> RelationDef { Relation::Manufacturer.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Gross margin in percent, rounded to one decimal place.
    pub fn profit_margin(&self) -> f64 {
        profit_margin(self.wholesale_price, self.retail_price)
    }

    pub fn in_stock(&self) -> bool { self.stock_quantity > 0 }
}

pub fn profit_margin(wholesale: i64, retail: i64) -> f64 {
    if retail <= 0 { return 0.0; }
    let pct = (retail - wholesale) as f64 / retail as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Editable product fields, checked against the catalog limits.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub wholesale_price: i64,
    pub retail_price: i64,
    pub free_shipping_threshold: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub requires_refrigeration: bool,
    #[serde(default)]
    pub requires_freezing: bool,
    #[serde(default)]
    pub shipping_fee: i64,
    pub stock_quantity: i32,
    #[serde(default = "default_minimum_order_quantity")]
    pub minimum_order_quantity: i32,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_minimum_order_quantity() -> i32 { 1 }
fn default_is_active() -> bool { true }

impl ProductFields {
    pub fn validate(&self) -> Result<(), ModelError> {
        let name = self.name.trim();
        if name.is_empty() { return Err(ModelError::Validation("product name required".into())); }
        if name.chars().count() > 200 { return Err(ModelError::Validation("product name too long (<=200)".into())); }
        if self.description.as_deref().map(|d| d.chars().count() > 1000).unwrap_or(false) {
            return Err(ModelError::Validation("description too long (<=1000)".into()));
        }
        for (label, v) in [("wholesale_price", self.wholesale_price), ("retail_price", self.retail_price)] {
            if !(0..=MAX_PRICE).contains(&v) {
                return Err(ModelError::Validation(format!("{label} must be within 0..={MAX_PRICE}")));
            }
        }
        if let Some(t) = self.free_shipping_threshold {
            if !(0..=MAX_PRICE).contains(&t) {
                return Err(ModelError::Validation(format!("free_shipping_threshold must be within 0..={MAX_PRICE}")));
            }
        }
        if !(0..=MAX_SHIPPING_FEE).contains(&self.shipping_fee) {
            return Err(ModelError::Validation(format!("shipping_fee must be within 0..={MAX_SHIPPING_FEE}")));
        }
        if self.category.as_deref().map(|c| c.chars().count() > 100).unwrap_or(false) {
            return Err(ModelError::Validation("category too long (<=100)".into()));
        }
        if self.image_url.as_deref().map(|u| u.len() > 500).unwrap_or(false) {
            return Err(ModelError::Validation("image_url too long (<=500)".into()));
        }
        if self.stock_quantity < 0 { return Err(ModelError::Validation("stock_quantity must be >= 0".into())); }
        if self.minimum_order_quantity < 1 { return Err(ModelError::Validation("minimum_order_quantity must be >= 1".into())); }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ProductFields {
        ProductFields {
            name: "Yuzu Ponzu".into(),
            wholesale_price: 600,
            retail_price: 980,
            stock_quantity: 12,
            minimum_order_quantity: 1,
            is_active: true,
            ..Default::default()
        }
    }

    #[test]
    fn margin_rounds_to_one_decimal() {
        assert_eq!(profit_margin(600, 980), 38.8);
        assert_eq!(profit_margin(0, 0), 0.0);
        assert_eq!(profit_margin(500, 1000), 50.0);
    }

    #[test]
    fn valid_fields_pass() {
        assert!(fields().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut f = fields();
        f.retail_price = MAX_PRICE + 1;
        assert!(f.validate().is_err());
        let mut f = fields();
        f.shipping_fee = 10_000;
        assert!(f.validate().is_err());
        let mut f = fields();
        f.minimum_order_quantity = 0;
        assert!(f.validate().is_err());
        let mut f = fields();
        f.name = "   ".into();
        assert!(f.validate().is_err());
    }
}
