use sea_orm::{entity::prelude::*, Set, ConnectionTrait};
use uuid::Uuid;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors;

/// Role of an account; decides which route groups it may reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum UserRole {
    #[sea_orm(string_value = "Consumer")]
    Consumer,
    #[sea_orm(string_value = "Distributor")]
    Distributor,
    #[sea_orm(string_value = "Manufacturer")]
    Manufacturer,
    #[sea_orm(string_value = "Admin")]
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Consumer => "Consumer",
            UserRole::Distributor => "Distributor",
            UserRole::Manufacturer => "Manufacturer",
            UserRole::Admin => "Admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Consumer" => Some(UserRole::Consumer),
            "Distributor" => Some(UserRole::Distributor),
            "Manufacturer" => Some(UserRole::Manufacturer),
            "Admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub company_name: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub last_login_at: Option<DateTimeWithTimeZone>,
    pub lockout_end: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match *self {}
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name).trim().to_string()
    }

    pub fn is_locked_out(&self, now: chrono::DateTime<Utc>) -> bool {
        matches!(self.lockout_end, Some(end) if end > now)
    }
}

/// Lockout end used for accounts whose contract has been fully cancelled.
pub fn permanent_lockout() -> DateTimeWithTimeZone {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).single().unwrap_or_else(Utc::now).into()
}

pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    let trimmed = email.trim();
    let valid = trimmed.len() <= 255
        && trimmed.split_once('@').map(|(l, d)| !l.is_empty() && d.contains('.')).unwrap_or(false);
    if !valid { return Err(errors::ModelError::Validation("invalid email".into())); }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("name required".into())); }
    if name.len() > 100 { return Err(errors::ModelError::Validation("name too long (<=100)".into())); }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: UserRole,
    company_name: Option<String>,
) -> Result<Model, errors::ModelError> {
    validate_email(email)?;
    validate_name(first_name)?;
    validate_name(last_name)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.trim().to_lowercase()),
        first_name: Set(first_name.trim().to_string()),
        last_name: Set(last_name.trim().to_string()),
        role: Set(role),
        company_name: Set(company_name.filter(|c| !c.trim().is_empty())),
        created_at: Set(Utc::now().into()),
        last_login_at: Set(None),
        lockout_end: Set(None),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Lock the account until `permanent_lockout()`.
pub async fn lock_out<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), errors::ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?
        .ok_or_else(|| errors::ModelError::Validation("user not found".into()))?
        .into();
    found.lockout_end = Set(Some(permanent_lockout()));
    found.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("plain").is_err());
        assert!(validate_email("a@localhost").is_err());
    }

    #[test]
    fn lockout_respects_end_date() {
        let now = Utc::now();
        let mut u = Model {
            id: Uuid::new_v4(),
            email: "x@y.jp".into(),
            first_name: "Taro".into(),
            last_name: "Yamada".into(),
            role: UserRole::Distributor,
            company_name: None,
            created_at: now.into(),
            last_login_at: None,
            lockout_end: None,
        };
        assert!(!u.is_locked_out(now));
        u.lockout_end = Some(permanent_lockout());
        assert!(u.is_locked_out(now));
        u.lockout_end = Some((now - chrono::Duration::minutes(1)).into());
        assert!(!u.is_locked_out(now));
        assert_eq!(u.display_name(), "Yamada Taro");
    }

    #[test]
    fn role_round_trips_through_str() {
        for r in [UserRole::Consumer, UserRole::Distributor, UserRole::Manufacturer, UserRole::Admin] {
            assert_eq!(UserRole::parse(r.as_str()), Some(r));
        }
        assert_eq!(UserRole::parse("Root"), None);
    }
}
