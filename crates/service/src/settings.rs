//! System-wide settings stored as `(category, key) -> value` rows.
//!
//! Lookups by key ignore the category and take the first match.
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use tracing::{info, instrument};

use crate::errors::{ServiceError, ServiceResult};
use models::system_setting::{self, Entity as Setting};

pub use models::system_setting::keys;

pub async fn get_setting<C: ConnectionTrait>(db: &C, key: &str) -> ServiceResult<Option<system_setting::Model>> {
    Ok(Setting::find()
        .filter(system_setting::Column::Key.eq(key))
        .order_by_asc(system_setting::Column::Category)
        .one(db)
        .await?)
}

pub async fn get_value<C: ConnectionTrait>(db: &C, key: &str) -> ServiceResult<Option<String>> {
    Ok(get_setting(db, key).await?.map(|s| s.value))
}

/// Integer setting, falling back to `default` when absent or unparsable.
pub async fn get_int<C: ConnectionTrait>(db: &C, key: &str, default: i64) -> ServiceResult<i64> {
    Ok(get_value(db, key).await?.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(default))
}

pub async fn get_bool<C: ConnectionTrait>(db: &C, key: &str, default: bool) -> ServiceResult<bool> {
    Ok(get_value(db, key)
        .await?
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        })
        .unwrap_or(default))
}

pub async fn exists<C: ConnectionTrait>(db: &C, key: &str) -> ServiceResult<bool> {
    Ok(Setting::find().filter(system_setting::Column::Key.eq(key)).count(db).await? > 0)
}

pub async fn list_by_category<C: ConnectionTrait>(db: &C, category: &str) -> ServiceResult<Vec<system_setting::Model>> {
    Ok(Setting::find()
        .filter(system_setting::Column::Category.eq(category))
        .order_by_asc(system_setting::Column::Key)
        .all(db)
        .await?)
}

pub async fn list_all<C: ConnectionTrait>(db: &C) -> ServiceResult<Vec<system_setting::Model>> {
    Ok(Setting::find()
        .order_by_asc(system_setting::Column::Category)
        .order_by_asc(system_setting::Column::Key)
        .all(db)
        .await?)
}

/// Insert or update a setting; an absent `description` keeps the stored one.
#[instrument(skip(db, value, description))]
pub async fn set_value<C: ConnectionTrait>(
    db: &C,
    category: &str,
    key: &str,
    value: &str,
    description: Option<String>,
) -> ServiceResult<system_setting::Model> {
    if category.trim().is_empty() || key.trim().is_empty() {
        return Err(ServiceError::validation("category and key required"));
    }
    let now = Utc::now();
    let existing = Setting::find_by_id((category.to_string(), key.to_string())).one(db).await?;
    let saved = match existing {
        Some(found) => {
            let mut am: system_setting::ActiveModel = found.into();
            am.value = Set(value.to_string());
            if description.is_some() {
                am.description = Set(description);
            }
            am.updated_at = Set(Some(now.into()));
            am.update(db).await?
        }
        None => {
            system_setting::ActiveModel {
                category: Set(category.to_string()),
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                description: Set(description),
                updated_at: Set(Some(now.into())),
            }
            .insert(db)
            .await?
        }
    };
    info!(category, key, "setting_updated");
    Ok(saved)
}
