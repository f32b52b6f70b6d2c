//! Per-location QR codes and the products listed behind them.
use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::access;
use crate::distributor_products::{self, CatalogFilter, CatalogProduct};
use crate::errors::{ServiceError, ServiceResult};
use crate::qr_image;
use models::{distributor, product, qr_code, qr_code_product, sale};

/// Where storefront links point and where their PNGs live.
#[derive(Debug, Clone)]
pub struct QrOptions {
    pub base_url: String,
    pub qr_dir: PathBuf,
}

impl QrOptions {
    pub fn shop_url(&self, code: &str) -> String {
        format!("{}/shop/{}", self.base_url.trim_end_matches('/'), code)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QrCodeView {
    #[serde(flatten)]
    pub qr: qr_code::Model,
    pub shop_url: String,
    pub product_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrProduct {
    pub assignment: qr_code_product::Model,
    pub product: product::Model,
    pub profit_margin: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrProducts {
    pub qr_code_id: Uuid,
    pub selection_limit: i32,
    pub assigned: Vec<QrProduct>,
    pub available: Vec<CatalogProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddQrProductInput {
    pub product_id: Uuid,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub struct QrDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

async fn view(db: &DatabaseConnection, opts: &QrOptions, qr: qr_code::Model) -> ServiceResult<QrCodeView> {
    let product_count = qr_code_product::Entity::find()
        .filter(qr_code_product::Column::QrCodeId.eq(qr.id))
        .filter(qr_code_product::Column::IsActive.eq(true))
        .count(db)
        .await?;
    Ok(QrCodeView { shop_url: opts.shop_url(&qr.code), product_count, qr })
}

pub async fn list(db: &DatabaseConnection, opts: &QrOptions, user_id: Uuid, location_id: Option<Uuid>) -> ServiceResult<Vec<QrCodeView>> {
    let target = access::resolve_target(db, user_id, location_id).await?;
    let rows = qr_code::Entity::find()
        .filter(qr_code::Column::DistributorId.eq(target.id))
        .order_by_desc(qr_code::Column::CreatedAt)
        .all(db)
        .await?;
    let mut out = Vec::with_capacity(rows.len());
    for qr in rows {
        out.push(view(db, opts, qr).await?);
    }
    Ok(out)
}

async fn unused_code(db: &DatabaseConnection) -> ServiceResult<String> {
    for _ in 0..16 {
        let code = qr_code::new_code();
        let taken = qr_code::Entity::find().filter(qr_code::Column::Code.eq(code.as_str())).count(db).await?;
        if taken == 0 {
            return Ok(code);
        }
    }
    Err(ServiceError::conflict("could not allocate a unique qr code"))
}

const ONE_PER_LOCATION: &str = "this location already has a qr code";

/// Issue the location's QR code and write its PNG.
#[instrument(skip(db, opts))]
pub async fn generate(db: &DatabaseConnection, opts: &QrOptions, user_id: Uuid, location_id: Option<Uuid>, location: String) -> ServiceResult<QrCodeView> {
    let target = access::resolve_target(db, user_id, location_id).await?;
    let location = location.trim().to_string();
    if location.is_empty() {
        return Err(ServiceError::validation("location is required"));
    }
    let existing = qr_code::Entity::find()
        .filter(qr_code::Column::DistributorId.eq(target.id))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(ServiceError::conflict(ONE_PER_LOCATION));
    }

    let code = unused_code(db).await?;
    // the unique index on distributor_id settles concurrent issuers
    let created = qr_code::ActiveModel {
        id: Set(Uuid::new_v4()),
        distributor_id: Set(target.id),
        code: Set(code.clone()),
        location: Set(Some(location)),
        image_url: Set(Some(format!("/qrcodes/{code}.png"))),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        deactivated_at: Set(None),
    }
    .insert(db)
    .await
    .map_err(|e| ServiceError::unique_or_db(e, ONE_PER_LOCATION))?;
    qr_image::write_png(&opts.qr_dir, &code, &opts.shop_url(&code)).await?;
    info!(qr_id = %created.id, code = %created.code, distributor_id = %target.id, "qr_code_generated");
    view(db, opts, created).await
}

#[instrument(skip(db))]
pub async fn deactivate(db: &DatabaseConnection, user_id: Uuid, qr_id: Uuid) -> ServiceResult<qr_code::Model> {
    let qr = access::require_qr_code(db, user_id, qr_id).await?;
    let mut am: qr_code::ActiveModel = qr.into();
    am.is_active = Set(false);
    am.deactivated_at = Set(Some(Utc::now().into()));
    let updated = am.update(db).await?;
    info!(%qr_id, "qr_code_deactivated");
    Ok(updated)
}

#[instrument(skip(db))]
pub async fn activate(db: &DatabaseConnection, user_id: Uuid, qr_id: Uuid) -> ServiceResult<qr_code::Model> {
    let qr = access::require_qr_code(db, user_id, qr_id).await?;
    let others = qr_code::Entity::find()
        .filter(qr_code::Column::DistributorId.eq(qr.distributor_id))
        .filter(qr_code::Column::IsActive.eq(true))
        .filter(qr_code::Column::Id.ne(qr.id))
        .count(db)
        .await?;
    if others > 0 {
        return Err(ServiceError::conflict("location already has an active qr code"));
    }
    let mut am: qr_code::ActiveModel = qr.into();
    am.is_active = Set(true);
    am.deactivated_at = Set(None);
    let updated = am.update(db).await?;
    info!(%qr_id, "qr_code_activated");
    Ok(updated)
}

/// Hard delete together with its product assignments and PNG.
#[instrument(skip(db, opts))]
pub async fn delete(db: &DatabaseConnection, opts: &QrOptions, user_id: Uuid, qr_id: Uuid) -> ServiceResult<()> {
    let qr = access::require_qr_code(db, user_id, qr_id).await?;
    qr_code_product::Entity::delete_many()
        .filter(qr_code_product::Column::QrCodeId.eq(qr.id))
        .exec(db)
        .await?;
    sale::Entity::update_many()
        .col_expr(sale::Column::QrCodeId, Expr::value(Option::<Uuid>::None))
        .filter(sale::Column::QrCodeId.eq(qr.id))
        .exec(db)
        .await?;
    qr_code::Entity::delete_by_id(qr.id).exec(db).await?;
    let path = qr_image::png_path(&opts.qr_dir, &qr.code);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "qr png not removed");
        }
    }
    info!(%qr_id, "qr_code_deleted");
    Ok(())
}

/// PNG bytes for printing; re-rendered when the file is gone.
pub async fn download(db: &DatabaseConnection, opts: &QrOptions, user_id: Uuid, qr_id: Uuid) -> ServiceResult<QrDownload> {
    let qr = access::require_qr_code(db, user_id, qr_id).await?;
    let path = qr_image::png_path(&opts.qr_dir, &qr.code);
    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(_) => qr_image::write_png(&opts.qr_dir, &qr.code, &opts.shop_url(&qr.code)).await?,
    };
    let label = qr.location.clone().unwrap_or_else(|| "shelf".into());
    Ok(QrDownload { file_name: format!("QRCode_{}_{}.png", label, qr.code), bytes })
}

pub async fn products(db: &DatabaseConnection, user_id: Uuid, qr_id: Uuid) -> ServiceResult<QrProducts> {
    let qr = access::require_qr_code(db, user_id, qr_id).await?;
    let owner = distributor::Entity::find_by_id(qr.distributor_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("distributor"))?;
    let rows = qr_code_product::Entity::find()
        .find_also_related(product::Entity)
        .filter(qr_code_product::Column::QrCodeId.eq(qr.id))
        .filter(qr_code_product::Column::IsActive.eq(true))
        .order_by_asc(qr_code_product::Column::DisplayOrder)
        .all(db)
        .await?;
    let assigned: Vec<QrProduct> = rows
        .into_iter()
        .filter_map(|(a, p)| p.map(|p| QrProduct { profit_margin: p.profit_margin(), assignment: a, product: p }))
        .collect();
    let taken: HashSet<Uuid> = assigned.iter().map(|a| a.product.id).collect();
    let available = distributor_products::catalog(db, CatalogFilter::default())
        .await?
        .into_iter()
        .filter(|c| !taken.contains(&c.product.id))
        .collect();
    Ok(QrProducts { qr_code_id: qr.id, selection_limit: owner.product_selection_count, assigned, available })
}

#[instrument(skip(db, input), fields(product_id = %input.product_id))]
pub async fn add_product(db: &DatabaseConnection, user_id: Uuid, qr_id: Uuid, input: AddQrProductInput) -> ServiceResult<qr_code_product::Model> {
    let qr = access::require_qr_code(db, user_id, qr_id).await?;
    let p = product::Entity::find_by_id(input.product_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("product"))?;
    if !p.is_active {
        return Err(ServiceError::validation("product is not available"));
    }

    let txn = db.begin().await?;
    let owner = distributor::Entity::find_by_id(qr.distributor_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("distributor"))?;
    let active = qr_code_product::Entity::find()
        .filter(qr_code_product::Column::QrCodeId.eq(qr.id))
        .filter(qr_code_product::Column::IsActive.eq(true))
        .count(&txn)
        .await?;
    if active >= owner.product_selection_count.max(0) as u64 {
        return Err(ServiceError::validation(format!("selection limit of {} products reached", owner.product_selection_count)));
    }
    let existing = qr_code_product::Entity::find()
        .filter(qr_code_product::Column::QrCodeId.eq(qr.id))
        .filter(qr_code_product::Column::ProductId.eq(p.id))
        .one(&txn)
        .await?;
    let now = Utc::now();
    let display_order = input.display_order.unwrap_or(active as i32);
    let saved = match existing {
        Some(a) if a.is_active => return Err(ServiceError::conflict("product already on this qr code")),
        Some(a) => {
            let mut am: qr_code_product::ActiveModel = a.into();
            am.is_active = Set(true);
            am.display_order = Set(display_order);
            am.assigned_at = Set(now.into());
            am.removed_at = Set(None);
            am.notes = Set(input.notes);
            am.update(&txn).await?
        }
        None => {
            qr_code_product::ActiveModel {
                id: Set(Uuid::new_v4()),
                qr_code_id: Set(qr.id),
                product_id: Set(p.id),
                is_active: Set(true),
                display_order: Set(display_order),
                assigned_at: Set(now.into()),
                removed_at: Set(None),
                notes: Set(input.notes),
            }
            .insert(&txn)
            .await?
        }
    };
    txn.commit().await?;
    info!(%qr_id, product_id = %p.id, "qr_product_added");
    Ok(saved)
}

#[instrument(skip(db))]
pub async fn remove_product(db: &DatabaseConnection, user_id: Uuid, qr_id: Uuid, product_id: Uuid) -> ServiceResult<()> {
    let qr = access::require_qr_code(db, user_id, qr_id).await?;
    let a = qr_code_product::Entity::find()
        .filter(qr_code_product::Column::QrCodeId.eq(qr.id))
        .filter(qr_code_product::Column::ProductId.eq(product_id))
        .filter(qr_code_product::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("qr product"))?;
    let mut am: qr_code_product::ActiveModel = a.into();
    am.is_active = Set(false);
    am.removed_at = Set(Some(Utc::now().into()));
    am.update(db).await?;
    info!(%qr_id, %product_id, "qr_product_removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, individual_location, manufacturer_with_products};

    fn opts() -> QrOptions {
        QrOptions {
            base_url: "http://shop.test/".into(),
            qr_dir: std::env::temp_dir().join(format!("shelfup-qr-{}", Uuid::new_v4())),
        }
    }

    #[tokio::test]
    async fn one_qr_code_per_location() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let opts = opts();
        let (u, _) = individual_location(&db).await?;

        assert!(matches!(generate(&db, &opts, u.id, None, "  ".into()).await, Err(ServiceError::Validation(_))));
        let qr = generate(&db, &opts, u.id, None, "Register".into()).await?;
        assert_eq!(qr.qr.code.len(), 8);
        assert_eq!(qr.shop_url, format!("http://shop.test/shop/{}", qr.qr.code));
        assert_eq!(qr.qr.image_url.as_deref(), Some(format!("/qrcodes/{}.png", qr.qr.code).as_str()));
        assert!(qr_image::png_path(&opts.qr_dir, &qr.qr.code).exists());

        deactivate(&db, u.id, qr.qr.id).await?;
        assert!(matches!(generate(&db, &opts, u.id, None, "Door".into()).await, Err(ServiceError::Conflict(_))));
        let back = activate(&db, u.id, qr.qr.id).await?;
        assert!(back.is_active && back.deactivated_at.is_none());

        let file = download(&db, &opts, u.id, qr.qr.id).await?;
        assert_eq!(file.file_name, format!("QRCode_Register_{}.png", qr.qr.code));

        delete(&db, &opts, u.id, qr.qr.id).await?;
        assert!(list(&db, &opts, u.id, None).await?.is_empty());
        let _ = std::fs::remove_dir_all(&opts.qr_dir);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_issuers_get_one_qr_code() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let opts = opts();
        let (u, d) = individual_location(&db).await?;

        let (a, b) = tokio::join!(
            generate(&db, &opts, u.id, None, "Counter".into()),
            generate(&db, &opts, u.id, None, "Window".into()),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(a.err().or(b.err()), Some(ServiceError::Conflict(_))));
        let rows = qr_code::Entity::find()
            .filter(qr_code::Column::DistributorId.eq(d.id))
            .count(&db)
            .await?;
        assert_eq!(rows, 1);
        let _ = std::fs::remove_dir_all(&opts.qr_dir);
        Ok(())
    }

    #[tokio::test]
    async fn foreign_qr_code_is_forbidden() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let opts = opts();
        let (owner, _) = individual_location(&db).await?;
        let (other, _) = individual_location(&db).await?;
        let qr = generate(&db, &opts, owner.id, None, "Shelf".into()).await?;
        assert!(matches!(deactivate(&db, other.id, qr.qr.id).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(deactivate(&db, other.id, Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
        let _ = std::fs::remove_dir_all(&opts.qr_dir);
        Ok(())
    }

    #[tokio::test]
    async fn qr_products_respect_quota() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let opts = opts();
        let (u, d) = individual_location(&db).await?;
        let (_, products) = manufacturer_with_products(&db, &["Dorayaki", "Mochi"]).await?;
        let mut am: distributor::ActiveModel = d.into();
        am.product_selection_count = Set(1);
        am.update(&db).await?;
        let qr = generate(&db, &opts, u.id, None, "Front".into()).await?;

        let input = |id| AddQrProductInput { product_id: id, display_order: None, notes: None };
        add_product(&db, u.id, qr.qr.id, input(products[0].id)).await?;
        assert!(matches!(add_product(&db, u.id, qr.qr.id, input(products[0].id)).await, Err(ServiceError::Validation(_))));

        let listing = products_view(&db, u.id, qr.qr.id).await?;
        assert_eq!(listing.assigned.len(), 1);
        assert_eq!(listing.available.len(), 1);
        assert_eq!(listing.assigned[0].profit_margin, 40.0);

        remove_product(&db, u.id, qr.qr.id, products[0].id).await?;
        add_product(&db, u.id, qr.qr.id, input(products[1].id)).await?;
        let _ = std::fs::remove_dir_all(&opts.qr_dir);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_qr_listings_stop_at_quota() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let opts = opts();
        let (u, d) = individual_location(&db).await?;
        let (_, products) = manufacturer_with_products(&db, &["Taiyaki", "Ramune"]).await?;
        let mut am: distributor::ActiveModel = d.into();
        am.product_selection_count = Set(1);
        am.update(&db).await?;
        let qr = generate(&db, &opts, u.id, None, "Front".into()).await?;

        let input = |id| AddQrProductInput { product_id: id, display_order: None, notes: None };
        let (a, b) = tokio::join!(
            add_product(&db, u.id, qr.qr.id, input(products[0].id)),
            add_product(&db, u.id, qr.qr.id, input(products[1].id)),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(products_view(&db, u.id, qr.qr.id).await?.assigned.len(), 1);
        let _ = std::fs::remove_dir_all(&opts.qr_dir);
        Ok(())
    }

    async fn products_view(db: &DatabaseConnection, user_id: Uuid, qr_id: Uuid) -> ServiceResult<QrProducts> {
        products(db, user_id, qr_id).await
    }
}
