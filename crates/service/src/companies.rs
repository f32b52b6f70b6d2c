//! Head office views over the locations of a chain.
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access;
use crate::contracts::purge_location;
use crate::distributor_products::{self, SelectedProduct};
use crate::errors::{ServiceError, ServiceResult};
use models::company;
use models::distributor::{self, DistributorType};
use models::{distributor_product, sale};

#[derive(Debug, Clone, Serialize)]
pub struct CompanySales {
    pub sales: Vec<sale::Model>,
    pub sales_count: usize,
    pub total_sales: i64,
    pub total_commission: i64,
}

async fn require_head_office(db: &DatabaseConnection, user_id: Uuid) -> ServiceResult<(distributor::Model, company::Model)> {
    access::head_office(db, user_id)
        .await?
        .ok_or_else(|| ServiceError::forbidden("head office access required"))
}

/// An active location of the head office's company.
async fn company_location(db: &DatabaseConnection, user_id: Uuid, location_id: Uuid) -> ServiceResult<distributor::Model> {
    let (_, company) = require_head_office(db, user_id).await?;
    distributor::Entity::find_by_id(location_id)
        .filter(distributor::Column::CompanyId.eq(company.id))
        .filter(distributor::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("location"))
}

pub async fn locations(db: &DatabaseConnection, user_id: Uuid) -> ServiceResult<Vec<distributor::Model>> {
    let (_, company) = require_head_office(db, user_id).await?;
    access::company_locations(db, company.id).await
}

pub async fn head_office_code(db: &DatabaseConnection, user_id: Uuid) -> ServiceResult<String> {
    let (_, company) = require_head_office(db, user_id).await?;
    Ok(company.head_office_code)
}

/// Issue a fresh code; the old one stops working for new signups.
#[instrument(skip(db))]
pub async fn regenerate_code(db: &DatabaseConnection, user_id: Uuid) -> ServiceResult<String> {
    let (_, company) = require_head_office(db, user_id).await?;
    let code = access::generate_unique_company_code(db).await?;
    let company_id = company.id;
    let mut am: company::ActiveModel = company.into();
    am.head_office_code = Set(code.clone());
    am.updated_at = Set(Some(chrono::Utc::now().into()));
    am.update(db).await?;
    info!(%company_id, "head_office_code_regenerated");
    Ok(code)
}

pub async fn company_sales(db: &DatabaseConnection, user_id: Uuid) -> ServiceResult<CompanySales> {
    let (_, company) = require_head_office(db, user_id).await?;
    let ids: Vec<Uuid> = distributor::Entity::find()
        .filter(distributor::Column::CompanyId.eq(company.id))
        .all(db)
        .await?
        .into_iter()
        .map(|d| d.id)
        .collect();
    let sales = if ids.is_empty() {
        Vec::new()
    } else {
        sale::Entity::find()
            .filter(sale::Column::DistributorId.is_in(ids))
            .order_by_desc(sale::Column::SaleDate)
            .all(db)
            .await?
    };
    Ok(CompanySales {
        sales_count: sales.len(),
        total_sales: sales.iter().map(|s| s.total_amount).sum(),
        total_commission: sales.iter().map(|s| s.distributor_commission).sum(),
        sales,
    })
}

/// Remove a store of the chain. Locations with sales history are kept.
#[instrument(skip(db))]
pub async fn delete_location(db: &DatabaseConnection, user_id: Uuid, location_id: Uuid) -> ServiceResult<()> {
    let loc = company_location(db, user_id, location_id).await?;
    if loc.distributor_type != DistributorType::Store {
        return Err(ServiceError::validation("only store locations can be deleted"));
    }
    let sales = sale::Entity::find()
        .filter(sale::Column::DistributorId.eq(loc.id))
        .count(db)
        .await?;
    if sales > 0 {
        return Err(ServiceError::conflict("location has sales history"));
    }
    let txn = db.begin().await?;
    purge_location(&txn, &loc, false).await?;
    txn.commit().await?;
    info!(%location_id, "location_deleted");
    Ok(())
}

pub async fn location_products(db: &DatabaseConnection, user_id: Uuid, location_id: Uuid) -> ServiceResult<Vec<SelectedProduct>> {
    let loc = company_location(db, user_id, location_id).await?;
    distributor_products::selected_for(db, loc.id).await
}

pub async fn add_location_product(db: &DatabaseConnection, user_id: Uuid, location_id: Uuid, product_id: Uuid) -> ServiceResult<distributor_product::Model> {
    let loc = company_location(db, user_id, location_id).await?;
    distributor_products::add_for(db, &loc, product_id).await
}

pub async fn remove_location_product(db: &DatabaseConnection, user_id: Uuid, location_id: Uuid, product_id: Uuid) -> ServiceResult<()> {
    let loc = company_location(db, user_id, location_id).await?;
    distributor_products::remove_for(db, loc.id, product_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{self, NewContractInput};
    use crate::test_support::{get_db, individual_location, manufacturer_with_products, user_with_role};
    use models::user::UserRole;

    async fn chain_with_store(db: &DatabaseConnection) -> anyhow::Result<(Uuid, distributor::Model, distributor::Model)> {
        let (hq_user, _) = individual_location(db).await?;
        let (hq, chain) = contracts::upgrade_to_chain(db, hq_user.id, None).await?;
        let store_user = user_with_role(db, UserRole::Distributor).await?;
        let store = contracts::new_contract(db, store_user.id, NewContractInput {
            company_name: chain.name,
            location_name: "Store".into(),
            address: None,
            phone: None,
            head_office_code: Some(chain.head_office_code),
        })
        .await?;
        Ok((hq_user.id, hq, store))
    }

    #[tokio::test]
    async fn only_head_offices_get_in() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (u, _) = individual_location(&db).await?;
        assert!(matches!(locations(&db, u.id).await, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn head_office_manages_store_products_and_deletes_store() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (hq_user, hq, store) = chain_with_store(&db).await?;
        let (_, products) = manufacturer_with_products(&db, &["Senbei"]).await?;

        assert_eq!(locations(&db, hq_user).await?.len(), 2);
        let old = head_office_code(&db, hq_user).await?;
        let new = regenerate_code(&db, hq_user).await?;
        assert_ne!(old, new);
        assert_eq!(head_office_code(&db, hq_user).await?, new);

        add_location_product(&db, hq_user, store.id, products[0].id).await?;
        assert_eq!(location_products(&db, hq_user, store.id).await?.len(), 1);
        remove_location_product(&db, hq_user, store.id, products[0].id).await?;
        assert!(location_products(&db, hq_user, store.id).await?.is_empty());

        assert!(matches!(delete_location(&db, hq_user, hq.id).await, Err(ServiceError::Validation(_))));
        delete_location(&db, hq_user, store.id).await?;
        assert_eq!(locations(&db, hq_user).await?.len(), 1);
        assert_eq!(company_sales(&db, hq_user).await?.sales_count, 0);
        Ok(())
    }
}
