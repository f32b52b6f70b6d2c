//! Which distributor locations a signed-in user may act on.
//!
//! A user owns its own locations; the owner of a chain head office may also
//! act on every active location of the same company.
use rand::Rng;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::{ServiceError, ServiceResult};
use models::company::{self, CompanyType};
use models::distributor::{self, DistributorType};
use models::qr_code;

/// Active locations owned by the user, oldest first.
pub async fn user_distributors<C: ConnectionTrait>(db: &C, user_id: Uuid) -> ServiceResult<Vec<distributor::Model>> {
    Ok(distributor::Entity::find()
        .filter(distributor::Column::UserId.eq(user_id))
        .filter(distributor::Column::IsActive.eq(true))
        .order_by_asc(distributor::Column::CreatedAt)
        .all(db)
        .await?)
}

/// The user's active head office together with its chain company.
pub async fn head_office<C: ConnectionTrait>(db: &C, user_id: Uuid) -> ServiceResult<Option<(distributor::Model, company::Model)>> {
    let found = distributor::Entity::find()
        .filter(distributor::Column::UserId.eq(user_id))
        .filter(distributor::Column::IsActive.eq(true))
        .filter(distributor::Column::DistributorType.eq(DistributorType::HeadOffice))
        .find_also_related(company::Entity)
        .one(db)
        .await?;
    Ok(match found {
        Some((d, Some(c))) if c.company_type == CompanyType::Chain => Some((d, c)),
        _ => None,
    })
}

pub async fn is_head_office<C: ConnectionTrait>(db: &C, user_id: Uuid) -> ServiceResult<bool> {
    Ok(head_office(db, user_id).await?.is_some())
}

/// Active locations of a company, oldest first.
pub async fn company_locations<C: ConnectionTrait>(db: &C, company_id: Uuid) -> ServiceResult<Vec<distributor::Model>> {
    Ok(distributor::Entity::find()
        .filter(distributor::Column::CompanyId.eq(company_id))
        .filter(distributor::Column::IsActive.eq(true))
        .order_by_asc(distributor::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Location a request acts on.
///
/// With an explicit id a head office may pick any active location of its
/// company, everyone else only their own. Without one the user's first active
/// location is used.
#[instrument(skip(db))]
pub async fn resolve_target<C: ConnectionTrait>(db: &C, user_id: Uuid, location_id: Option<Uuid>) -> ServiceResult<distributor::Model> {
    match location_id {
        Some(id) => {
            if let Some((_, company)) = head_office(db, user_id).await? {
                let in_company = distributor::Entity::find_by_id(id)
                    .filter(distributor::Column::CompanyId.eq(company.id))
                    .filter(distributor::Column::IsActive.eq(true))
                    .one(db)
                    .await?;
                if let Some(d) = in_company {
                    return Ok(d);
                }
            }
            distributor::Entity::find_by_id(id)
                .filter(distributor::Column::UserId.eq(user_id))
                .filter(distributor::Column::IsActive.eq(true))
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::not_found("distributor"))
        }
        None => user_distributors(db, user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::not_found("distributor")),
    }
}

pub async fn has_access_to_distributor<C: ConnectionTrait>(db: &C, user_id: Uuid, distributor_id: Uuid) -> ServiceResult<bool> {
    let Some(target) = distributor::Entity::find_by_id(distributor_id).one(db).await? else {
        return Ok(false);
    };
    if target.user_id == user_id {
        return Ok(true);
    }
    let allowed = match (head_office(db, user_id).await?, target.company_id) {
        (Some((_, company)), Some(cid)) => company.id == cid,
        _ => false,
    };
    debug!(%user_id, %distributor_id, allowed, "distributor access check");
    Ok(allowed)
}

pub async fn has_access_to_qr_code<C: ConnectionTrait>(db: &C, user_id: Uuid, qr_id: Uuid) -> ServiceResult<bool> {
    match qr_code::Entity::find_by_id(qr_id).one(db).await? {
        Some(qr) => has_access_to_distributor(db, user_id, qr.distributor_id).await,
        None => Ok(false),
    }
}

/// Load a QR code the user may manage: missing is NotFound, foreign is Forbidden.
pub async fn require_qr_code<C: ConnectionTrait>(db: &C, user_id: Uuid, qr_id: Uuid) -> ServiceResult<qr_code::Model> {
    let qr = qr_code::Entity::find_by_id(qr_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("qr code"))?;
    if !has_access_to_distributor(db, user_id, qr.distributor_id).await? {
        return Err(ServiceError::forbidden("no access to this qr code"));
    }
    Ok(qr)
}

/// Company type and active location count used by the effective quotas.
pub async fn company_context<C: ConnectionTrait>(db: &C, d: &distributor::Model) -> ServiceResult<(Option<CompanyType>, u64)> {
    let Some(company_id) = d.company_id else {
        return Ok((None, 1));
    };
    let company_type = company::Entity::find_by_id(company_id).one(db).await?.map(|c| c.company_type);
    let active = distributor::Entity::find()
        .filter(distributor::Column::CompanyId.eq(company_id))
        .filter(distributor::Column::IsActive.eq(true))
        .count(db)
        .await?;
    Ok((company_type, active))
}

/// Random 8-digit head office code not yet used by any company.
pub async fn generate_unique_company_code<C: ConnectionTrait>(db: &C) -> ServiceResult<String> {
    for _ in 0..32 {
        let code = rand::thread_rng().gen_range(10_000_000u32..=99_999_999).to_string();
        let taken = company::Entity::find()
            .filter(company::Column::HeadOfficeCode.eq(code.as_str()))
            .count(db)
            .await?;
        if taken == 0 {
            return Ok(code);
        }
    }
    Err(ServiceError::conflict("could not allocate a unique head office code"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{self, NewContractInput};
    use crate::test_support::{get_db, individual_location, user_with_role};
    use models::user::UserRole;

    #[tokio::test]
    async fn own_location_resolves_and_foreign_does_not() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (u1, d1) = individual_location(&db).await?;
        let (u2, d2) = individual_location(&db).await?;

        assert_eq!(resolve_target(&db, u1.id, None).await?.id, d1.id);
        assert_eq!(resolve_target(&db, u1.id, Some(d1.id)).await?.id, d1.id);
        assert!(matches!(resolve_target(&db, u1.id, Some(d2.id)).await, Err(ServiceError::NotFound(_))));
        assert!(!has_access_to_distributor(&db, u2.id, d1.id).await?);
        assert!(!is_head_office(&db, u1.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn head_office_reaches_company_stores() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (hq_user, hq) = individual_location(&db).await?;
        contracts::upgrade_to_chain(&db, hq_user.id, None).await?;
        let code = crate::companies::head_office_code(&db, hq_user.id).await?;

        let store_user = user_with_role(&db, UserRole::Distributor).await?;
        let store = contracts::new_contract(&db, store_user.id, NewContractInput {
            company_name: "Yamada Shoten".into(),
            location_name: "Shinjuku".into(),
            address: None,
            phone: None,
            head_office_code: Some(code),
        })
        .await?;

        assert!(is_head_office(&db, hq_user.id).await?);
        assert_eq!(resolve_target(&db, hq_user.id, Some(store.id)).await?.id, store.id);
        assert!(has_access_to_distributor(&db, hq_user.id, store.id).await?);
        assert!(!has_access_to_distributor(&db, store_user.id, hq.id).await?);

        let (ct, n) = company_context(&db, &hq).await?;
        assert_eq!(ct, Some(CompanyType::Chain));
        assert_eq!(n, 2);
        Ok(())
    }

    #[tokio::test]
    async fn company_code_is_eight_digits() -> anyhow::Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let code = generate_unique_company_code(&db).await?;
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        Ok(())
    }
}
