use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use models::company;
use service::contracts::{self, ContractView, NewContractInput, SettlementSummary};

use crate::errors::ApiResult;
use crate::routes::auth::{CurrentUser, ServerState};
use crate::routes::LocationQuery;

#[derive(Serialize)]
pub struct UpgradeOutput {
    pub contract: ContractView,
    pub company: company::Model,
}

#[utoipa::path(post, path = "/contracts", tag = "contracts", request_body = crate::openapi::NewContractRequest, responses((status = 201, description = "Contract signed"), (status = 409, description = "User already has an active location")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<NewContractInput>,
) -> ApiResult<(StatusCode, Json<ContractView>)> {
    let d = contracts::new_contract(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(contracts::contract_view(&state.db, d).await?)))
}

#[utoipa::path(post, path = "/contracts/upgrade", tag = "contracts", params(LocationQuery), responses((status = 200, description = "Location is now a chain head office")))]
pub async fn upgrade(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<LocationQuery>,
) -> ApiResult<Json<UpgradeOutput>> {
    let (d, company) = contracts::upgrade_to_chain(&state.db, user.id, q.location_id).await?;
    let contract = contracts::contract_view(&state.db, d).await?;
    Ok(Json(UpgradeOutput { contract, company }))
}

#[utoipa::path(post, path = "/contracts/downgrade", tag = "contracts", params(LocationQuery), responses((status = 200, description = "Back to an individual contract"), (status = 409, description = "Company still has stores")))]
pub async fn downgrade(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<LocationQuery>,
) -> ApiResult<Json<ContractView>> {
    let d = contracts::downgrade_to_individual(&state.db, user.id, q.location_id).await?;
    Ok(Json(contracts::contract_view(&state.db, d).await?))
}

#[utoipa::path(post, path = "/contracts/{id}/cancel", tag = "contracts", params(("id" = Uuid, Path, description = "Distributor id")), responses((status = 200, description = "Cancellation requested")))]
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ContractView>> {
    let d = contracts::request_cancellation(&state.db, user.id, id).await?;
    Ok(Json(contracts::contract_view(&state.db, d).await?))
}

#[utoipa::path(post, path = "/contracts/{id}/shelf-return", tag = "contracts", params(("id" = Uuid, Path, description = "Distributor id")), responses((status = 200, description = "Shelf return confirmed")))]
pub async fn shelf_return(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ContractView>> {
    let d = contracts::confirm_shelf_return(&state.db, user.id, id).await?;
    Ok(Json(contracts::contract_view(&state.db, d).await?))
}

#[utoipa::path(post, path = "/contracts/{id}/extend", tag = "contracts", params(("id" = Uuid, Path, description = "Distributor id")), responses((status = 200, description = "Cancellation withdrawn")))]
pub async fn extend(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ContractView>> {
    let d = contracts::extend_contract(&state.db, user.id, id).await?;
    Ok(Json(contracts::contract_view(&state.db, d).await?))
}

#[utoipa::path(get, path = "/contracts/settlement", tag = "contracts", params(LocationQuery), responses((status = 200, description = "Sales and commission totals")))]
pub async fn settlement(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<LocationQuery>,
) -> ApiResult<Json<SettlementSummary>> {
    Ok(Json(contracts::settlement_summary(&state.db, user.id, q.location_id).await?))
}
