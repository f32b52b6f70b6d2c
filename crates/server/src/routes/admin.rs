//! Platform administration endpoints.
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use models::{distributor, manufacturer, review, sample_order, settlement, system_setting};
use service::admin::{self, AdminDashboard, Analytics, QrCodeReport, SalesReport, SampleOrderStatusInput, Subscriptions};
use service::contracts::{self, ContractView};
use service::pagination::Pagination;
use service::settlements::{self, SettlementReport};
use service::{reviews, settings};

use crate::errors::ApiResult;
use crate::metrics;
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        let d = Pagination::default();
        Pagination { page: q.page.unwrap_or(d.page), per_page: q.per_page.unwrap_or(d.per_page) }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateSettlementsInput {
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SettingInput {
    pub category: String,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct CompletionOutput {
    pub distributor_id: Uuid,
    pub removed_locations: usize,
}

#[utoipa::path(get, path = "/admin/dashboard", tag = "admin", responses((status = 200, description = "Platform overview")))]
pub async fn dashboard(State(state): State<ServerState>) -> ApiResult<Json<AdminDashboard>> {
    Ok(Json(admin::dashboard(&state.db).await?))
}

#[utoipa::path(get, path = "/admin/analytics", tag = "admin", responses((status = 200, description = "Daily revenue for the current month")))]
pub async fn analytics(State(state): State<ServerState>) -> ApiResult<Json<Analytics>> {
    Ok(Json(admin::analytics(&state.db, Utc::now()).await?))
}

#[utoipa::path(get, path = "/admin/distributors", tag = "admin", params(PageQuery), responses((status = 200, description = "Distributors, newest first")))]
pub async fn distributors(State(state): State<ServerState>, Query(q): Query<PageQuery>) -> ApiResult<Json<Vec<distributor::Model>>> {
    Ok(Json(admin::distributors(&state.db, q.into()).await?))
}

#[utoipa::path(post, path = "/admin/distributors/{id}/activate", tag = "admin", params(("id" = Uuid, Path,)), responses((status = 200, description = "Distributor activated")))]
pub async fn activate_distributor(State(state): State<ServerState>, Path(id): Path<Uuid>) -> ApiResult<Json<distributor::Model>> {
    Ok(Json(admin::set_distributor_active(&state.db, id, true).await?))
}

#[utoipa::path(post, path = "/admin/distributors/{id}/deactivate", tag = "admin", params(("id" = Uuid, Path,)), responses((status = 200, description = "Distributor deactivated")))]
pub async fn deactivate_distributor(State(state): State<ServerState>, Path(id): Path<Uuid>) -> ApiResult<Json<distributor::Model>> {
    Ok(Json(admin::set_distributor_active(&state.db, id, false).await?))
}

#[utoipa::path(get, path = "/admin/manufacturers", tag = "admin", responses((status = 200, description = "All manufacturers")))]
pub async fn manufacturers(State(state): State<ServerState>) -> ApiResult<Json<Vec<manufacturer::Model>>> {
    Ok(Json(admin::manufacturers(&state.db).await?))
}

#[utoipa::path(get, path = "/admin/contracts", tag = "admin", responses((status = 200, description = "Every contract, newest first")))]
pub async fn contracts(State(state): State<ServerState>) -> ApiResult<Json<Vec<ContractView>>> {
    let rows = contracts::list_contracts(&state.db).await?;
    let mut views = Vec::with_capacity(rows.len());
    for d in rows {
        views.push(contracts::contract_view(&state.db, d).await?);
    }
    Ok(Json(views))
}

#[utoipa::path(post, path = "/admin/contracts/{id}/complete", tag = "admin", params(("id" = Uuid, Path,)), responses((status = 200, description = "Locations removed and owners locked out"), (status = 400, description = "Shelf not returned yet")))]
pub async fn complete_contract(State(state): State<ServerState>, Path(id): Path<Uuid>) -> ApiResult<Json<CompletionOutput>> {
    let removed_locations = contracts::complete_cancellation(&state.db, id).await?;
    metrics::CONTRACTS_CANCELLED_TOTAL.inc();
    info!(distributor_id = %id, removed_locations, "contract cancellation completed");
    Ok(Json(CompletionOutput { distributor_id: id, removed_locations }))
}

#[utoipa::path(post, path = "/admin/contracts/{id}/overdue", tag = "admin", params(("id" = Uuid, Path,)), responses((status = 200, description = "Shelf return marked overdue")))]
pub async fn mark_overdue(State(state): State<ServerState>, Path(id): Path<Uuid>) -> ApiResult<Json<ContractView>> {
    let d = contracts::mark_shelf_return_overdue(&state.db, id).await?;
    Ok(Json(contracts::contract_view(&state.db, d).await?))
}

#[utoipa::path(get, path = "/admin/subscriptions", tag = "admin", responses((status = 200, description = "Active subscriptions and monthly revenue")))]
pub async fn subscriptions(State(state): State<ServerState>) -> ApiResult<Json<Subscriptions>> {
    Ok(Json(admin::subscriptions(&state.db).await?))
}

#[utoipa::path(get, path = "/admin/sales", tag = "admin", responses((status = 200, description = "Latest sales with totals")))]
pub async fn sales(State(state): State<ServerState>) -> ApiResult<Json<SalesReport>> {
    Ok(Json(admin::sales(&state.db).await?))
}

#[utoipa::path(get, path = "/admin/settlements", tag = "admin", responses((status = 200, description = "Settlements with pending and completed sums")))]
pub async fn list_settlements(State(state): State<ServerState>) -> ApiResult<Json<SettlementReport>> {
    Ok(Json(settlements::list(&state.db).await?))
}

/// Defaults to the current month up to now.
#[utoipa::path(post, path = "/admin/settlements/generate", tag = "admin", request_body = crate::openapi::GenerateSettlementsRequest, responses((status = 200, description = "Settlements created")))]
pub async fn generate_settlements(
    State(state): State<ServerState>,
    Json(input): Json<GenerateSettlementsInput>,
) -> ApiResult<Json<Vec<settlement::Model>>> {
    let now = Utc::now();
    let start = input.period_start.unwrap_or_else(|| settlements::month_start(now));
    let end = input.period_end.unwrap_or(now);
    Ok(Json(settlements::generate(&state.db, start, end).await?))
}

#[utoipa::path(post, path = "/admin/settlements/{id}/process", tag = "admin", params(("id" = Uuid, Path,)), responses((status = 200, description = "Settlement completed")))]
pub async fn process_settlement(State(state): State<ServerState>, Path(id): Path<Uuid>) -> ApiResult<Json<settlement::Model>> {
    Ok(Json(settlements::process(&state.db, id).await?))
}

#[utoipa::path(get, path = "/admin/sample-orders", tag = "admin", responses((status = 200, description = "All sample orders")))]
pub async fn sample_orders(State(state): State<ServerState>) -> ApiResult<Json<Vec<sample_order::Model>>> {
    Ok(Json(admin::list_sample_orders(&state.db).await?))
}

#[utoipa::path(put, path = "/admin/sample-orders/{id}/status", tag = "admin", params(("id" = Uuid, Path,)), request_body = crate::openapi::SampleOrderStatusRequest, responses((status = 200, description = "Sample order status changed")))]
pub async fn update_sample_order_status(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SampleOrderStatusInput>,
) -> ApiResult<Json<sample_order::Model>> {
    Ok(Json(admin::update_sample_order_status(&state.db, id, input).await?))
}

#[utoipa::path(get, path = "/admin/qrcodes", tag = "admin", responses((status = 200, description = "All QR codes with active counts")))]
pub async fn qr_codes(State(state): State<ServerState>) -> ApiResult<Json<QrCodeReport>> {
    Ok(Json(admin::qr_codes(&state.db).await?))
}

#[utoipa::path(get, path = "/admin/settings", tag = "admin", responses((status = 200, description = "Every system setting")))]
pub async fn list_settings(State(state): State<ServerState>) -> ApiResult<Json<Vec<system_setting::Model>>> {
    Ok(Json(settings::list_all(&state.db).await?))
}

#[utoipa::path(get, path = "/admin/settings/{category}", tag = "admin", params(("category" = String, Path,)), responses((status = 200, description = "Settings of one category")))]
pub async fn settings_by_category(State(state): State<ServerState>, Path(category): Path<String>) -> ApiResult<Json<Vec<system_setting::Model>>> {
    Ok(Json(settings::list_by_category(&state.db, &category).await?))
}

#[utoipa::path(put, path = "/admin/settings", tag = "admin", request_body = crate::openapi::SettingRequest, responses((status = 200, description = "Setting stored")))]
pub async fn put_setting(State(state): State<ServerState>, Json(input): Json<SettingInput>) -> ApiResult<Json<system_setting::Model>> {
    let saved = settings::set_value(&state.db, &input.category, &input.key, &input.value, input.description).await?;
    Ok(Json(saved))
}

#[utoipa::path(get, path = "/admin/reviews", tag = "admin", responses((status = 200, description = "Reviews awaiting approval")))]
pub async fn pending_reviews(State(state): State<ServerState>) -> ApiResult<Json<Vec<review::Model>>> {
    Ok(Json(reviews::pending(&state.db).await?))
}

#[utoipa::path(post, path = "/admin/reviews/{id}/approve", tag = "admin", params(("id" = Uuid, Path,)), responses((status = 200, description = "Review approved")))]
pub async fn approve_review(State(state): State<ServerState>, Path(id): Path<Uuid>) -> ApiResult<Json<review::Model>> {
    Ok(Json(reviews::approve(&state.db, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_falls_back_to_defaults() {
        let p: Pagination = PageQuery { page: None, per_page: Some(50) }.into();
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 50);
    }
}
