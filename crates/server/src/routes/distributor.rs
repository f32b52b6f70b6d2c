//! Distributor workspace: catalog, selections, QR codes and sample orders.
//! Every location-scoped route takes an optional `location_id` so a chain
//! head office can act on one of its stores.
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use uuid::Uuid;

use models::{distributor_product, manufacturer, qr_code, qr_code_product, sample_order};
use service::contracts::{self, ContractView, SettlementSummary};
use service::distributor_products::{self, CatalogFilter, CatalogProduct, SelectedProduct};
use service::qr_codes::{self, AddQrProductInput, QrCodeView, QrProducts};
use service::sample_orders::{self, SampleOrderInput};
use service::access;

use crate::errors::ApiResult;
use crate::metrics;
use crate::routes::auth::{CurrentUser, ServerState};
use crate::routes::{LocationQuery, ProductIdInput};

#[derive(Serialize)]
pub struct DistributorDashboard {
    pub contract: ContractView,
    pub settlement: SettlementSummary,
    pub selected_products: usize,
    pub qr_codes: Vec<QrCodeView>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub manufacturer_id: Option<Uuid>,
}

impl From<CatalogQuery> for CatalogFilter {
    fn from(q: CatalogQuery) -> Self {
        CatalogFilter { search: q.search, category: q.category, manufacturer_id: q.manufacturer_id }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateQrInput {
    pub location: String,
}

#[utoipa::path(get, path = "/distributor/dashboard", tag = "distributor", params(LocationQuery), responses((status = 200, description = "Contract, sales and QR overview")))]
pub async fn dashboard(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<LocationQuery>,
) -> ApiResult<Json<DistributorDashboard>> {
    let target = access::resolve_target(&state.db, user.id, q.location_id).await?;
    let location = Some(target.id);
    let settlement = contracts::settlement_summary(&state.db, user.id, location).await?;
    let selected_products = distributor_products::selected(&state.db, user.id, location).await?.len();
    let qr_codes = qr_codes::list(&state.db, &state.qr, user.id, location).await?;
    let contract = contracts::contract_view(&state.db, target).await?;
    Ok(Json(DistributorDashboard { contract, settlement, selected_products, qr_codes }))
}

/// Own locations, or every company location for a chain head office.
#[utoipa::path(get, path = "/distributor/locations", tag = "distributor", responses((status = 200, description = "Locations the user can manage")))]
pub async fn locations(State(state): State<ServerState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<Vec<ContractView>>> {
    let rows = match access::head_office(&state.db, user.id).await? {
        Some((_, company)) => access::company_locations(&state.db, company.id).await?,
        None => access::user_distributors(&state.db, user.id).await?,
    };
    let mut views = Vec::with_capacity(rows.len());
    for d in rows {
        views.push(contracts::contract_view(&state.db, d).await?);
    }
    Ok(Json(views))
}

#[utoipa::path(get, path = "/distributor/catalog", tag = "distributor", params(CatalogQuery), responses((status = 200, description = "Active products of active manufacturers")))]
pub async fn catalog(State(state): State<ServerState>, Query(q): Query<CatalogQuery>) -> ApiResult<Json<Vec<CatalogProduct>>> {
    Ok(Json(distributor_products::catalog(&state.db, q.into()).await?))
}

#[utoipa::path(get, path = "/distributor/catalog/categories", tag = "distributor", responses((status = 200, description = "Distinct product categories")))]
pub async fn categories(State(state): State<ServerState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(distributor_products::categories(&state.db).await?))
}

#[utoipa::path(get, path = "/distributor/catalog/manufacturers", tag = "distributor", responses((status = 200, description = "Active manufacturers")))]
pub async fn manufacturers(State(state): State<ServerState>) -> ApiResult<Json<Vec<manufacturer::Model>>> {
    Ok(Json(distributor_products::manufacturers(&state.db).await?))
}

#[utoipa::path(get, path = "/distributor/products", tag = "distributor", params(LocationQuery), responses((status = 200, description = "Products selected for the location")))]
pub async fn selected_products(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<LocationQuery>,
) -> ApiResult<Json<Vec<SelectedProduct>>> {
    Ok(Json(distributor_products::selected(&state.db, user.id, q.location_id).await?))
}

#[utoipa::path(post, path = "/distributor/products", tag = "distributor", params(LocationQuery), request_body = crate::openapi::ProductIdRequest, responses((status = 201, description = "Product selected"), (status = 409, description = "Already selected")))]
pub async fn add_product(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<LocationQuery>,
    Json(input): Json<ProductIdInput>,
) -> ApiResult<(StatusCode, Json<distributor_product::Model>)> {
    let row = distributor_products::add(&state.db, user.id, q.location_id, input.product_id).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(delete, path = "/distributor/products/{product_id}", tag = "distributor", params(("product_id" = Uuid, Path,), LocationQuery), responses((status = 204, description = "Product deselected")))]
pub async fn remove_product(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<Uuid>,
    Query(q): Query<LocationQuery>,
) -> ApiResult<StatusCode> {
    distributor_products::remove(&state.db, user.id, q.location_id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/distributor/qrcodes", tag = "distributor", params(LocationQuery), responses((status = 200, description = "QR codes of the location")))]
pub async fn list_qr_codes(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<LocationQuery>,
) -> ApiResult<Json<Vec<QrCodeView>>> {
    Ok(Json(qr_codes::list(&state.db, &state.qr, user.id, q.location_id).await?))
}

#[utoipa::path(post, path = "/distributor/qrcodes", tag = "distributor", params(LocationQuery), request_body = crate::openapi::GenerateQrRequest, responses((status = 201, description = "QR code issued"), (status = 409, description = "Location already has a QR code")))]
pub async fn generate_qr_code(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<LocationQuery>,
    Json(input): Json<GenerateQrInput>,
) -> ApiResult<(StatusCode, Json<QrCodeView>)> {
    let view = qr_codes::generate(&state.db, &state.qr, user.id, q.location_id, input.location).await?;
    metrics::QR_CODES_ISSUED_TOTAL.inc();
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(post, path = "/distributor/qrcodes/{id}/activate", tag = "distributor", params(("id" = Uuid, Path,)), responses((status = 200, description = "QR code active"), (status = 409, description = "Another QR code is active")))]
pub async fn activate_qr_code(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<qr_code::Model>> {
    Ok(Json(qr_codes::activate(&state.db, user.id, id).await?))
}

#[utoipa::path(post, path = "/distributor/qrcodes/{id}/deactivate", tag = "distributor", params(("id" = Uuid, Path,)), responses((status = 200, description = "QR code inactive")))]
pub async fn deactivate_qr_code(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<qr_code::Model>> {
    Ok(Json(qr_codes::deactivate(&state.db, user.id, id).await?))
}

#[utoipa::path(delete, path = "/distributor/qrcodes/{id}", tag = "distributor", params(("id" = Uuid, Path,)), responses((status = 204, description = "QR code deleted")))]
pub async fn delete_qr_code(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    qr_codes::delete(&state.db, &state.qr, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Header-safe attachment name; non-ASCII location names collapse to `_`.
fn attachment_header(file_name: &str) -> HeaderValue {
    let safe: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[utoipa::path(get, path = "/distributor/qrcodes/{id}/download", tag = "distributor", params(("id" = Uuid, Path,)), responses((status = 200, description = "PNG image", content_type = "image/png")))]
pub async fn download_qr_code(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let dl = qr_codes::download(&state.db, &state.qr, user.id, id).await?;
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
        (header::CONTENT_DISPOSITION, attachment_header(&dl.file_name)),
    ];
    Ok((headers, dl.bytes).into_response())
}

#[utoipa::path(get, path = "/distributor/qrcodes/{id}/products", tag = "distributor", params(("id" = Uuid, Path,)), responses((status = 200, description = "Assigned and available products")))]
pub async fn qr_products(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<QrProducts>> {
    Ok(Json(qr_codes::products(&state.db, user.id, id).await?))
}

#[utoipa::path(post, path = "/distributor/qrcodes/{id}/products", tag = "distributor", params(("id" = Uuid, Path,)), request_body = crate::openapi::AddQrProductRequest, responses((status = 201, description = "Product listed on the QR code"), (status = 400, description = "Selection limit reached")))]
pub async fn add_qr_product(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<AddQrProductInput>,
) -> ApiResult<(StatusCode, Json<qr_code_product::Model>)> {
    let row = qr_codes::add_product(&state.db, user.id, id, input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(delete, path = "/distributor/qrcodes/{id}/products/{product_id}", tag = "distributor", params(("id" = Uuid, Path,), ("product_id" = Uuid, Path,)), responses((status = 204, description = "Product removed from the QR code")))]
pub async fn remove_qr_product(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    qr_codes::remove_product(&state.db, user.id, id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/distributor/sample-orders", tag = "distributor", params(LocationQuery), responses((status = 200, description = "Sample orders of the location")))]
pub async fn list_sample_orders(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<LocationQuery>,
) -> ApiResult<Json<Vec<sample_order::Model>>> {
    Ok(Json(sample_orders::list_for_user(&state.db, user.id, q.location_id).await?))
}

#[utoipa::path(post, path = "/distributor/sample-orders", tag = "distributor", params(LocationQuery), request_body = crate::openapi::SampleOrderRequest, responses((status = 201, description = "Sample order placed")))]
pub async fn create_sample_order(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(q): Query<LocationQuery>,
    Json(input): Json<SampleOrderInput>,
) -> ApiResult<(StatusCode, Json<sample_order::Model>)> {
    let row = sample_orders::create(&state.db, user.id, q.location_id, input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}
