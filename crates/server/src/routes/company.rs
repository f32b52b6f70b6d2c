//! Chain head office management of its company's locations.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use models::{distributor, distributor_product};
use service::companies::{self, CompanySales};
use service::distributor_products::SelectedProduct;

use crate::errors::ApiResult;
use crate::routes::auth::{CurrentUser, ServerState};
use crate::routes::ProductIdInput;

#[derive(Serialize)]
pub struct CodeOutput {
    pub head_office_code: String,
}

#[utoipa::path(get, path = "/company/locations", tag = "company", responses((status = 200, description = "Active company locations"), (status = 403, description = "Not a chain head office")))]
pub async fn locations(State(state): State<ServerState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<Vec<distributor::Model>>> {
    Ok(Json(companies::locations(&state.db, user.id).await?))
}

#[utoipa::path(delete, path = "/company/locations/{id}", tag = "company", params(("id" = Uuid, Path,)), responses((status = 204, description = "Store removed"), (status = 409, description = "Store has sales")))]
pub async fn delete_location(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    companies::delete_location(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/company/code", tag = "company", responses((status = 200, description = "Head office code")))]
pub async fn code(State(state): State<ServerState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<CodeOutput>> {
    let head_office_code = companies::head_office_code(&state.db, user.id).await?;
    Ok(Json(CodeOutput { head_office_code }))
}

#[utoipa::path(post, path = "/company/code/regenerate", tag = "company", responses((status = 200, description = "New head office code")))]
pub async fn regenerate_code(State(state): State<ServerState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<CodeOutput>> {
    let head_office_code = companies::regenerate_code(&state.db, user.id).await?;
    Ok(Json(CodeOutput { head_office_code }))
}

#[utoipa::path(get, path = "/company/sales", tag = "company", responses((status = 200, description = "Sales of every company location")))]
pub async fn sales(State(state): State<ServerState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<CompanySales>> {
    Ok(Json(companies::company_sales(&state.db, user.id).await?))
}

#[utoipa::path(get, path = "/company/locations/{id}/products", tag = "company", params(("id" = Uuid, Path,)), responses((status = 200, description = "Products selected for the location")))]
pub async fn location_products(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<SelectedProduct>>> {
    Ok(Json(companies::location_products(&state.db, user.id, id).await?))
}

#[utoipa::path(post, path = "/company/locations/{id}/products", tag = "company", params(("id" = Uuid, Path,)), request_body = crate::openapi::ProductIdRequest, responses((status = 201, description = "Product selected"), (status = 400, description = "Selection limit reached")))]
pub async fn add_location_product(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<ProductIdInput>,
) -> ApiResult<(StatusCode, Json<distributor_product::Model>)> {
    let row = companies::add_location_product(&state.db, user.id, id, input.product_id).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(delete, path = "/company/locations/{id}/products/{product_id}", tag = "company", params(("id" = Uuid, Path,), ("product_id" = Uuid, Path,)), responses((status = 204, description = "Product deselected")))]
pub async fn remove_location_product(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    companies::remove_location_product(&state.db, user.id, id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
