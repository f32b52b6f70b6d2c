use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use models::product::{self, ProductFields};
use models::{manufacturer, order};
use service::manufacturer::{self as maker, ManufacturerOrder, ManufacturerStats, OrderStatusInput, ProfileInput};

use crate::errors::ApiResult;
use crate::routes::auth::{CurrentUser, ServerState};

#[derive(Debug, Deserialize)]
pub struct StockInput {
    pub quantity: i32,
}

#[utoipa::path(get, path = "/manufacturer/profile", tag = "manufacturer", responses((status = 200, description = "Manufacturer profile")))]
pub async fn profile(State(state): State<ServerState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<manufacturer::Model>> {
    Ok(Json(maker::profile(&state.db, user.id).await?))
}

#[utoipa::path(put, path = "/manufacturer/profile", tag = "manufacturer", request_body = crate::openapi::ProfileRequest, responses((status = 200, description = "Profile updated")))]
pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<ProfileInput>,
) -> ApiResult<Json<manufacturer::Model>> {
    Ok(Json(maker::update_profile(&state.db, user.id, input).await?))
}

#[utoipa::path(get, path = "/manufacturer/dashboard", tag = "manufacturer", responses((status = 200, description = "Products, orders and settlement totals")))]
pub async fn dashboard(State(state): State<ServerState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<ManufacturerStats>> {
    Ok(Json(maker::stats(&state.db, user.id).await?))
}

#[utoipa::path(get, path = "/manufacturer/products", tag = "manufacturer", responses((status = 200, description = "Active products")))]
pub async fn products(State(state): State<ServerState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<Vec<product::Model>>> {
    Ok(Json(maker::products(&state.db, user.id).await?))
}

#[utoipa::path(post, path = "/manufacturer/products", tag = "manufacturer", request_body = crate::openapi::ProductRequest, responses((status = 201, description = "Product created"), (status = 400, description = "Field out of range")))]
pub async fn create_product(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(fields): Json<ProductFields>,
) -> ApiResult<(StatusCode, Json<product::Model>)> {
    let p = maker::create_product(&state.db, user.id, fields).await?;
    Ok((StatusCode::CREATED, Json(p)))
}

#[utoipa::path(put, path = "/manufacturer/products/{id}", tag = "manufacturer", params(("id" = Uuid, Path,)), request_body = crate::openapi::ProductRequest, responses((status = 200, description = "Product updated")))]
pub async fn update_product(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(fields): Json<ProductFields>,
) -> ApiResult<Json<product::Model>> {
    Ok(Json(maker::update_product(&state.db, user.id, id, fields).await?))
}

#[utoipa::path(put, path = "/manufacturer/products/{id}/stock", tag = "manufacturer", params(("id" = Uuid, Path,)), request_body = crate::openapi::StockRequest, responses((status = 200, description = "Stock updated")))]
pub async fn update_stock(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<StockInput>,
) -> ApiResult<Json<product::Model>> {
    Ok(Json(maker::update_stock(&state.db, user.id, id, input.quantity).await?))
}

#[utoipa::path(get, path = "/manufacturer/orders", tag = "manufacturer", responses((status = 200, description = "Orders containing the manufacturer's products")))]
pub async fn orders(State(state): State<ServerState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<Vec<ManufacturerOrder>>> {
    Ok(Json(maker::orders(&state.db, user.id).await?))
}

#[utoipa::path(put, path = "/manufacturer/orders/{id}/status", tag = "manufacturer", params(("id" = Uuid, Path,)), request_body = crate::openapi::OrderStatusRequest, responses((status = 200, description = "Order status changed")))]
pub async fn update_order_status(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<OrderStatusInput>,
) -> ApiResult<Json<order::Model>> {
    Ok(Json(maker::update_order_status(&state.db, user.id, id, input).await?))
}
