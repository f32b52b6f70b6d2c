//! Consumer storefront behind the printed QR codes.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use models::review;
use service::storefront::{self, PlaceOrderInput, PlacedOrder, ProductDetail, ReviewInput, ShopView};

use crate::errors::ApiResult;
use crate::metrics;
use crate::routes::auth::{CurrentUser, ServerState};

#[utoipa::path(get, path = "/shop/{code}", tag = "shop", params(("code" = String, Path, description = "QR code")), responses((status = 200, description = "Products listed on the QR code"), (status = 404, description = "Unknown or inactive QR code")))]
pub async fn get_shop(State(state): State<ServerState>, Path(code): Path<String>) -> ApiResult<Json<ShopView>> {
    Ok(Json(storefront::shop(&state.db, &code).await?))
}

#[utoipa::path(get, path = "/shop/{code}/product/{id}", tag = "shop", params(("code" = String, Path,), ("id" = Uuid, Path,)), responses((status = 200, description = "Product with approved reviews"), (status = 404, description = "Not listed")))]
pub async fn product_detail(State(state): State<ServerState>, Path((code, id)): Path<(String, Uuid)>) -> ApiResult<Json<ProductDetail>> {
    Ok(Json(storefront::product_detail(&state.db, &code, id).await?))
}

#[utoipa::path(post, path = "/shop/{code}/orders", tag = "shop", params(("code" = String, Path,)), request_body = crate::openapi::PlaceOrderRequest, responses((status = 201, description = "Order placed and paid"), (status = 400, description = "Invalid order lines")))]
pub async fn place_order(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(code): Path<String>,
    Json(input): Json<PlaceOrderInput>,
) -> ApiResult<(StatusCode, Json<PlacedOrder>)> {
    let placed = storefront::place_order(&state.db, &code, user.id, input).await?;
    metrics::ORDERS_PLACED_TOTAL.inc();
    Ok((StatusCode::CREATED, Json(placed)))
}

#[utoipa::path(post, path = "/shop/{code}/product/{id}/reviews", tag = "shop", params(("code" = String, Path,), ("id" = Uuid, Path,)), request_body = crate::openapi::ReviewRequest, responses((status = 201, description = "Review stored for moderation")))]
pub async fn submit_review(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((code, id)): Path<(String, Uuid)>,
    Json(input): Json<ReviewInput>,
) -> ApiResult<(StatusCode, Json<review::Model>)> {
    // only products reachable from this shop can be reviewed through it
    storefront::product_detail(&state.db, &code, id).await?;
    let review = storefront::submit_review(&state.db, user.id, id, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
