use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use common::types::Health;

use crate::metrics;
use crate::openapi::ApiDoc;

pub mod admin;
pub mod auth;
pub mod company;
pub mod contracts;
pub mod distributor;
pub mod manufacturer;
pub mod shop;

use auth::ServerState;

/// Optional location selector; a chain head office uses it to act on a store.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ProductIdInput {
    pub product_id: Uuid,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

async fn metrics_handler() -> (axum::http::StatusCode, String) {
    metrics::encode_metrics()
}

fn auth_routes() -> Router<ServerState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/distributor/login", post(auth::distributor_login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/admins", post(auth::create_admin))
}

fn shop_routes() -> Router<ServerState> {
    Router::new()
        .route("/shop/:code", get(shop::get_shop))
        .route("/shop/:code/orders", post(shop::place_order))
        .route("/shop/:code/product/:id", get(shop::product_detail))
        .route("/shop/:code/product/:id/reviews", post(shop::submit_review))
}

fn distributor_routes() -> Router<ServerState> {
    Router::new()
        .route("/contracts", post(contracts::create))
        .route("/contracts/upgrade", post(contracts::upgrade))
        .route("/contracts/downgrade", post(contracts::downgrade))
        .route("/contracts/settlement", get(contracts::settlement))
        .route("/contracts/:id/cancel", post(contracts::cancel))
        .route("/contracts/:id/shelf-return", post(contracts::shelf_return))
        .route("/contracts/:id/extend", post(contracts::extend))
        .route("/company/locations", get(company::locations))
        .route("/company/locations/:id", delete(company::delete_location))
        .route(
            "/company/locations/:id/products",
            get(company::location_products).post(company::add_location_product),
        )
        .route("/company/locations/:id/products/:product_id", delete(company::remove_location_product))
        .route("/company/code", get(company::code))
        .route("/company/code/regenerate", post(company::regenerate_code))
        .route("/company/sales", get(company::sales))
        .route("/distributor/dashboard", get(distributor::dashboard))
        .route("/distributor/locations", get(distributor::locations))
        .route("/distributor/catalog", get(distributor::catalog))
        .route("/distributor/catalog/categories", get(distributor::categories))
        .route("/distributor/catalog/manufacturers", get(distributor::manufacturers))
        .route("/distributor/products", get(distributor::selected_products).post(distributor::add_product))
        .route("/distributor/products/:product_id", delete(distributor::remove_product))
        .route("/distributor/qrcodes", get(distributor::list_qr_codes).post(distributor::generate_qr_code))
        .route("/distributor/qrcodes/:id", delete(distributor::delete_qr_code))
        .route("/distributor/qrcodes/:id/activate", post(distributor::activate_qr_code))
        .route("/distributor/qrcodes/:id/deactivate", post(distributor::deactivate_qr_code))
        .route("/distributor/qrcodes/:id/download", get(distributor::download_qr_code))
        .route("/distributor/qrcodes/:id/products", get(distributor::qr_products).post(distributor::add_qr_product))
        .route("/distributor/qrcodes/:id/products/:product_id", delete(distributor::remove_qr_product))
        .route(
            "/distributor/sample-orders",
            get(distributor::list_sample_orders).post(distributor::create_sample_order),
        )
        .route_layer(middleware::from_fn(auth::require_distributor))
}

fn manufacturer_routes() -> Router<ServerState> {
    Router::new()
        .route("/manufacturer/profile", get(manufacturer::profile).put(manufacturer::update_profile))
        .route("/manufacturer/dashboard", get(manufacturer::dashboard))
        .route("/manufacturer/products", get(manufacturer::products).post(manufacturer::create_product))
        .route("/manufacturer/products/:id", put(manufacturer::update_product))
        .route("/manufacturer/products/:id/stock", put(manufacturer::update_stock))
        .route("/manufacturer/orders", get(manufacturer::orders))
        .route("/manufacturer/orders/:id/status", put(manufacturer::update_order_status))
        .route_layer(middleware::from_fn(auth::require_manufacturer))
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/analytics", get(admin::analytics))
        .route("/admin/distributors", get(admin::distributors))
        .route("/admin/distributors/:id/activate", post(admin::activate_distributor))
        .route("/admin/distributors/:id/deactivate", post(admin::deactivate_distributor))
        .route("/admin/manufacturers", get(admin::manufacturers))
        .route("/admin/contracts", get(admin::contracts))
        .route("/admin/contracts/:id/complete", post(admin::complete_contract))
        .route("/admin/contracts/:id/overdue", post(admin::mark_overdue))
        .route("/admin/subscriptions", get(admin::subscriptions))
        .route("/admin/sales", get(admin::sales))
        .route("/admin/settlements", get(admin::list_settlements))
        .route("/admin/settlements/generate", post(admin::generate_settlements))
        .route("/admin/settlements/:id/process", post(admin::process_settlement))
        .route("/admin/sample-orders", get(admin::sample_orders))
        .route("/admin/sample-orders/:id/status", put(admin::update_sample_order_status))
        .route("/admin/qrcodes", get(admin::qr_codes))
        .route("/admin/settings", get(admin::list_settings).put(admin::put_setting))
        .route("/admin/settings/:category", get(admin::settings_by_category))
        .route("/admin/reviews", get(admin::pending_reviews))
        .route("/admin/reviews/:id/approve", post(admin::approve_review))
        .route_layer(middleware::from_fn(auth::require_admin))
}

/// Build the full application router: public surfaces, role-gated groups,
/// the global token middleware and request tracing.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let qr_files = ServeDir::new(state.qr.qr_dir.clone());

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .merge(auth_routes())
        .merge(shop_routes())
        .merge(distributor_routes())
        .merge(manufacturer_routes())
        .merge(admin_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/qrcodes", qr_files)
        .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx and transport failures
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
