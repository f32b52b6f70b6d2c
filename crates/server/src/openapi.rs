use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

// Request bodies as documented; the handlers deserialize the service types.

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub service: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Consumer, Distributor or Manufacturer
    pub role: String,
    pub company_name: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct CreateAdminRequest { pub email: String, pub password: String, pub first_name: String, pub last_name: String }

#[derive(ToSchema)]
pub struct NewContractRequest {
    pub company_name: String,
    pub location_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Eight digit code of the chain to join as a store
    pub head_office_code: Option<String>,
}

#[derive(ToSchema)]
pub struct ProductIdRequest { pub product_id: Uuid }

#[derive(ToSchema)]
pub struct GenerateQrRequest { pub location: String }

#[derive(ToSchema)]
pub struct AddQrProductRequest { pub product_id: Uuid, pub display_order: Option<i32>, pub notes: Option<String> }

#[derive(ToSchema)]
pub struct SampleOrderRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Initial or Additional
    pub order_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(ToSchema)]
pub struct OrderLineRequest { pub product_id: Uuid, pub quantity: i32 }

#[derive(ToSchema)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub shipping_name: Option<String>,
    pub shipping_address: Option<String>,
    pub shipping_phone: Option<String>,
}

#[derive(ToSchema)]
pub struct ReviewRequest { pub rating: i32, pub comment: Option<String> }

#[derive(ToSchema)]
pub struct ProfileRequest {
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub company_description: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub established_year: Option<i32>,
}

/// Prices and fees are whole yen.
#[derive(ToSchema)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub wholesale_price: i64,
    pub retail_price: i64,
    pub free_shipping_threshold: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub requires_refrigeration: bool,
    pub requires_freezing: bool,
    pub shipping_fee: i64,
    pub stock_quantity: i32,
    pub minimum_order_quantity: i32,
    pub is_active: bool,
}

#[derive(ToSchema)]
pub struct StockRequest { pub quantity: i32 }

#[derive(ToSchema)]
pub struct OrderStatusRequest { pub status: String, pub tracking_number: Option<String> }

#[derive(ToSchema)]
pub struct SampleOrderStatusRequest { pub status: String, pub notes: Option<String> }

#[derive(ToSchema)]
pub struct GenerateSettlementsRequest { pub period_start: Option<String>, pub period_end: Option<String> }

#[derive(ToSchema)]
pub struct SettingRequest { pub category: String, pub key: String, pub value: String, pub description: Option<String> }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::distributor_login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::create_admin,
        crate::routes::shop::get_shop,
        crate::routes::shop::product_detail,
        crate::routes::shop::place_order,
        crate::routes::shop::submit_review,
        crate::routes::contracts::create,
        crate::routes::contracts::upgrade,
        crate::routes::contracts::downgrade,
        crate::routes::contracts::cancel,
        crate::routes::contracts::shelf_return,
        crate::routes::contracts::extend,
        crate::routes::contracts::settlement,
        crate::routes::company::locations,
        crate::routes::company::delete_location,
        crate::routes::company::code,
        crate::routes::company::regenerate_code,
        crate::routes::company::sales,
        crate::routes::company::location_products,
        crate::routes::company::add_location_product,
        crate::routes::company::remove_location_product,
        crate::routes::distributor::dashboard,
        crate::routes::distributor::locations,
        crate::routes::distributor::catalog,
        crate::routes::distributor::categories,
        crate::routes::distributor::manufacturers,
        crate::routes::distributor::selected_products,
        crate::routes::distributor::add_product,
        crate::routes::distributor::remove_product,
        crate::routes::distributor::list_qr_codes,
        crate::routes::distributor::generate_qr_code,
        crate::routes::distributor::activate_qr_code,
        crate::routes::distributor::deactivate_qr_code,
        crate::routes::distributor::delete_qr_code,
        crate::routes::distributor::download_qr_code,
        crate::routes::distributor::qr_products,
        crate::routes::distributor::add_qr_product,
        crate::routes::distributor::remove_qr_product,
        crate::routes::distributor::list_sample_orders,
        crate::routes::distributor::create_sample_order,
        crate::routes::manufacturer::profile,
        crate::routes::manufacturer::update_profile,
        crate::routes::manufacturer::dashboard,
        crate::routes::manufacturer::products,
        crate::routes::manufacturer::create_product,
        crate::routes::manufacturer::update_product,
        crate::routes::manufacturer::update_stock,
        crate::routes::manufacturer::orders,
        crate::routes::manufacturer::update_order_status,
        crate::routes::admin::dashboard,
        crate::routes::admin::analytics,
        crate::routes::admin::distributors,
        crate::routes::admin::activate_distributor,
        crate::routes::admin::deactivate_distributor,
        crate::routes::admin::manufacturers,
        crate::routes::admin::contracts,
        crate::routes::admin::complete_contract,
        crate::routes::admin::mark_overdue,
        crate::routes::admin::subscriptions,
        crate::routes::admin::sales,
        crate::routes::admin::list_settlements,
        crate::routes::admin::generate_settlements,
        crate::routes::admin::process_settlement,
        crate::routes::admin::sample_orders,
        crate::routes::admin::update_sample_order_status,
        crate::routes::admin::qr_codes,
        crate::routes::admin::list_settings,
        crate::routes::admin::settings_by_category,
        crate::routes::admin::put_setting,
        crate::routes::admin::pending_reviews,
        crate::routes::admin::approve_review,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            CreateAdminRequest,
            NewContractRequest,
            ProductIdRequest,
            GenerateQrRequest,
            AddQrProductRequest,
            SampleOrderRequest,
            OrderLineRequest,
            PlaceOrderRequest,
            ReviewRequest,
            ProfileRequest,
            ProductRequest,
            StockRequest,
            OrderStatusRequest,
            SampleOrderStatusRequest,
            GenerateSettlementsRequest,
            SettingRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "shop"),
        (name = "contracts"),
        (name = "company"),
        (name = "distributor"),
        (name = "manufacturer"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
