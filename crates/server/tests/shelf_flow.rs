mod support;

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};

use support::{account, build_app, send, PASSWORD};

struct Shop {
    distributor: String,
    product_id: String,
    qr_id: String,
    code: String,
}

async fn product(app: &Router, maker: &str, name: &str) -> anyhow::Result<Value> {
    let (status, body) = send(
        app,
        "POST",
        "/manufacturer/products",
        Some(maker),
        Some(json!({
            "name": name,
            "wholesale_price": 600,
            "retail_price": 1000,
            "free_shipping_threshold": 3000,
            "category": "Snacks",
            "shipping_fee": 500,
            "stock_quantity": 10,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Ok(body)
}

/// Manufacturer lists a product; a distributor signs up, selects it and
/// puts it on a fresh QR code.
async fn open_shop(app: &Router) -> anyhow::Result<Shop> {
    let maker = account(app, "Manufacturer").await?;
    let p = product(app, &maker, "Matcha Cookies").await?;
    let product_id = p["id"].as_str().unwrap_or_default().to_string();

    let distributor = account(app, "Distributor").await?;
    let (status, contract) = send(
        app,
        "POST",
        "/contracts",
        Some(&distributor),
        Some(json!({"company_name": "Yamada Shoten", "location_name": "Shibuya"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{contract}");
    assert_eq!(contract["distributor_type"], "Individual");

    let (status, catalog) = send(app, "GET", "/distributor/catalog?search=matcha", Some(&distributor), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalog.as_array().map(Vec::len), Some(1));

    let (status, _) = send(app, "POST", "/distributor/products", Some(&distributor), Some(json!({"product_id": product_id}))).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, qr) = send(app, "POST", "/distributor/qrcodes", Some(&distributor), Some(json!({"location": "Entrance"}))).await?;
    assert_eq!(status, StatusCode::CREATED, "{qr}");
    let qr_id = qr["id"].as_str().unwrap_or_default().to_string();
    let code = qr["code"].as_str().unwrap_or_default().to_string();
    assert_eq!(qr["shop_url"], format!("http://shop.test/shop/{code}"));

    let (status, _) = send(
        app,
        "POST",
        &format!("/distributor/qrcodes/{qr_id}/products"),
        Some(&distributor),
        Some(json!({"product_id": product_id})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    Ok(Shop { distributor, product_id, qr_id, code })
}

#[tokio::test]
async fn consumer_orders_through_qr_shop() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = build_app().await?;
    let shop = open_shop(&app).await?;

    // anonymous browsing
    let (status, view) = send(&app, "GET", &format!("/shop/{}", shop.code), None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["location"], "Entrance");
    assert_eq!(view["products"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, "GET", &format!("/shop/{}/product/{}", shop.code, shop.product_id), None, None).await?;
    assert_eq!(status, StatusCode::OK);

    // ordering needs a login
    let order = json!({"items": [{"product_id": shop.product_id, "quantity": 2}], "shipping_name": "Taro"});
    let (status, _) = send(&app, "POST", &format!("/shop/{}/orders", shop.code), None, Some(order.clone())).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let consumer = account(&app, "Consumer").await?;
    let (status, placed) = send(&app, "POST", &format!("/shop/{}/orders", shop.code), Some(&consumer), Some(order)).await?;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    assert_eq!(placed["order"]["total_amount"], 2500);
    assert_eq!(placed["order"]["shipping_fee"], 500);
    assert_eq!(placed["sale"]["distributor_commission"], 250);

    let (status, summary) = send(&app, "GET", "/contracts/settlement", Some(&shop.distributor), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["sales_count"], 1);
    assert_eq!(summary["total_commission"], 250);

    let (status, review) = send(
        &app,
        "POST",
        &format!("/shop/{}/product/{}/reviews", shop.code, shop.product_id),
        Some(&consumer),
        Some(json!({"rating": 5, "comment": "Great with tea"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["is_approved"], false);
    Ok(())
}

#[tokio::test]
async fn qr_lifecycle_and_download() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = build_app().await?;
    let shop = open_shop(&app).await?;

    // one QR per location
    let (status, _) = send(&app, "POST", "/distributor/qrcodes", Some(&shop.distributor), Some(json!({"location": "Register"}))).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let req = axum::http::Request::builder()
        .uri(format!("/distributor/qrcodes/{}/download", shop.qr_id))
        .header("authorization", format!("Bearer {}", shop.distributor))
        .body(axum::body::Body::empty())?;
    let resp = tower::Service::call(&mut app.clone(), req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "image/png");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    let (status, _) = send(&app, "POST", &format!("/distributor/qrcodes/{}/deactivate", shop.qr_id), Some(&shop.distributor), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/shop/{}", shop.code), None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/distributor/qrcodes/{}", shop.qr_id), Some(&shop.distributor), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn cancellation_runs_to_completion() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = build_app().await?;
    let distributor = account(&app, "Distributor").await?;
    let (_, contract) = send(
        &app,
        "POST",
        "/contracts",
        Some(&distributor),
        Some(json!({"company_name": "Kobayashi Mart", "location_name": "Ueno"})),
    )
    .await?;
    let id = contract["id"].as_str().unwrap_or_default().to_string();

    // a fresh contract is inside its minimum term
    let (status, _) = send(&app, "POST", &format!("/contracts/{id}/cancel"), Some(&distributor), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // shelf return is only possible after a cancellation request
    let (status, _) = send(&app, "POST", &format!("/contracts/{id}/shelf-return"), Some(&distributor), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let admin = json!({"email": "root@shelfup.test", "password": PASSWORD, "first_name": "Root", "last_name": "Admin"});
    send(&app, "POST", "/auth/admins", None, Some(admin)).await?;
    let admin_token = support::login(&app, "root@shelfup.test").await?;

    let (status, _) = send(&app, "POST", &format!("/admin/contracts/{id}/complete"), Some(&admin_token), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = send(&app, "GET", "/admin/contracts", Some(&admin_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["can_cancel"], false);
    Ok(())
}

#[tokio::test]
async fn admin_settings_and_settlements() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = build_app().await?;
    let admin = json!({"email": "root@shelfup.test", "password": PASSWORD, "first_name": "Root", "last_name": "Admin"});
    send(&app, "POST", "/auth/admins", None, Some(admin)).await?;
    let token = support::login(&app, "root@shelfup.test").await?;

    let (status, pricing) = send(&app, "GET", "/admin/settings/PRICING", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(pricing.as_array().map(|a| !a.is_empty()).unwrap_or(false));

    let (status, saved) = send(
        &app,
        "PUT",
        "/admin/settings",
        Some(&token),
        Some(json!({"category": "PRICING", "key": "PLATFORM_FEE_RATE", "value": "7"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["value"], "7");

    let (status, created) = send(&app, "POST", "/admin/settlements/generate", Some(&token), Some(json!({}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created.as_array().map(Vec::len), Some(0));

    let (status, report) = send(&app, "GET", "/admin/settlements", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["pending_total"], 0);
    Ok(())
}
