mod support;

use std::net::SocketAddr;

use axum::Router;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use server::routes;
use support::{cors, state, temp_qr_dir, test_db, PASSWORD};

struct TestApp {
    base_url: String,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let db = test_db().await?;
    let app: Router = routes::build_router(state(db, temp_qr_dir()), cors());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("reqwest client")
}

#[tokio::test]
async fn cookie_session_over_http() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = start_server().await?;
    let http = client();
    let email = format!("e2e_{}@example.com", Uuid::new_v4().simple());

    let resp = http
        .post(format!("{}/auth/register", app.base_url))
        .json(&json!({"email": email, "password": PASSWORD, "first_name": "Ken", "last_name": "Ito", "role": "Distributor"}))
        .send()
        .await?;
    assert_eq!(resp.status(), HttpStatusCode::CREATED);

    let resp = http
        .post(format!("{}/auth/distributor/login", app.base_url))
        .json(&json!({"email": email, "password": PASSWORD}))
        .send()
        .await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);

    // cookie store carries auth_token from here on
    let me: Value = http.get(format!("{}/auth/me", app.base_url)).send().await?.json().await?;
    assert_eq!(me["email"], email);

    let resp = http
        .post(format!("{}/contracts", app.base_url))
        .json(&json!({"company_name": "Ito Kiosk", "location_name": "Shinjuku"}))
        .send()
        .await?;
    assert_eq!(resp.status(), HttpStatusCode::CREATED);

    let resp = http.get(format!("{}/distributor/dashboard", app.base_url)).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);
    let dash: Value = resp.json().await?;
    assert_eq!(dash["contract"]["location_name"], "Shinjuku");

    let resp = http.post(format!("{}/auth/logout", app.base_url)).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::NO_CONTENT);
    let resp = http.get(format!("{}/auth/me", app.base_url)).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = start_server().await?;
    let resp = client().get(format!("{}/api-docs/openapi.json", app.base_url)).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);
    let doc: Value = resp.json().await?;
    assert!(doc["paths"]["/contracts"].is_object());
    Ok(())
}
