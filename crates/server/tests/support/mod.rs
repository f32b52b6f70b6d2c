#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower::Service;
use uuid::Uuid;

use server::routes::{self, auth};
use service::qr_codes::QrOptions;

pub const JWT_SECRET: &str = "test-secret";
pub const PASSWORD: &str = "S3curePass!";

pub fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

pub fn temp_qr_dir() -> PathBuf {
    std::env::temp_dir().join(format!("shelfup-qr-{}", Uuid::new_v4()))
}

pub async fn test_db() -> anyhow::Result<DatabaseConnection> {
    let db = models::db::connect_with_config(&models::db::memory_config()).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn state(db: DatabaseConnection, qr_dir: PathBuf) -> auth::ServerState {
    auth::ServerState {
        db,
        auth: auth::ServerAuthConfig { jwt_secret: JWT_SECRET.into(), token_ttl_hours: 12 },
        qr: QrOptions { base_url: "http://shop.test".into(), qr_dir },
    }
}

pub async fn build_app() -> anyhow::Result<Router> {
    let db = test_db().await?;
    Ok(routes::build_router(state(db, temp_qr_dir()), cors()))
}

/// Fire one request at the router and decode the JSON body (Null when empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&v)?))?,
        None => builder.body(Body::empty())?,
    };
    let resp = app.clone().call(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, value))
}

pub async fn register(app: &Router, email: &str, role: &str, company: Option<&str>) -> anyhow::Result<Value> {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": PASSWORD,
            "first_name": "Hanako",
            "last_name": "Suzuki",
            "role": role,
            "company_name": company,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "register {email}: {body}");
    Ok(body)
}

pub async fn login(app: &Router, email: &str) -> anyhow::Result<String> {
    let (status, body) = send(app, "POST", "/auth/login", None, Some(json!({"email": email, "password": PASSWORD}))).await?;
    assert_eq!(status, StatusCode::OK, "login {email}: {body}");
    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

/// Register a fresh account with `role` and return its bearer token.
pub async fn account(app: &Router, role: &str) -> anyhow::Result<String> {
    let email = format!("{}_{}@example.com", role.to_lowercase(), Uuid::new_v4().simple());
    register(app, &email, role, Some("Suzuki Trading")).await?;
    login(app, &email).await
}
