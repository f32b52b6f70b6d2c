use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use models::user::UserRole;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use service::auth::domain::{AuthUser, Claims, CreateAdminInput, LoginInput, RegisterInput};
use service::auth::service::{AuthConfig, AuthService};
use service::auth::repo::SeaOrmAuthRepository;
use service::qr_codes::QrOptions;

use crate::errors::{ApiResult, JsonApiError};
use crate::metrics;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub qr: QrOptions,
}

impl ServerState {
    fn auth_service(&self) -> AuthService<SeaOrmAuthRepository> {
        let repo = Arc::new(SeaOrmAuthRepository::new(self.db.clone()));
        AuthService::new(
            repo,
            AuthConfig {
                jwt_secret: Some(self.auth.jwt_secret.clone()),
                password_algorithm: "argon2".into(),
                token_ttl_hours: self.auth.token_ttl_hours,
            },
        )
    }
}

/// Identity decoded from the bearer token or `auth_token` cookie.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub user: AuthUser,
    pub token: String,
}

fn is_public(method: &Method, path: &str) -> bool {
    method == Method::OPTIONS
        || path == "/health"
        || path == "/metrics"
        || path == "/auth/login"
        || path == "/auth/register"
        || path == "/auth/distributor/login"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
        || path.starts_with("/qrcodes/")
}

/// Routes where a token is read when present but not demanded.
fn token_optional(method: &Method, path: &str) -> bool {
    path == "/auth/admins" || (method == Method::GET && path.starts_with("/shop/"))
}

fn extract_token(req: &Request) -> Result<Option<String>, JsonApiError> {
    let path = req.uri().path();
    if let Some(h) = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return match h.strip_prefix("Bearer ") {
            Some(t) => Ok(Some(t.trim().to_string())),
            None => {
                warn!(path = %path, "invalid Authorization format (expect Bearer)");
                Err(JsonApiError::unauthorized("Authorization header must use the Bearer scheme"))
            }
        };
    }
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = cookie_header
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("auth_token="))
        .find(|t| !t.is_empty())
        .map(str::to_string);
    Ok(token)
}

fn decode_user(secret: &str, token: &str) -> Result<CurrentUser, JsonApiError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let claims = decode::<Claims>(token, &key, &validation)
        .map_err(|e| {
            warn!(err = %e, "token validation failed");
            JsonApiError::unauthorized("invalid or expired token")
        })?
        .claims;
    match (claims.user_id(), claims.role()) {
        (Some(id), Some(role)) => Ok(CurrentUser { id, email: claims.sub, role }),
        _ => Err(JsonApiError::unauthorized("malformed token claims")),
    }
}

/// Global middleware: everything outside the public whitelist needs a valid
/// token. Missing token gives 400, invalid or expired gives 401. Routes with an
/// optional token continue anonymously instead.
pub async fn authenticate(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    if is_public(&method, &path) {
        return Ok(next.run(req).await);
    }

    // optional routes treat an unusable token like no token
    let optional = token_optional(&method, &path);
    let token = match extract_token(&req) {
        Ok(Some(t)) => t,
        Ok(None) | Err(_) if optional => return Ok(next.run(req).await),
        Ok(None) => {
            warn!(path = %path, "missing Authorization header and auth_token cookie");
            return Err(JsonApiError::bad_request("missing authentication token"));
        }
        Err(e) => return Err(e),
    };
    match decode_user(&state.auth.jwt_secret, &token) {
        Ok(user) => {
            req.extensions_mut().insert(user);
        }
        Err(_) if optional => debug!(path = %path, "continuing anonymously with unusable token"),
        Err(e) => return Err(e),
    }
    Ok(next.run(req).await)
}

async fn guard(role: UserRole, req: Request, next: Next) -> Result<Response, JsonApiError> {
    match req.extensions().get::<CurrentUser>() {
        Some(u) if u.role == role => Ok(next.run(req).await),
        Some(u) => {
            warn!(user_id = %u.id, role = u.role.as_str(), required = role.as_str(), "role check failed");
            Err(JsonApiError::forbidden(format!("{} role required", role.as_str())))
        }
        None => Err(JsonApiError::unauthorized("authentication required")),
    }
}

pub async fn require_distributor(req: Request, next: Next) -> Result<Response, JsonApiError> {
    guard(UserRole::Distributor, req, next).await
}

pub async fn require_manufacturer(req: Request, next: Next) -> Result<Response, JsonApiError> {
    guard(UserRole::Manufacturer, req, next).await
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, JsonApiError> {
    guard(UserRole::Admin, req, next).await
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

fn start_session(jar: CookieJar, user: AuthUser, token: Option<String>) -> ApiResult<(CookieJar, Json<LoginOutput>)> {
    let token = token.ok_or_else(|| JsonApiError::internal("token generation failed"))?;
    metrics::LOGINS_TOTAL.inc();
    let jar = jar.add(session_cookie(token.clone()));
    Ok((jar, Json(LoginOutput { user, token })))
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, Json(input): Json<RegisterInput>) -> ApiResult<(StatusCode, Json<AuthUser>)> {
    let user = state.auth_service().register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in, auth_token cookie set"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> ApiResult<(CookieJar, Json<LoginOutput>)> {
    let session = state.auth_service().login(input).await?;
    start_session(jar, session.user, session.token)
}

#[utoipa::path(post, path = "/auth/distributor/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in as distributor"), (status = 401, description = "Not a distributor account or bad credentials")))]
pub async fn distributor_login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> ApiResult<(CookieJar, Json<LoginOutput>)> {
    let session = state.auth_service().login_distributor(input).await?;
    start_session(jar, session.user, session.token)
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<AuthUser>> {
    Ok(Json(state.auth_service().me(user.id).await?))
}

#[utoipa::path(post, path = "/auth/admins", tag = "auth", request_body = crate::openapi::CreateAdminRequest, responses((status = 201, description = "Administrator created"), (status = 403, description = "Only administrators can create administrators")))]
pub async fn create_admin(
    State(state): State<ServerState>,
    current: Option<Extension<CurrentUser>>,
    Json(input): Json<CreateAdminInput>,
) -> ApiResult<(StatusCode, Json<AuthUser>)> {
    let svc = state.auth_service();
    let actor = match current {
        Some(Extension(u)) => Some(svc.me(u.id).await?),
        None => None,
    };
    let admin = svc.create_admin(input, actor.as_ref()).await?;
    info!(admin_id = %admin.id, "administrator created");
    Ok((StatusCode::CREATED, Json(admin)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_covers_public_surfaces() {
        assert!(is_public(&Method::POST, "/auth/login"));
        assert!(is_public(&Method::GET, "/qrcodes/ABCD1234.png"));
        assert!(is_public(&Method::OPTIONS, "/admin/dashboard"));
        assert!(!is_public(&Method::GET, "/auth/me"));
        assert!(!is_public(&Method::GET, "/shop/ABCD1234"));
    }

    #[test]
    fn shop_reads_take_optional_token() {
        assert!(token_optional(&Method::GET, "/shop/ABCD1234"));
        assert!(!token_optional(&Method::POST, "/shop/ABCD1234/orders"));
        assert!(token_optional(&Method::POST, "/auth/admins"));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let err = decode_user("secret", "not-a-jwt").unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
