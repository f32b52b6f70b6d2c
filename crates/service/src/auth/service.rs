use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::Utc;
use jsonwebtoken::{encode, Header as JwtHeader, EncodingKey};
use models::user::UserRole;
use rand::rngs::OsRng;
use tracing::{info, debug, warn, instrument};
use uuid::Uuid;

use super::domain::{AuthSession, AuthUser, Claims, CreateAdminInput, LoginInput, NewUser, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Company name stamped on every administrator account.
pub const ADMIN_COMPANY_NAME: &str = "ShelfUp Operations";

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub password_algorithm: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: None, password_algorithm: "argon2".into(), token_ttl_hours: 12 }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a consumer, distributor or manufacturer with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use models::user::UserRole;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::default());
    /// let input = RegisterInput {
    ///     email: "user@example.com".into(), password: "Secret123".into(),
    ///     first_name: "Taro".into(), last_name: "Yamada".into(),
    ///     role: UserRole::Consumer, company_name: None,
    /// };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email, role = input.role.as_str()))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        if input.role == UserRole::Admin {
            return Err(AuthError::Validation("administrators cannot self-register".into()));
        }
        self.create_account(NewUser {
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role,
            company_name: input.company_name,
        }, &input.password).await
    }

    /// Create an administrator. The first administrator may be created by
    /// anyone; after that `actor` must be an administrator.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::CreateAdminInput;
    /// use std::sync::Arc;
    /// let svc = AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::default());
    /// let input = |email: &str| CreateAdminInput {
    ///     email: email.into(), password: "Adm1nPass".into(),
    ///     first_name: "Root".into(), last_name: "Ops".into(),
    /// };
    /// let first = tokio_test::block_on(svc.create_admin(input("root@example.com"), None)).unwrap();
    /// assert_eq!(first.company_name.as_deref(), Some("ShelfUp Operations"));
    /// assert!(tokio_test::block_on(svc.create_admin(input("other@example.com"), None)).is_err());
    /// assert!(tokio_test::block_on(svc.create_admin(input("other@example.com"), Some(&first))).is_ok());
    /// ```
    #[instrument(skip(self, input, actor), fields(email = %input.email))]
    pub async fn create_admin(&self, input: CreateAdminInput, actor: Option<&AuthUser>) -> Result<AuthUser, AuthError> {
        if self.repo.admin_exists().await? && !matches!(actor, Some(a) if a.role == UserRole::Admin) {
            warn!("admin creation refused");
            return Err(AuthError::Forbidden);
        }
        self.create_account(NewUser {
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            role: UserRole::Admin,
            company_name: Some(ADMIN_COMPANY_NAME.to_string()),
        }, &input.password).await
    }

    async fn create_account(&self, new_user: NewUser, password: &str) -> Result<AuthUser, AuthError> {
        if password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if !new_user.email.contains('@') {
            return Err(AuthError::Validation("invalid email".into()));
        }
        if new_user.first_name.trim().is_empty() || new_user.last_name.trim().is_empty() {
            return Err(AuthError::Validation("first and last name required".into()));
        }
        if let Some(existing) = self.repo.find_user_by_email(&new_user.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let user = self.repo.create_user(new_user).await?;
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let _cred = self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, email = %user.email, role = user.role.as_str(), "user_registered");
        Ok(user)
    }

    /// Authenticate a user and optionally issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use models::user::UserRole;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig { jwt_secret: Some("secret".into()), ..AuthConfig::default() });
    /// let _ = tokio_test::block_on(svc.register(RegisterInput {
    ///     email: "u@e.com".into(), password: "Passw0rd".into(),
    ///     first_name: "N".into(), last_name: "M".into(),
    ///     role: UserRole::Consumer, company_name: None,
    /// }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(session.token.is_some());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        self.authenticate(user, &input.password).await
    }

    /// Same as [`login`](Self::login) but only for distributor accounts.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login_distributor(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .filter(|u| u.role == UserRole::Distributor)
            .ok_or(AuthError::NotDistributor)?;
        self.authenticate(user, &input.password).await
    }

    async fn authenticate(&self, mut user: AuthUser, password: &str) -> Result<AuthSession, AuthError> {
        let now = Utc::now();
        if user.is_locked_out(now) {
            warn!(user_id = %user.id, "login for locked account");
            return Err(AuthError::LockedOut);
        }

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        self.repo.record_login(user.id, now).await?;
        user.last_login_at = Some(now);

        let token = match &self.cfg.jwt_secret {
            Some(secret) => Some(self.issue_token(&user, secret)?),
            None => None,
        };
        info!(user_id = %user.id, role = user.role.as_str(), "user_logged_in");
        Ok(AuthSession { user, token })
    }

    fn issue_token(&self, user: &AuthUser, secret: &str) -> Result<String, AuthError> {
        let exp = (Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp() as usize;
        let claims = Claims { sub: user.email.clone(), uid: user.id.to_string(), role: user.role.as_str().to_string(), exp };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Profile of the authenticated user.
    pub async fn me(&self, user_id: Uuid) -> Result<AuthUser, AuthError> {
        self.repo.find_user_by_id(user_id).await?.ok_or(AuthError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;
    use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};

    fn svc() -> (Arc<MockAuthRepository>, AuthService<MockAuthRepository>) {
        let repo = Arc::new(MockAuthRepository::default());
        let cfg = AuthConfig { jwt_secret: Some("test-secret".into()), ..AuthConfig::default() };
        (repo.clone(), AuthService::new(repo, cfg))
    }

    fn register_input(email: &str, role: UserRole) -> RegisterInput {
        RegisterInput {
            email: email.into(),
            password: "Passw0rd!".into(),
            first_name: "Hanako".into(),
            last_name: "Sato".into(),
            role,
            company_name: Some("Sato Store".into()),
        }
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_admin_role() {
        let (_, svc) = svc();
        let mut input = register_input("a@example.com", UserRole::Consumer);
        input.password = "short".into();
        assert!(matches!(svc.register(input).await, Err(AuthError::Validation(_))));
        let admin = register_input("b@example.com", UserRole::Admin);
        assert!(matches!(svc.register(admin).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (_, svc) = svc();
        svc.register(register_input("dup@example.com", UserRole::Consumer)).await.unwrap();
        let err = svc.register(register_input("DUP@example.com", UserRole::Consumer)).await.unwrap_err();
        assert_eq!(err.code(), 1002);
    }

    #[tokio::test]
    async fn login_issues_token_with_role_claim() {
        let (_, svc) = svc();
        svc.register(register_input("d@example.com", UserRole::Distributor)).await.unwrap();
        let session = svc.login(LoginInput { email: "d@example.com".into(), password: "Passw0rd!".into() }).await.unwrap();
        assert!(session.user.last_login_at.is_some());
        let token = session.token.unwrap();
        let data = decode::<Claims>(&token, &DecodingKey::from_secret(b"test-secret"), &Validation::new(Algorithm::HS256)).unwrap();
        assert_eq!(data.claims.role(), Some(UserRole::Distributor));
        assert_eq!(data.claims.user_id(), Some(session.user.id));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (_, svc) = svc();
        svc.register(register_input("w@example.com", UserRole::Consumer)).await.unwrap();
        let err = svc.login(LoginInput { email: "w@example.com".into(), password: "nope-nope".into() }).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn distributor_login_rejects_other_roles() {
        let (_, svc) = svc();
        svc.register(register_input("m@example.com", UserRole::Manufacturer)).await.unwrap();
        let err = svc.login_distributor(LoginInput { email: "m@example.com".into(), password: "Passw0rd!".into() }).await.unwrap_err();
        assert_eq!(err.to_string(), "distributor account not found");
    }

    #[tokio::test]
    async fn locked_account_cannot_login() {
        let (repo, svc) = svc();
        svc.register(register_input("l@example.com", UserRole::Distributor)).await.unwrap();
        repo.lock("l@example.com", Utc::now() + chrono::Duration::days(1));
        let err = svc.login(LoginInput { email: "l@example.com".into(), password: "Passw0rd!".into() }).await.unwrap_err();
        assert!(matches!(err, AuthError::LockedOut));
    }
}
