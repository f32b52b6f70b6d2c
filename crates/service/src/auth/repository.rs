use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, NewUser};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, user: NewUser) -> Result<AuthUser, AuthError>;
    async fn admin_exists(&self) -> Result<bool, AuthError>;
    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use models::user::UserRole;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: lower-cased email
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
    }

    impl MockAuthRepository {
        /// Lock an account, as a completed contract cancellation does.
        pub fn lock(&self, email: &str, until: DateTime<Utc>) {
            if let Some(u) = self.users.lock().unwrap().get_mut(&email.to_lowercase()) {
                u.lockout_end = Some(until);
            }
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(&email.trim().to_lowercase()).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.id == id).cloned())
        }

        async fn create_user(&self, user: NewUser) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            let key = user.email.trim().to_lowercase();
            if users.contains_key(&key) {
                return Err(AuthError::Conflict);
            }
            let created = AuthUser {
                id: Uuid::new_v4(),
                email: key.clone(),
                first_name: user.first_name,
                last_name: user.last_name,
                role: user.role,
                company_name: user.company_name,
                last_login_at: None,
                lockout_end: None,
            };
            users.insert(key, created.clone());
            Ok(created)
        }

        async fn admin_exists(&self) -> Result<bool, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().any(|u| u.role == UserRole::Admin))
        }

        async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AuthError> {
            let mut users = self.users.lock().unwrap();
            if let Some(u) = users.values_mut().find(|u| u.id == user_id) {
                u.last_login_at = Some(at);
            }
            Ok(())
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = Credentials { user_id, password_hash, password_algorithm };
            creds.insert(user_id, c.clone());
            Ok(c)
        }
    }
}
