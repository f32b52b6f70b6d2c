use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials, NewUser};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use models::user::{self, UserRole};

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn to_auth_user(u: user::Model) -> AuthUser {
    AuthUser {
        id: u.id,
        email: u.email,
        first_name: u.first_name,
        last_name: u.last_name,
        role: u.role,
        company_name: u.company_name,
        last_login_at: u.last_login_at.map(|t| t.with_timezone(&Utc)),
        lockout_end: u.lockout_end.map(|t| t.with_timezone(&Utc)),
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = user::find_by_email(&self.db, email)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_auth_user))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_auth_user))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<AuthUser, AuthError> {
        let created = user::create(
            &self.db,
            &new_user.email,
            &new_user.first_name,
            &new_user.last_name,
            new_user.role,
            new_user.company_name,
        )
        .await
        .map_err(|e| AuthError::Validation(e.to_string()))?;
        Ok(to_auth_user(created))
    }

    async fn admin_exists(&self) -> Result<bool, AuthError> {
        let n = user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Admin))
            .count(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(n > 0)
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AuthError> {
        let am = user::ActiveModel { id: Set(user_id), last_login_at: Set(Some(at.into())), ..Default::default() };
        am.update(&self.db).await.map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::find_by_user(&self.db, user_id)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm })
    }
}
