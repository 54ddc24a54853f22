// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::unique_violation, error::AppError},
    db::traits::UserStore,
    models::auth::{NewUser, User, UserRole},
};

const USER_COLUMNS: &str =
    "id, phone, password_hash, name, email, role, fcm_token, created_at, updated_at";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone = $1"
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (phone, password_hash, name, email, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.phone)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(new_user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e).as_deref() {
            Some("users_phone_key") => AppError::PhoneAlreadyExists,
            _ => e.into(),
        })
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_fcm_token(&self, id: Uuid, token: Option<String>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET fcm_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_fcm_token_if(&self, id: Uuid, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET fcm_token = NULL, updated_at = NOW() WHERE id = $1 AND fcm_token = $2",
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_admins(&self) -> Result<Vec<User>, AppError> {
        let admins = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY created_at"
        ))
        .bind(UserRole::Admin)
        .fetch_all(&self.pool)
        .await?;
        Ok(admins)
    }

    async fn latest_customer(&self) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE role = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(UserRole::Customer)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
