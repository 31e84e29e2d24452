use async_trait::async_trait;
use sqlx::postgres::PgQueryResult;
use uuid::Uuid;

use crate::{models::User, PGPool};

use super::{PgStore, StoreError, UserStore};

const USER_COLUMNS: &str = "id, name, email, pwd_hash, created_at";

pub async fn create(user: &User, pool: &PGPool) -> Result<PgQueryResult, sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, name, email, pwd_hash, created_at)
        VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.pwd_hash)
    .bind(user.created_at)
    .execute(pool)
    .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_by_email(email: &str, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        create(&user, &self.pool).await?;
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(get_by_id(id, &self.pool).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(get_by_email(email, &self.pool).await?)
    }
}
