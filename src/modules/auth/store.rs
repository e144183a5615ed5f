use async_trait::async_trait;
use shelf_db::StoreResult;
use sqlx::PgPool;

use super::models::{NewUser, User};

/// Unique constraint on `users.email`.
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return its id.
    async fn create(&self, user: NewUser) -> StoreResult<i64>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
