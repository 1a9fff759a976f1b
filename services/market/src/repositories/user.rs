//! PostgreSQL user repository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::{UserStore, is_unique_violation};
use crate::error::{MarketError, MarketResult};
use crate::models::{NewUser, User};

/// User repository backed by the `users` table
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn conflict_from_constraint(err: &sqlx::Error) -> MarketError {
    let on_email = err
        .as_database_error()
        .and_then(|db_err| db_err.constraint())
        .is_some_and(|constraint| constraint.contains("email"));

    if on_email {
        MarketError::Conflict("Email is already registered".to_string())
    } else {
        MarketError::Conflict("Username is already taken".to_string())
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn insert(&self, new_user: NewUser) -> MarketResult<User> {
        info!("Creating new user: {}", new_user.username);

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING username, email, password_hash, created_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&mut *tx)
        .await;

        match result {
            Ok(user) => {
                tx.commit().await?;
                Ok(user)
            }
            Err(e) => {
                tx.rollback().await?;
                if is_unique_violation(&e) {
                    Err(conflict_from_constraint(&e))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> MarketResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT username, email, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn exists(&self, username: &str, email: &str) -> MarketResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count(&self) -> MarketResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
