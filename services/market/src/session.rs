//! Server-side sessions referenced by a cookie token

use async_trait::async_trait;
use common::cache::RedisClient;
use rand::{Rng, distributions::Alphanumeric};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{MarketError, MarketResult};

/// Length of generated session tokens
pub const SESSION_TOKEN_LEN: usize = 48;

/// Storage for session records mapping a token to a username
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, token: &str, username: &str, ttl: Duration) -> MarketResult<()>;

    /// Username bound to `token`, if the record exists and has not expired
    async fn get(&self, token: &str) -> MarketResult<Option<String>>;

    async fn remove(&self, token: &str) -> MarketResult<()>;
}

fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

fn redis_failure(err: anyhow::Error) -> MarketError {
    MarketError::Persistence(format!("session store: {}", err))
}

/// Session records kept in Redis with a TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: RedisClient,
}

impl RedisSessionStore {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, token: &str, username: &str, ttl: Duration) -> MarketResult<()> {
        self.redis
            .set_with_expiry(&session_key(token), username, ttl)
            .await
            .map_err(redis_failure)
    }

    async fn get(&self, token: &str) -> MarketResult<Option<String>> {
        self.redis
            .get(&session_key(token))
            .await
            .map_err(redis_failure)
    }

    async fn remove(&self, token: &str) -> MarketResult<()> {
        self.redis
            .delete(&session_key(token))
            .await
            .map(|_| ())
            .map_err(redis_failure)
    }
}

/// Process-local session records (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    records: Arc<RwLock<HashMap<String, (String, Instant)>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, token: &str, username: &str, ttl: Duration) -> MarketResult<()> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            MarketError::Persistence(format!("session lifetime out of range: {:?}", ttl))
        })?;

        let mut records = self.records.write().await;
        // Drop every expired record, not only the ones looked up again
        records.retain(|_, (_, expiry)| *expiry > now);
        records.insert(token.to_string(), (username.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, token: &str) -> MarketResult<Option<String>> {
        let mut records = self.records.write().await;
        match records.get(token) {
            Some((_, expires_at)) if Instant::now() >= *expires_at => {
                records.remove(token);
                Ok(None)
            }
            Some((username, _)) => Ok(Some(username.clone())),
            None => Ok(None),
        }
    }

    async fn remove(&self, token: &str) -> MarketResult<()> {
        self.records.write().await.remove(token);
        Ok(())
    }
}

/// Creates, resolves and ends user sessions
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Create a new session for a user and return its token
    pub async fn create_session(&self, username: &str) -> MarketResult<String> {
        let token = generate_token();
        self.store.put(&token, username, self.ttl).await?;
        info!("Created session for user: {}", username);
        Ok(token)
    }

    /// Username bound to a session token
    pub async fn get_session(&self, token: &str) -> MarketResult<Option<String>> {
        if token.len() != SESSION_TOKEN_LEN {
            return Ok(None);
        }
        self.store.get(token).await
    }

    /// Delete a session
    pub async fn delete_session(&self, token: &str) -> MarketResult<()> {
        self.store.remove(token).await
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}
