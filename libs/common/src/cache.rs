//! Redis client used for server-side session records
//!
//! Sessions are plain string values stored under a key with an expiry. A
//! single multiplexed connection is opened at startup and shared by every
//! clone of [`RedisClient`].

use anyhow::{Context, Result};
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Connection and per-command timeout
    pub timeout: Duration,
}

impl RedisConfig {
    /// Read the Redis settings from the environment
    ///
    /// # Environment Variables
    /// - `REDIS_URL` (default: "redis://localhost:6379")
    /// - `REDIS_TIMEOUT_SECONDS` (default: 5)
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let timeout = match std::env::var("REDIS_TIMEOUT_SECONDS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("REDIS_TIMEOUT_SECONDS is not a number: {raw}"))?,
            Err(_) => 5,
        };

        Ok(RedisConfig {
            url,
            timeout: Duration::from_secs(timeout),
        })
    }
}

/// Whole seconds for `SET EX`, rounded up; Redis rejects a zero expiry
fn expiry_seconds(ttl: Duration) -> u64 {
    let partial = u64::from(ttl.subsec_nanos() > 0);
    ttl.as_secs().saturating_add(partial).max(1)
}

#[derive(Clone)]
pub struct RedisClient {
    conn: MultiplexedConnection,
}

impl RedisClient {
    /// Open the shared connection
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())
            .with_context(|| format!("invalid Redis URL: {}", config.url))?;
        let conn = client
            .get_multiplexed_async_connection_with_timeouts(config.timeout, config.timeout)
            .await
            .context("failed to connect to Redis")?;

        info!("Connected to Redis at {}", config.url);
        Ok(RedisClient { conn })
    }

    /// Store `value` under `key`, expiring after `ttl` (rounded up to a second)
    pub async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let seconds = expiry_seconds(ttl);
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, seconds).await?;
        debug!(key, seconds, "Stored Redis key");
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    /// Delete `key`, returning whether it existed
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    pub async fn ping(&self) -> Result<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
