//! Service configuration
//!
//! Database and Redis settings come from `common`; everything specific to the
//! web service is read from `MARKET_*` environment variables.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::listings::DEFAULT_MAX_ID_ATTEMPTS;

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL_SECONDS: u64 = 31_536_000;

/// Where session records are kept
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Redis,
    Memory,
}

/// Web service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_address: String,
    /// Session lifetime in seconds
    pub session_ttl_seconds: u64,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    /// Identifier candidates tried per listing creation
    pub listing_id_max_attempts: u32,
    pub session_backend: SessionBackend,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `MARKET_BIND_ADDRESS` (default: "0.0.0.0:3000")
    /// - `MARKET_SESSION_TTL_SECONDS` (default: 604800, 1 to 31536000)
    /// - `MARKET_SECURE_COOKIES` (default: false)
    /// - `MARKET_LISTING_ID_MAX_ATTEMPTS` (default: 16)
    /// - `MARKET_SESSION_BACKEND`: `redis` or `memory` (default: redis)
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("session_ttl_seconds", 604_800)?
            .set_default("secure_cookies", false)?
            .set_default("listing_id_max_attempts", DEFAULT_MAX_ID_ATTEMPTS)?
            .set_default("session_backend", "redis")?
            .add_source(config::Environment::with_prefix("MARKET").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        if config.listing_id_max_attempts == 0 {
            anyhow::bail!("MARKET_LISTING_ID_MAX_ATTEMPTS must be at least 1");
        }
        if !(1..=MAX_SESSION_TTL_SECONDS).contains(&config.session_ttl_seconds) {
            anyhow::bail!(
                "MARKET_SESSION_TTL_SECONDS must be between 1 and {}",
                MAX_SESSION_TTL_SECONDS
            );
        }
        Ok(config)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            session_ttl_seconds: 604_800,
            secure_cookies: false,
            listing_id_max_attempts: DEFAULT_MAX_ID_ATTEMPTS,
            session_backend: SessionBackend::Redis,
        }
    }
}
