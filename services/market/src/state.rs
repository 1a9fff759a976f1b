//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    config::ServerConfig,
    error::MarketResult,
    id::RandomDigits,
    identity::IdentityService,
    listings::ListingService,
    repositories::{InMemoryListingStore, InMemoryUserStore, ListingStore, UserStore},
    session::{InMemorySessionStore, SessionManager, SessionStore},
    templates::Templates,
};

/// Application state shared across handlers
///
/// Built once at startup and handed to the router; no handler reaches for
/// global state.
#[derive(Clone)]
pub struct AppState {
    pub templates: Templates,
    pub identity: IdentityService,
    pub listings: ListingService,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the services over the given stores
    pub fn new(
        config: ServerConfig,
        users: Arc<dyn UserStore>,
        listings: Arc<dyn ListingStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> MarketResult<Self> {
        let sessions = SessionManager::new(sessions, config.session_ttl());

        Ok(Self {
            templates: Templates::new()?,
            identity: IdentityService::new(users, sessions),
            listings: ListingService::new(
                listings,
                Arc::new(RandomDigits),
                config.listing_id_max_attempts,
            ),
            config: Arc::new(config),
        })
    }

    /// State backed entirely by in-memory stores
    pub fn in_memory(config: ServerConfig) -> MarketResult<Self> {
        Self::new(
            config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryListingStore::new()),
            Arc::new(InMemorySessionStore::new()),
        )
    }
}
