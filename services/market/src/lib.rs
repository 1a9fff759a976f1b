//! BuyMe marketplace service
//!
//! Users register and log in, publish product listings, and browse a feed.
//! Pages are rendered on the server; sessions live in Redis behind an
//! HTTP-only cookie; users and listings are stored in PostgreSQL.

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod id;
pub mod identity;
pub mod listings;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod state;
pub mod templates;
pub mod validation;

pub use error::{MarketError, MarketResult};
pub use routes::create_router;
pub use state::AppState;
