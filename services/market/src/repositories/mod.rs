//! Store seams for users and listings
//!
//! Each trait has a PostgreSQL repository used by the service and an
//! in-memory implementation for development and tests.

use async_trait::async_trait;

use crate::error::MarketResult;
use crate::models::{Comment, Listing, ListingChanges, NewListing, NewUser, User};

pub mod listing;
pub mod memory;
pub mod user;

pub use listing::PgListingRepository;
pub use memory::{InMemoryListingStore, InMemoryUserStore};
pub use user::PgUserRepository;

/// Persistence for registered users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; a taken username or email is a `Conflict`
    async fn insert(&self, new_user: NewUser) -> MarketResult<User>;

    async fn find_by_username(&self, username: &str) -> MarketResult<Option<User>>;

    /// Whether the username or the email is already registered
    async fn exists(&self, username: &str, email: &str) -> MarketResult<bool>;

    async fn count(&self) -> MarketResult<i64>;
}

/// Persistence for listings and their comments
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Insert the listing unless its identifier is already taken.
    ///
    /// The existence check and the insert run in one transaction. Returns
    /// `None` on collision, with nothing written.
    async fn insert_if_absent(&self, listing: NewListing) -> MarketResult<Option<Listing>>;

    /// All listings, newest first
    async fn list_feed(&self) -> MarketResult<Vec<Listing>>;

    /// Listings owned by `username`, newest first
    async fn list_by_owner(&self, username: &str) -> MarketResult<Vec<Listing>>;

    async fn get(&self, id: &str) -> MarketResult<Option<Listing>>;

    /// Overwrite the mutable fields; `NotFound` when missing
    async fn update(&self, id: &str, changes: ListingChanges) -> MarketResult<Listing>;

    /// Remove permanently, together with its comments; `NotFound` when missing
    async fn delete(&self, id: &str) -> MarketResult<()>;

    /// Attach a comment; `NotFound` when the listing is missing
    async fn add_comment(&self, listing_id: &str, content: &str) -> MarketResult<Comment>;

    /// Comments of a listing, oldest first; `NotFound` when the listing is missing
    async fn comments_for(&self, listing_id: &str) -> MarketResult<Vec<Comment>>;
}

/// Whether a database error is a violated unique or primary key constraint
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

pub(crate) fn listing_not_found(id: &str) -> crate::error::MarketError {
    crate::error::MarketError::NotFound(format!("listing {}", id))
}
