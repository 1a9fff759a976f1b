//! In-memory stores (for development/testing)

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{ListingStore, UserStore, listing_not_found};
use crate::error::{MarketError, MarketResult};
use crate::models::{Comment, Listing, ListingChanges, NewListing, NewUser, User};

/// In-memory implementation of UserStore
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, new_user: NewUser) -> MarketResult<User> {
        let mut users = self.users.write().await;

        if users.contains_key(&new_user.username) {
            return Err(MarketError::Conflict("Username is already taken".to_string()));
        }
        if users.values().any(|u| u.email == new_user.email) {
            return Err(MarketError::Conflict(
                "Email is already registered".to_string(),
            ));
        }

        let user = User {
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.username.clone(), user.clone());

        tracing::info!(username = %user.username, "Created user");
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> MarketResult<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn exists(&self, username: &str, email: &str) -> MarketResult<bool> {
        let users = self.users.read().await;
        Ok(users.contains_key(username) || users.values().any(|u| u.email == email))
    }

    async fn count(&self) -> MarketResult<i64> {
        Ok(self.users.read().await.len() as i64)
    }
}

#[derive(Debug, Default)]
struct ListingTables {
    listings: HashMap<String, Listing>,
    comments: Vec<Comment>,
    next_comment_id: i64,
}

/// In-memory implementation of ListingStore
#[derive(Debug, Default, Clone)]
pub struct InMemoryListingStore {
    tables: Arc<RwLock<ListingTables>>,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored listings
    pub async fn len(&self) -> usize {
        self.tables.read().await.listings.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn newest_first(listings: &mut [Listing]) {
    listings.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn insert_if_absent(&self, listing: NewListing) -> MarketResult<Option<Listing>> {
        let mut tables = self.tables.write().await;

        if tables.listings.contains_key(&listing.id) {
            return Ok(None);
        }

        let listing = listing.into_listing();
        tables.listings.insert(listing.id.clone(), listing.clone());
        Ok(Some(listing))
    }

    async fn list_feed(&self) -> MarketResult<Vec<Listing>> {
        let tables = self.tables.read().await;
        let mut listings: Vec<Listing> = tables.listings.values().cloned().collect();
        newest_first(&mut listings);
        Ok(listings)
    }

    async fn list_by_owner(&self, username: &str) -> MarketResult<Vec<Listing>> {
        let tables = self.tables.read().await;
        let mut listings: Vec<Listing> = tables
            .listings
            .values()
            .filter(|l| l.owner.as_deref() == Some(username))
            .cloned()
            .collect();
        newest_first(&mut listings);
        Ok(listings)
    }

    async fn get(&self, id: &str) -> MarketResult<Option<Listing>> {
        Ok(self.tables.read().await.listings.get(id).cloned())
    }

    async fn update(&self, id: &str, changes: ListingChanges) -> MarketResult<Listing> {
        let mut tables = self.tables.write().await;
        let listing = tables
            .listings
            .get_mut(id)
            .ok_or_else(|| listing_not_found(id))?;

        listing.title = changes.title;
        listing.description = changes.description;
        listing.images = changes.images;
        Ok(listing.clone())
    }

    async fn delete(&self, id: &str) -> MarketResult<()> {
        let mut tables = self.tables.write().await;
        if tables.listings.remove(id).is_none() {
            return Err(listing_not_found(id));
        }
        tables.comments.retain(|c| c.listing_id != id);
        Ok(())
    }

    async fn add_comment(&self, listing_id: &str, content: &str) -> MarketResult<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.listings.contains_key(listing_id) {
            return Err(listing_not_found(listing_id));
        }

        tables.next_comment_id += 1;
        let comment = Comment {
            id: tables.next_comment_id,
            listing_id: listing_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn comments_for(&self, listing_id: &str) -> MarketResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        if !tables.listings.contains_key(listing_id) {
            return Err(listing_not_found(listing_id));
        }

        Ok(tables
            .comments
            .iter()
            .filter(|c| c.listing_id == listing_id)
            .cloned()
            .collect())
    }
}
