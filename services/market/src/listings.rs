//! Listing operations: creation with unique identifiers, feed, edit, delete

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{MarketError, MarketResult};
use crate::id::ListingIdGenerator;
use crate::models::{Comment, Listing, NewListing, User};
use crate::repositories::{ListingStore, listing_not_found};
use crate::validation::{validate_listing, validate_listing_changes};

/// Default number of identifier candidates tried before giving up
pub const DEFAULT_MAX_ID_ATTEMPTS: u32 = 16;

/// Listing form input, as submitted
#[derive(Debug, Clone, Default)]
pub struct ListingInput {
    pub title: String,
    pub description: String,
    pub images: Option<String>,
    pub characteristics: Option<String>,
}

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn ListingStore>,
    ids: Arc<dyn ListingIdGenerator>,
    max_id_attempts: u32,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn ListingStore>,
        ids: Arc<dyn ListingIdGenerator>,
        max_id_attempts: u32,
    ) -> Self {
        Self {
            store,
            ids,
            max_id_attempts: max_id_attempts.max(1),
        }
    }

    /// Create a listing under a freshly generated identifier.
    ///
    /// Each candidate is inserted only if no listing holds it yet; colliding
    /// candidates are discarded and regenerated.
    pub async fn create_listing(
        &self,
        input: ListingInput,
        owner: Option<&User>,
    ) -> MarketResult<Listing> {
        let draft = validate_listing(
            &input.title,
            &input.description,
            input.images.as_deref(),
            input.characteristics.as_deref(),
        )
        .map_err(MarketError::Validation)?;

        let owner = owner.map(|user| user.username.clone());
        let published_at = Utc::now();

        for attempt in 1..=self.max_id_attempts {
            let candidate = self.ids.next_candidate();
            let new_listing =
                NewListing::from_draft(candidate, draft.clone(), owner.clone(), published_at);

            match self.store.insert_if_absent(new_listing).await? {
                Some(listing) => {
                    info!(
                        listing_id = %listing.id,
                        owner = ?listing.owner,
                        attempt,
                        "Created listing"
                    );
                    return Ok(listing);
                }
                None => warn!(attempt, "Listing id collision, regenerating"),
            }
        }

        Err(MarketError::Persistence(format!(
            "no free listing id after {} attempts",
            self.max_id_attempts
        )))
    }

    /// All listings, newest first
    pub async fn list_feed(&self) -> MarketResult<Vec<Listing>> {
        self.store.list_feed().await
    }

    /// Listings created by `username`, newest first
    pub async fn listings_of(&self, username: &str) -> MarketResult<Vec<Listing>> {
        self.store.list_by_owner(username).await
    }

    pub async fn get_listing(&self, id: &str) -> MarketResult<Listing> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| listing_not_found(id))
    }

    pub async fn update_listing(&self, id: &str, input: ListingInput) -> MarketResult<Listing> {
        let changes =
            validate_listing_changes(&input.title, &input.description, input.images.as_deref())
                .map_err(MarketError::Validation)?;

        let listing = self.store.update(id, changes).await?;
        info!(listing_id = %listing.id, "Updated listing");
        Ok(listing)
    }

    pub async fn delete_listing(&self, id: &str) -> MarketResult<()> {
        self.store.delete(id).await?;
        info!(listing_id = %id, "Deleted listing");
        Ok(())
    }

    pub async fn add_comment(&self, listing_id: &str, content: &str) -> MarketResult<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MarketError::Validation(
                "Comment content is required".to_string(),
            ));
        }
        self.store.add_comment(listing_id, content).await
    }

    pub async fn comments_for(&self, listing_id: &str) -> MarketResult<Vec<Comment>> {
        self.store.comments_for(listing_id).await
    }
}
