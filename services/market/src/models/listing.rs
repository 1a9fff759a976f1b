//! Listing ("position") model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Product listing shown in the feed
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Optional JSON object of key/value characteristics
    pub characteristics: Option<serde_json::Value>,
    /// Free-text image references, stored as given
    pub images: Option<String>,
    pub published_at: DateTime<Utc>,
    /// Username of the creating user; `None` for anonymous listings
    pub owner: Option<String>,
}

impl Listing {
    /// Whether `username` may edit or delete this listing
    pub fn editable_by(&self, username: &str) -> bool {
        match &self.owner {
            Some(owner) => owner == username,
            None => true,
        }
    }
}

/// Validated listing content, before an identifier is assigned
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub images: Option<String>,
    pub characteristics: Option<serde_json::Value>,
}

/// Listing row ready for insertion
#[derive(Debug, Clone)]
pub struct NewListing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub characteristics: Option<serde_json::Value>,
    pub images: Option<String>,
    pub published_at: DateTime<Utc>,
    pub owner: Option<String>,
}

impl NewListing {
    pub fn from_draft(
        id: String,
        draft: ListingDraft,
        owner: Option<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            characteristics: draft.characteristics,
            images: draft.images,
            published_at,
            owner,
        }
    }

    pub fn into_listing(self) -> Listing {
        Listing {
            id: self.id,
            title: self.title,
            description: self.description,
            characteristics: self.characteristics,
            images: self.images,
            published_at: self.published_at,
            owner: self.owner,
        }
    }
}

/// The mutable fields of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListingChanges {
    pub title: String,
    pub description: String,
    pub images: Option<String>,
}
