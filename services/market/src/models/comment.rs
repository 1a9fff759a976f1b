//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Comment attached to exactly one listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Comment {
    pub id: i64,
    #[sqlx(rename = "position_id")]
    pub listing_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
