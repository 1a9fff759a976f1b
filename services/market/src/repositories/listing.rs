//! PostgreSQL listing repository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{ListingStore, is_unique_violation, listing_not_found};
use crate::error::{MarketError, MarketResult};
use crate::models::{Comment, Listing, ListingChanges, NewListing};

/// Listing repository backed by the `positions` and `comments` tables
#[derive(Clone)]
pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    /// Create a new listing repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for PgListingRepository {
    async fn insert_if_absent(&self, listing: NewListing) -> MarketResult<Option<Listing>> {
        let mut tx = self.pool.begin().await?;

        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM positions WHERE id = $1)")
                .bind(&listing.id)
                .fetch_one(&mut *tx)
                .await?;

        if taken {
            tx.rollback().await?;
            debug!(listing_id = %listing.id, "Listing id already taken");
            return Ok(None);
        }

        let result = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO positions (id, title, description, characteristics, images, published_at, owner)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, characteristics, images, published_at, owner
            "#,
        )
        .bind(&listing.id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(&listing.characteristics)
        .bind(&listing.images)
        .bind(listing.published_at)
        .bind(&listing.owner)
        .fetch_one(&mut *tx)
        .await;

        match result {
            Ok(row) => {
                tx.commit().await?;
                info!(listing_id = %row.id, "Inserted listing");
                Ok(Some(row))
            }
            Err(e) if is_unique_violation(&e) => {
                // Lost a race with a concurrent insert of the same id
                tx.rollback().await?;
                Ok(None)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn list_feed(&self) -> MarketResult<Vec<Listing>> {
        let listings = sqlx::query_as::<_, Listing>(
            r#"
            SELECT id, title, description, characteristics, images, published_at, owner
            FROM positions
            ORDER BY published_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    async fn list_by_owner(&self, username: &str) -> MarketResult<Vec<Listing>> {
        let listings = sqlx::query_as::<_, Listing>(
            r#"
            SELECT id, title, description, characteristics, images, published_at, owner
            FROM positions
            WHERE owner = $1
            ORDER BY published_at DESC, id DESC
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    async fn get(&self, id: &str) -> MarketResult<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>(
            r#"
            SELECT id, title, description, characteristics, images, published_at, owner
            FROM positions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn update(&self, id: &str, changes: ListingChanges) -> MarketResult<Listing> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Listing>(
            r#"
            UPDATE positions
            SET title = $2, description = $3, images = $4
            WHERE id = $1
            RETURNING id, title, description, characteristics, images, published_at, owner
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.images)
        .fetch_optional(&mut *tx)
        .await;

        match updated {
            Ok(Some(listing)) => {
                tx.commit().await?;
                Ok(listing)
            }
            Ok(None) => {
                tx.rollback().await?;
                Err(listing_not_found(id))
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn delete(&self, id: &str) -> MarketResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM positions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await;

        match result {
            Ok(done) if done.rows_affected() > 0 => {
                tx.commit().await?;
                Ok(())
            }
            Ok(_) => {
                tx.rollback().await?;
                Err(listing_not_found(id))
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn add_comment(&self, listing_id: &str, content: &str) -> MarketResult<Comment> {
        let mut tx = self.pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM positions WHERE id = $1)")
                .bind(listing_id)
                .fetch_one(&mut *tx)
                .await?;

        if !exists {
            tx.rollback().await?;
            return Err(listing_not_found(listing_id));
        }

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (position_id, content)
            VALUES ($1, $2)
            RETURNING id, position_id, content, created_at
            "#,
        )
        .bind(listing_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await
        .map_err(MarketError::from)?;

        tx.commit().await?;
        Ok(comment)
    }

    async fn comments_for(&self, listing_id: &str) -> MarketResult<Vec<Comment>> {
        if self.get(listing_id).await?.is_none() {
            return Err(listing_not_found(listing_id));
        }

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, position_id, content, created_at
            FROM comments
            WHERE position_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}
