//! Schema migrations for the marketplace tables

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, migrate::Migrator};
use tracing::info;

/// Migrations embedded from `migrations/`
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Bring the schema up to date
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    info!("Database migrations applied");
    Ok(())
}
