//! Database schema migrations
//!
//! Versioned schema migrations tracked through the `schema_version` table.
//! Migrations must stay idempotent (safe to run multiple times) and never be
//! edited once released; schema changes get a new migration function and a
//! bumped `CURRENT_SCHEMA_VERSION`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

/// Set schema version in database
async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = get_schema_version(pool).await?;

    if current >= CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    info!(
        "Migrating database schema from v{} to v{}",
        current, CURRENT_SCHEMA_VERSION
    );

    if current < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    if current < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    Ok(())
}

/// v1: lookup indexes for the wizard resume path and listing browse queries
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_lead_steps_lead ON lead_steps(lead_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_zone ON listings(zone_id)")
        .execute(pool)
        .await?;

    info!("Migration v1: Created lead_steps and listings indexes");
    Ok(())
}

/// v2: add instagram column to listings created before contact handles
/// were captured per row
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    // Check if column already exists (idempotency)
    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('listings') WHERE name = 'instagram'",
    )
    .fetch_one(pool)
    .await?;

    if has_column == 0 {
        sqlx::query("ALTER TABLE listings ADD COLUMN instagram TEXT")
            .execute(pool)
            .await?;
        info!("Migration v2: Added instagram column to listings");
    }

    Ok(())
}
