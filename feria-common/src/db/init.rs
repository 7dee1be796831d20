//! Database initialization
//!
//! Creates the database on first run, applies idempotent schema creation,
//! runs versioned migrations, and seeds the default catalog so a fresh
//! install can resolve imports immediately.

use crate::types::CatalogEntry;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Default categories seeded into a fresh database.
///
/// Also serves as the static fallback catalog when the dynamic lookup
/// fails during an import.
pub fn default_categories() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new(1, "Inmuebles", "inmuebles"),
        CatalogEntry::new(2, "Vehículos", "vehiculos"),
        CatalogEntry::new(3, "Hogar", "hogar"),
        CatalogEntry::new(4, "Tecnología", "tecnologia"),
        CatalogEntry::new(5, "Servicios", "servicios"),
        CatalogEntry::new(6, "Empleo", "empleo"),
    ]
}

/// Default zones seeded into a fresh database (static fallback catalog).
pub fn default_zones() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new(1, "Centro", "centro"),
        CatalogEntry::new(2, "Norte", "norte"),
        CatalogEntry::new(3, "Sur", "sur"),
        CatalogEntry::new(4, "Rosario, Santa Fe", "rosario-santa-fe"),
        CatalogEntry::new(5, "Córdoba Capital", "cordoba-capital"),
        CatalogEntry::new(6, "La Plata, Buenos Aires", "la-plata-buenos-aires"),
    ]
}

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers with one writer; autosave traffic
    // from the wizard can overlap with import inserts
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Schema creation (idempotent - safe to call multiple times)
    create_schema_version_table(&pool).await?;
    create_leads_table(&pool).await?;
    create_lead_steps_table(&pool).await?;
    create_listings_table(&pool).await?;
    create_categories_table(&pool).await?;
    create_zones_table(&pool).await?;

    // Versioned migrations run after CREATE TABLE IF NOT EXISTS
    crate::db::migrations::run_migrations(&pool).await?;

    // Seed default catalog entries
    seed_default_catalog(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_leads_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leads (
            id TEXT PRIMARY KEY,
            tenant_id TEXT,
            property_id TEXT,
            flow_type TEXT NOT NULL,
            source TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'NEW',
            name TEXT,
            email TEXT,
            phone TEXT,
            zone TEXT,
            property_type TEXT,
            budget_min REAL,
            budget_max REAL,
            bedrooms INTEGER,
            area_m2 REAL,
            condition TEXT,
            address TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            submitted_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Per-step wizard values, one row per (lead, step key).
///
/// The composite primary key is the upsert target for last-write-wins
/// autosave semantics.
async fn create_lead_steps_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lead_steps (
            lead_id TEXT NOT NULL,
            step_key TEXT NOT NULL,
            value TEXT,
            saved_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (lead_id, step_key),
            FOREIGN KEY (lead_id) REFERENCES leads(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_listings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS listings (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            price REAL,
            currency TEXT NOT NULL DEFAULT 'ARS',
            condition TEXT,
            whatsapp TEXT,
            phone TEXT,
            email TEXT,
            instagram TEXT,
            category_id INTEGER NOT NULL,
            zone_id INTEGER NOT NULL,
            primary_image TEXT,
            images TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (category_id) REFERENCES categories(id),
            FOREIGN KEY (zone_id) REFERENCES zones(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            slug TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_zones_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS zones (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            slug TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed default zones and categories if absent (INSERT OR IGNORE)
async fn seed_default_catalog(pool: &SqlitePool) -> Result<()> {
    for entry in default_categories() {
        sqlx::query("INSERT OR IGNORE INTO categories (id, name, slug) VALUES (?, ?, ?)")
            .bind(entry.id)
            .bind(&entry.name)
            .bind(&entry.slug)
            .execute(pool)
            .await?;
    }

    for entry in default_zones() {
        sqlx::query("INSERT OR IGNORE INTO zones (id, name, slug) VALUES (?, ?, ?)")
            .bind(entry.id)
            .bind(&entry.name)
            .bind(&entry.slug)
            .execute(pool)
            .await?;
    }

    Ok(())
}
