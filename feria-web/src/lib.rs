//! feria-web library - leads wizard and bulk listing import service
//!
//! JSON HTTP surface over SQLite: the multi-step leads wizard
//! (init/resume/autosave/submit) and the spreadsheet import reconciler
//! (preview/commit).

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

pub mod api;
pub mod db;
pub mod error;
pub mod import;
pub mod wizard;

use import::{CatalogCache, ImageDirCache};

/// Uploaded spreadsheets are small; 10 MiB leaves generous headroom
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Catalog (zones/categories) TTL cache
    pub catalog: Arc<CatalogCache>,
    /// Uploads directory listing TTL cache
    pub images: Arc<ImageDirCache>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, uploads_dir: PathBuf) -> Self {
        Self {
            db,
            catalog: Arc::new(CatalogCache::new()),
            images: Arc::new(ImageDirCache::new(uploads_dir)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, patch, post};

    Router::new()
        .route("/health", get(api::health::health_check))
        .route("/leads/init", post(api::leads::init_lead))
        .route("/leads/:id/resume", get(api::leads::resume_lead))
        .route("/leads/:id/step", patch(api::leads::save_step))
        .route("/leads/:id/submit", post(api::leads::submit_lead))
        .route(
            "/publish/listing/import-excel-v2",
            post(api::import::import_excel),
        )
        .route(
            "/publish/listing/import-commit",
            post(api::import::import_commit),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
