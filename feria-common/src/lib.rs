//! # Feria Common Library
//!
//! Shared code for the Feria marketplace services including:
//! - Error types
//! - Domain enums and models (leads, listings, catalog)
//! - Database initialization and migrations
//! - Configuration loading and root folder resolution

pub mod config;
pub mod db;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{CatalogEntry, Condition, Currency, FlowType, Lead, LeadStatus};
