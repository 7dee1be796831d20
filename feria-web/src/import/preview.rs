//! Import preview aggregation
//!
//! Side-effect-free summary of a reconciled batch so the user can review
//! before committing. Safe to recompute as often as the source file changes.

use super::row::{PreviewListing, ReconciledRow};
use serde::Serialize;

/// Per-row error detail for the preview response
#[derive(Debug, Clone, Serialize)]
pub struct RowErrors {
    pub row_number: usize,
    pub title: String,
    pub errors: Vec<String>,
}

/// Aggregated preview of one reconciled batch
#[derive(Debug, Clone, Serialize)]
pub struct ImportPreview {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub error_rows: usize,
    pub listings: Vec<PreviewListing>,
    pub errors: Vec<RowErrors>,
}

/// Aggregate reconciled rows into counts plus per-row detail. Performs no
/// writes.
pub fn build_preview(rows: &[ReconciledRow]) -> ImportPreview {
    let listings: Vec<PreviewListing> = rows.iter().filter_map(ReconciledRow::to_preview).collect();
    let errors: Vec<RowErrors> = rows
        .iter()
        .filter(|r| !r.is_valid())
        .map(|r| RowErrors {
            row_number: r.row_number,
            title: r.title.clone(),
            errors: r.errors.clone(),
        })
        .collect();

    ImportPreview {
        total_rows: rows.len(),
        valid_rows: listings.len(),
        error_rows: errors.len(),
        listings,
        errors,
    }
}
