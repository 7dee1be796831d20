//! Commit: one insert per valid row, independently transacted
//!
//! A single row's insert failure must not roll back or block the others;
//! per-row successes and failures are collected and reported side by side.

use super::row::PreviewListing;
use crate::db::listings;
use feria_common::{Error, Result};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{error, info};

/// A successfully inserted listing
#[derive(Debug, Clone, Serialize)]
pub struct CreatedListing {
    pub row_number: usize,
    pub id: String,
    pub title: String,
}

/// A row that was attempted and failed to insert
#[derive(Debug, Clone, Serialize)]
pub struct InsertFailure {
    pub row_number: usize,
    pub title: String,
    pub error: String,
}

/// Outcome of a commit: per-row created ids and per-row insert failures
#[derive(Debug, Clone, Serialize, Default)]
pub struct CommitOutcome {
    pub created: Vec<CreatedListing>,
    pub failures: Vec<InsertFailure>,
}

/// Insert the given rows one by one.
///
/// Fails outright only when zero rows are supplied; individual insert
/// failures are reported per row with the raw database detail kept in the
/// logs.
pub async fn commit_rows(db: &Pool<Sqlite>, rows: &[PreviewListing]) -> Result<CommitOutcome> {
    if rows.is_empty() {
        return Err(Error::InvalidInput(
            "No rows supplied for commit".to_string(),
        ));
    }

    let mut outcome = CommitOutcome::default();

    for row in rows {
        match listings::insert_listing(db, row).await {
            Ok(id) => {
                outcome.created.push(CreatedListing {
                    row_number: row.row_number,
                    id,
                    title: row.title.clone(),
                });
            }
            Err(e) => {
                error!(row = row.row_number, title = %row.title, "Listing insert failed: {}", e);
                outcome.failures.push(InsertFailure {
                    row_number: row.row_number,
                    title: row.title.clone(),
                    error: insert_failure_message(&e),
                });
            }
        }
    }

    info!(
        created = outcome.created.len(),
        failed = outcome.failures.len(),
        "Import commit finished"
    );

    Ok(outcome)
}

/// User-facing failure message; database internals stay in the logs
fn insert_failure_message(err: &Error) -> String {
    match err {
        Error::InvalidInput(msg) | Error::NotFound(msg) => msg.clone(),
        _ => "No se pudo guardar el aviso, reintente".to_string(),
    }
}
