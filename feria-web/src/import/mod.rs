//! Bulk listing import reconciler
//!
//! Turns an uploaded spreadsheet of loosely-formatted rows into
//! catalog-resolved draft listings: parse → normalize → resolve zones and
//! categories through ordered matcher tiers → validate → preview, and only
//! on explicit confirm, insert one listing per valid row.

pub mod catalog;
pub mod commit;
pub mod images;
pub mod parse;
pub mod preview;
pub mod resolve;
pub mod row;

pub use catalog::{CatalogCache, CatalogSnapshot, Clock, SystemClock};
pub use commit::{commit_rows, CommitOutcome, CreatedListing, InsertFailure};
pub use images::ImageDirCache;
pub use parse::{parse_upload, ImportError, RawRow, MAX_IMPORT_ROWS};
pub use preview::{build_preview, ImportPreview};
pub use row::{reconcile_row, ContactDefaults, PreviewListing, ReconciledRow};
