//! Bulk listing import endpoints
//!
//! One multipart endpoint handles both preview and one-shot commit
//! (`previewOnly` toggles); a second JSON endpoint commits rows the client
//! confirmed from an earlier preview, re-validating them first.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::import::preview::RowErrors;
use crate::import::{
    build_preview, commit_rows, parse_upload, reconcile_row, CommitOutcome, ContactDefaults,
    ImportError, PreviewListing, ReconciledRow,
};
use crate::AppState;

/// POST /publish/listing/import-excel-v2 (multipart)
///
/// Fields: `file` (the spreadsheet), `previewOnly` (default true),
/// `defaultWhatsapp` / `defaultPhone` / `defaultEmail` (contact fallbacks
/// for rows with blank contact cells).
pub async fn import_excel(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let mut filename: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;
    let mut preview_only = true;
    let mut defaults = ContactDefaults::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|f| f.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Cannot read upload: {}", e)))?;
                bytes = Some(data.to_vec());
            }
            "previewOnly" => {
                let text = read_text_field(field).await?;
                preview_only = !matches!(text.trim(), "false" | "0" | "no");
            }
            "defaultWhatsapp" => defaults.whatsapp = non_empty(read_text_field(field).await?),
            "defaultPhone" => defaults.phone = non_empty(read_text_field(field).await?),
            "defaultEmail" => defaults.email = non_empty(read_text_field(field).await?),
            _ => {}
        }
    }

    let filename =
        filename.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;
    let bytes = bytes.ok_or_else(|| ApiError::BadRequest("Empty 'file' field".to_string()))?;

    let raw_rows = parse_upload(&filename, &bytes).map_err(import_error)?;
    let rows = reconcile_batch(&state, &raw_rows, &defaults).await;
    let preview = build_preview(&rows);

    if preview_only {
        return Ok(Json(json!({
            "preview": true,
            "totalRows": preview.total_rows,
            "validRows": preview.valid_rows,
            "errorRows": preview.error_rows,
            "previewListings": preview.listings,
            "errorsDetails": preview.errors,
        })));
    }

    let outcome = if preview.listings.is_empty() {
        CommitOutcome::default()
    } else {
        commit_rows(&state.db, &preview.listings).await?
    };

    Ok(Json(commit_response(preview.errors, outcome)))
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub rows: Vec<PreviewListing>,
}

/// POST /publish/listing/import-commit (JSON)
///
/// Commit rows confirmed from an earlier preview. Every row is re-validated
/// server-side first; rows failing validation are never attempted and the
/// rest are inserted independently.
pub async fn import_commit(
    State(state): State<AppState>,
    Json(req): Json<CommitRequest>,
) -> ApiResult<Json<Value>> {
    if req.rows.is_empty() {
        return Err(ApiError::BadRequest(
            "No rows supplied for commit".to_string(),
        ));
    }

    let mut validation_errors = Vec::new();
    let mut valid = Vec::new();
    for row in req.rows {
        match row.validate() {
            Ok(()) => valid.push(row),
            Err(message) => validation_errors.push(RowErrors {
                row_number: row.row_number,
                title: row.title.clone(),
                errors: vec![message],
            }),
        }
    }

    let outcome = if valid.is_empty() {
        CommitOutcome::default()
    } else {
        commit_rows(&state.db, &valid).await?
    };

    Ok(Json(commit_response(validation_errors, outcome)))
}

/// Resolve and validate every raw row against the cached catalog, then
/// annotate photo filenames not yet present in the uploads directory.
async fn reconcile_batch(
    state: &AppState,
    raw_rows: &[crate::import::RawRow],
    defaults: &ContactDefaults,
) -> Vec<ReconciledRow> {
    let catalog = state.catalog.get_or_load(&state.db).await;
    let uploaded = state.images.filenames();

    raw_rows
        .iter()
        .map(|raw| {
            let mut row = reconcile_row(raw, &catalog.categories, &catalog.zones, defaults);
            let missing: Vec<String> = row
                .images
                .iter()
                .filter(|image| !uploaded.contains(image.as_str()))
                .cloned()
                .collect();
            for image in missing {
                row.warnings
                    .push(format!("La foto '{}' todavía no fue subida", image));
            }
            row
        })
        .collect()
}

fn commit_response(validation_errors: Vec<RowErrors>, outcome: CommitOutcome) -> Value {
    json!({
        "success": validation_errors.is_empty() && outcome.failures.is_empty(),
        "validationErrors": validation_errors,
        "insertErrors": outcome.failures,
        "results": outcome.created,
    })
}

fn import_error(err: ImportError) -> ApiError {
    match err {
        ImportError::RowLimitExceeded { .. } => ApiError::Validation(err.to_string()),
        _ => ApiError::BadRequest(err.to_string()),
    }
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Cannot read field: {}", e)))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
