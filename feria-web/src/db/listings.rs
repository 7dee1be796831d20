//! Listing insert operations
//!
//! Each insert verifies its catalog references first, so a stale or
//! hand-crafted commit payload fails with a per-row message instead of an
//! opaque constraint error.

use crate::import::row::PreviewListing;
use feria_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Insert one listing row, returning the new listing id.
pub async fn insert_listing(db: &Pool<Sqlite>, row: &PreviewListing) -> Result<String> {
    let category_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?)")
            .bind(row.category_id)
            .fetch_one(db)
            .await?;
    if !category_exists {
        return Err(Error::InvalidInput(format!(
            "La categoría {} no existe",
            row.category_id
        )));
    }

    let zone_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM zones WHERE id = ?)")
        .bind(row.zone_id)
        .fetch_one(db)
        .await?;
    if !zone_exists {
        return Err(Error::InvalidInput(format!(
            "La zona {} no existe",
            row.zone_id
        )));
    }

    let id = Uuid::new_v4().to_string();
    let images_json = serde_json::to_string(&row.images)
        .map_err(|e| Error::Internal(format!("Cannot serialize images: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO listings (
            id, title, description, price, currency, condition,
            whatsapp, phone, email, instagram,
            category_id, zone_id, primary_image, images
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&row.title)
    .bind(&row.description)
    .bind(row.price)
    .bind(&row.currency)
    .bind(&row.condition)
    .bind(&row.whatsapp)
    .bind(&row.phone)
    .bind(&row.email)
    .bind(&row.instagram)
    .bind(row.category_id)
    .bind(row.zone_id)
    .bind(&row.primary_image)
    .bind(&images_json)
    .execute(db)
    .await?;

    tracing::debug!(listing_id = %id, title = %row.title, "Listing inserted");

    Ok(id)
}
