//! Row normalization and validation
//!
//! Catalog resolution and invariant validation are independent: a row can
//! fail validation with a resolved catalog reference and vice versa. Both
//! must pass for the row to be valid. Errors and warnings are collected per
//! row; a bad row never aborts the batch.

use super::parse::{photo_fields, RawRow};
use super::resolve::{resolve_category, resolve_zone};
use feria_common::{CatalogEntry, Condition, Currency};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const MIN_TITLE_LEN: usize = 5;
const MIN_DESCRIPTION_LEN: usize = 10;

/// Default contact fields applied to rows with blank contact cells
#[derive(Debug, Clone, Default)]
pub struct ContactDefaults {
    pub whatsapp: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// One reconciled spreadsheet row with everything needed for preview and
/// commit, plus collected errors and warnings.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledRow {
    pub row_number: usize,
    pub title: String,
    pub description: String,
    pub price: Option<f64>,
    pub currency: String,
    pub condition: Option<String>,
    pub whatsapp: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub instagram: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub zone_id: Option<i64>,
    pub zone_name: Option<String>,
    pub primary_image: Option<String>,
    pub images: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ReconciledRow {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Serializable listing draft for a valid row (None when invalid)
    pub fn to_preview(&self) -> Option<PreviewListing> {
        if !self.is_valid() {
            return None;
        }
        Some(PreviewListing {
            row_number: self.row_number,
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            currency: self.currency.clone(),
            condition: self.condition.clone(),
            whatsapp: self.whatsapp.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            instagram: self.instagram.clone(),
            // is_valid() checked above
            category_id: self.category_id.unwrap_or_default(),
            category_name: self.category_name.clone().unwrap_or_default(),
            zone_id: self.zone_id.unwrap_or_default(),
            zone_name: self.zone_name.clone().unwrap_or_default(),
            primary_image: self.primary_image.clone(),
            images: self.images.clone(),
            warnings: self.warnings.clone(),
        })
    }
}

/// A valid, catalog-resolved draft listing as shown in the preview and
/// re-submitted by the client on commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewListing {
    pub row_number: usize,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub price: Option<f64>,
    pub currency: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    pub category_id: i64,
    #[serde(default)]
    pub category_name: String,
    pub zone_id: i64,
    #[serde(default)]
    pub zone_name: String,
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl PreviewListing {
    /// Re-run the row invariants on a client-submitted listing before any
    /// insert is attempted.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().chars().count() < MIN_TITLE_LEN {
            return Err(format!(
                "El título debe tener al menos {} caracteres",
                MIN_TITLE_LEN
            ));
        }
        if self.description.trim().chars().count() < MIN_DESCRIPTION_LEN {
            return Err(format!(
                "La descripción debe tener al menos {} caracteres",
                MIN_DESCRIPTION_LEN
            ));
        }
        Currency::from_str(&self.currency).map_err(|_| {
            format!("Moneda '{}' inválida (use ARS o USD)", self.currency)
        })?;
        if let Some(condition) = &self.condition {
            Condition::from_str(condition)
                .map_err(|_| format!("Condición '{}' inválida (use nuevo o usado)", condition))?;
        }
        if let Some(whatsapp) = &self.whatsapp {
            validate_whatsapp(whatsapp)?;
        }
        if let Some(price) = self.price {
            if price < 0.0 {
                return Err("El precio no puede ser negativo".to_string());
            }
        }
        Ok(())
    }
}

/// Normalize, resolve, and validate one raw row.
pub fn reconcile_row(
    raw: &RawRow,
    categories: &[CatalogEntry],
    zones: &[CatalogEntry],
    defaults: &ContactDefaults,
) -> ReconciledRow {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let title = raw.get("title").unwrap_or("").trim().to_string();
    if title.chars().count() < MIN_TITLE_LEN {
        errors.push(format!(
            "El título debe tener al menos {} caracteres",
            MIN_TITLE_LEN
        ));
    }

    let description = raw.get("description").unwrap_or("").trim().to_string();
    if description.chars().count() < MIN_DESCRIPTION_LEN {
        errors.push(format!(
            "La descripción debe tener al menos {} caracteres",
            MIN_DESCRIPTION_LEN
        ));
    }

    // Catalog resolution runs regardless of field validation outcomes
    let (category_id, category_name) = match raw.get("category") {
        Some(input) => match resolve_category(input, categories) {
            Ok(m) => {
                if let Some(warning) = m.warning {
                    warnings.push(warning);
                }
                (Some(m.id), Some(m.name))
            }
            Err(message) => {
                errors.push(message);
                (None, None)
            }
        },
        None => {
            errors.push("Falta la categoría".to_string());
            (None, None)
        }
    };

    let (zone_id, zone_name) = match raw.get("zone") {
        Some(input) => match resolve_zone(input, zones) {
            Ok(m) => {
                if let Some(warning) = m.warning {
                    warnings.push(warning);
                }
                (Some(m.id), Some(m.name))
            }
            Err(message) => {
                errors.push(message);
                (None, None)
            }
        },
        None => {
            errors.push("Falta la zona".to_string());
            (None, None)
        }
    };

    let price = match raw.get("price") {
        Some(input) => match parse_price(input) {
            Ok(price) => Some(price),
            Err(message) => {
                errors.push(message);
                None
            }
        },
        None => None,
    };

    // Empty currency defaults to ARS; a present value must be ARS or USD
    let currency = match raw.get("currency") {
        Some(input) => match Currency::from_str(input) {
            Ok(c) => c.as_str().to_string(),
            Err(_) => {
                errors.push(format!("Moneda '{}' inválida (use ARS o USD)", input.trim()));
                Currency::Ars.as_str().to_string()
            }
        },
        None => Currency::Ars.as_str().to_string(),
    };

    let condition = match raw.get("condition") {
        Some(input) => match Condition::from_str(input) {
            Ok(c) => Some(c.as_str().to_string()),
            Err(_) => {
                errors.push(format!(
                    "Condición '{}' inválida (use nuevo o usado)",
                    input.trim()
                ));
                None
            }
        },
        None => None,
    };

    let whatsapp = raw
        .get("whatsapp")
        .map(str::to_string)
        .or_else(|| defaults.whatsapp.clone());
    if let Some(wa) = &whatsapp {
        if let Err(message) = validate_whatsapp(wa) {
            errors.push(message);
        }
    }

    let phone = raw
        .get("phone")
        .map(str::to_string)
        .or_else(|| defaults.phone.clone());
    let email = raw
        .get("email")
        .map(str::to_string)
        .or_else(|| defaults.email.clone());
    let instagram = raw.get("instagram").map(str::to_string);

    // Photo filenames are accepted as given; existence on storage is not
    // required (the user may upload matching files afterward)
    let images: Vec<String> = photo_fields()
        .into_iter()
        .filter_map(|field| raw.get(field))
        .map(str::to_string)
        .collect();
    let primary_image = images.first().cloned();

    ReconciledRow {
        row_number: raw.row_number,
        title,
        description,
        price,
        currency,
        condition,
        whatsapp,
        phone,
        email,
        instagram,
        category_id,
        category_name,
        zone_id,
        zone_name,
        primary_image,
        images,
        errors,
        warnings,
    }
}

/// Parse a price cell: strip everything except digits and separators, then
/// interpret ',' as the decimal separator when both are present (Argentine
/// formatting, e.g. "1.234,56").
pub fn parse_price(input: &str) -> Result<f64, String> {
    let kept: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if kept.is_empty() {
        return Err(format!("Precio '{}' inválido", input.trim()));
    }

    let normalized = if kept.contains(',') {
        kept.replace('.', "").replace(',', ".")
    } else {
        // Dots followed by three-digit groups are thousands separators
        // ("120.000" is 120000, not 120), anything else is a decimal point
        let parts: Vec<&str> = kept.split('.').collect();
        if parts.len() > 1 && parts[1..].iter().all(|p| p.len() == 3) {
            parts.concat()
        } else {
            kept
        }
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|p| *p >= 0.0)
        .ok_or_else(|| format!("Precio '{}' inválido", input.trim()))
}

fn validate_whatsapp(value: &str) -> Result<(), String> {
    let rest = value
        .trim()
        .strip_prefix("https://wa.me/")
        .ok_or_else(|| format!("WhatsApp '{}' inválido (use https://wa.me/...)", value.trim()))?;
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "WhatsApp '{}' inválido (use https://wa.me/<número>)",
            value.trim()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn categories() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new(1, "Inmuebles", "inmuebles"),
            CatalogEntry::new(4, "Tecnología", "tecnologia"),
        ]
    }

    fn zones() -> Vec<CatalogEntry> {
        vec![CatalogEntry::new(1, "Centro", "centro")]
    }

    fn raw(fields: &[(&'static str, &str)]) -> RawRow {
        RawRow {
            row_number: 1,
            fields: fields
                .iter()
                .map(|(k, v)| (*k, v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn valid_raw() -> RawRow {
        raw(&[
            ("title", "Departamento céntrico"),
            ("description", "Dos ambientes con balcón al frente"),
            ("category", "Inmuebles"),
            ("zone", "Centro"),
            ("price", "120000"),
        ])
    }

    #[test]
    fn fully_valid_row_has_no_errors() {
        let row = reconcile_row(&valid_raw(), &categories(), &zones(), &Default::default());
        assert!(row.is_valid(), "errors: {:?}", row.errors);
        assert_eq!(row.category_id, Some(1));
        assert_eq!(row.zone_id, Some(1));
        assert_eq!(row.price, Some(120000.0));
        assert_eq!(row.currency, "ARS");
    }

    #[test]
    fn short_title_is_rejected_with_minimum_length() {
        let mut r = valid_raw();
        r.fields.insert("title", "Casa".to_string());
        let row = reconcile_row(&r, &categories(), &zones(), &Default::default());
        assert!(!row.is_valid());
        assert!(row.errors.iter().any(|e| e.contains("5")), "{:?}", row.errors);
        // Category and zone still resolved despite the validation failure
        assert_eq!(row.category_id, Some(1));
        assert_eq!(row.zone_id, Some(1));
    }

    #[test]
    fn invalid_currency_is_an_error_but_empty_defaults_to_ars() {
        let mut r = valid_raw();
        r.fields.insert("currency", "EUR".to_string());
        let row = reconcile_row(&r, &categories(), &zones(), &Default::default());
        assert!(row.errors.iter().any(|e| e.contains("Moneda")));

        let row = reconcile_row(&valid_raw(), &categories(), &zones(), &Default::default());
        assert_eq!(row.currency, "ARS");
    }

    #[test]
    fn condition_must_be_nuevo_or_usado() {
        let mut r = valid_raw();
        r.fields.insert("condition", "usado".to_string());
        let row = reconcile_row(&r, &categories(), &zones(), &Default::default());
        assert!(row.is_valid());
        assert_eq!(row.condition.as_deref(), Some("usado"));

        r.fields.insert("condition", "refurbished".to_string());
        let row = reconcile_row(&r, &categories(), &zones(), &Default::default());
        assert!(row.errors.iter().any(|e| e.contains("Condición")));
    }

    #[test]
    fn whatsapp_must_be_wa_me_url() {
        let mut r = valid_raw();
        r.fields
            .insert("whatsapp", "https://wa.me/5491155551234".to_string());
        let row = reconcile_row(&r, &categories(), &zones(), &Default::default());
        assert!(row.is_valid());

        r.fields.insert("whatsapp", "+54 9 11 5555-1234".to_string());
        let row = reconcile_row(&r, &categories(), &zones(), &Default::default());
        assert!(row.errors.iter().any(|e| e.contains("WhatsApp")));
    }

    #[test]
    fn contact_defaults_fill_blank_cells_only() {
        let defaults = ContactDefaults {
            whatsapp: Some("https://wa.me/5491100000000".to_string()),
            phone: Some("1100000000".to_string()),
            email: None,
        };
        let row = reconcile_row(&valid_raw(), &categories(), &zones(), &defaults);
        assert_eq!(row.whatsapp.as_deref(), Some("https://wa.me/5491100000000"));
        assert_eq!(row.phone.as_deref(), Some("1100000000"));

        let mut r = valid_raw();
        r.fields.insert("phone", "1199999999".to_string());
        let row = reconcile_row(&r, &categories(), &zones(), &defaults);
        assert_eq!(row.phone.as_deref(), Some("1199999999"));
    }

    #[test]
    fn photos_collected_in_order_with_primary_first() {
        let mut r = valid_raw();
        r.fields.insert("foto_principal", "frente.jpg".to_string());
        r.fields.insert("foto_3", "cocina.jpg".to_string());
        r.fields.insert("foto_2", "living.jpg".to_string());
        let row = reconcile_row(&r, &categories(), &zones(), &Default::default());
        assert_eq!(row.images, vec!["frente.jpg", "living.jpg", "cocina.jpg"]);
        assert_eq!(row.primary_image.as_deref(), Some("frente.jpg"));
        // Unresolved filenames are deliberately allowed through as valid
        assert!(row.is_valid());
    }

    #[test]
    fn price_parsing_handles_currency_noise_and_decimals() {
        assert_eq!(parse_price("120000").unwrap(), 120000.0);
        assert_eq!(parse_price("$ 120.000").unwrap(), 120000.0);
        assert_eq!(parse_price("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_price("99.5").unwrap(), 99.5);
        assert_eq!(parse_price("USD 1500").unwrap(), 1500.0);
        assert!(parse_price("consultar").is_err());
    }

    #[test]
    fn missing_price_is_not_an_error() {
        let mut r = valid_raw();
        r.fields.remove("price");
        let row = reconcile_row(&r, &categories(), &zones(), &Default::default());
        assert!(row.is_valid());
        assert_eq!(row.price, None);
    }
}
