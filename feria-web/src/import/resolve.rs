//! Catalog resolution through ordered matcher tiers
//!
//! Each tier is a pure function `(input, catalog) -> Option<TierMatch>`.
//! Tiers run in a fixed order and the first match wins, so resolution is
//! deterministic for a given catalog and input. Inferred tiers (alias and
//! the zone-specific fallbacks) attach a warning noting the mapping was
//! inferred, not exact.

use feria_common::CatalogEntry;

/// A successful tier match
#[derive(Debug, Clone, PartialEq)]
pub struct TierMatch {
    pub id: i64,
    pub name: String,
    pub warning: Option<String>,
}

/// One matcher tier
type Matcher = fn(&str, &[CatalogEntry]) -> Option<TierMatch>;

/// Category tiers: exact, alias, token overlap
const CATEGORY_TIERS: &[Matcher] = &[match_exact, match_category_alias, match_token_overlap];

/// Zone tiers: exact, alias, token overlap, comma-insensitive containment,
/// single-word overlap
const ZONE_TIERS: &[Matcher] = &[
    match_exact,
    match_zone_alias,
    match_token_overlap,
    match_comma_containment,
    match_single_word_overlap,
];

/// Resolve a free-text category name.
///
/// Err carries the guidance message listing all canonical names.
pub fn resolve_category(input: &str, catalog: &[CatalogEntry]) -> Result<TierMatch, String> {
    run_tiers(CATEGORY_TIERS, input, catalog).ok_or_else(|| {
        format!(
            "Categoría '{}' no reconocida. Categorías válidas: {}",
            input.trim(),
            catalog_names(catalog)
        )
    })
}

/// Resolve a free-text zone name.
pub fn resolve_zone(input: &str, catalog: &[CatalogEntry]) -> Result<TierMatch, String> {
    run_tiers(ZONE_TIERS, input, catalog).ok_or_else(|| {
        format!(
            "Zona '{}' no reconocida. Zonas válidas: {}",
            input.trim(),
            catalog_names(catalog)
        )
    })
}

fn run_tiers(tiers: &[Matcher], input: &str, catalog: &[CatalogEntry]) -> Option<TierMatch> {
    tiers.iter().find_map(|tier| tier(input, catalog))
}

fn catalog_names(catalog: &[CatalogEntry]) -> String {
    catalog
        .iter()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Tier implementations
// ---------------------------------------------------------------------------

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Accent-stripped form for forgiving alias/word comparison
fn fold(s: &str) -> String {
    normalize(s)
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Tier 1: exact canonical name match (case-insensitive, trimmed)
fn match_exact(input: &str, catalog: &[CatalogEntry]) -> Option<TierMatch> {
    let needle = normalize(input);
    catalog
        .iter()
        .find(|e| normalize(&e.name) == needle)
        .map(|e| TierMatch {
            id: e.id,
            name: e.name.clone(),
            warning: None,
        })
}

/// Common synonyms -> canonical category name (accent-folded keys)
const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("terreno", "Inmuebles"),
    ("terrenos", "Inmuebles"),
    ("lote", "Inmuebles"),
    ("casa", "Inmuebles"),
    ("casas", "Inmuebles"),
    ("departamento", "Inmuebles"),
    ("departamentos", "Inmuebles"),
    ("alquiler", "Inmuebles"),
    ("propiedades", "Inmuebles"),
    ("auto", "Vehículos"),
    ("autos", "Vehículos"),
    ("moto", "Vehículos"),
    ("motos", "Vehículos"),
    ("camioneta", "Vehículos"),
    ("vehiculo", "Vehículos"),
    ("notebook", "Tecnología"),
    ("notebooks", "Tecnología"),
    ("celular", "Tecnología"),
    ("celulares", "Tecnología"),
    ("computadora", "Tecnología"),
    ("computadoras", "Tecnología"),
    ("electronica", "Tecnología"),
    ("mueble", "Hogar"),
    ("muebles", "Hogar"),
    ("electrodomestico", "Hogar"),
    ("electrodomesticos", "Hogar"),
    ("plomero", "Servicios"),
    ("electricista", "Servicios"),
    ("servicio", "Servicios"),
    ("trabajo", "Empleo"),
    ("trabajos", "Empleo"),
    ("empleos", "Empleo"),
];

/// Common abbreviations -> canonical zone name (accent-folded keys)
const ZONE_ALIASES: &[(&str, &str)] = &[
    ("capital", "Córdoba Capital"),
    ("cordoba", "Córdoba Capital"),
    ("rosario", "Rosario, Santa Fe"),
    ("la plata", "La Plata, Buenos Aires"),
    ("centro ciudad", "Centro"),
    ("zona norte", "Norte"),
    ("zona sur", "Sur"),
];

/// Tier 2: alias table lookup, then re-resolve exactly
fn match_alias(
    aliases: &[(&str, &str)],
    input: &str,
    catalog: &[CatalogEntry],
) -> Option<TierMatch> {
    let folded = fold(input);
    let (_, canonical) = aliases.iter().find(|(alias, _)| *alias == folded)?;
    let matched = match_exact(canonical, catalog)?;
    Some(TierMatch {
        warning: Some(format!(
            "'{}' se interpretó como '{}'",
            input.trim(),
            matched.name
        )),
        ..matched
    })
}

fn match_category_alias(input: &str, catalog: &[CatalogEntry]) -> Option<TierMatch> {
    match_alias(CATEGORY_ALIASES, input, catalog)
}

fn match_zone_alias(input: &str, catalog: &[CatalogEntry]) -> Option<TierMatch> {
    match_alias(ZONE_ALIASES, input, catalog)
}

fn words(s: &str) -> Vec<String> {
    fold(s)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Tier 3: token overlap of at least min(2, input word count) words
fn match_token_overlap(input: &str, catalog: &[CatalogEntry]) -> Option<TierMatch> {
    overlap_match(input, catalog, |input_words| 2.min(input_words.len()))
}

/// Tier 5 (zones): a single shared word is enough, since zone names are
/// often one distinguishing word
fn match_single_word_overlap(input: &str, catalog: &[CatalogEntry]) -> Option<TierMatch> {
    let matched = overlap_match(input, catalog, |_| 1)?;
    Some(TierMatch {
        warning: Some(format!(
            "Zona '{}' asignada a '{}' por coincidencia parcial",
            input.trim(),
            matched.name
        )),
        ..matched
    })
}

fn overlap_match(
    input: &str,
    catalog: &[CatalogEntry],
    required: impl Fn(&[String]) -> usize,
) -> Option<TierMatch> {
    let mut input_words = words(input);
    if input_words.is_empty() {
        return None;
    }
    let needed = required(&input_words);

    // A repeated input word counts once toward the threshold
    input_words.sort();
    input_words.dedup();

    catalog
        .iter()
        .find(|e| {
            let name_words = words(&e.name);
            let shared = input_words
                .iter()
                .filter(|w| name_words.contains(w))
                .count();
            shared >= needed
        })
        .map(|e| TierMatch {
            id: e.id,
            name: e.name.clone(),
            warning: None,
        })
}

/// Tier 4 (zones): strip commas and collapse whitespace on both sides;
/// match if either normalized form contains the other
fn match_comma_containment(input: &str, catalog: &[CatalogEntry]) -> Option<TierMatch> {
    let squash = |s: &str| -> String {
        fold(s)
            .replace(',', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    };

    let needle = squash(input);
    if needle.is_empty() {
        return None;
    }

    catalog
        .iter()
        .find(|e| {
            let name = squash(&e.name);
            name.contains(&needle) || needle.contains(&name)
        })
        .map(|e| TierMatch {
            id: e.id,
            name: e.name.clone(),
            warning: Some(format!(
                "Zona '{}' asignada a '{}' por coincidencia aproximada",
                input.trim(),
                e.name
            )),
        })
}
