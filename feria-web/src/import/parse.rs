//! Tabular file parsing for the bulk import
//!
//! Accepts delimited text (csv/tsv) and binary spreadsheets (xlsx/xls).
//! Header matching is case-insensitive, accent-insensitive, and accepts
//! Spanish and English column aliases. Output is a sequence of raw rows
//! mapping canonical field names to trimmed cell strings.

use calamine::Reader;
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

/// Hard cap on data rows per import, to bound total request latency
pub const MAX_IMPORT_ROWS: usize = 50;

/// Import-specific errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// File cannot be decoded as tabular data, or has no data rows
    #[error("Cannot parse file: {0}")]
    Parse(String),

    /// More data rows than the hard cap
    #[error("File has {count} rows; the maximum per import is {max}")]
    RowLimitExceeded { count: usize, max: usize },

    /// Extension outside the accepted set
    #[error("Unsupported file type '{0}' (accepted: csv, tsv, txt, xlsx, xls)")]
    UnsupportedFileType(String),
}

/// One raw spreadsheet row: canonical field name -> trimmed cell value.
/// Empty cells are omitted.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    /// 1-based data row number (header excluded)
    pub row_number: usize,
    pub fields: HashMap<&'static str, String>,
}

impl RawRow {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// Parse an uploaded file into raw rows.
///
/// The row cap is enforced before any row-level processing.
pub fn parse_upload(filename: &str, bytes: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "csv" | "tsv" | "txt" => parse_delimited(bytes)?,
        "xlsx" | "xls" => parse_workbook(bytes)?,
        other => return Err(ImportError::UnsupportedFileType(other.to_string())),
    };

    if rows.is_empty() {
        return Err(ImportError::Parse("File contains no data rows".to_string()));
    }
    if rows.len() > MAX_IMPORT_ROWS {
        return Err(ImportError::RowLimitExceeded {
            count: rows.len(),
            max: MAX_IMPORT_ROWS,
        });
    }

    Ok(rows)
}

fn parse_delimited(bytes: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    let text = String::from_utf8_lossy(bytes);
    let first_line = text.lines().next().unwrap_or("");
    let delimiter = sniff_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ImportError::Parse(format!("Invalid header row: {}", e)))?;
    let columns = map_headers(headers.iter());

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ImportError::Parse(format!("Row {}: {}", i + 1, e)))?;
        if let Some(row) = build_row(i + 1, &columns, record.iter()) {
            rows.push(row);
        }
    }

    Ok(rows)
}

fn parse_workbook(bytes: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| ImportError::Parse(format!("Cannot open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Parse("Workbook has no worksheets".to_string()))?
        .map_err(|e| ImportError::Parse(format!("Cannot read worksheet: {}", e)))?;

    let mut iter = range.rows();
    let header_row = iter
        .next()
        .ok_or_else(|| ImportError::Parse("Worksheet is empty".to_string()))?;
    let headers: Vec<String> = header_row.iter().map(|cell| cell.to_string()).collect();
    let columns = map_headers(headers.iter().map(String::as_str));

    let mut rows = Vec::new();
    for (i, cells) in iter.enumerate() {
        let values: Vec<String> = cells.iter().map(|cell| cell.to_string()).collect();
        if let Some(row) = build_row(i + 1, &columns, values.iter().map(String::as_str)) {
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Pick the delimiter with the most occurrences on the header line
fn sniff_delimiter(header_line: &str) -> u8 {
    let candidates = [b',', b';', b'\t'];
    candidates
        .into_iter()
        .max_by_key(|d| header_line.bytes().filter(|b| b == d).count())
        .unwrap_or(b',')
}

/// Resolve each header cell to a canonical field name (None = ignored column)
fn map_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<Option<&'static str>> {
    headers.map(canonical_field).collect()
}

fn build_row<'a>(
    row_number: usize,
    columns: &[Option<&'static str>],
    values: impl Iterator<Item = &'a str>,
) -> Option<RawRow> {
    let mut row = RawRow {
        row_number,
        ..Default::default()
    };

    for (column, value) in columns.iter().zip(values) {
        let value = value.trim();
        if let (Some(field), false) = (column, value.is_empty()) {
            row.fields.insert(field, value.to_string());
        }
    }

    if row.fields.is_empty() {
        None
    } else {
        Some(row)
    }
}

/// Canonical field name for a header cell, accepting Spanish/English aliases
pub fn canonical_field(header: &str) -> Option<&'static str> {
    let normalized = normalize_header(header);

    let field = match normalized.as_str() {
        "titulo" | "title" => "title",
        "categoria" | "category" => "category",
        "zona" | "zone" => "zone",
        "descripcion" | "description" => "description",
        "precio" | "price" => "price",
        "moneda" | "currency" => "currency",
        "condicion" | "condition" => "condition",
        "whatsapp" => "whatsapp",
        "telefono" | "phone" => "phone",
        "email" => "email",
        "instagram" => "instagram",
        "foto_principal" | "main_photo" => "foto_principal",
        _ => return photo_field(&normalized),
    };

    Some(field)
}

/// foto_2..foto_10 / photo_2..photo_10
fn photo_field(normalized: &str) -> Option<&'static str> {
    const PHOTO_FIELDS: [&str; 9] = [
        "foto_2", "foto_3", "foto_4", "foto_5", "foto_6", "foto_7", "foto_8", "foto_9", "foto_10",
    ];

    let suffix = normalized
        .strip_prefix("foto_")
        .or_else(|| normalized.strip_prefix("photo_"))?;
    let index: usize = suffix.parse().ok()?;
    if (2..=10).contains(&index) {
        Some(PHOTO_FIELDS[index - 2])
    } else {
        None
    }
}

/// Ordered list of the photo fields (foto_principal first)
pub fn photo_fields() -> [&'static str; 10] {
    [
        "foto_principal",
        "foto_2",
        "foto_3",
        "foto_4",
        "foto_5",
        "foto_6",
        "foto_7",
        "foto_8",
        "foto_9",
        "foto_10",
    ]
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .map(strip_accent)
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        other => other,
    }
}
