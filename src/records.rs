// 📂 Record Store - Purchase history loader
// Reads the comma-delimited purchase history into immutable records

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Calendar years accepted for `yearOfPurchase`
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// Columns in the order they appear in the dataset
pub const COLUMNS: [&str; 6] = [
    "brand",
    "category",
    "price",
    "orderedOnline",
    "paidFullPrice",
    "yearOfPurchase",
];

// ============================================================================
// PURCHASE RECORD
// ============================================================================

/// One historical purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub brand: String,
    pub category: String,
    pub price: f64,

    /// Bought through the online channel (vs in-store)
    pub ordered_online: bool,

    /// false = bought on sale
    pub paid_full_price: bool,

    pub year_of_purchase: i32,
}

impl PurchaseRecord {
    pub fn new(
        brand: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        ordered_online: bool,
        paid_full_price: bool,
        year_of_purchase: i32,
    ) -> Self {
        PurchaseRecord {
            brand: brand.into(),
            category: category.into(),
            price,
            ordered_online,
            paid_full_price,
            year_of_purchase,
        }
    }

    pub fn is_on_sale(&self) -> bool {
        !self.paid_full_price
    }

    /// Parse one data row positionally
    pub fn from_row(row: &StringRecord) -> Result<Self, RowError> {
        if row.len() != COLUMNS.len() {
            return Err(RowError::FieldCount {
                expected: COLUMNS.len(),
                found: row.len(),
            });
        }

        let brand = required_text(row, 0)?;
        let category = required_text(row, 1)?;

        let raw_price = row[2].trim();
        let price: f64 = raw_price
            .parse()
            .map_err(|_| RowError::InvalidPrice(raw_price.to_string()))?;
        if !price.is_finite() || price < 0.0 {
            return Err(RowError::InvalidPrice(raw_price.to_string()));
        }

        let ordered_online = parse_flag(&row[3]).ok_or_else(|| RowError::InvalidFlag {
            column: COLUMNS[3],
            value: row[3].trim().to_string(),
        })?;
        let paid_full_price = parse_flag(&row[4]).ok_or_else(|| RowError::InvalidFlag {
            column: COLUMNS[4],
            value: row[4].trim().to_string(),
        })?;

        let raw_year = row[5].trim();
        let year_of_purchase: i32 = raw_year
            .parse()
            .ok()
            .filter(|year| YEAR_RANGE.contains(year))
            .ok_or_else(|| RowError::InvalidYear(raw_year.to_string()))?;

        Ok(PurchaseRecord {
            brand,
            category,
            price,
            ordered_online,
            paid_full_price,
            year_of_purchase,
        })
    }
}

fn required_text(row: &StringRecord, index: usize) -> Result<String, RowError> {
    let value = row[index].trim();
    if value.is_empty() {
        return Err(RowError::EmptyField(COLUMNS[index]));
    }
    Ok(value.to_string())
}

/// Normalize a Yes/No style flag. Unknown tokens are rejected, never defaulted.
pub fn parse_flag(token: &str) -> Option<bool> {
    match token.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Why a single data row was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("column '{0}' is empty")]
    EmptyField(&'static str),
    #[error("price '{0}' is not a non-negative number")]
    InvalidPrice(String),
    #[error("column '{column}' has unrecognized flag '{value}'")]
    InvalidFlag { column: &'static str, value: String },
    #[error("year '{0}' is not a calendar year (0-9999)")]
    InvalidYear(String),
    #[error("malformed row: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("purchase history {path:?} is unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read header row: {0}")]
    Header(#[from] csv::Error),
}

// ============================================================================
// LOADING
// ============================================================================

/// A data row that was dropped during loading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line in the source, header included
    pub line: u64,
    pub reason: String,
}

/// Records that loaded cleanly plus the rows that were dropped
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub records: Vec<PurchaseRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Load the history from a CSV file. Bad rows are skipped with a warning.
pub fn load_records(path: &Path) -> Result<LoadReport, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let report = load_records_from_reader(file)?;
    info!(
        path = %path.display(),
        loaded = report.records.len(),
        skipped = report.skipped.len(),
        "loaded purchase history"
    );
    Ok(report)
}

/// Load the history from any reader (header row first)
pub fn load_records_from_reader<R: Read>(reader: R) -> Result<LoadReport, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    // Surface an unreadable header up front; its contents are ignored
    rdr.headers()?;

    let mut report = LoadReport::default();

    for (index, result) in rdr.records().enumerate() {
        // Header is line 1, so the first data row is line 2
        let fallback_line = index as u64 + 2;

        let parsed = match result {
            Ok(row) => {
                let line = row.position().map(|p| p.line()).unwrap_or(fallback_line);
                (line, PurchaseRecord::from_row(&row))
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
                (line, Err(RowError::Malformed(e.to_string())))
            }
        };

        match parsed {
            (_, Ok(record)) => report.records.push(record),
            (line, Err(reason)) => {
                warn!(line, %reason, "skipping purchase row");
                report.skipped.push(SkippedRow {
                    line,
                    reason: reason.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Load the history, falling back to an empty store when the source is
/// unavailable. Every query then scores 0.
pub fn load_or_empty(path: &Path) -> LoadReport {
    match load_records(path) {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "continuing with no purchase history");
            LoadReport::default()
        }
    }
}

// ============================================================================
// RECORD STORE
// ============================================================================

/// Immutable, ordered purchase history
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<PurchaseRecord>,
}

impl RecordStore {
    pub fn new(records: Vec<PurchaseRecord>) -> Self {
        RecordStore { records }
    }

    pub fn records(&self) -> &[PurchaseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct brands, sorted
    pub fn brands(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.brand.as_str()))
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.category.as_str()))
    }
}

impl From<LoadReport> for RecordStore {
    fn from(report: LoadReport) -> Self {
        RecordStore::new(report.records)
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

// ============================================================================
// TESTS
// ============================================================================
