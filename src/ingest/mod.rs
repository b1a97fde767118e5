//! Time-Series Ingestion
//!
//! Parses raw tabular vehicle logs into a flat collection of [`Sample`]s.
//! Two document shapes are auto-detected from the header row:
//!
//! **Wide**: one time column plus N parameter columns, each cell becoming
//! one sample. Headers may embed a unit suffix, e.g. `Engine Coolant Temp (°F)`;
//! known units are converted so downstream code always sees °C, km/h, kPa, g/s.
//!
//! **Long**: explicit parameter and value columns (optionally a unit
//! column), one sample per row. Without a time column each row's 0-based
//! ordinal becomes its relative time in seconds.
//!
//! Relative times are scaled by the time header's unit, so `Time (ms)` and
//! `Elapsed (min)` land on the same seconds axis as `Time (s)`. Semicolon
//! delimited documents read `,` as the decimal mark.
//!
//! Recovery rules:
//! - Empty / unparsable value cells become `value: None`, never a row error
//! - A row whose time cannot be parsed is skipped and counted
//! - Rows and columns past the configured caps are truncated with a note
//! - A document that cannot be parsed at all yields an [`IngestError`]; the
//!   batch layer records it and moves on to the next document

mod batch;
pub mod csv;
mod long;
mod wide;

pub use batch::{ingest_batch, load_documents, Document, DocumentStats, FileFailure, IngestReport};
pub use csv::parse_number;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LimitsConfig;
use crate::types::{Sample, SampleTime};
use csv::{csv_split, detect_delimiter, parse_header_field, HeaderField};

// ============================================================================
// Errors
// ============================================================================

/// Failure to ingest one whole document
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("document {label} is empty")]
    Empty { label: String },

    #[error("document {label} has no value columns")]
    NoValueColumns { label: String },

    #[error("document {label} produced no samples ({skipped} rows skipped)")]
    NoSamples { label: String, skipped: usize },

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exceeds the {cap} byte limit", path.display())]
    TooLarge { path: PathBuf, cap: usize },

    #[error("archive {}: {message}", path.display())]
    Archive { path: PathBuf, message: String },
}

// ============================================================================
// Document Parsing
// ============================================================================

/// Detected document layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Wide,
    Long,
}

/// Result of parsing one document
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub label: String,
    pub format: LogFormat,
    pub samples: Vec<Sample>,
    pub rows_read: usize,
    pub rows_skipped: usize,
    /// Truncation and other non-fatal remarks
    pub notes: Vec<String>,
}

/// Header names accepted as the time column, highest priority first
const TIME_COLUMN_PRIORITY: &[&str] = &[
    "time",
    "timestamp",
    "seconds",
    "time s",
    "elapsed time",
    "elapsed",
    "device time",
    "gps time",
    "datetime",
    "date time",
    "time ms",
    "t",
];

/// Header names accepted as the parameter column of a long document
const PARAMETER_COLUMN_NAMES: &[&str] = &["parameter", "param", "pid", "name", "sensor", "signal", "channel"];

/// Header names accepted as the value column of a long document
const VALUE_COLUMN_NAMES: &[&str] = &["value", "reading", "val"];

/// Header names accepted as the unit column of a long document
const UNIT_COLUMN_NAMES: &[&str] = &["unit", "units"];

fn header_key(field: &HeaderField) -> String {
    field
        .name
        .to_lowercase()
        .replace(['_', '(', ')'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn find_column(headers: &[HeaderField], names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| header_key(h) == *name))
}

/// Index of the time column: first match in priority order, else column 0
fn time_column(headers: &[HeaderField]) -> usize {
    find_column(headers, TIME_COLUMN_PRIORITY).unwrap_or(0)
}

/// Seconds per unit of a relative time column, from its header unit or a
/// `_ms` style name suffix
fn seconds_per_unit(header: &HeaderField) -> f64 {
    let unit = header
        .unit
        .as_deref()
        .map(|u| u.trim().to_lowercase())
        .or_else(|| header_key(header).rsplit_once(' ').map(|(_, suffix)| suffix.to_string()));
    match unit.as_deref() {
        Some("ms" | "msec" | "millis" | "milliseconds") => 0.001,
        Some("min" | "mins" | "minutes") => 60.0,
        Some("h" | "hr" | "hrs" | "hours") => 3600.0,
        _ => 1.0,
    }
}

/// Where each row's timestamp comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TimeSource {
    /// A time column; relative offsets are multiplied by `seconds_per_unit`
    Column { index: usize, seconds_per_unit: f64 },
    /// No time column: the 0-based data row number, one second apart
    RowOrdinal,
}

impl TimeSource {
    fn column(headers: &[HeaderField], index: usize) -> Self {
        let seconds_per_unit = headers.get(index).map_or(1.0, seconds_per_unit);
        Self::Column { index, seconds_per_unit }
    }

    /// Column index, if the time comes from a column
    pub(crate) const fn index(&self) -> Option<usize> {
        match *self {
            Self::Column { index, .. } => Some(index),
            Self::RowOrdinal => None,
        }
    }

    /// Time of data row `row` (0-based); `None` when the cell is unparsable
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn read(&self, fields: &[String], row: usize) -> Option<SampleTime> {
        match *self {
            Self::Column { index, seconds_per_unit } => {
                let cell = fields.get(index)?;
                match SampleTime::parse(cell)? {
                    // Clock-style cells are already in seconds
                    SampleTime::Relative(v) if parse_number(cell).is_some() => {
                        Some(SampleTime::Relative(v * seconds_per_unit))
                    }
                    other => Some(other),
                }
            }
            Self::RowOrdinal => Some(SampleTime::Relative(row as f64)),
        }
    }
}

/// Parse one document's text into samples labelled `label`
pub fn parse_document(text: &str, label: &str, limits: &LimitsConfig) -> Result<ParsedDocument, IngestError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header_line = lines.next().ok_or_else(|| IngestError::Empty { label: label.to_string() })?;
    let delimiter = detect_delimiter(header_line);
    let headers: Vec<HeaderField> = csv_split(header_line, delimiter)
        .iter()
        .map(|cell| parse_header_field(cell))
        .collect();

    let parameter_col = find_column(&headers, PARAMETER_COLUMN_NAMES);
    let value_col = find_column(&headers, VALUE_COLUMN_NAMES);

    let mut doc = match (parameter_col, value_col) {
        (Some(p), Some(v)) => {
            let unit_col = find_column(&headers, UNIT_COLUMN_NAMES);
            let time = find_column(&headers, TIME_COLUMN_PRIORITY)
                .or_else(|| (0..headers.len()).find(|i| Some(*i) != unit_col && *i != p && *i != v))
                .map_or(TimeSource::RowOrdinal, |i| TimeSource::column(&headers, i));
            let columns = long::LongColumns { time, parameter: p, value: v, unit: unit_col };
            long::parse_rows(lines, delimiter, &columns, label, limits)
        }
        _ => {
            let time = TimeSource::column(&headers, time_column(&headers));
            wide::parse_rows(lines, delimiter, &headers, time, label, limits)?
        }
    };

    if doc.samples.is_empty() {
        return Err(IngestError::NoSamples {
            label: label.to_string(),
            skipped: doc.rows_skipped,
        });
    }

    let absolute = doc.samples.iter().filter(|s| s.time.is_absolute()).count();
    if absolute != 0 && absolute != doc.samples.len() {
        warn!(document = %label, absolute, total = doc.samples.len(), "Document mixes relative and absolute times");
        doc.notes.push(format!(
            "{label}: {absolute} of {} samples carry absolute timestamps, the rest are relative offsets",
            doc.samples.len()
        ));
    }

    debug!(
        document = %label,
        format = ?doc.format,
        samples = doc.samples.len(),
        rows = doc.rows_read,
        skipped = doc.rows_skipped,
        "Document parsed"
    );

    Ok(doc)
}
