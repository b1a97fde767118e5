//! Sample: one (time, parameter, value) observation from a vehicle log

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Numeric times at or above this are treated as epoch seconds
const EPOCH_SECONDS_FLOOR: f64 = 1.0e9;

/// Numeric times at or above this are treated as epoch milliseconds
const EPOCH_MILLIS_FLOOR: f64 = 1.0e11;

// ============================================================================
// Sample Time
// ============================================================================

/// Timestamp of a sample.
///
/// Logs carry either an offset from the start of recording or a wall-clock
/// timestamp. The two are never compared directly: every computation goes
/// through [`SampleTime::epoch_millis`], which maps both onto one
/// millisecond axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SampleTime {
    /// Seconds since the start of the recording
    Relative(f64),
    /// Milliseconds since the Unix epoch
    Absolute(i64),
}

impl SampleTime {
    /// Millisecond position on the common comparison axis
    pub fn epoch_millis(&self) -> f64 {
        match *self {
            Self::Relative(secs) => secs * 1000.0,
            #[allow(clippy::cast_precision_loss)]
            Self::Absolute(ms) => ms as f64,
        }
    }

    /// True for wall-clock timestamps
    pub const fn is_absolute(&self) -> bool {
        matches!(self, Self::Absolute(_))
    }

    /// Interpret a bare number from a time column.
    ///
    /// Small values are offsets in seconds; values that look like Unix epoch
    /// seconds or milliseconds become absolute timestamps.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_number(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        if value >= EPOCH_MILLIS_FLOOR {
            Some(Self::Absolute(value.round() as i64))
        } else if value >= EPOCH_SECONDS_FLOOR {
            Some(Self::Absolute((value * 1000.0).round() as i64))
        } else {
            Some(Self::Relative(value))
        }
    }

    /// Parse a time cell.
    ///
    /// Accepts plain numbers (see [`SampleTime::from_number`]), RFC 3339,
    /// `YYYY-MM-DD HH:MM:SS[.fff]` and bare `HH:MM:SS[.fff]` time-of-day,
    /// which is kept relative to midnight.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(n) = crate::ingest::parse_number(trimmed) {
            return Self::from_number(n);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(Self::Absolute(dt.with_timezone(&Utc).timestamp_millis()));
        }

        for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%d/%m/%Y %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Some(Self::Absolute(naive.and_utc().timestamp_millis()));
            }
        }

        for fmt in ["%H:%M:%S%.f", "%H:%M:%S"] {
            if let Ok(t) = NaiveTime::parse_from_str(trimmed, fmt) {
                let secs = f64::from(t.num_seconds_from_midnight())
                    + f64::from(t.nanosecond()) / 1.0e9;
                return Some(Self::Relative(secs));
            }
        }

        None
    }
}

// ============================================================================
// Sample
// ============================================================================

/// A single observation of one parameter.
///
/// Created once at ingestion and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// When the value was recorded
    pub time: SampleTime,
    /// Canonical parameter id (or the raw name when unmapped)
    pub parameter_id: String,
    /// Reading; `None` for empty or unparsable cells
    pub value: Option<f64>,
    /// Unit after normalization, if known
    pub unit: Option<String>,
    /// Originating file / trip label
    pub source_trip: String,
}

impl Sample {
    pub fn new(
        time: SampleTime,
        parameter_id: impl Into<String>,
        value: Option<f64>,
        unit: Option<String>,
        source_trip: impl Into<String>,
    ) -> Self {
        Self {
            time,
            parameter_id: parameter_id.into(),
            value,
            unit,
            source_trip: source_trip.into(),
        }
    }

    /// Value if present and finite
    pub fn finite_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}
