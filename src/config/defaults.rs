//! Built-in defaults for every configurable cap.
//!
//! Grouped by the stage that enforces them.

// ============================================================================
// Ingestion
// ============================================================================

/// Data rows read from one document before truncation.
pub const MAX_ROWS_PER_FILE: usize = 50_000;

/// Value columns kept from one wide document.
pub const MAX_COLUMNS_PER_FILE: usize = 512;

/// Bytes read from one file or archive entry; larger inputs are rejected.
///
/// 64 MiB comfortably holds `MAX_ROWS_PER_FILE` rows of a wide export.
pub const MAX_BYTES_PER_FILE: usize = 64 * 1024 * 1024;

// ============================================================================
// Segmentation
// ============================================================================

/// Samples retained per trip; later samples are dropped.
///
/// 200 000 = a one-hour log of ~55 parameters at 1 Hz.
pub const MAX_SAMPLES_PER_TRIP: usize = 200_000;

/// Trips analyzed per batch; later trips are skipped, not queued.
pub const MAX_TRIPS: usize = 50;

// ============================================================================
// Analysis
// ============================================================================

/// Minimum finite samples before a parameter gets a trend line.
pub const MIN_TREND_SAMPLES: usize = 10;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "OBDSCOPE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "obdscope.toml";
