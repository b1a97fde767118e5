//! Engine configuration: work caps and analysis switches as TOML values
//!
//! Every struct implements `Default` with the built-in caps from
//! [`super::defaults`], so a missing or partial file behaves exactly like
//! no file at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration handed to the engine by reference.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$OBDSCOPE_CONFIG` env var
/// 2. `./obdscope.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard caps bounding ingestion and analysis work
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Analysis switches
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from env path, falling back");
                    }
                }
            } else {
                warn!(path = %path, "Config env var points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded engine config from working directory");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load local config, using defaults");
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys are logged, not rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML (used by `obdscope config`).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate caps.
    ///
    /// Rules:
    /// - Every cap must be > 0
    /// - Trend lines need at least 2 samples
    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.limits;
        let mut errors: Vec<String> = Vec::new();

        for (name, value) in [
            ("limits.max_rows_per_file", l.max_rows_per_file),
            ("limits.max_columns_per_file", l.max_columns_per_file),
            ("limits.max_bytes_per_file", l.max_bytes_per_file),
            ("limits.max_samples_per_trip", l.max_samples_per_trip),
            ("limits.max_trips", l.max_trips),
        ] {
            if value == 0 {
                errors.push(format!("{name}: must be > 0"));
            }
        }

        if self.analysis.min_trend_samples < 2 {
            errors.push(format!(
                "analysis.min_trend_samples: must be >= 2 (got {})",
                self.analysis.min_trend_samples
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Limits
// ============================================================================

/// Caps applied before computation begins; overruns truncate, never fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Data rows read per document
    pub max_rows_per_file: usize,
    /// Value columns kept per wide document
    pub max_columns_per_file: usize,
    /// Bytes read per file or archive entry
    pub max_bytes_per_file: usize,
    /// Samples retained per trip
    pub max_samples_per_trip: usize,
    /// Trips analyzed per batch
    pub max_trips: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_rows_per_file: defaults::MAX_ROWS_PER_FILE,
            max_columns_per_file: defaults::MAX_COLUMNS_PER_FILE,
            max_bytes_per_file: defaults::MAX_BYTES_PER_FILE,
            max_samples_per_trip: defaults::MAX_SAMPLES_PER_TRIP,
            max_trips: defaults::MAX_TRIPS,
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Run trips on the rayon pool. Output order is identical either way.
    pub parallel: bool,
    /// Minimum finite samples for a trend line
    pub min_trend_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            min_trend_samples: defaults::MIN_TREND_SAMPLES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.limits.max_trips, 50);
        assert_eq!(config.limits.max_rows_per_file, 50_000);
        assert!(!config.analysis.parallel);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("[limits]\nmax_trips = 5\n").expect("parse");
        assert_eq!(config.limits.max_trips, 5);
        assert_eq!(config.limits.max_samples_per_trip, defaults::MAX_SAMPLES_PER_TRIP);
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_zero_cap_rejected() {
        let err = EngineConfig::from_toml_str("[limits]\nmax_rows_per_file = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().contains("max_rows_per_file"));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = EngineConfig::from_toml_str("[limits\nmax_trips = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EngineConfig::default();
        config.analysis.parallel = true;
        let text = config.to_toml().expect("serialize");
        assert_eq!(EngineConfig::from_toml_str(&text).expect("parse"), config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("obdscope.toml");
        std::fs::write(&path, "[analysis]\nparallel = true\n").expect("write");
        let config = EngineConfig::load_from_file(&path).expect("load");
        assert!(config.analysis.parallel);

        let missing = EngineConfig::load_from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(..))));
    }
}
