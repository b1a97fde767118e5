//! Engine Configuration Module
//!
//! Caps and analysis switches loaded from TOML. Detector thresholds are not
//! here: they are fixed constants in `detectors::thresholds`.
//!
//! ## Loading Order
//!
//! 1. `OBDSCOPE_CONFIG` environment variable (path to TOML file)
//! 2. `obdscope.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! There is no global instance. Load once and pass by reference:
//!
//! ```ignore
//! let config = EngineConfig::load();
//! let report = engine::analyze_documents(&documents, &config);
//! ```

pub mod defaults;
mod engine_config;
mod validation;

pub use engine_config::*;
pub use validation::{validate_unknown_keys, ValidationWarning};
