//! OBDScope: vehicle log diagnostics
//!
//! Turns captured OBD sensor logs into ranked health findings, per-trip
//! summaries, parameter trends and fault-pattern matches.
//!
//! ## Architecture
//!
//! - **Ingestion** (`ingest`): wide or long CSV logs and zip bundles into a
//!   flat [`Sample`] collection, with unit normalization and hard caps
//! - **Canonicalizer** (`canonical`): raw column names onto a fixed vocabulary
//! - **Trips** (`trips`): segmentation by source and fixed-shape summaries
//! - **Detector Catalog** (`detectors`): independent rules per subject system
//! - **Trend & Pattern Engine** (`trend`): regression trends and fault hypotheses
//! - **Engine** (`engine`): fault-isolated orchestration, ranking, full pipeline
//!
//! Everything below `engine` is pure computation; only `ingest::load_documents`
//! touches the filesystem.

pub mod canonical;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod ingest;
pub mod series;
pub mod stats;
pub mod trend;
pub mod trips;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, EngineConfig};

// Re-export the data model
pub use types::{
    Finding, FindingLevel, PatternMatch, Sample, SampleTime, TrendDirection, TrendSummary,
    TripSummary, Urgency,
};

// Re-export entry points
pub use engine::{analyze_documents, analyze_trends, analyze_trips, rank_findings, DiagnosticReport};
pub use ingest::{ingest_batch, load_documents, Document};
pub use trips::{segment_trips, summarize_trips, Trip};
