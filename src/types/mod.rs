//! Shared data model for the diagnostic pipeline
//!
//! - `Sample` / `SampleTime`: ingested observations (immutable)
//! - `TripSummary`: fixed-shape per-trip metrics
//! - `Finding` / `FindingLevel`: detector output
//! - `TrendSummary` / `PatternMatch`: trend and fault-pattern output
//!
//! Everything except `Sample` is derived and recomputed on every run.

mod sample;
mod finding;
mod summary;
mod trend;

pub use sample::*;
pub use finding::*;
pub use summary::*;
pub use trend::*;
