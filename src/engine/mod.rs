//! Aggregation & Ranking: the engine's public entry points
//!
//! ## Architecture
//!
//! - **[`Orchestrator`]**: runs the detector catalog over each trip behind a
//!   per-detector fault boundary, honours the trip cap, optionally fans trips
//!   out over rayon while keeping output order.
//! - **[`rank_findings`]**: stable severity sort, no deduplication.
//! - **[`analyze_trips`]**: trips + summaries → ranked findings.
//! - **[`analyze_trends`]**: samples → (trends, pattern matches).
//! - **[`analyze_documents`]**: the full pipeline into a [`DiagnosticReport`].
//!
//! The engine performs no I/O; documents are loaded by the caller.

mod orchestrator;
mod pipeline;
mod ranking;

pub use orchestrator::{run_guarded, Orchestrator, DATA_LIMITS_CATEGORY, SYSTEM_ERROR_CATEGORY};
pub use pipeline::{analyze_documents, analyze_trends, analyze_trips, DiagnosticReport};
pub use ranking::{rank_findings, rank_patterns, LevelCounts};
