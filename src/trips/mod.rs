//! Trip Segmentation & Summarization
//!
//! ## Architecture
//!
//! - **segment**: partitions samples by source label into [`Trip`]s, capped
//! - **summary**: computes one [`crate::types::TripSummary`] per trip

pub mod segment;
pub mod summary;

pub use segment::{segment_trips, Segmentation, Trip};
pub use summary::{summarize_trip, summarize_trips, WARMUP_TARGET_C};
