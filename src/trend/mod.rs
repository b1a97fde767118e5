//! Trend & Pattern Engine
//!
//! ## Architecture
//!
//! - **[`trends`]**: per-parameter least-squares trend, 2σ outlier count and
//!   erratic override, canned predictions.
//! - **[`patterns`]**: a static catalog of fault hypotheses evaluated against
//!   per-trip aggregates (mean, range, trend). Matches are independent.
//!
//! Both are pure functions of one trip and can run in any order.

pub mod patterns;
pub mod trends;

pub use patterns::{match_patterns, FaultPattern, ParamAggregate, TripAggregates, PATTERNS};
pub use trends::{compute_trend, prediction, trip_trends};

use crate::trips::Trip;
use crate::types::{PatternMatch, TrendSummary};

/// Trends and pattern matches for one trip
pub fn analyze_trip(trip: &Trip, min_samples: usize) -> (Vec<TrendSummary>, Vec<PatternMatch>) {
    let trends = trip_trends(trip, min_samples);
    let aggregates = TripAggregates::from_trip(trip, &trends);
    let matches = match_patterns(&trip.id, &aggregates);
    (trends, matches)
}
