//! Trend and fault-pattern output types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Regression-derived classification of a parameter over one trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    Erratic,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing"),
            Self::Decreasing => write!(f, "decreasing"),
            Self::Stable => write!(f, "stable"),
            Self::Erratic => write!(f, "erratic"),
        }
    }
}

/// Trend of one parameter within one trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub trip_id: String,
    pub parameter_id: String,
    /// Least-squares slope in value units per minute
    pub slope: f64,
    pub trend: TrendDirection,
    /// Samples further than 2σ from the mean
    pub outlier_count: usize,
    pub sample_count: usize,
    pub mean: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
}

/// How soon a matched fault pattern needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "CRITICAL"),
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

/// A named fault hypothesis whose guard conditions all held for a trip.
///
/// Confidence, urgency and texts are static per hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub trip_id: String,
    pub pattern: String,
    pub confidence: f64,
    pub symptoms: Vec<String>,
    pub urgency: Urgency,
    pub predicted_failure: String,
    pub time_to_failure: String,
    pub related_parameters: Vec<String>,
}
