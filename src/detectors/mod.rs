//! Detector Catalog
//!
//! Independent rule functions, each examining one trip and emitting zero or
//! more [`Finding`]s. Detectors never see each other's output.
//!
//! ## Architecture
//!
//! - **[`Detector`]**: a descriptor (id, subject, required series, minimum
//!   sample count, compute function). The orchestrator in `engine` skips a
//!   detector whose required series are short and wraps every run in a
//!   fault boundary.
//! - **[`TripData`]**: the read-only view a detector receives. Series are
//!   built once per trip and shared by every detector.
//! - **[`thresholds`]**: fixed numeric thresholds, grouped by subject.
//! - One submodule per subject system contributes a `DETECTORS` table;
//!   [`catalog`] concatenates them in a fixed order.
//!
//! Insufficient data is never an error: a detector returns `Ok(vec![])`.
//! `Err` is reserved for a computation that should have succeeded.

mod cooling;
mod driving;
mod electrical;
mod emissions;
mod engine;
mod evap;
mod fuel;
mod ignition;
mod induction;
mod security;
mod sensors;
pub mod thresholds;
mod transmission;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::canonical::params;
use crate::series::{Aligned, TimeSeries};
use crate::trips::Trip;
use crate::types::{Finding, FindingLevel, Sample, TripSummary};

// ============================================================================
// Errors
// ============================================================================

/// Failure inside one detector run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("{what} could not be computed")]
    Missing { what: &'static str },

    #[error("{0}")]
    Computation(String),
}

/// Unwrap a statistic the gating guarantees is available
pub fn need(value: Option<f64>, what: &'static str) -> Result<f64, DetectorError> {
    value.ok_or(DetectorError::Missing { what })
}

// ============================================================================
// Descriptors
// ============================================================================

/// Subject system a detector belongs to; doubles as the finding category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Engine,
    Cooling,
    Fuel,
    Emissions,
    Transmission,
    Electrical,
    Induction,
    Ignition,
    Evap,
    Security,
    Sensors,
    Driving,
}

impl Subject {
    /// Category label carried by findings
    pub const fn category(self) -> &'static str {
        match self {
            Self::Engine => "Engine",
            Self::Cooling => "Cooling System",
            Self::Fuel => "Fuel System",
            Self::Emissions => "Emissions",
            Self::Transmission => "Transmission",
            Self::Electrical => "Electrical",
            Self::Induction => "Air Intake & Boost",
            Self::Ignition => "Ignition Timing",
            Self::Evap => "EVAP System",
            Self::Security => "Data Integrity",
            Self::Sensors => "Sensor Health",
            Self::Driving => "Driving Behavior",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category())
    }
}

/// Compute function of a detector
pub type DetectFn = fn(&TripData<'_>) -> Result<Vec<Finding>, DetectorError>;

/// One entry of the catalog
#[derive(Clone, Copy)]
pub struct Detector {
    /// Stable identifier, e.g. `cooling.overheat`
    pub id: &'static str,
    pub subject: Subject,
    /// Parameters that must each have `min_samples` finite readings
    pub requires: &'static [&'static str],
    pub min_samples: usize,
    pub run: DetectFn,
}

impl Detector {
    /// True when every required series has enough readings
    pub fn is_applicable(&self, data: &TripData<'_>) -> bool {
        self.requires
            .iter()
            .all(|id| data.series(id).len() >= self.min_samples)
    }
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector")
            .field("id", &self.id)
            .field("subject", &self.subject)
            .field("requires", &self.requires)
            .field("min_samples", &self.min_samples)
            .finish_non_exhaustive()
    }
}

/// The full catalog in run order
pub fn catalog() -> Vec<Detector> {
    [
        engine::DETECTORS,
        cooling::DETECTORS,
        fuel::DETECTORS,
        emissions::DETECTORS,
        transmission::DETECTORS,
        electrical::DETECTORS,
        induction::DETECTORS,
        ignition::DETECTORS,
        evap::DETECTORS,
        security::DETECTORS,
        sensors::DETECTORS,
        driving::DETECTORS,
    ]
    .concat()
}

// ============================================================================
// Trip View
// ============================================================================

static EMPTY_SERIES: TimeSeries = TimeSeries::new();

/// Everything a detector may read about one trip
#[derive(Debug)]
pub struct TripData<'a> {
    pub trip_id: &'a str,
    /// Samples in ingestion order
    pub samples: &'a [Sample],
    pub summary: Option<&'a TripSummary>,
    series: HashMap<&'a str, TimeSeries>,
}

impl<'a> TripData<'a> {
    /// Build the shared per-parameter series of a trip
    pub fn new(trip: &'a Trip, summary: Option<&'a TripSummary>) -> Self {
        let mut grouped: HashMap<&'a str, Vec<&'a Sample>> = HashMap::new();
        for s in &trip.samples {
            grouped.entry(s.parameter_id.as_str()).or_default().push(s);
        }
        let series = grouped
            .into_iter()
            .map(|(id, samples)| (id, TimeSeries::from_samples(samples)))
            .collect();
        Self {
            trip_id: &trip.id,
            samples: &trip.samples,
            summary,
            series,
        }
    }

    /// Series of one parameter; empty when the trip lacks it
    pub fn series(&self, parameter_id: &str) -> &TimeSeries {
        self.series.get(parameter_id).unwrap_or(&EMPTY_SERIES)
    }

    /// Finite values of one parameter in time order
    pub fn values(&self, parameter_id: &str) -> Vec<f64> {
        self.series(parameter_id).values()
    }

    /// Readings of `primary` joined with the nearest reading of `other`
    pub fn align(&self, primary: &str, other: &str) -> Vec<Aligned> {
        self.series(primary).align(self.series(other))
    }

    /// Readings of `primary` whose nearest `other` reading satisfies `pred`
    pub fn values_when(&self, primary: &str, other: &str, pred: impl Fn(f64) -> bool) -> Vec<f64> {
        self.align(primary, other)
            .into_iter()
            .filter(|a| pred(a.other))
            .map(|a| a.primary)
            .collect()
    }

    /// Readings of `parameter_id` taken while idling: stationary with RPM
    /// inside the idle band
    pub fn idle_values(&self, parameter_id: &str) -> Vec<f64> {
        let speed = self.align(parameter_id, params::VEHICLE_SPEED);
        let rpm = self.align(parameter_id, params::ENGINE_RPM);
        speed
            .iter()
            .zip(&rpm)
            .filter(|(s, r)| {
                s.other <= thresholds::STATIONARY_KMH
                    && (thresholds::IDLE_RPM_MIN..=thresholds::IDLE_RPM_MAX).contains(&r.other)
            })
            .map(|(s, _)| s.primary)
            .collect()
    }

    /// Parameter ids present in the trip, sorted
    pub fn parameter_ids(&self) -> Vec<&'a str> {
        let mut ids: Vec<&'a str> = self.series.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Finding pre-filled with this trip and the subject's category
    pub fn finding(&self, level: FindingLevel, subject: Subject, message: impl Into<String>) -> Finding {
        Finding::new(level, subject.category(), message).trip(self.trip_id)
    }
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Severity for a value that is worse the higher it goes
pub fn above(value: f64, warn: f64, fail: f64) -> Option<FindingLevel> {
    if value > fail {
        Some(FindingLevel::Fail)
    } else if value > warn {
        Some(FindingLevel::Warn)
    } else {
        None
    }
}

/// Severity for a value that is worse the lower it goes
pub fn below(value: f64, warn: f64, fail: f64) -> Option<FindingLevel> {
    if value < fail {
        Some(FindingLevel::Fail)
    } else if value < warn {
        Some(FindingLevel::Warn)
    } else {
        None
    }
}

/// Share of `values` satisfying `pred`, 0 for an empty slice
#[allow(clippy::cast_precision_loss)]
pub fn share(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| pred(**v)).count() as f64 / values.len() as f64
}

/// Events per minute over a series' covered span
#[allow(clippy::cast_precision_loss)]
pub fn per_minute(count: usize, series: &TimeSeries) -> Option<f64> {
    let minutes = series.duration_min()?;
    (minutes > 0.0).then(|| count as f64 / minutes)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Synthetic trip builders shared by detector tests

    use crate::trips::Trip;
    use crate::types::{Sample, SampleTime};

    /// Builder for a single-trip sample set at 1 Hz
    #[derive(Default)]
    pub struct TripBuilder {
        samples: Vec<Sample>,
    }

    impl TripBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// One reading per second, `f(i)` for `i in 0..n`
        pub fn series(mut self, param: &str, n: usize, f: impl Fn(usize) -> f64) -> Self {
            for i in 0..n {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64;
                self.samples
                    .push(Sample::new(SampleTime::Relative(t), param, Some(f(i)), None, "trip"));
            }
            self
        }

        /// Constant reading for `n` seconds
        pub fn constant(self, param: &str, n: usize, v: f64) -> Self {
            self.series(param, n, |_| v)
        }

        pub fn push(mut self, sample: Sample) -> Self {
            self.samples.push(sample);
            self
        }

        pub fn build(self) -> Trip {
            Trip::new("trip", self.samples)
        }
    }
}
