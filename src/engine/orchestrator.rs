//! Master orchestrator: runs the detector catalog over every trip
//!
//! Each detector runs inside its own fault boundary. An `Err` or a panic
//! becomes one `fail`-level "System Error" finding for that trip and the
//! remaining detectors keep running.

use rayon::prelude::*;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::detectors::{self, Detector, TripData};
use crate::trips::Trip;
use crate::types::{Finding, TripSummary};

/// Category of findings produced by the fault boundary
pub const SYSTEM_ERROR_CATEGORY: &str = "System Error";

/// Category of the note emitted when trips exceed the batch cap
pub const DATA_LIMITS_CATEGORY: &str = "Data Limits";

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs a detector catalog over trips
#[derive(Debug, Clone)]
pub struct Orchestrator {
    detectors: Vec<Detector>,
    max_trips: usize,
    parallel: bool,
}

impl Orchestrator {
    /// Orchestrator over the full built-in catalog
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_detectors(detectors::catalog(), config)
    }

    /// Orchestrator over a caller-supplied catalog
    pub fn with_detectors(detectors: Vec<Detector>, config: &EngineConfig) -> Self {
        Self {
            detectors,
            max_trips: config.limits.max_trips,
            parallel: config.analysis.parallel,
        }
    }

    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    /// Findings for every trip up to the trip cap, in trip then catalog order.
    ///
    /// `summaries` are matched to trips by id; a trip without one still runs.
    pub fn run(&self, trips: &[Trip], summaries: &[TripSummary]) -> Vec<Finding> {
        let by_trip: HashMap<&str, &TripSummary> =
            summaries.iter().map(|s| (s.trip_id.as_str(), s)).collect();

        let processed = &trips[..trips.len().min(self.max_trips)];
        let skipped = trips.len() - processed.len();

        let per_trip: Vec<Vec<Finding>> = if self.parallel {
            processed
                .par_iter()
                .map(|trip| self.analyze_trip(trip, by_trip.get(trip.id.as_str()).copied()))
                .collect()
        } else {
            processed
                .iter()
                .map(|trip| self.analyze_trip(trip, by_trip.get(trip.id.as_str()).copied()))
                .collect()
        };

        let mut findings: Vec<Finding> = per_trip.into_iter().flatten().collect();
        if skipped > 0 {
            warn!(skipped, cap = self.max_trips, "Trip cap reached");
            findings.push(
                Finding::info(
                    DATA_LIMITS_CATEGORY,
                    format!("{skipped} trip(s) beyond the limit of {} were not analyzed", self.max_trips),
                )
                .detail(
                    trips[processed.len()..]
                        .iter()
                        .map(|t| t.id.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            );
        }

        info!(
            trips = processed.len(),
            skipped,
            findings = findings.len(),
            "Detector catalog complete"
        );
        findings
    }

    /// Findings for a single trip, in catalog order
    pub fn analyze_trip(&self, trip: &Trip, summary: Option<&TripSummary>) -> Vec<Finding> {
        let data = TripData::new(trip, summary);
        let mut findings = Vec::new();
        let mut ran = 0usize;

        for detector in &self.detectors {
            if !detector.is_applicable(&data) {
                debug!(trip = %trip.id, detector = detector.id, "Insufficient data, skipped");
                continue;
            }
            ran += 1;
            findings.extend(run_guarded(detector, &data));
        }

        debug!(trip = %trip.id, ran, findings = findings.len(), "Trip analyzed");
        findings
    }
}

/// Run one detector inside a fault boundary
pub fn run_guarded(detector: &Detector, data: &TripData<'_>) -> Vec<Finding> {
    match panic::catch_unwind(AssertUnwindSafe(|| (detector.run)(data))) {
        Ok(Ok(findings)) => findings,
        Ok(Err(e)) => {
            warn!(trip = data.trip_id, detector = detector.id, error = %e, "Detector failed");
            vec![system_error(detector, data.trip_id, &e.to_string())]
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            warn!(trip = data.trip_id, detector = detector.id, %reason, "Detector panicked");
            vec![system_error(detector, data.trip_id, &reason)]
        }
    }
}

fn system_error(detector: &Detector, trip_id: &str, reason: &str) -> Finding {
    Finding::fail(
        SYSTEM_ERROR_CATEGORY,
        format!("Detector {} failed on trip {trip_id}", detector.id),
    )
    .trip(trip_id)
    .detail(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::params;
    use crate::detectors::{DetectorError, Subject};
    use crate::types::{FindingLevel, Sample, SampleTime};

    fn ok_detector(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
        Ok(vec![data.finding(FindingLevel::Info, Subject::Engine, "ok")])
    }

    fn err_detector(_: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
        Err(DetectorError::Computation("division by zero".into()))
    }

    fn panicking_detector(_: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
        panic!("boom")
    }

    fn detector(id: &'static str, run: detectors::DetectFn) -> Detector {
        Detector {
            id,
            subject: Subject::Engine,
            requires: &[],
            min_samples: 0,
            run,
        }
    }

    fn trip(id: &str) -> Trip {
        let samples = (0..10)
            .map(|i| Sample::new(SampleTime::Relative(f64::from(i)), params::ENGINE_RPM, Some(800.0), None, id))
            .collect();
        Trip::new(id, samples)
    }

    #[test]
    fn test_err_becomes_system_error() {
        let orch = Orchestrator::with_detectors(
            vec![detector("a", ok_detector), detector("b", err_detector), detector("c", ok_detector)],
            &EngineConfig::default(),
        );
        let findings = orch.analyze_trip(&trip("t1"), None);
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[1].level, FindingLevel::Fail);
        assert_eq!(findings[1].category, SYSTEM_ERROR_CATEGORY);
        assert_eq!(findings[1].trip_id.as_deref(), Some("t1"));
        assert_eq!(findings[1].detail.as_deref(), Some("division by zero"));
    }

    #[test]
    fn test_panic_is_contained() {
        let orch = Orchestrator::with_detectors(
            vec![detector("boom", panicking_detector), detector("ok", ok_detector)],
            &EngineConfig::default(),
        );
        let findings = orch.run(&[trip("t1"), trip("t2")], &[]);
        assert_eq!(findings.len(), 4);
        let errors: Vec<_> = findings.iter().filter(|f| f.category == SYSTEM_ERROR_CATEGORY).collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].detail.as_deref(), Some("boom"));
    }

    #[test]
    fn test_inapplicable_detector_is_silent() {
        let gated = Detector {
            requires: &[params::COOLANT_TEMP],
            min_samples: 30,
            ..detector("gated", err_detector)
        };
        let orch = Orchestrator::with_detectors(vec![gated], &EngineConfig::default());
        assert!(orch.analyze_trip(&trip("t1"), None).is_empty());
    }

    #[test]
    fn test_trip_cap_emits_data_limits_note() {
        let mut config = EngineConfig::default();
        config.limits.max_trips = 2;
        let orch = Orchestrator::with_detectors(vec![detector("ok", ok_detector)], &config);
        let findings = orch.run(&[trip("a"), trip("b"), trip("c")], &[]);

        assert_eq!(findings.len(), 3);
        let note = &findings[2];
        assert_eq!(note.category, DATA_LIMITS_CATEGORY);
        assert_eq!(note.level, FindingLevel::Info);
        assert_eq!(note.detail.as_deref(), Some("c"));
    }

    #[test]
    fn test_parallel_preserves_order() {
        let mut config = EngineConfig::default();
        config.analysis.parallel = true;
        let orch = Orchestrator::with_detectors(vec![detector("ok", ok_detector)], &config);
        let trips: Vec<Trip> = (0..8).map(|i| trip(&format!("trip-{i}"))).collect();
        let ids: Vec<_> = orch
            .run(&trips, &[])
            .into_iter()
            .filter_map(|f| f.trip_id)
            .collect();
        let expected: Vec<_> = (0..8).map(|i| format!("trip-{i}")).collect();
        assert_eq!(ids, expected);
    }
}
