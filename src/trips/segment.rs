//! Trip Segmentation
//!
//! Groups the flat sample collection by `source_trip`. Trips keep the order
//! in which their first sample appeared; samples keep ingestion order.
//! Each trip retains at most `max_samples_per_trip` samples.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::LimitsConfig;
use crate::series::TimeSeries;
use crate::types::Sample;

/// All samples sharing one source label
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: String,
    pub samples: Vec<Sample>,
}

impl Trip {
    pub fn new(id: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self { id: id.into(), samples }
    }

    /// Time-sorted finite readings of one parameter
    pub fn series(&self, parameter_id: &str) -> TimeSeries {
        TimeSeries::from_samples(self.samples.iter().filter(|s| s.parameter_id == parameter_id))
    }

    /// Distinct parameter ids in first-appearance order
    pub fn parameters(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for s in &self.samples {
            if !seen.contains(&s.parameter_id.as_str()) {
                seen.push(s.parameter_id.as_str());
            }
        }
        seen
    }

    /// Earliest timestamp of any sample (ms)
    pub fn start_millis(&self) -> Option<f64> {
        self.samples
            .iter()
            .map(|s| s.time.epoch_millis())
            .filter(|t| t.is_finite())
            .min_by(f64::total_cmp)
    }

    /// Latest timestamp of any sample (ms)
    pub fn end_millis(&self) -> Option<f64> {
        self.samples
            .iter()
            .map(|s| s.time.epoch_millis())
            .filter(|t| t.is_finite())
            .max_by(f64::total_cmp)
    }
}

/// Trips plus truncation notes
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    pub trips: Vec<Trip>,
    pub notes: Vec<String>,
}

/// Partition samples into trips, applying the per-trip sample cap
pub fn segment_trips<I>(samples: I, limits: &LimitsConfig) -> Segmentation
where
    I: IntoIterator<Item = Sample>,
{
    let mut trips: Vec<Trip> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut dropped: Vec<usize> = Vec::new();

    for sample in samples {
        let slot = match index.get(&sample.source_trip) {
            Some(&i) => i,
            None => {
                index.insert(sample.source_trip.clone(), trips.len());
                trips.push(Trip::new(sample.source_trip.clone(), Vec::new()));
                dropped.push(0);
                trips.len() - 1
            }
        };
        if trips[slot].samples.len() < limits.max_samples_per_trip {
            trips[slot].samples.push(sample);
        } else {
            dropped[slot] += 1;
        }
    }

    let mut notes = Vec::new();
    for (trip, &n) in trips.iter().zip(&dropped) {
        if n > 0 {
            warn!(trip = %trip.id, dropped = n, cap = limits.max_samples_per_trip, "Trip sample cap reached");
            notes.push(format!(
                "{}: {n} samples beyond the {} per-trip cap were dropped",
                trip.id, limits.max_samples_per_trip
            ));
        }
    }

    debug!(trips = trips.len(), "Samples segmented");
    Segmentation { trips, notes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleTime;

    fn sample(trip: &str, t: f64, param: &str, v: f64) -> Sample {
        Sample::new(SampleTime::Relative(t), param, Some(v), None, trip)
    }

    #[test]
    fn test_groups_by_source_in_first_appearance_order() {
        let samples = vec![
            sample("b", 0.0, "rpm", 1.0),
            sample("a", 0.0, "rpm", 2.0),
            sample("b", 1.0, "rpm", 3.0),
        ];
        let seg = segment_trips(samples, &LimitsConfig::default());
        let ids: Vec<_> = seg.trips.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(seg.trips[0].samples.len(), 2);
        assert!(seg.notes.is_empty());
    }

    #[test]
    fn test_sample_cap_drops_tail_with_note() {
        let samples: Vec<_> = (0..10).map(|i| sample("t", f64::from(i), "rpm", 800.0)).collect();
        let limits = LimitsConfig { max_samples_per_trip: 4, ..LimitsConfig::default() };
        let seg = segment_trips(samples, &limits);
        assert_eq!(seg.trips[0].samples.len(), 4);
        assert_eq!(seg.trips[0].samples[3].time, SampleTime::Relative(3.0));
        assert_eq!(seg.notes.len(), 1);
    }

    #[test]
    fn test_trip_helpers() {
        let trip = Trip::new(
            "t",
            vec![
                sample("t", 5.0, "rpm", 900.0),
                sample("t", 1.0, "speed", 10.0),
                sample("t", 2.0, "rpm", 800.0),
            ],
        );
        assert_eq!(trip.parameters(), vec!["rpm", "speed"]);
        assert_eq!(trip.start_millis(), Some(1_000.0));
        assert_eq!(trip.end_millis(), Some(5_000.0));
        assert_eq!(trip.series("rpm").values(), vec![800.0, 900.0]);
    }
}
