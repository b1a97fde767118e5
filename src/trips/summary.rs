//! Trip Summarization
//!
//! One fixed-shape [`TripSummary`] per trip. Aggregates ignore missing and
//! non-finite readings; an empty input yields `None` for that field.
//!
//! Idle and load mass-air-flow medians classify each MAF reading by the
//! nearest-in-time speed and RPM readings.

use tracing::debug;

use super::Trip;
use crate::canonical::params;
use crate::series::TimeSeries;
use crate::stats;
use crate::types::TripSummary;

/// Coolant temperature marking the end of warm-up (°C)
pub const WARMUP_TARGET_C: f64 = 80.0;

/// Idle: stationary with RPM in the idle band
const IDLE_MAX_SPEED_KMH: f64 = 2.0;
const IDLE_RPM_MIN: f64 = 500.0;
const IDLE_RPM_MAX: f64 = 1200.0;

/// Load: moving at road speed with RPM well above idle
const LOAD_MIN_SPEED_KMH: f64 = 40.0;
const LOAD_MIN_RPM: f64 = 2000.0;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Summarize every trip, preserving order
pub fn summarize_trips(trips: &[Trip]) -> Vec<TripSummary> {
    trips.iter().map(summarize_trip).collect()
}

/// Compute the summary record of one trip
pub fn summarize_trip(trip: &Trip) -> TripSummary {
    let speed = trip.series(params::VEHICLE_SPEED).values();
    let coolant = trip.series(params::COOLANT_TEMP);
    let coolant_values = coolant.values();
    let rpm = trip.series(params::ENGINE_RPM).values();
    let battery = trip.series(params::CONTROL_MODULE_VOLTAGE).values();
    let stft = trip.series(params::STFT_B1).values();
    let ltft = trip.series(params::LTFT_B1).values();

    let start = trip.start_millis();
    let duration_min = start
        .zip(trip.end_millis())
        .map(|(s, e)| (e - s) / MILLIS_PER_MINUTE);

    let (maf_idle_median, maf_load_median) = maf_medians(trip);

    let summary = TripSummary {
        trip_id: trip.id.clone(),
        duration_min,
        speed_avg: stats::mean(&speed),
        speed_max: stats::max(&speed),
        coolant_min: stats::min(&coolant_values),
        coolant_max: stats::max(&coolant_values),
        warmup_to_80c_min: start.and_then(|s| warmup_minutes(&coolant, s)),
        rpm_max: stats::max(&rpm),
        maf_idle_median,
        maf_load_median,
        battery_min: stats::min(&battery),
        battery_max: stats::max(&battery),
        stft_avg: stats::mean(&stft),
        ltft_avg: stats::mean(&ltft),
        sample_count: trip.samples.len(),
    };

    debug!(
        trip = %trip.id,
        samples = summary.sample_count,
        duration_min = ?summary.duration_min,
        "Trip summarized"
    );
    summary
}

/// Minutes from `trip_start` to the first coolant reading >= 80 °C
fn warmup_minutes(coolant: &TimeSeries, trip_start: f64) -> Option<f64> {
    coolant
        .points()
        .iter()
        .find(|p| p.value >= WARMUP_TARGET_C)
        .map(|p| (p.t - trip_start) / MILLIS_PER_MINUTE)
}

/// (idle median, load median) of mass air flow
fn maf_medians(trip: &Trip) -> (Option<f64>, Option<f64>) {
    let maf = trip.series(params::MAF);
    let speed = trip.series(params::VEHICLE_SPEED);
    let rpm = trip.series(params::ENGINE_RPM);
    if maf.is_empty() || speed.is_empty() || rpm.is_empty() {
        return (None, None);
    }

    let mut idle = Vec::new();
    let mut load = Vec::new();
    for (with_speed, with_rpm) in maf.align(&speed).iter().zip(maf.align(&rpm)) {
        let (v, rpm) = (with_speed.other, with_rpm.other);
        if v <= IDLE_MAX_SPEED_KMH && (IDLE_RPM_MIN..=IDLE_RPM_MAX).contains(&rpm) {
            idle.push(with_speed.primary);
        } else if v >= LOAD_MIN_SPEED_KMH && rpm >= LOAD_MIN_RPM {
            load.push(with_speed.primary);
        }
    }
    (stats::median(&idle), stats::median(&load))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sample, SampleTime};

    fn push(samples: &mut Vec<Sample>, t: f64, param: &str, v: f64) {
        samples.push(Sample::new(SampleTime::Relative(t), param, Some(v), None, "trip"));
    }

    #[test]
    fn test_missing_parameters_summarize_to_none() {
        let mut samples = Vec::new();
        push(&mut samples, 0.0, params::ENGINE_RPM, 800.0);
        push(&mut samples, 60.0, params::ENGINE_RPM, 2500.0);
        let s = summarize_trip(&Trip::new("trip", samples));

        assert_eq!(s.rpm_max, Some(2500.0));
        assert_eq!(s.duration_min, Some(1.0));
        assert_eq!(s.speed_avg, None);
        assert_eq!(s.coolant_min, None);
        assert_eq!(s.warmup_to_80c_min, None);
        assert_eq!(s.maf_idle_median, None);
        assert_eq!(s.battery_min, None);
        assert_eq!(s.sample_count, 2);
    }

    #[test]
    fn test_null_values_are_excluded() {
        let samples = vec![
            Sample::new(SampleTime::Relative(0.0), params::VEHICLE_SPEED, None, None, "trip"),
            Sample::new(SampleTime::Relative(1.0), params::VEHICLE_SPEED, Some(f64::NAN), None, "trip"),
        ];
        let s = summarize_trip(&Trip::new("trip", samples));
        assert_eq!(s.speed_avg, None);
        assert_eq!(s.speed_max, None);
    }

    #[test]
    fn test_warmup_is_first_crossing() {
        let mut samples = Vec::new();
        for i in 0..600 {
            let v = 20.0 + 70.0 * f64::from(i) / 599.0;
            push(&mut samples, f64::from(i), params::COOLANT_TEMP, v);
        }
        let s = summarize_trip(&Trip::new("trip", samples));
        let warmup = s.warmup_to_80c_min.expect("warm-up reached");
        // first sample >= 80 °C is index 514
        assert!((warmup - 514.0 / 60.0).abs() <= 1.0 / 60.0, "warmup={warmup}");
        assert_eq!(s.coolant_min, Some(20.0));
    }

    #[test]
    fn test_warmup_measured_from_trip_start() {
        let mut samples = Vec::new();
        push(&mut samples, 0.0, params::ENGINE_RPM, 800.0);
        push(&mut samples, 120.0, params::COOLANT_TEMP, 60.0);
        push(&mut samples, 180.0, params::COOLANT_TEMP, 85.0);
        let s = summarize_trip(&Trip::new("trip", samples));
        assert_eq!(s.warmup_to_80c_min, Some(3.0));
    }

    #[test]
    fn test_maf_idle_and_load_medians() {
        let mut samples = Vec::new();
        for i in 0..10 {
            let t = f64::from(i);
            push(&mut samples, t, params::VEHICLE_SPEED, 0.0);
            push(&mut samples, t, params::ENGINE_RPM, 750.0);
            push(&mut samples, t + 0.2, params::MAF, 3.0 + f64::from(i % 2));
        }
        for i in 10..20 {
            let t = f64::from(i);
            push(&mut samples, t, params::VEHICLE_SPEED, 90.0);
            push(&mut samples, t, params::ENGINE_RPM, 2600.0);
            push(&mut samples, t + 0.2, params::MAF, 30.0);
        }
        let s = summarize_trip(&Trip::new("trip", samples));
        assert_eq!(s.maf_idle_median, Some(3.5));
        assert_eq!(s.maf_load_median, Some(30.0));
    }
}
