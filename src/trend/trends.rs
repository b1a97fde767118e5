//! Per-parameter trend classification
//!
//! Least-squares slope over (minutes since trip start, value), a 2σ outlier
//! count, and a lookup of a canned prediction for notable (parameter, trend)
//! combinations.

use tracing::debug;

use crate::canonical::params;
use crate::series::TimeSeries;
use crate::stats;
use crate::trips::Trip;
use crate::types::{TrendDirection, TrendSummary};

/// Outliers lie further than this many standard deviations from the mean
pub const OUTLIER_SIGMA: f64 = 2.0;

/// Outlier share above which a series is classified erratic
pub const ERRATIC_SHARE: f64 = 0.2;

/// Slope per minute, relative to the series magnitude, treated as flat
pub const STABLE_RELATIVE_SLOPE: f64 = 0.01;

const PREDICTIONS: &[(&str, TrendDirection, &str)] = &[
    (
        params::COOLANT_TEMP,
        TrendDirection::Increasing,
        "Coolant temperature is climbing; overheating likely if the trend continues",
    ),
    (
        params::COOLANT_TEMP,
        TrendDirection::Erratic,
        "Coolant temperature is unstable; suspect a sticking thermostat or trapped air",
    ),
    (
        params::CONTROL_MODULE_VOLTAGE,
        TrendDirection::Decreasing,
        "System voltage is falling; the battery is discharging faster than it charges",
    ),
    (
        params::CONTROL_MODULE_VOLTAGE,
        TrendDirection::Erratic,
        "System voltage fluctuates; check the alternator regulator and ground straps",
    ),
    (
        params::LTFT_B1,
        TrendDirection::Increasing,
        "Long-term fuel trim is drifting lean; a vacuum leak or weak fuel delivery is developing",
    ),
    (
        params::LTFT_B1,
        TrendDirection::Decreasing,
        "Long-term fuel trim is drifting rich; check for leaking injectors or a purge valve stuck open",
    ),
    (
        params::FUEL_RAIL_PRESSURE,
        TrendDirection::Decreasing,
        "Fuel rail pressure is falling; the pump or pressure regulator is weakening",
    ),
    (
        params::OIL_PRESSURE,
        TrendDirection::Decreasing,
        "Oil pressure is falling; check the oil level and pump before running under load",
    ),
    (
        params::TRANS_FLUID_TEMP,
        TrendDirection::Increasing,
        "Transmission fluid is heating up; slipping clutches or a blocked cooler",
    ),
    (
        params::KNOCK_RETARD,
        TrendDirection::Increasing,
        "Knock retard is increasing; carbon build-up or poor fuel quality",
    ),
    (
        params::BOOST_PRESSURE,
        TrendDirection::Decreasing,
        "Boost is dropping; turbocharger wear or a boost leak is developing",
    ),
    (
        params::MAF,
        TrendDirection::Decreasing,
        "Airflow is declining; check the air filter and the MAF sensor element",
    ),
];

/// Canned outlook for a parameter moving in a given direction
pub fn prediction(parameter_id: &str, trend: TrendDirection) -> Option<&'static str> {
    PREDICTIONS
        .iter()
        .find(|(id, dir, _)| *id == parameter_id && *dir == trend)
        .map(|(_, _, text)| *text)
}

/// Classify a least-squares slope (value units per minute)
pub fn classify_slope(slope: f64, mean: f64) -> TrendDirection {
    if slope.abs() / mean.abs().max(1.0) < STABLE_RELATIVE_SLOPE {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    }
}

/// Values further than [`OUTLIER_SIGMA`] standard deviations from the mean
pub fn count_outliers(values: &[f64]) -> usize {
    let (Some(mean), Some(sd)) = (stats::mean(values), stats::stddev(values)) else {
        return 0;
    };
    if sd < f64::EPSILON {
        return 0;
    }
    values
        .iter()
        .filter(|v| (*v - mean).abs() > OUTLIER_SIGMA * sd)
        .count()
}

/// Trend of one series, or `None` below `min_samples` or without a time spread
#[allow(clippy::cast_precision_loss)]
pub fn compute_trend(
    trip_id: &str,
    parameter_id: &str,
    series: &TimeSeries,
    min_samples: usize,
) -> Option<TrendSummary> {
    if series.len() < min_samples.max(2) {
        return None;
    }
    let start = series.start()?;
    let minutes: Vec<f64> = series.times().iter().map(|t| (t - start) / 60_000.0).collect();
    let values = series.values();

    let fit = stats::linear_regression(&minutes, &values)?;
    let mean = stats::mean(&values)?;
    let outlier_count = count_outliers(&values);

    let trend = if outlier_count as f64 > ERRATIC_SHARE * values.len() as f64 {
        TrendDirection::Erratic
    } else {
        classify_slope(fit.slope, mean)
    };

    Some(TrendSummary {
        trip_id: trip_id.to_string(),
        parameter_id: parameter_id.to_string(),
        slope: fit.slope,
        trend,
        outlier_count,
        sample_count: values.len(),
        mean,
        prediction: prediction(parameter_id, trend).map(str::to_string),
    })
}

/// Trends for every parameter of a trip, in first-appearance order
pub fn trip_trends(trip: &Trip, min_samples: usize) -> Vec<TrendSummary> {
    let trends: Vec<TrendSummary> = trip
        .parameters()
        .into_iter()
        .filter_map(|id| compute_trend(&trip.id, id, &trip.series(id), min_samples))
        .collect();
    debug!(trip = %trip.id, trends = trends.len(), "Trends computed");
    trends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleTime;

    fn series(n: usize, f: impl Fn(usize) -> f64) -> TimeSeries {
        TimeSeries::from_points((0..n).map(|i| (SampleTime::Relative(i as f64), f(i))))
    }

    #[test]
    fn test_rising_coolant_is_increasing() {
        let s = series(600, |i| 20.0 + 70.0 * i as f64 / 599.0);
        let trend = compute_trend("t", params::COOLANT_TEMP, &s, 10).expect("trend");
        assert_eq!(trend.trend, TrendDirection::Increasing);
        // 70 °C over ~10 minutes
        assert!((trend.slope - 7.0).abs() < 0.1, "slope {}", trend.slope);
        assert_eq!(trend.outlier_count, 0);
        assert!(trend.prediction.is_some());
    }

    #[test]
    fn test_flat_series_is_stable() {
        let s = series(300, |i| if i % 2 == 0 { 13.9 } else { 14.1 });
        let trend = compute_trend("t", params::CONTROL_MODULE_VOLTAGE, &s, 10).expect("trend");
        assert_eq!(trend.trend, TrendDirection::Stable);
        assert!(trend.prediction.is_none());
    }

    #[test]
    fn test_outlier_counting() {
        let s = series(200, |i| if i % 4 == 0 { 500.0 } else { 100.0 + (i % 3) as f64 });
        assert!(count_outliers(&s.values()) == 0, "bimodal split stays within 2σ");

        let spiky = series(200, |i| match i % 10 {
            0 => 400.0,
            5 => -200.0,
            _ => 100.0,
        });
        // both spike groups sit 300 away from a mean of 100 with σ ≈ 134
        assert_eq!(count_outliers(&spiky.values()), 40);
    }

    #[test]
    fn test_erratic_override_beats_slope() {
        let values: Vec<f64> = (0..100)
            .map(|i| if i < 79 { 50.0 } else if i < 90 { 200.0 } else { -100.0 })
            .collect();
        assert!(count_outliers(&values) > 20);
        let s = series(100, |i| values[i]);
        let trend = compute_trend("t", params::MAF, &s, 10).expect("trend");
        assert_eq!(trend.trend, TrendDirection::Erratic);
    }

    #[test]
    fn test_too_few_samples() {
        let s = series(5, |i| i as f64);
        assert!(compute_trend("t", params::MAF, &s, 10).is_none());
    }
}
