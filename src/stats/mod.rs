//! Statistics Library
//!
//! Generic numeric primitives shared by trip summaries, detectors and the
//! trend engine. Every aggregate returns `None` on an empty input and never
//! NaN; callers strip missing / non-finite readings with [`finite`] first.
//!
//! ## Contents
//! - Location and spread: `mean`, `variance`, `stddev`, `median`, `percentile`
//! - Shape: `coefficient_of_variation`, `moving_average`
//! - Events: `count_transitions`, `count_crossings`, `detect_spikes`, `local_maxima`
//! - Relationships: `regression` (least squares, Pearson r with p-value)

pub mod regression;

pub use regression::{correlation, correlation_significance, linear_regression, Correlation, LinearFit};

use statrs::statistics::Statistics;

/// Keep only present, finite values
pub fn finite<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect()
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = values.iter().mean();
    m.is_finite().then_some(m)
}

/// Population variance
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let v = values.iter().population_variance();
    v.is_finite().then_some(v)
}

/// Population standard deviation
pub fn stddev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// max - min
pub fn range(values: &[f64]) -> Option<f64> {
    Some(max(values)? - min(values)?)
}

/// Percentile with linear interpolation between closest ranks.
///
/// `p` is in percent and clamped to 0..=100.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !p.is_finite() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let p = p.clamp(0.0, 100.0);
    #[allow(clippy::cast_precision_loss)]
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = rank - rank.floor();
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// Standard deviation relative to the absolute mean.
///
/// `None` when the mean is effectively zero.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if m.abs() < 1e-9 {
        return None;
    }
    Some(stddev(values)? / m.abs())
}

/// Trailing moving average; output has the same length as the input.
///
/// The first `window - 1` points average over what is available so far.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return values.to_vec();
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        let n = (i + 1).min(window);
        #[allow(clippy::cast_precision_loss)]
        out.push(sum / n as f64);
    }
    out
}

/// Number of times consecutive values differ by more than `tolerance`
pub fn count_transitions(values: &[f64], tolerance: f64) -> usize {
    values
        .windows(2)
        .filter(|w| (w[1] - w[0]).abs() > tolerance)
        .count()
}

/// Number of times the series crosses `threshold` (either direction)
pub fn count_crossings(values: &[f64], threshold: f64) -> usize {
    let mut count = 0;
    let mut above: Option<bool> = None;
    for &v in values {
        if v == threshold {
            continue;
        }
        let now_above = v > threshold;
        if let Some(prev) = above {
            if prev != now_above {
                count += 1;
            }
        }
        above = Some(now_above);
    }
    count
}

/// Indices whose value sits more than `z` standard deviations from the
/// trailing moving average of the preceding `window` points.
pub fn detect_spikes(values: &[f64], window: usize, z: f64) -> Vec<usize> {
    if window == 0 || values.len() <= window {
        return Vec::new();
    }
    let Some(sigma) = stddev(values) else {
        return Vec::new();
    };
    if sigma < 1e-9 {
        return Vec::new();
    }

    let mut spikes = Vec::new();
    let mut sum: f64 = values[..window].iter().sum();
    for i in window..values.len() {
        #[allow(clippy::cast_precision_loss)]
        let baseline = sum / window as f64;
        if (values[i] - baseline).abs() > z * sigma {
            spikes.push(i);
        }
        sum += values[i] - values[i - window];
    }
    spikes
}

/// Indices of strict local maxima that rise at least `min_prominence` above
/// both neighbours.
pub fn local_maxima(values: &[f64], min_prominence: f64) -> Vec<usize> {
    values
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] - w[0] >= min_prominence && w[1] - w[2] >= min_prominence)
        .map(|(i, _)| i + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_aggregates_are_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(stddev(&[]), None);
        assert_eq!(variance(&[]), None);
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(median(&[]), None);
        assert_eq!(min(&[]), None);
        assert_eq!(coefficient_of_variation(&[]), None);
    }

    #[test]
    fn test_null_only_input_behaves_as_empty() {
        let filtered = finite([None, None, Some(f64::NAN), Some(f64::INFINITY)]);
        assert!(filtered.is_empty());
        assert_eq!(mean(&filtered), None);
    }

    #[test]
    fn test_basic_moments() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), Some(5.0));
        assert!((stddev(&v).expect("stddev") - 2.0).abs() < 1e-12);
        assert_eq!(range(&v), Some(7.0));
    }

    #[test]
    fn test_percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&v, 0.0), Some(1.0));
        assert_eq!(percentile(&v, 100.0), Some(4.0));
        assert_eq!(median(&v), Some(2.5));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn test_cv_of_zero_mean_is_none() {
        assert_eq!(coefficient_of_variation(&[-1.0, 1.0]), None);
        let cv = coefficient_of_variation(&[9.0, 11.0]).expect("cv");
        assert!((cv - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_moving_average() {
        let ma = moving_average(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(ma, vec![1.0, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_transitions_and_crossings() {
        let gears = [1.0, 1.0, 2.0, 2.0, 3.0, 2.0];
        assert_eq!(count_transitions(&gears, 0.5), 3);

        let o2 = [0.1, 0.8, 0.2, 0.9, 0.45, 0.1];
        assert_eq!(count_crossings(&o2, 0.45), 4);
    }

    #[test]
    fn test_spike_detection() {
        let mut v = vec![800.0; 100];
        v[50] = 2000.0;
        let spikes = detect_spikes(&v, 10, 3.0);
        assert_eq!(spikes, vec![50]);
        assert!(detect_spikes(&[800.0; 100], 10, 3.0).is_empty());
    }

    #[test]
    fn test_local_maxima() {
        let v = [0.0, 5.0, 0.0, 1.0, 1.5, 1.0, 9.0, 0.0];
        assert_eq!(local_maxima(&v, 1.0), vec![1, 6]);
    }
}
