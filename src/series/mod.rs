//! Time-indexed series and nearest-time lookup
//!
//! Sensors in an OBD log are sampled asynchronously, so cross-parameter
//! checks align series by closest timestamp rather than exact match.
//! A [`TimeSeries`] is built once per (trip, parameter): non-finite readings
//! are dropped and points are stably sorted on the common millisecond axis.
//! Lookups are then a binary search, and [`TimeSeries::align`] joins two
//! series in a single two-pointer pass.
//!
//! Ties between two equally distant points resolve to the earlier timestamp;
//! among duplicates at one timestamp the first one ingested wins.

use crate::types::{Sample, SampleTime};

/// One reading on the millisecond axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub t: f64,
    pub value: f64,
}

/// A (time, value) pair from two series joined by nearest time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aligned {
    pub t: f64,
    pub primary: f64,
    pub other: f64,
}

/// Time-sorted readings of one parameter
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    points: Vec<Point>,
}

impl TimeSeries {
    /// Series with no points
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Build from (time, value) pairs in any order
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (SampleTime, f64)>,
    {
        let mut points: Vec<Point> = points
            .into_iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(t, value)| Point { t: t.epoch_millis(), value })
            .filter(|p| p.t.is_finite())
            .collect();
        // Stable: duplicates keep ingestion order
        points.sort_by(|a, b| a.t.total_cmp(&b.t));
        Self { points }
    }

    /// Build from samples, skipping missing values
    pub fn from_samples<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        Self::from_points(
            samples
                .into_iter()
                .filter_map(|s| s.finite_value().map(|v| (s.time, v))),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.t).collect()
    }

    /// Earliest timestamp (ms)
    pub fn start(&self) -> Option<f64> {
        self.points.first().map(|p| p.t)
    }

    /// Latest timestamp (ms)
    pub fn end(&self) -> Option<f64> {
        self.points.last().map(|p| p.t)
    }

    /// Covered time span in minutes
    pub fn duration_min(&self) -> Option<f64> {
        Some((self.end()? - self.start()?) / 60_000.0)
    }

    /// Points with `start <= t < end`
    pub fn window(&self, start: f64, end: f64) -> &[Point] {
        let lo = self.points.partition_point(|p| p.t < start);
        let hi = self.points.partition_point(|p| p.t < end);
        &self.points[lo..hi.max(lo)]
    }

    /// Point closest in time to `t` (ms)
    pub fn nearest_point(&self, t: f64) -> Option<&Point> {
        if self.points.is_empty() || !t.is_finite() {
            return None;
        }
        let idx = self.points.partition_point(|p| p.t < t);
        let pick = if idx == 0 {
            0
        } else if idx == self.points.len() {
            self.first_at(idx - 1)
        } else {
            let before = t - self.points[idx - 1].t;
            let after = self.points[idx].t - t;
            if after < before {
                idx
            } else {
                self.first_at(idx - 1)
            }
        };
        self.points.get(pick)
    }

    /// Value closest in time to `t` (ms)
    pub fn nearest(&self, t: f64) -> Option<f64> {
        self.nearest_point(t).map(|p| p.value)
    }

    /// Value closest in time to `time`
    pub fn nearest_at(&self, time: &SampleTime) -> Option<f64> {
        self.nearest(time.epoch_millis())
    }

    /// Join every point of `self` with the nearest point of `other`.
    ///
    /// Single merge pass; equivalent to calling [`TimeSeries::nearest`] per point.
    pub fn align(&self, other: &Self) -> Vec<Aligned> {
        if other.is_empty() {
            return Vec::new();
        }
        let theirs = &other.points;
        // `j` always sits on the first point of a run of equal timestamps
        let mut j = 0;
        let mut out = Vec::with_capacity(self.points.len());
        for p in &self.points {
            loop {
                let next = other.next_run(j);
                if next < theirs.len() && (theirs[next].t - p.t).abs() < (theirs[j].t - p.t).abs() {
                    j = next;
                } else {
                    break;
                }
            }
            out.push(Aligned {
                t: p.t,
                primary: p.value,
                other: theirs[j].value,
            });
        }
        out
    }

    /// Index of the first point after the run of equal timestamps at `idx`
    fn next_run(&self, idx: usize) -> usize {
        let t = self.points[idx].t;
        let mut next = idx + 1;
        while next < self.points.len() && self.points[next].t <= t {
            next += 1;
        }
        next
    }

    /// Index of the first point sharing the timestamp at `idx`
    fn first_at(&self, idx: usize) -> usize {
        let t = self.points[idx].t;
        self.points[..idx].partition_point(|p| p.t < t)
    }
}

/// One-off nearest lookup over an unsorted slice.
///
/// A single linear pass; ties go to the first pair encountered. Prefer a
/// [`TimeSeries`] when querying the same series more than once.
pub fn nearest_value(reference: &SampleTime, series: &[(SampleTime, f64)]) -> Option<f64> {
    let target = reference.epoch_millis();
    let mut best: Option<(f64, f64)> = None;
    for (time, value) in series {
        if !value.is_finite() {
            continue;
        }
        let dist = (time.epoch_millis() - target).abs();
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, *value));
        }
    }
    best.map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(points: &[(f64, f64)]) -> TimeSeries {
        TimeSeries::from_points(points.iter().map(|&(t, v)| (SampleTime::Relative(t), v)))
    }

    #[test]
    fn test_nearest_prefers_smaller_distance() {
        let s = rel(&[(0.0, 1.0), (10.0, 2.0), (20.0, 3.0)]);
        assert_eq!(s.nearest_at(&SampleTime::Relative(14.0)), Some(2.0));
        assert_eq!(s.nearest_at(&SampleTime::Relative(16.0)), Some(3.0));
        assert_eq!(s.nearest_at(&SampleTime::Relative(-5.0)), Some(1.0));
        assert_eq!(s.nearest_at(&SampleTime::Relative(99.0)), Some(3.0));
    }

    #[test]
    fn test_nearest_on_empty_is_none() {
        assert_eq!(TimeSeries::default().nearest(0.0), None);
        assert_eq!(nearest_value(&SampleTime::Relative(1.0), &[]), None);
    }

    #[test]
    fn test_ties_resolve_to_first_encountered() {
        let s = rel(&[(0.0, 1.0), (10.0, 2.0)]);
        assert_eq!(s.nearest(5_000.0), Some(1.0));

        let dup = rel(&[(10.0, 7.0), (10.0, 8.0), (0.0, 1.0)]);
        assert_eq!(dup.nearest(12_000.0), Some(7.0));
        assert_eq!(dup.nearest(10_000.0), Some(7.0));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let s = rel(&[(20.0, 3.0), (0.0, 1.0), (10.0, 2.0)]);
        assert_eq!(s.values(), vec![1.0, 2.0, 3.0]);
        assert_eq!(s.nearest(14_000.0), Some(2.0));
    }

    #[test]
    fn test_linear_lookup_matches_contract() {
        let series = [
            (SampleTime::Relative(0.0), 1.0),
            (SampleTime::Relative(20.0), 3.0),
            (SampleTime::Relative(10.0), 2.0),
        ];
        assert_eq!(nearest_value(&SampleTime::Relative(14.0), &series), Some(2.0));
    }

    #[test]
    fn test_absolute_and_string_times_share_axis() {
        let base = SampleTime::parse("2024-05-01T12:00:00Z").expect("time");
        let later = SampleTime::parse("2024-05-01 12:00:10").expect("time");
        let s = TimeSeries::from_points([(base, 1.0), (later, 2.0)]);
        let query = SampleTime::parse("2024-05-01T12:00:07Z").expect("time");
        assert_eq!(s.nearest_at(&query), Some(2.0));
    }

    #[test]
    fn test_align_matches_per_point_lookup() {
        let a = rel(&[(0.0, 0.0), (1.0, 1.0), (2.5, 2.0), (4.0, 3.0), (9.0, 4.0)]);
        let b = rel(&[(0.4, 10.0), (2.0, 20.0), (3.0, 30.0), (3.5, 35.0), (8.0, 80.0)]);
        let aligned = a.align(&b);
        assert_eq!(aligned.len(), a.len());
        for row in aligned {
            assert_eq!(Some(row.other), b.nearest(row.t), "mismatch at t={}", row.t);
        }
    }

    #[test]
    fn test_align_skips_duplicate_timestamps() {
        let a = rel(&[(0.0, 0.0), (4.9, 1.0), (5.0, 2.0), (5.9, 3.0), (7.0, 4.0)]);
        let b = rel(&[(0.0, 1.0), (5.0, 2.0), (5.0, 3.0), (6.0, 4.0), (6.0, 5.0), (6.0, 6.0), (9.0, 7.0)]);
        let aligned = a.align(&b);
        for row in &aligned {
            assert_eq!(Some(row.other), b.nearest(row.t), "mismatch at t={}", row.t);
        }
        // 5.9 s is closer to the 6 s run than the 5 s run; first of the run wins
        assert_eq!(aligned[3].other, 4.0);
        assert_eq!(aligned[2].other, 2.0);
    }

    #[test]
    fn test_non_finite_dropped_and_window() {
        let s = rel(&[(0.0, 1.0), (1.0, f64::NAN), (2.0, 3.0), (3.0, 4.0)]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.window(1_000.0, 3_000.0).len(), 1);
        assert_eq!(s.duration_min(), Some(0.05));
    }
}
