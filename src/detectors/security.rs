//! Data integrity detectors.
//!
//! Look at the log itself rather than the vehicle: time bases that run
//! backwards, conflicting duplicate frames and physically impossible jumps
//! point at a corrupted, spliced or injected log.

use std::collections::HashMap;

use super::thresholds as th;
use super::{Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::types::{Finding, FindingLevel};

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "integrity.time_regression",
        subject: Subject::Security,
        requires: &[],
        min_samples: 0,
        run: time_regression,
    },
    Detector {
        id: "integrity.conflicting_duplicates",
        subject: Subject::Security,
        requires: &[],
        min_samples: 0,
        run: conflicting_duplicates,
    },
    Detector {
        id: "integrity.impossible_speed_steps",
        subject: Subject::Security,
        requires: &[params::VEHICLE_SPEED],
        min_samples: 60,
        run: impossible_speed_steps,
    },
    Detector {
        id: "integrity.mixed_time_bases",
        subject: Subject::Security,
        requires: &[],
        min_samples: 0,
        run: mixed_time_bases,
    },
    Detector {
        id: "integrity.logging_gaps",
        subject: Subject::Security,
        requires: &[],
        min_samples: 0,
        run: logging_gaps,
    },
];

/// Steps where a parameter's timestamp goes backwards in log order
#[allow(clippy::cast_precision_loss)]
fn time_regression(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let mut last: HashMap<&str, f64> = HashMap::new();
    let mut backward = 0usize;
    for s in data.samples {
        let t = s.time.epoch_millis();
        if let Some(prev) = last.insert(s.parameter_id.as_str(), t) {
            if t < prev {
                backward += 1;
            }
        }
    }
    if backward == 0 {
        return Ok(Vec::new());
    }

    let ratio = backward as f64 / data.samples.len() as f64;
    let level = if ratio > th::BACKWARD_SHARE_WARN {
        FindingLevel::Warn
    } else {
        FindingLevel::Info
    };
    Ok(vec![data
        .finding(level, Subject::Security, format!("{backward} readings are out of time order"))
        .detail("Log may be spliced from several recordings or re-ordered; readings were sorted before analysis")])
}

/// Two different values for one parameter at one instant
fn conflicting_duplicates(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let mut seen: HashMap<(&str, u64), f64> = HashMap::new();
    let mut conflicts = 0usize;
    for s in data.samples {
        let Some(v) = s.finite_value() else { continue };
        let key = (s.parameter_id.as_str(), s.time.epoch_millis().to_bits());
        match seen.get(&key) {
            Some(prev) if (prev - v).abs() > f64::EPSILON => conflicts += 1,
            Some(_) => {}
            None => {
                seen.insert(key, v);
            }
        }
    }
    if conflicts == 0 {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Warn,
            Subject::Security,
            format!("{conflicts} conflicting readings share a timestamp"),
        )
        .detail("Duplicate frames with different values suggest replayed or injected bus traffic")])
}

fn impossible_speed_steps(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let steps = data
        .series(params::VEHICLE_SPEED)
        .points()
        .windows(2)
        .filter(|w| {
            let dt_s = (w[1].t - w[0].t) / 1000.0;
            dt_s > 0.0 && dt_s <= 1.5 && (w[1].value - w[0].value).abs() / dt_s > th::IMPOSSIBLE_SPEED_STEP_KMH
        })
        .count();
    if steps == 0 {
        return Ok(Vec::new());
    }
    let level = if steps >= th::IMPOSSIBLE_STEPS_FAIL {
        FindingLevel::Fail
    } else {
        FindingLevel::Warn
    };
    Ok(vec![data
        .finding(
            level,
            Subject::Security,
            format!("{steps} physically impossible speed jumps"),
        )
        .detail("Wheel-speed data is corrupted or spoofed; speed-based findings for this trip are unreliable")
        .parameter(params::VEHICLE_SPEED)])
}

fn mixed_time_bases(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let absolute = data.samples.iter().filter(|s| s.time.is_absolute()).count();
    if absolute == 0 || absolute == data.samples.len() {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Info,
            Subject::Security,
            "Trip mixes relative offsets and wall-clock timestamps",
        )
        .detail(format!(
            "{absolute} of {} readings are absolute; cross-parameter timing may be misaligned",
            data.samples.len()
        ))])
}

fn logging_gaps(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let mut times: Vec<f64> = data
        .samples
        .iter()
        .map(|s| s.time.epoch_millis())
        .filter(|t| t.is_finite())
        .collect();
    times.sort_by(f64::total_cmp);

    let gaps: Vec<f64> = times
        .windows(2)
        .map(|w| (w[1] - w[0]) / 1000.0)
        .filter(|gap| *gap > th::LOGGING_GAP_S)
        .collect();
    let Some(longest) = gaps.iter().copied().max_by(f64::total_cmp) else {
        return Ok(Vec::new());
    };
    Ok(vec![data.finding(
        FindingLevel::Info,
        Subject::Security,
        format!("{} logging interruption(s), longest {:.1} min", gaps.len(), longest / 60.0),
    )])
}
