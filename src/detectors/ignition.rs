//! Ignition timing and knock detectors

use super::thresholds as th;
use super::{above, below, need, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::stats;
use crate::types::{Finding, FindingLevel};

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "ignition.cruise_timing",
        subject: Subject::Ignition,
        requires: &[params::TIMING_ADVANCE, params::VEHICLE_SPEED],
        min_samples: 60,
        run: cruise_timing,
    },
    Detector {
        id: "ignition.knock_retard",
        subject: Subject::Ignition,
        requires: &[params::KNOCK_RETARD],
        min_samples: 30,
        run: knock_retard,
    },
    Detector {
        id: "ignition.idle_timing_stability",
        subject: Subject::Ignition,
        requires: &[params::TIMING_ADVANCE, params::VEHICLE_SPEED, params::ENGINE_RPM],
        min_samples: 60,
        run: idle_timing_stability,
    },
    Detector {
        id: "ignition.timing_pulls",
        subject: Subject::Ignition,
        requires: &[params::TIMING_ADVANCE],
        min_samples: 100,
        run: timing_pulls,
    },
];

fn cruise_timing(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let cruise = data.values_when(params::TIMING_ADVANCE, params::VEHICLE_SPEED, |v| {
        (th::CRUISE_SPEED_MIN_KMH..=th::CRUISE_SPEED_MAX_KMH).contains(&v)
    });
    if cruise.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let mean = need(stats::mean(&cruise), "cruise timing")?;
    Ok(below(mean, th::CRUISE_TIMING_WARN_DEG, th::CRUISE_TIMING_FAIL_DEG)
        .map(|level| {
            data.finding(level, Subject::Ignition, format!("Retarded timing at cruise: {mean:.1}° BTDC"))
                .detail("The ECU is pulling timing at light load; suspect knock, poor fuel or carbon build-up")
                .parameter(params::TIMING_ADVANCE)
        })
        .into_iter()
        .collect())
}

fn knock_retard(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let peak = need(stats::max(&data.values(params::KNOCK_RETARD)), "peak knock retard")?;
    Ok(above(peak, th::KNOCK_RETARD_WARN_DEG, th::KNOCK_RETARD_FAIL_DEG)
        .map(|level| {
            data.finding(level, Subject::Ignition, format!("Knock retard up to {peak:.1}°"))
                .detail("Detonation detected; use the specified octane and check for overheating")
                .parameter(params::KNOCK_RETARD)
        })
        .into_iter()
        .collect())
}

fn idle_timing_stability(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let idle = data.idle_values(params::TIMING_ADVANCE);
    if idle.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let sd = need(stats::stddev(&idle), "idle timing deviation")?;
    if sd <= th::IDLE_TIMING_STDDEV_WARN_DEG {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Warn,
            Subject::Ignition,
            format!("Idle timing unstable: ±{sd:.1}°"),
        )
        .detail("The ECU is fighting to hold idle; check for misfire or vacuum leaks")
        .parameter(params::TIMING_ADVANCE)])
}

/// Sudden drops well below the recent average
fn timing_pulls(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let timing = data.values(params::TIMING_ADVANCE);
    let smoothed = stats::moving_average(&timing, 5);
    let pulls = timing
        .iter()
        .skip(1)
        .zip(&smoothed)
        .filter(|(v, avg)| **avg - **v > th::TIMING_PULL_DEG)
        .count();

    let level = if pulls >= th::TIMING_PULLS_FAIL {
        FindingLevel::Fail
    } else if pulls >= th::TIMING_PULLS_WARN {
        FindingLevel::Warn
    } else {
        return Ok(Vec::new());
    };
    Ok(vec![data
        .finding(level, Subject::Ignition, format!("{pulls} abrupt timing pulls"))
        .parameter(params::TIMING_ADVANCE)])
}
