//! Engine detectors: RPM range, idle quality, load, stalls, oil

use super::thresholds as th;
use super::{above, below, need, share, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::stats;
use crate::types::{Finding, FindingLevel};

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "engine.over_rev",
        subject: Subject::Engine,
        requires: &[params::ENGINE_RPM],
        min_samples: 30,
        run: over_rev,
    },
    Detector {
        id: "engine.rough_idle",
        subject: Subject::Engine,
        requires: &[params::ENGINE_RPM, params::VEHICLE_SPEED],
        min_samples: 60,
        run: rough_idle,
    },
    Detector {
        id: "engine.idle_speed",
        subject: Subject::Engine,
        requires: &[params::ENGINE_RPM, params::VEHICLE_SPEED],
        min_samples: 60,
        run: idle_speed,
    },
    Detector {
        id: "engine.sustained_load",
        subject: Subject::Engine,
        requires: &[params::ENGINE_LOAD],
        min_samples: 60,
        run: sustained_load,
    },
    Detector {
        id: "engine.stalls",
        subject: Subject::Engine,
        requires: &[params::ENGINE_RPM],
        min_samples: 30,
        run: stalls,
    },
    Detector {
        id: "engine.oil_pressure",
        subject: Subject::Engine,
        requires: &[params::OIL_PRESSURE, params::ENGINE_RPM],
        min_samples: 30,
        run: oil_pressure,
    },
    Detector {
        id: "engine.oil_temperature",
        subject: Subject::Engine,
        requires: &[params::OIL_TEMP],
        min_samples: 30,
        run: oil_temperature,
    },
];

fn over_rev(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let rpm = data.values(params::ENGINE_RPM);
    let peak = need(stats::max(&rpm), "peak RPM")?;
    Ok(above(peak, th::RPM_MAX_WARN, th::RPM_MAX_FAIL)
        .map(|level| {
            data.finding(level, Subject::Engine, format!("Engine speed reached {peak:.0} rpm"))
                .detail("Repeated operation near the rev limiter accelerates valvetrain and bearing wear")
                .parameter(params::ENGINE_RPM)
        })
        .into_iter()
        .collect())
}

fn rough_idle(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let idle = data.idle_values(params::ENGINE_RPM);
    if idle.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let sd = need(stats::stddev(&idle), "idle RPM deviation")?;
    Ok(above(sd, th::IDLE_RPM_STDDEV_WARN, th::IDLE_RPM_STDDEV_FAIL)
        .map(|level| {
            data.finding(level, Subject::Engine, format!("Rough idle: RPM varies by ±{sd:.0} rpm at idle"))
                .detail("Check for misfire, vacuum leaks, dirty throttle body or worn engine mounts")
                .parameter(params::ENGINE_RPM)
        })
        .into_iter()
        .collect())
}

fn idle_speed(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let idle = data.idle_values(params::ENGINE_RPM);
    if idle.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let mean = need(stats::mean(&idle), "mean idle RPM")?;

    if let Some(level) = below(mean, th::IDLE_RPM_LOW_WARN, th::IDLE_RPM_LOW_FAIL) {
        return Ok(vec![data
            .finding(level, Subject::Engine, format!("Low idle speed: {mean:.0} rpm"))
            .detail("Engine may stall when loads such as A/C or power steering engage")
            .parameter(params::ENGINE_RPM)]);
    }
    if mean > th::IDLE_RPM_HIGH_WARN {
        return Ok(vec![data
            .finding(FindingLevel::Warn, Subject::Engine, format!("High idle speed: {mean:.0} rpm"))
            .detail("Possible vacuum leak or idle air control fault")
            .parameter(params::ENGINE_RPM)]);
    }
    Ok(Vec::new())
}

fn sustained_load(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let load = data.values(params::ENGINE_LOAD);
    let heavy = share(&load, |v| v > th::HEAVY_LOAD_PCT);

    let level = if heavy > th::HEAVY_LOAD_SHARE_WARN {
        FindingLevel::Warn
    } else if heavy > th::HEAVY_LOAD_SHARE_INFO {
        FindingLevel::Info
    } else {
        return Ok(Vec::new());
    };
    Ok(vec![data
        .finding(
            level,
            Subject::Engine,
            format!("Engine load above {:.0}% for {:.0}% of the trip", th::HEAVY_LOAD_PCT, heavy * 100.0),
        )
        .parameter(params::ENGINE_LOAD)])
}

/// Falls from running RPM to near zero that are followed by a restart
fn stalls(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let rpm = data.values(params::ENGINE_RPM);
    let mut count = 0;
    let mut stalled = false;
    for w in rpm.windows(2) {
        if w[0] >= th::RUNNING_RPM && w[1] < th::STALL_RPM {
            stalled = true;
        } else if stalled && w[1] >= th::RUNNING_RPM {
            count += 1;
            stalled = false;
        }
    }

    let level = if count >= th::STALLS_FAIL {
        FindingLevel::Fail
    } else if count >= th::STALLS_WARN {
        FindingLevel::Warn
    } else {
        return Ok(Vec::new());
    };
    Ok(vec![data
        .finding(level, Subject::Engine, format!("{count} engine stall(s) followed by a restart"))
        .detail("Inspect idle air control, throttle body and fuel delivery")
        .parameter(params::ENGINE_RPM)])
}

fn oil_pressure(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let loaded = data.values_when(params::OIL_PRESSURE, params::ENGINE_RPM, |rpm| rpm >= th::OIL_PRESSURE_RPM);
    if loaded.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let p10 = need(stats::percentile(&loaded, 10.0), "oil pressure p10")?;
    Ok(below(p10, th::OIL_PRESSURE_WARN_KPA, th::OIL_PRESSURE_FAIL_KPA)
        .map(|level| {
            data.finding(level, Subject::Engine, format!("Low oil pressure above 1500 rpm: {p10:.0} kPa"))
                .detail("Check oil level and grade; worn bearings or a weak pump reduce pressure")
                .parameter(params::OIL_PRESSURE)
        })
        .into_iter()
        .collect())
}

fn oil_temperature(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let temps = data.values(params::OIL_TEMP);
    let peak = need(stats::max(&temps), "peak oil temperature")?;
    Ok(above(peak, th::OIL_TEMP_WARN_C, th::OIL_TEMP_FAIL_C)
        .map(|level| {
            data.finding(level, Subject::Engine, format!("Oil temperature reached {peak:.0}°C"))
                .parameter(params::OIL_TEMP)
        })
        .into_iter()
        .collect())
}
