//! Driving behaviour detectors

use super::thresholds as th;
use super::{share, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::series::Point;
use crate::stats;
use crate::types::{Finding, FindingLevel};

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "driving.harsh_acceleration",
        subject: Subject::Driving,
        requires: &[params::VEHICLE_SPEED],
        min_samples: 60,
        run: harsh_acceleration,
    },
    Detector {
        id: "driving.harsh_braking",
        subject: Subject::Driving,
        requires: &[params::VEHICLE_SPEED],
        min_samples: 60,
        run: harsh_braking,
    },
    Detector {
        id: "driving.excessive_idling",
        subject: Subject::Driving,
        requires: &[params::ENGINE_RPM, params::VEHICLE_SPEED],
        min_samples: 60,
        run: excessive_idling,
    },
    Detector {
        id: "driving.cold_engine_revving",
        subject: Subject::Driving,
        requires: &[params::ENGINE_RPM, params::COOLANT_TEMP],
        min_samples: 60,
        run: cold_engine_revving,
    },
    Detector {
        id: "driving.top_speed",
        subject: Subject::Driving,
        requires: &[params::VEHICLE_SPEED],
        min_samples: 30,
        run: top_speed,
    },
    Detector {
        id: "driving.short_trip",
        subject: Subject::Driving,
        requires: &[params::COOLANT_TEMP],
        min_samples: 10,
        run: short_trip,
    },
];

/// Speed change rates (km/h per second) between readings at most 2 s apart
fn speed_rates(points: &[Point]) -> Vec<f64> {
    points
        .windows(2)
        .filter_map(|w| {
            let dt_s = (w[1].t - w[0].t) / 1000.0;
            (dt_s > 0.0 && dt_s <= 2.0).then(|| (w[1].value - w[0].value) / dt_s)
        })
        .collect()
}

fn harsh_events(data: &TripData<'_>, count: usize, what: &str) -> Vec<Finding> {
    let level = if count >= th::HARSH_EVENTS_WARN {
        FindingLevel::Warn
    } else if count >= th::HARSH_EVENTS_INFO {
        FindingLevel::Info
    } else {
        return Vec::new();
    };
    vec![data
        .finding(level, Subject::Driving, format!("{count} harsh {what} events"))
        .detail("Aggressive driving accelerates brake, tyre and drivetrain wear")
        .parameter(params::VEHICLE_SPEED)]
}

fn harsh_acceleration(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let rates = speed_rates(data.series(params::VEHICLE_SPEED).points());
    let count = rates.iter().filter(|r| **r > th::HARSH_ACCEL_KMH_S).count();
    Ok(harsh_events(data, count, "acceleration"))
}

fn harsh_braking(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let rates = speed_rates(data.series(params::VEHICLE_SPEED).points());
    let count = rates.iter().filter(|r| **r < -th::HARSH_BRAKE_KMH_S).count();
    Ok(harsh_events(data, count, "braking"))
}

fn excessive_idling(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let running_speed = data.values_when(params::VEHICLE_SPEED, params::ENGINE_RPM, |rpm| rpm > th::RUNNING_RPM);
    if running_speed.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let idle = share(&running_speed, |v| v <= th::STATIONARY_KMH);
    let level = if idle > th::IDLING_SHARE_WARN {
        FindingLevel::Warn
    } else if idle > th::IDLING_SHARE_INFO {
        FindingLevel::Info
    } else {
        return Ok(Vec::new());
    };
    Ok(vec![data
        .finding(
            level,
            Subject::Driving,
            format!("Engine idling for {:.0}% of running time", idle * 100.0),
        )
        .detail("Extended idling wastes fuel and promotes carbon and oil dilution")])
}

fn cold_engine_revving(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let revs = data
        .align(params::ENGINE_RPM, params::COOLANT_TEMP)
        .iter()
        .filter(|a| a.primary > th::COLD_REV_RPM && a.other < th::COLD_REV_COOLANT_C)
        .count();
    if revs < th::COLD_REVS_WARN {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Warn,
            Subject::Driving,
            format!("{revs} readings above {:.0} rpm before the engine was warm", th::COLD_REV_RPM),
        )
        .detail("Oil is thick and clearances are wide when cold; high RPM accelerates wear")
        .parameter(params::ENGINE_RPM)])
}

fn top_speed(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let Some(peak) = stats::max(&data.values(params::VEHICLE_SPEED)) else {
        return Ok(Vec::new());
    };
    if peak <= th::SPEED_MAX_WARN_KMH {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(FindingLevel::Info, Subject::Driving, format!("Top speed {peak:.0} km/h"))
        .parameter(params::VEHICLE_SPEED)])
}

fn short_trip(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let coolant = data.series(params::COOLANT_TEMP);
    let duration = data.summary.and_then(|s| s.duration_min).or_else(|| coolant.duration_min());
    let peak = data
        .summary
        .and_then(|s| s.coolant_max)
        .or_else(|| stats::max(&coolant.values()));
    let (Some(duration), Some(peak)) = (duration, peak) else {
        return Ok(Vec::new());
    };
    if duration >= th::SHORT_TRIP_MIN || peak >= th::WARM_ENGINE_C {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Info,
            Subject::Driving,
            format!("Short trip ({duration:.1} min): engine never reached operating temperature"),
        )
        .detail("Frequent short trips let moisture and fuel accumulate in the oil")])
}

#[cfg(test)]
mod tests {
    use super::super::testing::TripBuilder;
    use super::*;

    #[test]
    fn test_harsh_braking_counts() {
        // gentle 10 km/h/s climbs, then four 20 km/h/s braking steps per cycle
        let trip = TripBuilder::new()
            .series(params::VEHICLE_SPEED, 120, |i| match i % 20 {
                0..=9 => (i % 20) as f64 * 10.0,
                10..=14 => 100.0 - ((i % 20) - 9) as f64 * 20.0,
                _ => 0.0,
            })
            .build();
        let data = TripData::new(&trip, None);
        let braking = harsh_braking(&data).expect("run");
        assert_eq!(braking[0].level, FindingLevel::Warn);
        assert!(harsh_acceleration(&data).expect("run").is_empty());
    }

    #[test]
    fn test_excessive_idling() {
        let trip = TripBuilder::new()
            .constant(params::ENGINE_RPM, 100, 800.0)
            .series(params::VEHICLE_SPEED, 100, |i| if i < 60 { 0.0 } else { 50.0 })
            .build();
        let findings = excessive_idling(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Warn);
    }

    #[test]
    fn test_short_trip() {
        let trip = TripBuilder::new().series(params::COOLANT_TEMP, 300, |i| 20.0 + i as f64 * 0.1).build();
        assert_eq!(short_trip(&TripData::new(&trip, None)).expect("run").len(), 1);
    }
}
