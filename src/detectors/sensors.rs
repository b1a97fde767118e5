//! Sensor health detectors: flat lines, implausible readings, dropouts

use std::collections::HashMap;

use super::thresholds as th;
use super::{need, share, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::stats;
use crate::types::{Finding, FindingLevel};

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "sensors.flatline",
        subject: Subject::Sensors,
        requires: &[params::ENGINE_RPM],
        min_samples: 60,
        run: flatline,
    },
    Detector {
        id: "sensors.out_of_range",
        subject: Subject::Sensors,
        requires: &[],
        min_samples: 0,
        run: out_of_range,
    },
    Detector {
        id: "sensors.missing_readings",
        subject: Subject::Sensors,
        requires: &[],
        min_samples: 0,
        run: missing_readings,
    },
    Detector {
        id: "sensors.cold_start_disagreement",
        subject: Subject::Sensors,
        requires: &[params::COOLANT_TEMP, params::INTAKE_AIR_TEMP],
        min_samples: 10,
        run: cold_start_disagreement,
    },
];

/// Parameters that always move while the vehicle is driven
const DYNAMIC_PARAMETERS: &[&str] = &[
    params::VEHICLE_SPEED,
    params::MAF,
    params::ENGINE_LOAD,
    params::THROTTLE_POSITION,
    params::MAP,
    params::O2_B1S1,
    params::TIMING_ADVANCE,
];

/// Engine RPM range that shows the vehicle was actually driven
const DRIVEN_RPM_RANGE: f64 = 500.0;

/// Plausible physical bounds per parameter
const PLAUSIBLE_RANGES: &[(&str, f64, f64)] = &[
    (params::ENGINE_RPM, 0.0, 10_000.0),
    (params::VEHICLE_SPEED, 0.0, 300.0),
    (params::COOLANT_TEMP, -40.0, 150.0),
    (params::INTAKE_AIR_TEMP, -40.0, 100.0),
    (params::OIL_TEMP, -40.0, 180.0),
    (params::MAF, 0.0, 700.0),
    (params::ENGINE_LOAD, 0.0, 100.0),
    (params::THROTTLE_POSITION, 0.0, 100.0),
    (params::CONTROL_MODULE_VOLTAGE, 0.0, 20.0),
    (params::O2_B1S1, 0.0, 1.3),
    (params::O2_B1S2, 0.0, 1.3),
    (params::STFT_B1, -100.0, 100.0),
    (params::LTFT_B1, -100.0, 100.0),
    (params::FUEL_LEVEL, 0.0, 100.0),
];

fn flatline(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let rpm_range = need(stats::range(&data.values(params::ENGINE_RPM)), "RPM range")?;
    if rpm_range < DRIVEN_RPM_RANGE {
        return Ok(Vec::new());
    }

    let mut findings = Vec::new();
    for id in DYNAMIC_PARAMETERS {
        let values = data.values(id);
        if values.len() < th::FLATLINE_MIN_SAMPLES {
            continue;
        }
        let range = need(stats::range(&values), "sensor range")?;
        if range < f64::EPSILON {
            findings.push(
                data.finding(
                    FindingLevel::Warn,
                    Subject::Sensors,
                    format!("{id} stuck at {:.2} while the engine was driven", values[0]),
                )
                .detail("Sensor or its circuit is not reporting live data")
                .parameter(*id),
            );
        }
    }
    Ok(findings)
}

#[allow(clippy::cast_precision_loss)]
fn out_of_range(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let mut findings = Vec::new();
    for (id, lo, hi) in PLAUSIBLE_RANGES {
        let values = data.values(id);
        if values.is_empty() {
            continue;
        }
        let bad = share(&values, |v| v < *lo || v > *hi);
        if bad == 0.0 {
            continue;
        }
        let level = if bad > th::OUT_OF_RANGE_FAIL_SHARE {
            FindingLevel::Fail
        } else {
            FindingLevel::Warn
        };
        let count = (bad * values.len() as f64).round();
        findings.push(
            data.finding(
                level,
                Subject::Sensors,
                format!("{count:.0} implausible {id} readings outside {lo}..{hi}"),
            )
            .detail("Sensor fault, wrong unit in the log header or bus corruption")
            .parameter(*id),
        );
    }
    Ok(findings)
}

#[allow(clippy::cast_precision_loss)]
fn missing_readings(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    // (total, missing) per parameter, in first-appearance order
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for s in data.samples {
        let entry = counts.entry(s.parameter_id.as_str()).or_insert_with(|| {
            order.push(s.parameter_id.as_str());
            (0, 0)
        });
        entry.0 += 1;
        if s.finite_value().is_none() {
            entry.1 += 1;
        }
    }

    let mut findings = Vec::new();
    for id in order {
        let Some(&(total, missing)) = counts.get(id) else {
            continue;
        };
        if total < th::MISSING_MIN_SAMPLES {
            continue;
        }
        let ratio = missing as f64 / total as f64;
        let level = if ratio > th::MISSING_WARN_SHARE {
            FindingLevel::Warn
        } else if ratio > th::MISSING_INFO_SHARE {
            FindingLevel::Info
        } else {
            continue;
        };
        findings.push(
            data.finding(level, Subject::Sensors, format!("{id}: {:.0}% of readings missing", ratio * 100.0))
                .parameter(id),
        );
    }
    Ok(findings)
}

/// After a long soak coolant and intake air should read alike
fn cold_start_disagreement(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let coolant = data.series(params::COOLANT_TEMP);
    let Some(first) = coolant.points().first() else {
        return Ok(Vec::new());
    };
    if first.value >= th::COLD_START_C {
        return Ok(Vec::new());
    }
    let iat = need(data.series(params::INTAKE_AIR_TEMP).nearest(first.t), "intake temperature at start")?;
    let delta = (first.value - iat).abs();
    if delta <= th::COLD_START_SENSOR_DELTA_C {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Info,
            Subject::Sensors,
            format!(
                "Coolant ({:.0}°C) and intake air ({iat:.0}°C) disagree by {delta:.0}°C at a cold start",
                first.value
            ),
        )
        .detail("One of the two temperature sensors may be skewed")
        .parameter(params::COOLANT_TEMP)])
}

#[cfg(test)]
mod tests {
    use super::super::testing::TripBuilder;
    use super::*;
    use crate::types::{Sample, SampleTime};

    #[test]
    fn test_flatline_only_when_driven() {
        let driven = TripBuilder::new()
            .series(params::ENGINE_RPM, 100, |i| 800.0 + (i as f64) * 20.0)
            .constant(params::MAF, 100, 4.2)
            .build();
        let findings = flatline(&TripData::new(&driven, None)).expect("run");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].parameter_id.as_deref(), Some(params::MAF));

        let parked = TripBuilder::new()
            .constant(params::ENGINE_RPM, 100, 800.0)
            .constant(params::MAF, 100, 4.2)
            .build();
        assert!(flatline(&TripData::new(&parked, None)).expect("run").is_empty());
    }

    #[test]
    fn test_out_of_range() {
        let trip = TripBuilder::new()
            .series(params::COOLANT_TEMP, 100, |i| if i < 10 { 250.0 } else { 90.0 })
            .build();
        let findings = out_of_range(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].level, FindingLevel::Fail);
        assert!(findings[0].message.starts_with("10 implausible"));
    }

    #[test]
    fn test_missing_readings() {
        let mut builder = TripBuilder::new().constant(params::MAF, 20, 5.0);
        for i in 0..30 {
            builder = builder.push(Sample::new(SampleTime::Relative(f64::from(i)), params::MAF, None, None, "trip"));
        }
        let findings = missing_readings(&TripData::new(&builder.build(), None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Warn);
    }
}
