//! Cooling system detectors: overheating, temperature cycling, warm-up, thermostat

use super::thresholds as th;
use super::{above, need, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::stats;
use crate::trips::WARMUP_TARGET_C;
use crate::types::{Finding, FindingLevel};

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "cooling.overheat",
        subject: Subject::Cooling,
        requires: &[params::COOLANT_TEMP],
        min_samples: 30,
        run: overheat,
    },
    Detector {
        id: "cooling.peak_temperature",
        subject: Subject::Cooling,
        requires: &[params::COOLANT_TEMP],
        min_samples: 30,
        run: peak_temperature,
    },
    Detector {
        id: "cooling.temperature_cycling",
        subject: Subject::Cooling,
        requires: &[params::COOLANT_TEMP],
        min_samples: 100,
        run: temperature_cycling,
    },
    Detector {
        id: "cooling.slow_warmup",
        subject: Subject::Cooling,
        requires: &[params::COOLANT_TEMP],
        min_samples: 60,
        run: slow_warmup,
    },
    Detector {
        id: "cooling.thermostat_stuck_open",
        subject: Subject::Cooling,
        requires: &[params::COOLANT_TEMP],
        min_samples: 120,
        run: thermostat_stuck_open,
    },
];

fn overheat(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let coolant = data.values(params::COOLANT_TEMP);
    let mean = need(stats::mean(&coolant), "mean coolant temperature")?;
    Ok(above(mean, th::COOLANT_MEAN_WARN_C, th::COOLANT_MEAN_FAIL_C)
        .map(|level| {
            let message = match level {
                FindingLevel::Fail => format!("Engine overheating: average coolant {mean:.1}°C"),
                _ => format!("Coolant running hot: average {mean:.1}°C"),
            };
            data.finding(level, Subject::Cooling, message)
                .detail("Check coolant level, radiator airflow, fan operation and water pump")
                .parameter(params::COOLANT_TEMP)
        })
        .into_iter()
        .collect())
}

fn peak_temperature(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let coolant = data.values(params::COOLANT_TEMP);
    let peak = need(stats::max(&coolant), "peak coolant temperature")?;
    Ok(above(peak, th::COOLANT_PEAK_WARN_C, th::COOLANT_PEAK_FAIL_C)
        .map(|level| {
            data.finding(level, Subject::Cooling, format!("Coolant peaked at {peak:.1}°C"))
                .parameter(params::COOLANT_TEMP)
        })
        .into_iter()
        .collect())
}

/// Large swings once the engine is warm point at a sticking thermostat or
/// intermittent fan.
fn temperature_cycling(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let warm: Vec<f64> = data
        .values(params::COOLANT_TEMP)
        .into_iter()
        .skip_while(|v| *v < th::WARM_ENGINE_C)
        .collect();
    if warm.len() < 30 {
        return Ok(Vec::new());
    }
    let sd = need(stats::stddev(&warm), "warm coolant deviation")?;
    if sd <= th::COOLANT_CYCLING_STDDEV_C {
        return Ok(Vec::new());
    }
    let range = need(stats::range(&warm), "warm coolant range")?;
    Ok(vec![data
        .finding(
            FindingLevel::Warn,
            Subject::Cooling,
            format!("Coolant temperature cycling: ±{sd:.1}°C over a {range:.0}°C range once warm"),
        )
        .detail("Typical of a sticking thermostat, air in the system or an intermittent cooling fan")
        .parameter(params::COOLANT_TEMP)])
}

/// Minutes to 80 °C from a cold start, preferring the trip summary
fn warmup_minutes(data: &TripData<'_>) -> Option<f64> {
    if let Some(m) = data.summary.and_then(|s| s.warmup_to_80c_min) {
        return Some(m);
    }
    let series = data.series(params::COOLANT_TEMP);
    let start = series.start()?;
    series
        .points()
        .iter()
        .find(|p| p.value >= WARMUP_TARGET_C)
        .map(|p| (p.t - start) / 60_000.0)
}

fn slow_warmup(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let series = data.series(params::COOLANT_TEMP);
    let Some(first) = series.points().first() else {
        return Ok(Vec::new());
    };
    if first.value >= th::COLD_START_C {
        return Ok(Vec::new());
    }
    let Some(minutes) = warmup_minutes(data) else {
        return Ok(Vec::new());
    };
    Ok(above(minutes, th::WARMUP_SLOW_WARN_MIN, th::WARMUP_SLOW_FAIL_MIN)
        .map(|level| {
            data.finding(level, Subject::Cooling, format!("Slow warm-up: {minutes:.1} min to reach 80°C"))
                .detail("Thermostat may be opening early or a coolant temperature sensor may read low")
                .parameter(params::COOLANT_TEMP)
        })
        .into_iter()
        .collect())
}

fn thermostat_stuck_open(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let duration = data
        .summary
        .and_then(|s| s.duration_min)
        .or_else(|| data.series(params::COOLANT_TEMP).duration_min());
    let Some(duration) = duration else {
        return Ok(Vec::new());
    };
    if duration < th::THERMOSTAT_MIN_TRIP_MIN {
        return Ok(Vec::new());
    }
    let peak = data
        .summary
        .and_then(|s| s.coolant_max)
        .or_else(|| stats::max(&data.values(params::COOLANT_TEMP)));
    let peak = need(peak, "peak coolant temperature")?;
    if peak >= th::THERMOSTAT_MAX_COOLANT_C {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Warn,
            Subject::Cooling,
            format!("Engine never warmed up: coolant peaked at {peak:.0}°C over {duration:.0} min"),
        )
        .detail("Thermostat likely stuck open; fuel economy and emissions suffer")
        .parameter(params::COOLANT_TEMP)])
}

#[cfg(test)]
mod tests {
    use super::super::testing::TripBuilder;
    use super::*;
    use crate::types::TripSummary;

    fn oscillating(low: f64, high: f64) -> crate::trips::Trip {
        TripBuilder::new()
            .series(params::COOLANT_TEMP, 1_000, |i| if i % 2 == 0 { low } else { high })
            .build()
    }

    #[test]
    fn test_overheat_ladder() {
        for (temp, expected) in [
            (90.0, None),
            (96.0, Some(FindingLevel::Warn)),
            (105.0, Some(FindingLevel::Warn)),
            (110.0, Some(FindingLevel::Fail)),
        ] {
            let trip = TripBuilder::new().constant(params::COOLANT_TEMP, 60, temp).build();
            let findings = overheat(&TripData::new(&trip, None)).expect("run");
            assert_eq!(findings.first().map(|f| f.level), expected, "coolant {temp}");
        }
    }

    #[test]
    fn test_cycling_ignores_narrow_band() {
        let trip = oscillating(94.0, 96.0);
        assert!(temperature_cycling(&TripData::new(&trip, None)).expect("run").is_empty());
    }

    #[test]
    fn test_cycling_flags_wide_swings() {
        let trip = oscillating(80.0, 105.0);
        let findings = temperature_cycling(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].level, FindingLevel::Warn);
    }

    #[test]
    fn test_cycling_skips_warm_up_phase() {
        // Steady climb from cold, then stable: the climb alone must not count
        let trip = TripBuilder::new()
            .series(params::COOLANT_TEMP, 600, |i| if i < 300 { 20.0 + f64::from(i as u32) * 0.25 } else { 92.0 })
            .build();
        assert!(temperature_cycling(&TripData::new(&trip, None)).expect("run").is_empty());
    }

    #[test]
    fn test_slow_warmup_uses_summary() {
        let trip = TripBuilder::new().series(params::COOLANT_TEMP, 120, |_| 30.0).build();
        let summary = TripSummary {
            warmup_to_80c_min: Some(30.0),
            ..TripSummary::empty("trip")
        };
        let findings = slow_warmup(&TripData::new(&trip, Some(&summary))).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Fail);
    }

    #[test]
    fn test_thermostat_stuck_open() {
        let trip = TripBuilder::new().constant(params::COOLANT_TEMP, 1_500, 65.0).build();
        let findings = thermostat_stuck_open(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings.len(), 1);

        let short = TripBuilder::new().constant(params::COOLANT_TEMP, 600, 65.0).build();
        assert!(thermostat_stuck_open(&TripData::new(&short, None)).expect("run").is_empty());
    }
}
