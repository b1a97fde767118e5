//! Electrical detectors: charging voltage, battery condition, alternator ripple

use super::thresholds as th;
use super::{above, below, need, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::stats;
use crate::types::Finding;

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "electrical.undercharging",
        subject: Subject::Electrical,
        requires: &[params::CONTROL_MODULE_VOLTAGE, params::ENGINE_RPM],
        min_samples: 30,
        run: undercharging,
    },
    Detector {
        id: "electrical.overcharging",
        subject: Subject::Electrical,
        requires: &[params::CONTROL_MODULE_VOLTAGE, params::ENGINE_RPM],
        min_samples: 30,
        run: overcharging,
    },
    Detector {
        id: "electrical.weak_battery",
        subject: Subject::Electrical,
        requires: &[params::CONTROL_MODULE_VOLTAGE],
        min_samples: 30,
        run: weak_battery,
    },
    Detector {
        id: "electrical.voltage_ripple",
        subject: Subject::Electrical,
        requires: &[params::CONTROL_MODULE_VOLTAGE, params::ENGINE_RPM],
        min_samples: 100,
        run: voltage_ripple,
    },
];

fn running_voltage(data: &TripData<'_>) -> Vec<f64> {
    data.values_when(params::CONTROL_MODULE_VOLTAGE, params::ENGINE_RPM, |rpm| rpm > th::RUNNING_RPM)
}

fn undercharging(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let running = running_voltage(data);
    if running.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let mean = need(stats::mean(&running), "mean running voltage")?;
    Ok(below(mean, th::CHARGING_LOW_WARN_V, th::CHARGING_LOW_FAIL_V)
        .map(|level| {
            data.finding(level, Subject::Electrical, format!("Low charging voltage: {mean:.2} V with engine running"))
                .detail("Alternator output is weak; check belt tension, alternator and battery terminals")
                .parameter(params::CONTROL_MODULE_VOLTAGE)
        })
        .into_iter()
        .collect())
}

fn overcharging(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let running = running_voltage(data);
    if running.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let peak = need(stats::max(&running), "peak running voltage")?;
    Ok(above(peak, th::CHARGING_HIGH_WARN_V, th::CHARGING_HIGH_FAIL_V)
        .map(|level| {
            data.finding(level, Subject::Electrical, format!("Overcharging: voltage peaked at {peak:.2} V"))
                .detail("Voltage regulator fault; sustained overcharge boils the battery and damages electronics")
                .parameter(params::CONTROL_MODULE_VOLTAGE)
        })
        .into_iter()
        .collect())
}

fn weak_battery(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let low = data
        .summary
        .and_then(|s| s.battery_min)
        .or_else(|| stats::min(&data.values(params::CONTROL_MODULE_VOLTAGE)));
    let low = need(low, "minimum voltage")?;
    Ok(below(low, th::BATTERY_MIN_WARN_V, th::BATTERY_MIN_FAIL_V)
        .map(|level| {
            data.finding(level, Subject::Electrical, format!("Battery voltage dipped to {low:.2} V"))
                .detail("Deep cranking dips indicate a weak or sulfated battery")
                .parameter(params::CONTROL_MODULE_VOLTAGE)
        })
        .into_iter()
        .collect())
}

fn voltage_ripple(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let running = running_voltage(data);
    if running.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let sd = need(stats::stddev(&running), "running voltage deviation")?;
    Ok(above(sd, th::RIPPLE_WARN_V, th::RIPPLE_FAIL_V)
        .map(|level| {
            data.finding(level, Subject::Electrical, format!("Unstable charging voltage: ±{sd:.2} V"))
                .detail("Failing alternator diodes or a loose connection")
                .parameter(params::CONTROL_MODULE_VOLTAGE)
        })
        .into_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::testing::TripBuilder;
    use super::*;
    use crate::types::{FindingLevel, TripSummary};

    fn trip(volts: impl Fn(usize) -> f64) -> crate::trips::Trip {
        TripBuilder::new()
            .series(params::CONTROL_MODULE_VOLTAGE, 120, volts)
            .constant(params::ENGINE_RPM, 120, 2_000.0)
            .build()
    }

    #[test]
    fn test_healthy_charging_is_quiet() {
        let t = trip(|_| 14.1);
        let data = TripData::new(&t, None);
        assert!(undercharging(&data).expect("run").is_empty());
        assert!(overcharging(&data).expect("run").is_empty());
        assert!(weak_battery(&data).expect("run").is_empty());
        assert!(voltage_ripple(&data).expect("run").is_empty());
    }

    #[test]
    fn test_undercharging() {
        let t = trip(|_| 12.3);
        let findings = undercharging(&TripData::new(&t, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Fail);
    }

    #[test]
    fn test_weak_battery_prefers_summary() {
        let t = trip(|_| 14.0);
        let summary = TripSummary {
            battery_min: Some(11.0),
            ..TripSummary::empty("trip")
        };
        let findings = weak_battery(&TripData::new(&t, Some(&summary))).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Warn);
    }
}
