//! Fuel system detectors: trims, bank balance, closed-loop stability, rail pressure

use super::thresholds as th;
use super::{above, need, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::stats;
use crate::types::{Finding, FindingLevel};

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "fuel.short_term_trim",
        subject: Subject::Fuel,
        requires: &[params::STFT_B1],
        min_samples: 60,
        run: short_term_trim,
    },
    Detector {
        id: "fuel.long_term_trim",
        subject: Subject::Fuel,
        requires: &[params::LTFT_B1],
        min_samples: 60,
        run: long_term_trim,
    },
    Detector {
        id: "fuel.total_trim",
        subject: Subject::Fuel,
        requires: &[params::STFT_B1, params::LTFT_B1],
        min_samples: 60,
        run: total_trim,
    },
    Detector {
        id: "fuel.bank_imbalance",
        subject: Subject::Fuel,
        requires: &[params::LTFT_B1, params::LTFT_B2],
        min_samples: 60,
        run: bank_imbalance,
    },
    Detector {
        id: "fuel.closed_loop_stability",
        subject: Subject::Fuel,
        requires: &[params::STFT_B1],
        min_samples: 100,
        run: closed_loop_stability,
    },
    Detector {
        id: "fuel.lean_under_load",
        subject: Subject::Fuel,
        requires: &[params::STFT_B1, params::ENGINE_LOAD],
        min_samples: 60,
        run: lean_under_load,
    },
    Detector {
        id: "fuel.rail_pressure_sag",
        subject: Subject::Fuel,
        requires: &[params::FUEL_RAIL_PRESSURE],
        min_samples: 60,
        run: rail_pressure_sag,
    },
];

/// Lean (positive trim) or rich (negative trim)
const fn mixture(trim: f64) -> &'static str {
    if trim > 0.0 {
        "lean"
    } else {
        "rich"
    }
}

fn trim_finding(
    data: &TripData<'_>,
    parameter: &'static str,
    label: &str,
    warn: f64,
    fail: f64,
) -> Result<Vec<Finding>, DetectorError> {
    let trim = need(stats::mean(&data.values(parameter)), "mean fuel trim")?;
    Ok(above(trim.abs(), warn, fail)
        .map(|level| {
            let condition = mixture(trim);
            data.finding(level, Subject::Fuel, format!("{label} {trim:+.1}%: engine running {condition}"))
                .detail(if condition == "lean" {
                    "Look for vacuum leaks, a weak fuel pump, clogged injectors or a dirty MAF sensor"
                } else {
                    "Look for leaking injectors, excessive fuel pressure or a saturated EVAP canister"
                })
                .parameter(parameter)
        })
        .into_iter()
        .collect())
}

fn short_term_trim(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    trim_finding(data, params::STFT_B1, "Short-term fuel trim", th::TRIM_WARN_PCT, th::TRIM_FAIL_PCT)
}

fn long_term_trim(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    trim_finding(data, params::LTFT_B1, "Long-term fuel trim", th::TRIM_WARN_PCT, th::TRIM_FAIL_PCT)
}

fn total_trim(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let combined: Vec<f64> = data
        .align(params::STFT_B1, params::LTFT_B1)
        .iter()
        .map(|a| a.primary + a.other)
        .collect();
    let trim = need(stats::mean(&combined), "mean total trim")?;
    Ok(above(trim.abs(), th::TOTAL_TRIM_WARN_PCT, th::TOTAL_TRIM_FAIL_PCT)
        .map(|level| {
            data.finding(
                level,
                Subject::Fuel,
                format!("Total fuel correction {trim:+.1}%: mixture persistently {}", mixture(trim)),
            )
            .parameter(params::LTFT_B1)
        })
        .into_iter()
        .collect())
}

fn bank_imbalance(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let b1 = need(stats::mean(&data.values(params::LTFT_B1)), "LTFT bank 1")?;
    let b2 = need(stats::mean(&data.values(params::LTFT_B2)), "LTFT bank 2")?;
    let delta = (b1 - b2).abs();
    Ok(above(delta, th::BANK_IMBALANCE_WARN_PCT, th::BANK_IMBALANCE_FAIL_PCT)
        .map(|level| {
            data.finding(
                level,
                Subject::Fuel,
                format!("Fuel trim differs between banks by {delta:.1}% (B1 {b1:+.1}%, B2 {b2:+.1}%)"),
            )
            .detail("A bank-specific fault: intake leak, injector or exhaust leak ahead of one O2 sensor")
            .parameter(params::LTFT_B2)
        })
        .into_iter()
        .collect())
}

fn closed_loop_stability(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let sd = need(stats::stddev(&data.values(params::STFT_B1)), "STFT deviation")?;
    if sd <= th::STFT_STDDEV_WARN_PCT {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Warn,
            Subject::Fuel,
            format!("Short-term fuel trim unstable: ±{sd:.1}%"),
        )
        .detail("Erratic closed-loop control; suspect a failing O2 sensor or intermittent air leak")
        .parameter(params::STFT_B1)])
}

fn lean_under_load(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let loaded = data.values_when(params::STFT_B1, params::ENGINE_LOAD, |load| load > th::HIGH_LOAD_PCT);
    if loaded.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let trim = need(stats::mean(&loaded), "STFT under load")?;
    if trim <= th::LOAD_STFT_WARN_PCT {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Warn,
            Subject::Fuel,
            format!("Lean under heavy load: short-term trim {trim:+.1}% above {:.0}% load", th::HIGH_LOAD_PCT),
        )
        .detail("Fuel delivery cannot keep up with demand; check pump, filter and regulator")
        .parameter(params::STFT_B1)])
}

fn rail_pressure_sag(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let rail = data.values(params::FUEL_RAIL_PRESSURE);
    let median = need(stats::median(&rail), "median rail pressure")?;
    if median <= 0.0 {
        return Ok(Vec::new());
    }
    let low = need(stats::min(&rail), "minimum rail pressure")?;
    let ratio = low / median;
    let level = if ratio < th::RAIL_SAG_FAIL_RATIO {
        FindingLevel::Fail
    } else if ratio < th::RAIL_SAG_WARN_RATIO {
        FindingLevel::Warn
    } else {
        return Ok(Vec::new());
    };
    Ok(vec![data
        .finding(
            level,
            Subject::Fuel,
            format!("Fuel rail pressure dropped to {:.0}% of normal ({low:.0} vs {median:.0} kPa)", ratio * 100.0),
        )
        .parameter(params::FUEL_RAIL_PRESSURE)])
}

#[cfg(test)]
mod tests {
    use super::super::testing::TripBuilder;
    use super::*;

    #[test]
    fn test_lean_trim_escalates() {
        let trip = TripBuilder::new().constant(params::LTFT_B1, 100, 12.0).build();
        let findings = long_term_trim(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Warn);
        assert!(findings[0].message.contains("lean"));

        let trip = TripBuilder::new().constant(params::LTFT_B1, 100, -22.0).build();
        let findings = long_term_trim(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Fail);
        assert!(findings[0].message.contains("rich"));
    }

    #[test]
    fn test_normal_trim_is_quiet() {
        let trip = TripBuilder::new()
            .series(params::STFT_B1, 100, |i| if i % 2 == 0 { -3.0 } else { 3.0 })
            .constant(params::LTFT_B1, 100, 2.0)
            .build();
        let data = TripData::new(&trip, None);
        assert!(short_term_trim(&data).expect("run").is_empty());
        assert!(total_trim(&data).expect("run").is_empty());
        assert!(closed_loop_stability(&data).expect("run").is_empty());
    }

    #[test]
    fn test_bank_imbalance() {
        let trip = TripBuilder::new()
            .constant(params::LTFT_B1, 100, 10.0)
            .constant(params::LTFT_B2, 100, -1.0)
            .build();
        let findings = bank_imbalance(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Warn);
    }

    #[test]
    fn test_rail_sag() {
        let trip = TripBuilder::new()
            .series(params::FUEL_RAIL_PRESSURE, 100, |i| if i == 40 { 150.0 } else { 350.0 })
            .build();
        let findings = rail_pressure_sag(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Fail);
    }
}
