//! EVAP system detectors: vapor pressure, purge behaviour

use super::thresholds as th;
use super::{above, need, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::series::Aligned;
use crate::stats;
use crate::types::{Finding, FindingLevel};

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "evap.vapor_pressure",
        subject: Subject::Evap,
        requires: &[params::EVAP_VAPOR_PRESSURE],
        min_samples: 30,
        run: vapor_pressure,
    },
    Detector {
        id: "evap.purge_fuel_shift",
        subject: Subject::Evap,
        requires: &[params::EVAP_PURGE, params::STFT_B1],
        min_samples: 60,
        run: purge_fuel_shift,
    },
    Detector {
        id: "evap.purge_no_vacuum",
        subject: Subject::Evap,
        requires: &[params::EVAP_PURGE, params::EVAP_VAPOR_PRESSURE],
        min_samples: 60,
        run: purge_no_vacuum,
    },
];

fn vapor_pressure(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let mean = need(stats::mean(&data.values(params::EVAP_VAPOR_PRESSURE)), "mean vapor pressure")?;
    Ok(above(mean.abs(), th::EVAP_PRESSURE_WARN_PA, th::EVAP_PRESSURE_FAIL_PA)
        .map(|level| {
            let state = if mean < 0.0 { "vacuum" } else { "pressure" };
            data.finding(level, Subject::Evap, format!("Abnormal fuel tank {state}: {mean:.0} Pa"))
                .detail("Blocked vent valve or a canister restriction")
                .parameter(params::EVAP_VAPOR_PRESSURE)
        })
        .into_iter()
        .collect())
}

/// Opening the purge valve feeds vapor to the engine; a large rich swing
/// in short-term trim means a saturated canister.
fn purge_fuel_shift(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let aligned = data.align(params::STFT_B1, params::EVAP_PURGE);
    let (active, idle): (Vec<&Aligned>, Vec<&Aligned>) = aligned.iter().partition(|a| a.other > th::PURGE_ACTIVE_PCT);
    if active.len() < th::MIN_CONDITIONAL_POINTS || idle.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let on: Vec<f64> = active.iter().map(|a| a.primary).collect();
    let off: Vec<f64> = idle.iter().map(|a| a.primary).collect();
    let shift = need(stats::mean(&on), "trim with purge")? - need(stats::mean(&off), "trim without purge")?;

    if shift >= -th::PURGE_STFT_SHIFT_PCT {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Info,
            Subject::Evap,
            format!("Fuel trim drops {:.1}% when purge opens", shift.abs()),
        )
        .detail("Heavy vapor load from the charcoal canister; often after topping off the tank")
        .parameter(params::EVAP_PURGE)])
}

fn purge_no_vacuum(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let during = data.values_when(params::EVAP_VAPOR_PRESSURE, params::EVAP_PURGE, |duty| {
        duty > th::PURGE_ACTIVE_PCT
    });
    if during.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let mean = need(stats::mean(&during), "vapor pressure during purge")?;
    if mean <= th::PURGE_NO_VACUUM_PA {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Warn,
            Subject::Evap,
            format!("No tank vacuum while purging ({mean:.0} Pa)"),
        )
        .detail("Large EVAP leak: loose fuel cap, cracked hose or failed purge valve")
        .parameter(params::EVAP_VAPOR_PRESSURE)])
}
