//! Air intake and forced induction detectors

use super::thresholds as th;
use super::{above, below, need, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::stats::{self, correlation_significance};
use crate::types::Finding;

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "induction.intake_restriction",
        subject: Subject::Induction,
        requires: &[params::ENGINE_LOAD, params::MAF],
        min_samples: 60,
        run: intake_restriction,
    },
    Detector {
        id: "induction.idle_airflow",
        subject: Subject::Induction,
        requires: &[params::MAF],
        min_samples: 60,
        run: idle_airflow,
    },
    Detector {
        id: "induction.maf_rpm_tracking",
        subject: Subject::Induction,
        requires: &[params::MAF, params::ENGINE_RPM],
        min_samples: 60,
        run: maf_rpm_tracking,
    },
    Detector {
        id: "induction.overboost",
        subject: Subject::Induction,
        requires: &[params::BOOST_PRESSURE],
        min_samples: 30,
        run: overboost,
    },
    Detector {
        id: "induction.underboost",
        subject: Subject::Induction,
        requires: &[params::BOOST_PRESSURE, params::ENGINE_LOAD],
        min_samples: 60,
        run: underboost,
    },
    Detector {
        id: "induction.idle_vacuum",
        subject: Subject::Induction,
        requires: &[params::MAP, params::ENGINE_RPM, params::VEHICLE_SPEED],
        min_samples: 60,
        run: idle_vacuum,
    },
    Detector {
        id: "induction.intake_air_temperature",
        subject: Subject::Induction,
        requires: &[params::INTAKE_AIR_TEMP],
        min_samples: 30,
        run: intake_air_temperature,
    },
];

/// High engine load with disproportionately little air flow
fn intake_restriction(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let loaded = data.values_when(params::MAF, params::ENGINE_LOAD, |load| load > th::HIGH_LOAD_PCT);
    if loaded.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let median = need(stats::median(&loaded), "MAF under load")?;
    Ok(below(median, th::RESTRICTION_MAF_WARN_GS, th::RESTRICTION_MAF_FAIL_GS)
        .map(|level| {
            data.finding(
                level,
                Subject::Induction,
                format!("Possible intake restriction: only {median:.1} g/s air flow above {:.0}% load", th::HIGH_LOAD_PCT),
            )
            .detail("Inspect the air filter, intake ducting and MAF sensor")
            .parameter(params::MAF)
        })
        .into_iter()
        .collect())
}

fn idle_airflow(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let idle = match data.summary.and_then(|s| s.maf_idle_median) {
        Some(m) => m,
        None => {
            let idle = data.idle_values(params::MAF);
            if idle.len() < th::MIN_CONDITIONAL_POINTS {
                return Ok(Vec::new());
            }
            need(stats::median(&idle), "idle MAF")?
        }
    };
    Ok(below(idle, th::IDLE_MAF_WARN_GS, th::IDLE_MAF_FAIL_GS)
        .map(|level| {
            data.finding(level, Subject::Induction, format!("Low idle air flow: {idle:.2} g/s"))
                .detail("A contaminated MAF sensor under-reads; clean it or check for unmetered air")
                .parameter(params::MAF)
        })
        .into_iter()
        .collect())
}

/// MAF should rise and fall with RPM; weak correlation means the sensor is
/// not tracking engine demand.
fn maf_rpm_tracking(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let aligned = data.align(params::MAF, params::ENGINE_RPM);
    let maf: Vec<f64> = aligned.iter().map(|a| a.primary).collect();
    let rpm: Vec<f64> = aligned.iter().map(|a| a.other).collect();
    let Some(corr) = correlation_significance(&maf, &rpm) else {
        return Ok(Vec::new());
    };
    Ok(below(corr.r, th::MAF_RPM_R_WARN, th::MAF_RPM_R_FAIL)
        .map(|level| {
            data.finding(
                level,
                Subject::Induction,
                format!("MAF does not track engine speed (r = {:.2})", corr.r),
            )
            .detail(format!("p = {:.3} over {} paired readings", corr.p_value, corr.sample_count))
            .parameter(params::MAF)
        })
        .into_iter()
        .collect())
}

fn overboost(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let peak = need(stats::max(&data.values(params::BOOST_PRESSURE)), "peak boost")?;
    Ok(above(peak, th::OVERBOOST_WARN_KPA, th::OVERBOOST_FAIL_KPA)
        .map(|level| {
            data.finding(level, Subject::Induction, format!("Overboost: {peak:.0} kPa"))
                .detail("Wastegate sticking closed or boost control solenoid fault")
                .parameter(params::BOOST_PRESSURE)
        })
        .into_iter()
        .collect())
}

fn underboost(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let loaded = data.values_when(params::BOOST_PRESSURE, params::ENGINE_LOAD, |load| load > th::HIGH_LOAD_PCT);
    if loaded.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let median = need(stats::median(&loaded), "boost under load")?;
    Ok(below(median, th::UNDERBOOST_WARN_KPA, th::UNDERBOOST_FAIL_KPA)
        .map(|level| {
            data.finding(level, Subject::Induction, format!("Underboost: {median:.0} kPa under heavy load"))
                .detail("Boost leak, wastegate stuck open or turbocharger wear")
                .parameter(params::BOOST_PRESSURE)
        })
        .into_iter()
        .collect())
}

fn idle_vacuum(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let idle = data.idle_values(params::MAP);
    if idle.len() < th::MIN_CONDITIONAL_POINTS {
        return Ok(Vec::new());
    }
    let mean = need(stats::mean(&idle), "idle MAP")?;
    Ok(above(mean, th::IDLE_MAP_WARN_KPA, th::IDLE_MAP_FAIL_KPA)
        .map(|level| {
            data.finding(level, Subject::Induction, format!("Weak idle vacuum: manifold pressure {mean:.0} kPa"))
                .detail("Vacuum leak, late cam timing or low compression")
                .parameter(params::MAP)
        })
        .into_iter()
        .collect())
}

fn intake_air_temperature(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let mean = need(stats::mean(&data.values(params::INTAKE_AIR_TEMP)), "mean intake temperature")?;
    Ok(above(mean, th::IAT_WARN_C, th::IAT_FAIL_C)
        .map(|level| {
            data.finding(level, Subject::Induction, format!("Hot intake air: {mean:.0}°C average"))
                .detail("Heat soak reduces power and invites knock; check intercooler and intake routing")
                .parameter(params::INTAKE_AIR_TEMP)
        })
        .into_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::testing::TripBuilder;
    use super::*;
    use crate::types::FindingLevel;

    #[test]
    fn test_intake_restriction() {
        let trip = TripBuilder::new()
            .constant(params::ENGINE_LOAD, 100, 90.0)
            .constant(params::MAF, 100, 6.0)
            .build();
        let findings = intake_restriction(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Fail);

        let healthy = TripBuilder::new()
            .constant(params::ENGINE_LOAD, 100, 90.0)
            .constant(params::MAF, 100, 60.0)
            .build();
        assert!(intake_restriction(&TripData::new(&healthy, None)).expect("run").is_empty());
    }

    #[test]
    fn test_idle_airflow_from_series() {
        let trip = TripBuilder::new()
            .constant(params::MAF, 100, 2.5)
            .constant(params::VEHICLE_SPEED, 100, 0.0)
            .constant(params::ENGINE_RPM, 100, 750.0)
            .build();
        let findings = idle_airflow(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Warn);
    }

    #[test]
    fn test_maf_tracks_rpm() {
        let tracking = TripBuilder::new()
            .series(params::ENGINE_RPM, 120, |i| 800.0 + (i % 30) as f64 * 100.0)
            .series(params::MAF, 120, |i| 3.0 + (i % 30) as f64 * 1.2)
            .build();
        assert!(maf_rpm_tracking(&TripData::new(&tracking, None)).expect("run").is_empty());

        let stuck = TripBuilder::new()
            .series(params::ENGINE_RPM, 120, |i| 800.0 + (i % 30) as f64 * 100.0)
            .series(params::MAF, 120, |i| if i % 2 == 0 { 5.0 } else { 5.5 })
            .build();
        let findings = maf_rpm_tracking(&TripData::new(&stuck, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Fail);
    }
}
