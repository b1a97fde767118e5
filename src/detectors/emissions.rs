//! Emissions detectors: O2 sensors, catalyst, EGR, MIL, enrichment

use super::thresholds as th;
use super::{above, need, per_minute, share, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::stats;
use crate::types::{Finding, FindingLevel};

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "emissions.upstream_o2_response",
        subject: Subject::Emissions,
        requires: &[params::O2_B1S1],
        min_samples: 100,
        run: upstream_o2_response,
    },
    Detector {
        id: "emissions.catalyst_efficiency",
        subject: Subject::Emissions,
        requires: &[params::O2_B1S1, params::O2_B1S2],
        min_samples: 100,
        run: catalyst_efficiency,
    },
    Detector {
        id: "emissions.egr_error",
        subject: Subject::Emissions,
        requires: &[params::EGR_ERROR],
        min_samples: 60,
        run: egr_error,
    },
    Detector {
        id: "emissions.catalyst_temperature",
        subject: Subject::Emissions,
        requires: &[params::CATALYST_TEMP_B1S1],
        min_samples: 30,
        run: catalyst_temperature,
    },
    Detector {
        id: "emissions.mil_distance",
        subject: Subject::Emissions,
        requires: &[params::DISTANCE_WITH_MIL],
        min_samples: 5,
        run: mil_distance,
    },
    Detector {
        id: "emissions.open_loop_enrichment",
        subject: Subject::Emissions,
        requires: &[params::EQUIVALENCE_RATIO],
        min_samples: 60,
        run: open_loop_enrichment,
    },
];

/// Stuck or slow-switching narrowband sensor ahead of the catalyst
fn upstream_o2_response(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let series = data.series(params::O2_B1S1);
    let volts = series.values();
    let range = need(stats::range(&volts), "O2 voltage range")?;

    if range < th::O2_STUCK_RANGE_V {
        let mean = need(stats::mean(&volts), "mean O2 voltage")?;
        return Ok(vec![data
            .finding(
                FindingLevel::Fail,
                Subject::Emissions,
                format!("Upstream O2 sensor stuck near {mean:.2} V"),
            )
            .detail("Sensor is not responding to mixture changes; replace bank 1 sensor 1")
            .parameter(params::O2_B1S1)]);
    }

    let switches = stats::count_crossings(&volts, th::O2_SWITCH_V);
    let Some(rate) = per_minute(switches, series) else {
        return Ok(Vec::new());
    };
    if rate >= th::O2_SLOW_SWITCH_PER_MIN {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Warn,
            Subject::Emissions,
            format!("Upstream O2 sensor switching slowly: {rate:.1} crossings/min"),
        )
        .detail("A lazy O2 sensor delays fuel control and raises emissions")
        .parameter(params::O2_B1S1)])
}

/// A healthy catalyst damps the downstream sensor; when it switches almost
/// as often as the upstream one, oxygen storage is gone.
#[allow(clippy::cast_precision_loss)]
fn catalyst_efficiency(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let upstream = stats::count_crossings(&data.values(params::O2_B1S1), th::O2_SWITCH_V);
    if upstream < th::CAT_MIN_UPSTREAM_SWITCHES {
        return Ok(Vec::new());
    }
    let downstream = stats::count_crossings(&data.values(params::O2_B1S2), th::O2_SWITCH_V);
    let ratio = downstream as f64 / upstream as f64;

    Ok(above(ratio, th::CAT_RATIO_WARN, th::CAT_RATIO_FAIL)
        .map(|level| {
            data.finding(
                level,
                Subject::Emissions,
                format!("Catalyst efficiency low: downstream/upstream switch ratio {ratio:.2}"),
            )
            .detail(format!("{downstream} downstream vs {upstream} upstream O2 crossings"))
            .parameter(params::O2_B1S2)
        })
        .into_iter()
        .collect())
}

fn egr_error(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let abs: Vec<f64> = data.values(params::EGR_ERROR).iter().map(|v| v.abs()).collect();
    let mean = need(stats::mean(&abs), "mean EGR error")?;
    Ok(above(mean, th::EGR_ERROR_WARN_PCT, th::EGR_ERROR_FAIL_PCT)
        .map(|level| {
            data.finding(level, Subject::Emissions, format!("EGR flow deviates from command by {mean:.0}% on average"))
                .detail("Carbon-clogged EGR valve or passages, or a failing EGR position sensor")
                .parameter(params::EGR_ERROR)
        })
        .into_iter()
        .collect())
}

fn catalyst_temperature(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let peak = need(stats::max(&data.values(params::CATALYST_TEMP_B1S1)), "peak catalyst temperature")?;
    Ok(above(peak, th::CAT_TEMP_WARN_C, th::CAT_TEMP_FAIL_C)
        .map(|level| {
            data.finding(level, Subject::Emissions, format!("Catalyst temperature reached {peak:.0}°C"))
                .detail("Misfire or rich running overheats the catalyst substrate")
                .parameter(params::CATALYST_TEMP_B1S1)
        })
        .into_iter()
        .collect())
}

fn mil_distance(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let km = need(stats::max(&data.values(params::DISTANCE_WITH_MIL)), "distance with MIL")?;
    let level = if km > th::MIL_DISTANCE_FAIL_KM {
        FindingLevel::Fail
    } else if km > 0.0 {
        FindingLevel::Warn
    } else {
        return Ok(Vec::new());
    };
    Ok(vec![data
        .finding(level, Subject::Emissions, format!("Check-engine light on for {km:.0} km"))
        .detail("Read stored trouble codes")
        .parameter(params::DISTANCE_WITH_MIL)])
}

fn open_loop_enrichment(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let rich = share(&data.values(params::EQUIVALENCE_RATIO), |lambda| lambda < th::RICH_LAMBDA);
    if rich <= th::RICH_SHARE_INFO {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Info,
            Subject::Emissions,
            format!("Commanded rich mixture for {:.0}% of the trip", rich * 100.0),
        )
        .parameter(params::EQUIVALENCE_RATIO)])
}

#[cfg(test)]
mod tests {
    use super::super::testing::TripBuilder;
    use super::*;

    fn switching(period: usize) -> impl Fn(usize) -> f64 {
        move |i| if (i / period) % 2 == 0 { 0.1 } else { 0.8 }
    }

    #[test]
    fn test_stuck_o2() {
        let trip = TripBuilder::new().constant(params::O2_B1S1, 200, 0.44).build();
        let findings = upstream_o2_response(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Fail);
    }

    #[test]
    fn test_healthy_o2_switching() {
        let trip = TripBuilder::new().series(params::O2_B1S1, 300, switching(2)).build();
        assert!(upstream_o2_response(&TripData::new(&trip, None)).expect("run").is_empty());
    }

    #[test]
    fn test_catalyst_ratio() {
        let worn = TripBuilder::new()
            .series(params::O2_B1S1, 300, switching(2))
            .series(params::O2_B1S2, 300, switching(2))
            .build();
        let findings = catalyst_efficiency(&TripData::new(&worn, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Fail);

        let healthy = TripBuilder::new()
            .series(params::O2_B1S1, 300, switching(2))
            .constant(params::O2_B1S2, 300, 0.7)
            .build();
        assert!(catalyst_efficiency(&TripData::new(&healthy, None)).expect("run").is_empty());
    }

    #[test]
    fn test_mil_distance() {
        let trip = TripBuilder::new().constant(params::DISTANCE_WITH_MIL, 10, 0.0).build();
        assert!(mil_distance(&TripData::new(&trip, None)).expect("run").is_empty());
        let trip = TripBuilder::new().constant(params::DISTANCE_WITH_MIL, 10, 250.0).build();
        assert_eq!(mil_distance(&TripData::new(&trip, None)).expect("run")[0].level, FindingLevel::Fail);
    }
}
