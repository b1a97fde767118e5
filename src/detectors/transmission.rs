//! Transmission detectors: fluid temperature, gear hunting, slip, flare

use std::collections::BTreeMap;

use super::thresholds as th;
use super::{above, need, per_minute, Detector, DetectorError, Subject, TripData};
use crate::canonical::params;
use crate::stats;
use crate::types::{Finding, FindingLevel};

pub(super) const DETECTORS: &[Detector] = &[
    Detector {
        id: "transmission.fluid_temperature",
        subject: Subject::Transmission,
        requires: &[params::TRANS_FLUID_TEMP],
        min_samples: 30,
        run: fluid_temperature,
    },
    Detector {
        id: "transmission.gear_hunting",
        subject: Subject::Transmission,
        requires: &[params::CURRENT_GEAR],
        min_samples: 120,
        run: gear_hunting,
    },
    Detector {
        id: "transmission.ratio_slip",
        subject: Subject::Transmission,
        requires: &[params::ENGINE_RPM, params::VEHICLE_SPEED, params::CURRENT_GEAR],
        min_samples: 120,
        run: ratio_slip,
    },
    Detector {
        id: "transmission.rpm_flare",
        subject: Subject::Transmission,
        requires: &[params::ENGINE_RPM, params::VEHICLE_SPEED],
        min_samples: 120,
        run: rpm_flare,
    },
];

fn fluid_temperature(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let peak = need(stats::max(&data.values(params::TRANS_FLUID_TEMP)), "peak fluid temperature")?;
    Ok(above(peak, th::TRANS_TEMP_WARN_C, th::TRANS_TEMP_FAIL_C)
        .map(|level| {
            data.finding(level, Subject::Transmission, format!("Transmission fluid reached {peak:.0}°C"))
                .detail("Fluid oxidizes quickly above 110°C; check cooler and fluid condition")
                .parameter(params::TRANS_FLUID_TEMP)
        })
        .into_iter()
        .collect())
}

fn gear_hunting(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let series = data.series(params::CURRENT_GEAR);
    let changes = stats::count_transitions(&series.values(), 0.5);
    let Some(rate) = per_minute(changes, series) else {
        return Ok(Vec::new());
    };
    Ok(above(rate, th::GEAR_CHANGES_WARN_PER_MIN, th::GEAR_CHANGES_FAIL_PER_MIN)
        .map(|level| {
            data.finding(level, Subject::Transmission, format!("Gear hunting: {rate:.1} gear changes per minute"))
                .detail("Frequent shifting at steady speed suggests a TCM, speed sensor or throttle signal issue")
                .parameter(params::CURRENT_GEAR)
        })
        .into_iter()
        .collect())
}

/// Within one gear the RPM/speed ratio is fixed mechanically; scatter means
/// the clutch packs or torque converter are slipping.
#[allow(clippy::cast_possible_truncation)]
fn ratio_slip(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let speed = data.align(params::ENGINE_RPM, params::VEHICLE_SPEED);
    let gear = data.align(params::ENGINE_RPM, params::CURRENT_GEAR);

    let mut ratios: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for (s, g) in speed.iter().zip(&gear) {
        if s.other >= th::GEAR_RATIO_MIN_KMH && g.other >= 1.0 {
            ratios.entry(g.other.round() as i64).or_default().push(s.primary / s.other);
        }
    }

    let worst = ratios
        .iter()
        .filter(|(_, r)| r.len() >= th::MIN_CONDITIONAL_POINTS)
        .filter_map(|(g, r)| stats::coefficient_of_variation(r).map(|cv| (*g, cv)))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    let Some((gear_no, cv)) = worst else {
        return Ok(Vec::new());
    };

    Ok(above(cv, th::GEAR_RATIO_CV_WARN, th::GEAR_RATIO_CV_FAIL)
        .map(|level| {
            data.finding(
                level,
                Subject::Transmission,
                format!("Possible slip in gear {gear_no}: RPM/speed ratio varies {:.0}%", cv * 100.0),
            )
            .parameter(params::CURRENT_GEAR)
        })
        .into_iter()
        .collect())
}

fn rpm_flare(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    let aligned = data.align(params::ENGINE_RPM, params::VEHICLE_SPEED);
    let flares = aligned
        .windows(2)
        .filter(|w| {
            w[0].other >= th::GEAR_RATIO_MIN_KMH
                && w[1].primary - w[0].primary >= th::FLARE_RPM_STEP
                && (w[1].other - w[0].other).abs() <= th::FLARE_MAX_SPEED_STEP_KMH
        })
        .count();
    if flares < th::FLARES_WARN {
        return Ok(Vec::new());
    }
    Ok(vec![data
        .finding(
            FindingLevel::Warn,
            Subject::Transmission,
            format!("{flares} RPM flares without matching acceleration"),
        )
        .detail("Engine speed jumps while road speed holds: slipping shifts or low fluid")
        .parameter(params::ENGINE_RPM)])
}

#[cfg(test)]
mod tests {
    use super::super::testing::TripBuilder;
    use super::*;

    #[test]
    fn test_gear_hunting() {
        let trip = TripBuilder::new()
            .series(params::CURRENT_GEAR, 240, |i| if (i / 4) % 2 == 0 { 4.0 } else { 5.0 })
            .build();
        let findings = gear_hunting(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Fail);

        let steady = TripBuilder::new().constant(params::CURRENT_GEAR, 240, 5.0).build();
        assert!(gear_hunting(&TripData::new(&steady, None)).expect("run").is_empty());
    }

    #[test]
    fn test_ratio_slip() {
        let tight = TripBuilder::new()
            .constant(params::VEHICLE_SPEED, 200, 80.0)
            .constant(params::ENGINE_RPM, 200, 2_400.0)
            .constant(params::CURRENT_GEAR, 200, 5.0)
            .build();
        assert!(ratio_slip(&TripData::new(&tight, None)).expect("run").is_empty());

        let slipping = TripBuilder::new()
            .constant(params::VEHICLE_SPEED, 200, 80.0)
            .series(params::ENGINE_RPM, 200, |i| if i % 2 == 0 { 2_000.0 } else { 3_000.0 })
            .constant(params::CURRENT_GEAR, 200, 5.0)
            .build();
        let findings = ratio_slip(&TripData::new(&slipping, None)).expect("run");
        assert_eq!(findings[0].level, FindingLevel::Fail);
        assert!(findings[0].message.contains("gear 5"));
    }

    #[test]
    fn test_rpm_flares() {
        let trip = TripBuilder::new()
            .constant(params::VEHICLE_SPEED, 200, 70.0)
            .series(params::ENGINE_RPM, 200, |i| if i % 40 == 39 { 3_400.0 } else { 2_200.0 })
            .build();
        let findings = rpm_flare(&TripData::new(&trip, None)).expect("run");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("5 RPM flares"));
    }
}
