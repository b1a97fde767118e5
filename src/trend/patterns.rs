//! Named fault hypotheses matched against per-trip parameter aggregates.
//!
//! Each [`FaultPattern`] carries static metadata (confidence, urgency,
//! symptoms, outlook) and a guard over [`TripAggregates`]. Patterns are
//! evaluated independently; any number may match one trip.

use std::collections::HashMap;

use crate::canonical::params;
use crate::stats;
use crate::trips::Trip;
use crate::types::{PatternMatch, TrendDirection, TrendSummary, Urgency};

// ============================================================================
// Aggregates
// ============================================================================

/// Summary statistics of one parameter within one trip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamAggregate {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub stddev: f64,
    pub trend: TrendDirection,
}

impl ParamAggregate {
    /// Aggregate of `values`; `None` when empty
    pub fn from_values(values: &[f64], trend: TrendDirection) -> Option<Self> {
        Some(Self {
            mean: stats::mean(values)?,
            min: stats::min(values)?,
            max: stats::max(values)?,
            range: stats::range(values)?,
            stddev: stats::stddev(values)?,
            trend,
        })
    }
}

/// Aggregates for every parameter present in a trip
#[derive(Debug, Clone, Default)]
pub struct TripAggregates {
    by_parameter: HashMap<String, ParamAggregate>,
}

impl TripAggregates {
    /// Build from a trip and its trends; parameters without a trend count as stable
    pub fn from_trip(trip: &Trip, trends: &[TrendSummary]) -> Self {
        let mut by_parameter = HashMap::new();
        for id in trip.parameters() {
            let trend = trends
                .iter()
                .find(|t| t.parameter_id == id)
                .map_or(TrendDirection::Stable, |t| t.trend);
            if let Some(agg) = ParamAggregate::from_values(&trip.series(id).values(), trend) {
                by_parameter.insert(id.to_string(), agg);
            }
        }
        Self { by_parameter }
    }

    pub fn insert(&mut self, parameter_id: impl Into<String>, aggregate: ParamAggregate) {
        self.by_parameter.insert(parameter_id.into(), aggregate);
    }

    pub fn get(&self, parameter_id: &str) -> Option<&ParamAggregate> {
        self.by_parameter.get(parameter_id)
    }

    /// True when the parameter is present and `pred` holds
    fn has(&self, parameter_id: &str, pred: impl Fn(&ParamAggregate) -> bool) -> bool {
        self.get(parameter_id).is_some_and(pred)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A named fault hypothesis
#[derive(Clone, Copy)]
pub struct FaultPattern {
    pub name: &'static str,
    /// Fixed credibility weight, not derived from data
    pub confidence: f64,
    pub urgency: Urgency,
    pub symptoms: &'static [&'static str],
    pub predicted_failure: &'static str,
    pub time_to_failure: &'static str,
    pub related: &'static [&'static str],
    pub guard: fn(&TripAggregates) -> bool,
}

impl std::fmt::Debug for FaultPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultPattern")
            .field("name", &self.name)
            .field("confidence", &self.confidence)
            .field("urgency", &self.urgency)
            .finish_non_exhaustive()
    }
}

impl FaultPattern {
    pub fn matches(&self, aggregates: &TripAggregates) -> bool {
        (self.guard)(aggregates)
    }

    fn to_match(&self, trip_id: &str) -> PatternMatch {
        PatternMatch {
            trip_id: trip_id.to_string(),
            pattern: self.name.to_string(),
            confidence: self.confidence,
            symptoms: self.symptoms.iter().map(|s| (*s).to_string()).collect(),
            urgency: self.urgency,
            predicted_failure: self.predicted_failure.to_string(),
            time_to_failure: self.time_to_failure.to_string(),
            related_parameters: self.related.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

const fn rising(trend: TrendDirection) -> bool {
    matches!(trend, TrendDirection::Increasing | TrendDirection::Erratic)
}

const fn falling(trend: TrendDirection) -> bool {
    matches!(trend, TrendDirection::Decreasing)
}

pub const PATTERNS: &[FaultPattern] = &[
    FaultPattern {
        name: "Head gasket failure",
        confidence: 0.75,
        urgency: Urgency::Critical,
        symptoms: &[
            "Coolant temperature climbing through the trip",
            "Peak coolant above 105°C",
        ],
        predicted_failure: "Combustion gas entering the cooling system; coolant loss and engine overheating",
        time_to_failure: "Days to weeks",
        related: &[params::COOLANT_TEMP],
        guard: |a| a.has(params::COOLANT_TEMP, |c| c.max > 105.0 && rising(c.trend)),
    },
    FaultPattern {
        name: "Turbocharger failure",
        confidence: 0.7,
        urgency: Urgency::High,
        symptoms: &["Boost pressure falling through the trip", "Hot intake charge"],
        predicted_failure: "Turbine or compressor wear leading to loss of boost",
        time_to_failure: "Weeks",
        related: &[params::BOOST_PRESSURE, params::INTAKE_AIR_TEMP],
        guard: |a| {
            a.has(params::BOOST_PRESSURE, |b| b.max < 60.0 && falling(b.trend))
                && a.has(params::INTAKE_AIR_TEMP, |i| i.mean > 45.0)
        },
    },
    FaultPattern {
        name: "Catalytic converter degradation",
        confidence: 0.8,
        urgency: Urgency::Medium,
        symptoms: &[
            "Downstream O2 sensor switching like the upstream sensor",
            "Little oxygen storage left in the catalyst",
        ],
        predicted_failure: "Catalyst efficiency below threshold; emissions test failure",
        time_to_failure: "Months",
        related: &[params::O2_B1S1, params::O2_B1S2],
        guard: |a| {
            a.has(params::O2_B1S1, |_| true)
                && a.has(params::O2_B1S2, |o| o.stddev > 0.2 && o.range > 0.6)
        },
    },
    FaultPattern {
        name: "Fuel pump weakening",
        confidence: 0.65,
        urgency: Urgency::High,
        symptoms: &["Rail pressure falling through the trip", "Lean long-term fuel trim"],
        predicted_failure: "Insufficient fuel delivery under load; hesitation and stalling",
        time_to_failure: "Weeks",
        related: &[params::FUEL_RAIL_PRESSURE, params::LTFT_B1],
        guard: |a| {
            a.has(params::FUEL_RAIL_PRESSURE, |r| falling(r.trend))
                && a.has(params::LTFT_B1, |l| l.mean > 10.0)
        },
    },
    FaultPattern {
        name: "Transmission slip",
        confidence: 0.6,
        urgency: Urgency::High,
        symptoms: &["Transmission fluid heating through the trip", "Fluid above 100°C"],
        predicted_failure: "Clutch pack or band wear; loss of drive",
        time_to_failure: "Weeks to months",
        related: &[params::TRANS_FLUID_TEMP, params::ENGINE_RPM],
        guard: |a| a.has(params::TRANS_FLUID_TEMP, |t| t.mean > 100.0 && rising(t.trend)),
    },
    FaultPattern {
        name: "Injector failure",
        confidence: 0.6,
        urgency: Urgency::Medium,
        symptoms: &["Short-term trim swinging widely", "Long-term trim far from zero"],
        predicted_failure: "Clogged or leaking injector; misfire and catalyst damage",
        time_to_failure: "Weeks to months",
        related: &[params::STFT_B1, params::LTFT_B1],
        guard: |a| {
            a.has(params::STFT_B1, |s| s.stddev > 8.0) && a.has(params::LTFT_B1, |l| l.mean.abs() > 10.0)
        },
    },
    FaultPattern {
        name: "Timing chain stretch",
        confidence: 0.55,
        urgency: Urgency::High,
        symptoms: &["Ignition advance low", "Advance falling through the trip"],
        predicted_failure: "Cam/crank correlation fault; chain may jump a tooth",
        time_to_failure: "Months",
        related: &[params::TIMING_ADVANCE, params::ENGINE_RPM],
        guard: |a| {
            a.has(params::TIMING_ADVANCE, |t| t.mean < 10.0 && falling(t.trend))
                && a.has(params::ENGINE_RPM, |r| r.max > 2_000.0)
        },
    },
    FaultPattern {
        name: "MAF sensor contamination",
        confidence: 0.7,
        urgency: Urgency::Low,
        symptoms: &["Airflow low for engine speed", "Lean long-term fuel trim"],
        predicted_failure: "Under-reported airflow; lean running and poor drivability",
        time_to_failure: "Months",
        related: &[params::MAF, params::ENGINE_RPM, params::LTFT_B1],
        guard: |a| {
            a.has(params::MAF, |m| m.mean < 8.0)
                && a.has(params::ENGINE_RPM, |r| r.mean > 1_500.0)
                && a.has(params::LTFT_B1, |l| l.mean > 8.0)
        },
    },
    FaultPattern {
        name: "Heat-soak detonation",
        confidence: 0.65,
        urgency: Urgency::High,
        symptoms: &["Intake air above 50°C", "Knock retard above 4°"],
        predicted_failure: "Detonation under hot intake conditions; piston and ring damage",
        time_to_failure: "Weeks",
        related: &[params::INTAKE_AIR_TEMP, params::KNOCK_RETARD],
        guard: |a| {
            a.has(params::INTAKE_AIR_TEMP, |i| i.mean > 50.0) && a.has(params::KNOCK_RETARD, |k| k.max > 4.0)
        },
    },
    FaultPattern {
        name: "Alternator failure",
        confidence: 0.7,
        urgency: Urgency::High,
        symptoms: &["System voltage falling while running", "Voltage below charging level"],
        predicted_failure: "Battery drains until the vehicle no longer starts",
        time_to_failure: "Days",
        related: &[params::CONTROL_MODULE_VOLTAGE, params::ENGINE_RPM],
        guard: |a| {
            a.has(params::CONTROL_MODULE_VOLTAGE, |v| v.mean < 13.2 && falling(v.trend))
                && a.has(params::ENGINE_RPM, |r| r.mean > 700.0)
        },
    },
    FaultPattern {
        name: "Thermostat stuck open",
        confidence: 0.6,
        urgency: Urgency::Low,
        symptoms: &["Coolant never reaches 75°C", "Vehicle driven at speed"],
        predicted_failure: "Engine runs cold; higher fuel use and weak cabin heat",
        time_to_failure: "Months",
        related: &[params::COOLANT_TEMP, params::VEHICLE_SPEED],
        guard: |a| {
            a.has(params::COOLANT_TEMP, |c| c.max < 75.0) && a.has(params::VEHICLE_SPEED, |s| s.mean > 50.0)
        },
    },
    FaultPattern {
        name: "Upstream O2 sensor aging",
        confidence: 0.6,
        urgency: Urgency::Medium,
        symptoms: &["Narrow upstream O2 swing", "Low O2 signal variation"],
        predicted_failure: "Slow sensor response; degraded fuel control and catalyst wear",
        time_to_failure: "Months",
        related: &[params::O2_B1S1],
        guard: |a| a.has(params::O2_B1S1, |o| o.range < 0.5 && o.stddev < 0.15),
    },
];

/// Every pattern whose guard holds, in catalog order
pub fn match_patterns(trip_id: &str, aggregates: &TripAggregates) -> Vec<PatternMatch> {
    PATTERNS
        .iter()
        .filter(|p| p.matches(aggregates))
        .map(|p| p.to_match(trip_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(mean: f64, min: f64, max: f64, trend: TrendDirection) -> ParamAggregate {
        ParamAggregate {
            mean,
            min,
            max,
            range: max - min,
            stddev: (max - min) / 4.0,
            trend,
        }
    }

    #[test]
    fn test_catalog_names_unique() {
        let mut names: Vec<_> = PATTERNS.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PATTERNS.len());
        assert_eq!(PATTERNS.len(), 12);
        assert!(PATTERNS.iter().all(|p| (0.0..=1.0).contains(&p.confidence)));
    }

    #[test]
    fn test_empty_aggregates_match_nothing() {
        assert!(match_patterns("t", &TripAggregates::default()).is_empty());
    }

    #[test]
    fn test_head_gasket_and_turbo_both_match() {
        let mut a = TripAggregates::default();
        a.insert(params::COOLANT_TEMP, agg(100.0, 85.0, 115.0, TrendDirection::Increasing));
        a.insert(params::BOOST_PRESSURE, agg(45.0, 20.0, 55.0, TrendDirection::Decreasing));
        a.insert(params::INTAKE_AIR_TEMP, agg(55.0, 50.0, 60.0, TrendDirection::Stable));

        let matches = match_patterns("trip-1", &a);
        let names: Vec<_> = matches.iter().map(|m| m.pattern.as_str()).collect();
        assert_eq!(names, ["Head gasket failure", "Turbocharger failure"]);
        assert_eq!(matches[0].urgency, Urgency::Critical);
        assert!((matches[0].confidence - 0.75).abs() < f64::EPSILON);
        assert_eq!(matches[1].trip_id, "trip-1");
    }

    #[test]
    fn test_all_guards_must_hold() {
        let mut a = TripAggregates::default();
        // falling boost but a cool intake charge
        a.insert(params::BOOST_PRESSURE, agg(45.0, 20.0, 55.0, TrendDirection::Decreasing));
        a.insert(params::INTAKE_AIR_TEMP, agg(30.0, 25.0, 35.0, TrendDirection::Stable));
        assert!(match_patterns("t", &a).is_empty());
    }

    #[test]
    fn test_confidence_is_static() {
        let mut mild = TripAggregates::default();
        mild.insert(params::COOLANT_TEMP, agg(95.0, 85.0, 106.0, TrendDirection::Increasing));
        let mut severe = TripAggregates::default();
        severe.insert(params::COOLANT_TEMP, agg(120.0, 100.0, 140.0, TrendDirection::Erratic));

        let a = match_patterns("t", &mild);
        let b = match_patterns("t", &severe);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].confidence, b[0].confidence);
    }
}
