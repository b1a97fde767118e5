//! Engine Property Tests
//!
//! Behavioural guarantees of the engine as a whole: fault isolation,
//! severity monotonicity, stable ranking, scenario thresholds and pattern
//! independence. All data is generated in-test.

use obdscope::canonical::{self, params};
use obdscope::config::EngineConfig;
use obdscope::detectors::{self, Detector, DetectorError, Subject, TripData};
use obdscope::engine::{analyze_trends, rank_findings, Orchestrator, SYSTEM_ERROR_CATEGORY};
use obdscope::series::TimeSeries;
use obdscope::trips::Trip;
use obdscope::types::{Finding, FindingLevel, Sample, SampleTime};

fn samples(trip: &str, parameter: &str, n: usize, f: impl Fn(usize) -> f64) -> Vec<Sample> {
    (0..n)
        .map(|i| Sample::new(SampleTime::Relative(i as f64), parameter, Some(f(i)), None, trip))
        .collect()
}

/// A running, moving engine with the given coolant profile
fn coolant_trip(id: &str, n: usize, coolant: impl Fn(usize) -> f64) -> Trip {
    let mut all = samples(id, params::COOLANT_TEMP, n, coolant);
    all.extend(samples(id, params::ENGINE_RPM, n, |i| 1_800.0 + (i % 5) as f64 * 40.0));
    all.extend(samples(id, params::VEHICLE_SPEED, n, |i| 60.0 + (i % 7) as f64));
    Trip::new(id, all)
}

fn only(ids: &[&str]) -> Vec<Detector> {
    detectors::catalog()
        .into_iter()
        .filter(|d| ids.contains(&d.id))
        .collect()
}

// ============================================================================
// Fault isolation
// ============================================================================

fn fails_on_bad_trip(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    if data.trip_id == "bad" {
        panic!("synthetic detector fault");
    }
    Ok(Vec::new())
}

fn errs_on_bad_trip(data: &TripData<'_>) -> Result<Vec<Finding>, DetectorError> {
    if data.trip_id == "bad" {
        return Err(DetectorError::Computation("synthetic error".into()));
    }
    Ok(Vec::new())
}

fn with_injected(run: detectors::DetectFn) -> Vec<Detector> {
    let mut catalog = detectors::catalog();
    let faulty = Detector {
        id: "test.faulty",
        subject: Subject::Engine,
        requires: &[],
        min_samples: 0,
        run,
    };
    catalog.insert(catalog.len() / 2, faulty);
    catalog
}

fn assert_isolated(run: detectors::DetectFn) {
    let config = EngineConfig::default();
    let bad = coolant_trip("bad", 600, |i| 85.0 + (i % 40) as f64);
    let good = coolant_trip("good", 600, |i| 85.0 + (i % 40) as f64);

    let baseline = Orchestrator::new(&config);
    let expected_bad = baseline.analyze_trip(&bad, None);
    let expected_good = baseline.analyze_trip(&good, None);
    assert!(!expected_bad.is_empty(), "scenario should produce findings");

    let injected = Orchestrator::with_detectors(with_injected(run), &config);
    let got_bad = injected.analyze_trip(&bad, None);
    let got_good = injected.analyze_trip(&good, None);

    let errors: Vec<_> = got_bad.iter().filter(|f| f.category == SYSTEM_ERROR_CATEGORY).collect();
    assert_eq!(errors.len(), 1, "exactly one System Error finding");
    assert_eq!(errors[0].level, FindingLevel::Fail);
    assert_eq!(errors[0].trip_id.as_deref(), Some("bad"));
    assert!(errors[0].message.contains("bad"));

    let rest: Vec<_> = got_bad
        .into_iter()
        .filter(|f| f.category != SYSTEM_ERROR_CATEGORY)
        .collect();
    assert_eq!(rest, expected_bad, "other detectors unaffected");
    assert_eq!(got_good, expected_good, "other trips unaffected");
}

#[test]
fn test_panicking_detector_is_isolated() {
    assert_isolated(fails_on_bad_trip);
}

#[test]
fn test_erroring_detector_is_isolated() {
    assert_isolated(errs_on_bad_trip);
}

// ============================================================================
// Severity escalation
// ============================================================================

#[test]
fn test_coolant_severity_is_monotonic() {
    let orch = Orchestrator::with_detectors(
        only(&["cooling.overheat", "cooling.peak_temperature"]),
        &EngineConfig::default(),
    );
    let mut last = 0u8;
    for mean in (90..=115).map(f64::from) {
        let trip = coolant_trip("t", 300, |i| mean + if i % 2 == 0 { -1.0 } else { 1.0 });
        let worst = orch
            .analyze_trip(&trip, None)
            .iter()
            .map(|f| f.level.severity())
            .max()
            .unwrap_or(0);
        assert!(worst >= last, "severity dropped at mean {mean}: {worst} < {last}");
        last = worst;
    }
    assert_eq!(last, FindingLevel::Fail.severity());
}

#[test]
fn test_voltage_severity_is_monotonic() {
    let orch = Orchestrator::with_detectors(only(&["electrical.undercharging"]), &EngineConfig::default());
    let mut last = 0u8;
    // falling voltage is a growing deviation
    for tenth in (110..=145).rev() {
        let volts = f64::from(tenth) / 10.0;
        let mut all = samples("t", params::CONTROL_MODULE_VOLTAGE, 200, |_| volts);
        all.extend(samples("t", params::ENGINE_RPM, 200, |_| 1_500.0));
        let worst = orch
            .analyze_trip(&Trip::new("t", all), None)
            .iter()
            .map(|f| f.level.severity())
            .max()
            .unwrap_or(0);
        assert!(worst >= last, "severity dropped at {volts} V");
        last = worst;
    }
    assert_eq!(last, FindingLevel::Fail.severity());
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_temperature_cycling_scenario() {
    let orch = Orchestrator::with_detectors(only(&["cooling.temperature_cycling"]), &EngineConfig::default());

    let steady = coolant_trip("steady", 1_000, |i| if i % 2 == 0 { 94.0 } else { 96.0 });
    assert!(
        orch.analyze_trip(&steady, None).is_empty(),
        "94-96°C oscillation must not be cycling"
    );

    let cycling = coolant_trip("cycling", 1_000, |i| if i % 2 == 0 { 80.0 } else { 105.0 });
    let findings = orch.analyze_trip(&cycling, None);
    assert_eq!(findings.len(), 1, "80-105°C oscillation must be cycling");
    assert_eq!(findings[0].level, FindingLevel::Warn);
}

#[test]
fn test_insufficient_data_is_silent() {
    let orch = Orchestrator::new(&EngineConfig::default());
    let trip = coolant_trip("short", 5, |_| 130.0);
    let findings = orch.analyze_trip(&trip, None);
    assert!(
        findings.iter().all(|f| f.category != SYSTEM_ERROR_CATEGORY),
        "short trips never produce errors: {findings:#?}"
    );
    assert!(findings.iter().all(|f| f.category != "Cooling System"));
}

// ============================================================================
// Ranking
// ============================================================================

#[test]
fn test_ranking_is_stable_over_detector_output() {
    let orch = Orchestrator::new(&EngineConfig::default());
    let trips = [
        coolant_trip("a", 600, |i| 85.0 + (i % 40) as f64),
        coolant_trip("b", 600, |_| 60.0),
    ];
    let raw = orch.run(&trips, &[]);
    let ranked = rank_findings(raw.clone());
    assert_eq!(ranked.len(), raw.len(), "no deduplication");

    for level in [FindingLevel::Fail, FindingLevel::Warn, FindingLevel::Info] {
        let before: Vec<_> = raw.iter().filter(|f| f.level == level).collect();
        let after: Vec<_> = ranked.iter().filter(|f| f.level == level).collect();
        assert_eq!(before, after, "{level} findings keep detector order");
    }
}

// ============================================================================
// Patterns
// ============================================================================

#[test]
fn test_head_gasket_and_turbo_match_together() {
    let mut all = samples("boosted", params::COOLANT_TEMP, 600, |i| 90.0 + i as f64 * 28.0 / 599.0);
    all.extend(samples("boosted", params::BOOST_PRESSURE, 600, |i| 55.0 - i as f64 * 35.0 / 599.0));
    all.extend(samples("boosted", params::INTAKE_AIR_TEMP, 600, |_| 55.0));

    let (trends, patterns) = analyze_trends(all, &EngineConfig::default());
    assert_eq!(trends.len(), 3);

    let names: Vec<_> = patterns.iter().map(|p| p.pattern.as_str()).collect();
    assert!(names.contains(&"Head gasket failure"), "patterns: {names:?}");
    assert!(names.contains(&"Turbocharger failure"), "patterns: {names:?}");
}

// ============================================================================
// Primitives
// ============================================================================

#[test]
fn test_canonicalize_is_total_and_idempotent() {
    for raw in ["RPM", "  engine_rpm ", "Coolant Temp", "0x0C", "", "Mystery Sensor 7", "°F"] {
        let once = canonical::canonicalize(raw);
        assert_eq!(canonical::canonicalize(&once), once, "not idempotent for {raw:?}");
    }
    assert_eq!(canonical::canonicalize("Mystery Sensor 7"), "Mystery Sensor 7");
}

#[test]
fn test_nearest_time_prefers_closer_point() {
    let series = TimeSeries::from_points(
        [(0.0, 1.0), (10.0, 2.0), (20.0, 3.0)]
            .into_iter()
            .map(|(t, v)| (SampleTime::Relative(t), v)),
    );
    assert_eq!(series.nearest_at(&SampleTime::Relative(14.0)), Some(2.0));
    assert_eq!(TimeSeries::new().nearest_at(&SampleTime::Relative(14.0)), None);
}
