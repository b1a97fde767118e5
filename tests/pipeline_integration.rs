//! Pipeline Integration Tests
//!
//! Synthetic multi-trip logs driven through the full pipeline:
//! ingest → segment → summarize → detect → rank → trends/patterns.

use obdscope::canonical::params;
use obdscope::engine::{analyze_documents, analyze_trips, DATA_LIMITS_CATEGORY};
use obdscope::ingest::{ingest_batch, Document};
use obdscope::trips::{segment_trips, summarize_trips};
use obdscope::{EngineConfig, FindingLevel};

/// 20-minute drive at 1 Hz: cold start, urban, highway
fn drive_log(coolant_peak: f64, voltage: f64) -> String {
    let mut text = String::from(
        "Time (s),Engine RPM,Vehicle Speed (km/h),Coolant Temperature (°C),Control Module Voltage (V),MAF (g/s)\n",
    );
    for i in 0..1200u32 {
        let t = f64::from(i);
        let speed = if i < 120 { 0.0 } else if i < 600 { 45.0 + (t * 0.1).sin() * 10.0 } else { 100.0 };
        let rpm = if speed < 1.0 { 780.0 + (t % 3.0) * 10.0 } else { 1_400.0 + speed * 20.0 };
        let coolant = (25.0 + t * 0.15).min(if i < 600 { 90.0 } else { coolant_peak });
        let maf = rpm / 1000.0 * 4.0;
        text.push_str(&format!("{i},{rpm:.0},{speed:.1},{coolant:.1},{voltage:.2},{maf:.2}\n"));
    }
    text
}

#[test]
fn test_healthy_and_overheating_trips() {
    let docs = vec![
        Document::new("healthy", drive_log(90.0, 14.1)),
        Document::new("overheat", drive_log(118.0, 14.1)),
    ];
    let report = analyze_documents(&docs, &EngineConfig::default());

    assert!(report.failures.is_empty());
    assert_eq!(report.trips.len(), 2);
    assert_eq!(report.trips[0].trip_id, "healthy");

    let cooling_fail = |trip: &str| {
        report.findings.iter().any(|f| {
            f.trip_id.as_deref() == Some(trip) && f.category == "Cooling System" && f.level == FindingLevel::Fail
        })
    };
    assert!(cooling_fail("overheat"), "findings: {:#?}", report.findings);
    assert!(!cooling_fail("healthy"));

    // Ranked most severe first
    let levels: Vec<_> = report.findings.iter().map(|f| f.level).collect();
    let mut sorted = levels.clone();
    sorted.sort();
    assert_eq!(levels, sorted);
}

#[test]
fn test_summary_fields_are_null_when_absent() {
    let docs = vec![Document::new("healthy", drive_log(90.0, 14.1))];
    let report = analyze_documents(&docs, &EngineConfig::default());
    let summary = &report.trips[0];

    assert!(summary.battery_min.is_some());
    assert!(summary.stft_avg.is_none(), "no fuel trim column in the log");
    assert!(summary.ltft_avg.is_none());
    let warmup = summary.warmup_to_80c_min.expect("engine warms up");
    // 25 + 0.15 t >= 80 at t ≈ 367 s
    assert!((warmup - 367.0 / 60.0).abs() < 1.0 / 60.0 + 1e-9, "warm-up {warmup}");
}

#[test]
fn test_weak_battery_is_reported() {
    let docs = vec![Document::new("flat", drive_log(90.0, 11.8))];
    let report = analyze_documents(&docs, &EngineConfig::default());
    assert!(report
        .findings
        .iter()
        .any(|f| f.category == "Electrical" && f.level != FindingLevel::Info));
}

#[test]
fn test_primary_entry_point_with_trip_cap() {
    let mut config = EngineConfig::default();
    config.limits.max_trips = 1;

    let docs: Vec<Document> = ["a", "b", "c"]
        .iter()
        .map(|label| Document::new(*label, drive_log(90.0, 14.1)))
        .collect();
    let ingest = ingest_batch(&docs, &config.limits);
    let trips = segment_trips(ingest.samples, &config.limits).trips;
    let summaries = summarize_trips(&trips);

    let findings = analyze_trips(&trips, &summaries, &config);
    let note = findings
        .iter()
        .find(|f| f.category == DATA_LIMITS_CATEGORY)
        .expect("data limits note");
    assert!(note.message.starts_with("2 trip(s)"));
    assert!(findings
        .iter()
        .filter_map(|f| f.trip_id.as_deref())
        .all(|t| t == "a"));
}

#[test]
fn test_trends_for_rising_coolant() {
    let docs = vec![Document::new("overheat", drive_log(118.0, 14.1))];
    let report = analyze_documents(&docs, &EngineConfig::default());
    let coolant = report
        .trends
        .iter()
        .find(|t| t.parameter_id == params::COOLANT_TEMP)
        .expect("coolant trend");
    assert!(coolant.slope > 0.0);
    assert_eq!(coolant.sample_count, 1200);
}
