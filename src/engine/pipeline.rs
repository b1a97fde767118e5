//! End-to-end pipeline: documents in, serializable report out

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::orchestrator::Orchestrator;
use super::ranking::{rank_findings, rank_patterns, LevelCounts};
use crate::config::EngineConfig;
use crate::ingest::{ingest_batch, Document, DocumentStats, FileFailure};
use crate::trend;
use crate::trips::{segment_trips, summarize_trips, Trip};
use crate::types::{Finding, PatternMatch, Sample, TrendSummary, TripSummary};

/// Everything one analysis run produces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub counts: LevelCounts,
    /// Ranked, most severe first
    pub findings: Vec<Finding>,
    pub trips: Vec<TripSummary>,
    pub trends: Vec<TrendSummary>,
    /// Ranked, most urgent first
    pub patterns: Vec<PatternMatch>,
    pub documents: Vec<DocumentStats>,
    pub failures: Vec<FileFailure>,
    /// Truncation and other non-fatal notes
    pub notes: Vec<String>,
}

/// Ranked findings for trips and their summaries
pub fn analyze_trips(trips: &[Trip], summaries: &[TripSummary], config: &EngineConfig) -> Vec<Finding> {
    rank_findings(Orchestrator::new(config).run(trips, summaries))
}

/// Trends and fault patterns for a flat sample collection, grouped by trip
pub fn analyze_trends(samples: Vec<Sample>, config: &EngineConfig) -> (Vec<TrendSummary>, Vec<PatternMatch>) {
    let segmentation = segment_trips(samples, &config.limits);
    trip_trends(&segmentation.trips, config)
}

fn trip_trends(trips: &[Trip], config: &EngineConfig) -> (Vec<TrendSummary>, Vec<PatternMatch>) {
    let processed = &trips[..trips.len().min(config.limits.max_trips)];
    let min = config.analysis.min_trend_samples;

    let per_trip: Vec<(Vec<TrendSummary>, Vec<PatternMatch>)> = if config.analysis.parallel {
        processed.par_iter().map(|t| trend::analyze_trip(t, min)).collect()
    } else {
        processed.iter().map(|t| trend::analyze_trip(t, min)).collect()
    };

    let mut trends = Vec::new();
    let mut patterns = Vec::new();
    for (t, p) in per_trip {
        trends.extend(t);
        patterns.extend(p);
    }
    (trends, patterns)
}

/// Ingest, segment, summarize, detect, rank and trend a batch of documents
pub fn analyze_documents(documents: &[Document], config: &EngineConfig) -> DiagnosticReport {
    let ingest = ingest_batch(documents, &config.limits);
    let segmentation = segment_trips(ingest.samples, &config.limits);
    let trips = segmentation.trips;
    let summaries = summarize_trips(&trips);

    let findings = analyze_trips(&trips, &summaries, config);
    let (trends, patterns) = trip_trends(&trips, config);

    let mut notes = ingest.notes;
    notes.extend(segmentation.notes);

    let report = DiagnosticReport {
        counts: LevelCounts::of(&findings),
        findings,
        trips: summaries,
        trends,
        patterns: rank_patterns(patterns),
        documents: ingest.documents,
        failures: ingest.failures,
        notes,
    };
    info!(
        documents = documents.len(),
        trips = report.trips.len(),
        findings = report.findings.len(),
        patterns = report.patterns.len(),
        "Analysis complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FindingLevel;
    use std::fmt::Write as _;

    fn hot_log() -> String {
        let mut text = String::from("Time (s),Engine RPM,Engine Coolant Temperature (°C)\n");
        for i in 0..600 {
            let _ = writeln!(text, "{i},{},{:.1}", 800 + (i % 7) * 10, 100.0 + f64::from(i) * 0.03);
        }
        text
    }

    #[test]
    fn test_documents_to_report() {
        let docs = vec![Document::new("hot", hot_log()), Document::new("junk", "")];
        let report = analyze_documents(&docs, &EngineConfig::default());

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].label, "junk");
        assert_eq!(report.trips.len(), 1);
        assert_eq!(report.findings[0].level, FindingLevel::Fail);
        assert!(report.findings.iter().any(|f| f.category == "Cooling System"));
        assert!(report.patterns.iter().any(|p| p.pattern == "Head gasket failure"));
        assert_eq!(report.counts.total(), report.findings.len());
    }

    #[test]
    fn test_report_serializes() {
        let report = analyze_documents(&[Document::new("hot", hot_log())], &EngineConfig::default());
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"level\":\"fail\""));
    }
}
