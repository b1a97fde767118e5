//! OBDScope command line
//!
//! # Usage
//!
//! ```bash
//! # Analyze logs, directories of logs, or zip bundles
//! obdscope analyze trip1.csv logs/ bundle.zip
//!
//! # Machine-readable report
//! obdscope analyze logs/ --json > report.json
//!
//! # Print the effective configuration
//! obdscope config
//! ```
//!
//! # Environment Variables
//!
//! - `OBDSCOPE_CONFIG`: Path to a TOML configuration file
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use obdscope::engine::{analyze_documents, DiagnosticReport};
use obdscope::ingest::load_documents;
use obdscope::EngineConfig;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "obdscope")]
#[command(about = "Vehicle OBD log diagnostics")]
#[command(version)]
struct CliArgs {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze log files, directories or zip archives
    Analyze {
        /// Inputs: .csv / .txt / .tsv files, directories, .zip bundles
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Configuration file (overrides OBDSCOPE_CONFIG and ./obdscope.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Analyze trips in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load_from_file(p)
            .with_context(|| format!("loading configuration from {}", p.display())),
        None => Ok(EngineConfig::load()),
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ============================================================================
// Report Rendering
// ============================================================================

fn print_report(report: &DiagnosticReport) {
    println!("=== Trips ===");
    for trip in &report.trips {
        let fmt = |v: Option<f64>, unit: &str| v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}{unit}"));
        println!(
            "{:<24} {:>8}  speed avg {:>10}  coolant max {:>8}  warm-up {:>9}  battery min {:>7}",
            trip.trip_id,
            fmt(trip.duration_min, " min"),
            fmt(trip.speed_avg, " km/h"),
            fmt(trip.coolant_max, "°C"),
            fmt(trip.warmup_to_80c_min, " min"),
            fmt(trip.battery_min, " V"),
        );
    }

    println!();
    println!(
        "=== Findings: {} fail, {} warn, {} info ===",
        report.counts.fail, report.counts.warn, report.counts.info
    );
    for f in &report.findings {
        let trip = f.trip_id.as_deref().unwrap_or("-");
        println!("[{}] {:<20} {:<18} {}", f.level, f.category, trip, f.message);
        if let Some(detail) = &f.detail {
            println!("       {detail}");
        }
    }

    if !report.patterns.is_empty() {
        println!();
        println!("=== Fault Patterns ===");
        for p in &report.patterns {
            println!(
                "[{}] {} on {} ({:.0}% confidence): {} ({})",
                p.urgency,
                p.pattern,
                p.trip_id,
                p.confidence * 100.0,
                p.predicted_failure,
                p.time_to_failure
            );
        }
    }

    let predictions: Vec<_> = report.trends.iter().filter(|t| t.prediction.is_some()).collect();
    if !predictions.is_empty() {
        println!();
        println!("=== Trends ===");
        for t in predictions {
            println!(
                "{:<18} {:<36} {:<10} {}",
                t.trip_id,
                t.parameter_id,
                t.trend.to_string(),
                t.prediction.as_deref().unwrap_or_default()
            );
        }
    }

    if !report.failures.is_empty() || !report.notes.is_empty() {
        println!();
        println!("=== Notes ===");
        for failure in &report.failures {
            println!("skipped {}: {}", failure.label, failure.error);
        }
        for note in &report.notes {
            println!("{note}");
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    match args.command {
        Command::Analyze { paths, json, config, parallel } => {
            let mut config = load_config(config.as_ref())?;
            if parallel {
                config.analysis.parallel = true;
            }

            let (documents, load_failures) = load_documents(&paths, &config.limits);
            if documents.is_empty() {
                anyhow::bail!("no readable log documents among {} input path(s)", paths.len());
            }
            info!(documents = documents.len(), "Documents loaded");

            let mut report = analyze_documents(&documents, &config);
            for failure in &load_failures {
                warn!(document = %failure.label, error = %failure.error, "Document not loaded");
            }
            report.failures.splice(0..0, load_failures);

            if json {
                let text = serde_json::to_string_pretty(&report).context("serializing report")?;
                println!("{text}");
            } else {
                print_report(&report);
            }
        }
        Command::Config { config } => {
            let config = load_config(config.as_ref())?;
            print!("{}", config.to_toml().context("serializing configuration")?);
        }
    }
    Ok(())
}
