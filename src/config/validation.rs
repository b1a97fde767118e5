//! Unknown-key detection for config files.
//!
//! `EngineConfig` has exactly two sections, `[limits]` and `[analysis]`, each
//! a flat table of scalars. The raw TOML is checked against that shape before
//! serde sees it; every stray section or field produces a warning. Warnings
//! never reject a config.

use std::fmt;

/// A non-fatal config warning.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown config key '{}'", self.field)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

/// Section name and its fields, maintained alongside `engine_config.rs`.
const SCHEMA: &[(&str, &[&str])] = &[
    (
        "limits",
        &[
            "max_rows_per_file",
            "max_columns_per_file",
            "max_bytes_per_file",
            "max_samples_per_trip",
            "max_trips",
        ],
    ),
    ("analysis", &["parallel", "min_trend_samples"]),
];

/// Candidate sharing the longest leading run with `unknown`, if at least
/// half of the candidate matches.
fn closest<'a>(unknown: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .filter_map(|c| {
            let shared = unknown.chars().zip(c.chars()).take_while(|(a, b)| a == b).count();
            (shared * 2 >= c.len().max(1)).then_some((shared, c))
        })
        .max_by_key(|(shared, c)| (*shared, std::cmp::Reverse(*c)))
        .map(|(_, c)| c)
}

fn unknown_section(name: &str) -> ValidationWarning {
    ValidationWarning {
        field: name.to_string(),
        suggestion: closest(name, SCHEMA.iter().map(|(section, _)| *section)).map(str::to_string),
    }
}

fn unknown_field(section: &str, fields: &[&str], name: &str) -> ValidationWarning {
    ValidationWarning {
        field: format!("{section}.{name}"),
        suggestion: closest(name, fields.iter().copied()).map(|f| format!("{section}.{f}")),
    }
}

/// Warnings for sections and fields `EngineConfig` does not know.
///
/// Returns nothing for unparsable TOML; serde reports that error later. A
/// known section holding a non-table is also left to serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(root) = raw_toml.parse::<toml::Table>() else {
        return Vec::new();
    };

    let mut warnings = Vec::new();
    for (name, value) in &root {
        let Some((section, fields)) = SCHEMA.iter().find(|(section, _)| *section == name.as_str()) else {
            warnings.push(unknown_section(name));
            continue;
        };
        let Some(table) = value.as_table() else {
            continue;
        };
        warnings.extend(
            table
                .keys()
                .filter(|key| !fields.contains(&key.as_str()))
                .map(|key| unknown_field(section, fields, key)),
        );
    }
    warnings
}
