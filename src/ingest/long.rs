//! Long layout: explicit parameter / value columns, one sample per row

use tracing::warn;

use super::csv::{csv_split, normalize_unit, parse_number_with, DecimalMark, UnitConversion};
use super::{LogFormat, ParsedDocument, TimeSource};
use crate::canonical;
use crate::config::LimitsConfig;
use crate::types::Sample;

/// Column positions of a long document
pub(super) struct LongColumns {
    pub time: TimeSource,
    pub parameter: usize,
    pub value: usize,
    pub unit: Option<usize>,
}

pub(super) fn parse_rows<'a, I>(
    lines: I,
    delimiter: char,
    columns: &LongColumns,
    label: &str,
    limits: &LimitsConfig,
) -> ParsedDocument
where
    I: Iterator<Item = &'a str>,
{
    let mut samples = Vec::new();
    let mut notes = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_skipped = 0usize;
    let decimal = DecimalMark::for_delimiter(delimiter);

    for line in lines {
        if rows_read >= limits.max_rows_per_file {
            warn!(document = %label, cap = limits.max_rows_per_file, "Row cap reached, truncating");
            notes.push(format!("{label}: truncated after {} rows", limits.max_rows_per_file));
            break;
        }
        let row = rows_read;
        rows_read += 1;

        let fields = csv_split(line, delimiter);
        let time = columns.time.read(&fields, row);
        let raw_name = fields.get(columns.parameter).map(|s| s.trim()).unwrap_or_default();
        let (Some(time), false) = (time, raw_name.is_empty()) else {
            rows_skipped += 1;
            continue;
        };

        let parameter_id = canonical::canonicalize(raw_name);
        let logged_unit = columns
            .unit
            .and_then(|i| fields.get(i))
            .map(|u| u.trim())
            .filter(|u| !u.is_empty());

        let (unit, conversion) = match logged_unit {
            Some(raw) => {
                let (unit, conversion) = normalize_unit(raw);
                (Some(unit), conversion)
            }
            None => {
                let inferred = canonical::infer_unit(&parameter_id);
                ((!inferred.is_empty()).then(|| inferred.to_string()), UnitConversion::Identity)
            }
        };

        let value = fields
            .get(columns.value)
            .and_then(|cell| parse_number_with(cell, decimal))
            .map(|v| conversion.apply(v));

        samples.push(Sample::new(time, parameter_id, value, unit, label));
    }

    ParsedDocument {
        label: label.to_string(),
        format: LogFormat::Long,
        samples,
        rows_read,
        rows_skipped,
        notes,
    }
}
