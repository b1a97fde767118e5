//! Wide layout: one time column plus one column per parameter

use tracing::warn;

use super::csv::{csv_split, normalize_unit, parse_number_with, DecimalMark, HeaderField, UnitConversion};
use super::{IngestError, LogFormat, ParsedDocument, TimeSource};
use crate::canonical;
use crate::config::LimitsConfig;
use crate::types::Sample;

/// A value column resolved to its canonical parameter
struct ValueColumn {
    index: usize,
    parameter_id: String,
    unit: Option<String>,
    conversion: UnitConversion,
}

impl ValueColumn {
    fn from_header(index: usize, header: &HeaderField) -> Self {
        let parameter_id = canonical::canonicalize(&header.name);
        let (unit, conversion) = match header.unit.as_deref() {
            Some(raw) => {
                let (unit, conversion) = normalize_unit(raw);
                (Some(unit), conversion)
            }
            None => {
                let inferred = canonical::infer_unit(&parameter_id);
                ((!inferred.is_empty()).then(|| inferred.to_string()), UnitConversion::Identity)
            }
        };
        Self { index, parameter_id, unit, conversion }
    }
}

pub(super) fn parse_rows<'a, I>(
    lines: I,
    delimiter: char,
    headers: &[HeaderField],
    time: TimeSource,
    label: &str,
    limits: &LimitsConfig,
) -> Result<ParsedDocument, IngestError>
where
    I: Iterator<Item = &'a str>,
{
    let mut notes = Vec::new();
    let decimal = DecimalMark::for_delimiter(delimiter);
    let time_col = time.index();

    let candidates: Vec<(usize, &HeaderField)> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| Some(*i) != time_col && !h.name.is_empty())
        .collect();
    if candidates.is_empty() {
        return Err(IngestError::NoValueColumns { label: label.to_string() });
    }
    if candidates.len() > limits.max_columns_per_file {
        warn!(document = %label, columns = candidates.len(), cap = limits.max_columns_per_file, "Column cap reached");
        notes.push(format!(
            "{label}: {} value columns truncated to {}",
            candidates.len(),
            limits.max_columns_per_file
        ));
    }
    let columns: Vec<ValueColumn> = candidates
        .into_iter()
        .take(limits.max_columns_per_file)
        .map(|(i, h)| ValueColumn::from_header(i, h))
        .collect();

    let mut samples = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_skipped = 0usize;

    for line in lines {
        if rows_read >= limits.max_rows_per_file {
            warn!(document = %label, cap = limits.max_rows_per_file, "Row cap reached, truncating");
            notes.push(format!("{label}: truncated after {} rows", limits.max_rows_per_file));
            break;
        }
        let row = rows_read;
        rows_read += 1;

        let fields = csv_split(line, delimiter);
        let Some(at) = time.read(&fields, row) else {
            rows_skipped += 1;
            continue;
        };

        for col in &columns {
            let value = fields
                .get(col.index)
                .and_then(|cell| parse_number_with(cell, decimal))
                .map(|v| col.conversion.apply(v));
            samples.push(Sample::new(at, col.parameter_id.clone(), value, col.unit.clone(), label));
        }
    }

    Ok(ParsedDocument {
        label: label.to_string(),
        format: LogFormat::Wide,
        samples,
        rows_read,
        rows_skipped,
        notes,
    })
}
