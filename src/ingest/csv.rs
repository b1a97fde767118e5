//! Delimited-text plumbing: quote-aware field splitting, header parsing with
//! embedded units, and unit normalization.

use regex::Regex;
use std::sync::OnceLock;

use crate::canonical;

// ============================================================================
// Quote-Aware Splitting
// ============================================================================

/// Split a line on `delimiter`, respecting quoted fields.
/// Returns owned strings because quoted fields need unquoting.
pub fn csv_split(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Pick the delimiter from the header line: comma unless the header has
/// none and uses semicolons or tabs instead.
pub fn detect_delimiter(header: &str) -> char {
    if header.contains(',') {
        ','
    } else if header.contains(';') {
        ';'
    } else if header.contains('\t') {
        '\t'
    } else {
        ','
    }
}

// ============================================================================
// Header Parsing
// ============================================================================

/// A header cell split into parameter name and unit
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderField {
    /// Header text as written (trimmed)
    pub raw: String,
    /// Name with any unit suffix removed
    pub name: String,
    /// Unit suffix, e.g. `rpm` from `Engine RPM (rpm)`
    pub unit: Option<String>,
}

fn unit_suffix_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)\s*[\(\[]\s*([^\)\]]*?)\s*[\)\]]\s*$").ok())
        .as_ref()
}

/// Parse `Name (unit)` / `Name [unit]` header cells.
///
/// A header whose full text is already a known parameter name is not split,
/// so `Speed (OBD)` stays one name.
pub fn parse_header_field(cell: &str) -> HeaderField {
    let raw = cell.trim().trim_start_matches('\u{feff}').trim().to_string();

    if canonical::lookup(&raw).is_some() {
        return HeaderField { name: raw.clone(), raw, unit: None };
    }

    if let Some(caps) = unit_suffix_re().and_then(|re| re.captures(&raw)) {
        let name = caps.get(1).map_or("", |m| m.as_str()).trim();
        let unit = caps.get(2).map_or("", |m| m.as_str()).trim();
        if !name.is_empty() {
            return HeaderField {
                name: name.to_string(),
                unit: (!unit.is_empty()).then(|| unit.to_string()),
                raw: raw.clone(),
            };
        }
    }

    HeaderField { name: raw.clone(), raw, unit: None }
}

// ============================================================================
// Numbers
// ============================================================================

/// Which character separates the fractional part of a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalMark {
    /// `1,234.5`
    Point,
    /// `1.234,5` (semicolon-delimited European exports)
    Comma,
}

impl DecimalMark {
    /// Semicolon-delimited documents use the decimal comma
    pub const fn for_delimiter(delimiter: char) -> Self {
        if delimiter == ';' {
            Self::Comma
        } else {
            Self::Point
        }
    }
}

/// `12,5` / `-0,75`: a comma followed by one or two digits is never a
/// thousands group
fn decimal_comma_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-+]?\d+,\d{1,2}$").ok()).as_ref()
}

fn is_group_separator(c: char) -> bool {
    matches!(c, '_' | ' ' | '\u{a0}' | '\u{202f}')
}

/// Parse a numeric cell written with a decimal point.
///
/// Tolerates thousands separators (`,`, `_`, spaces), surrounding quotes and
/// a trailing `%`. Empty cells and `-`, `nan`, `null`, `n/a` map to `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    parse_number_with(raw, DecimalMark::Point)
}

/// Parse a numeric cell under the document's decimal convention.
///
/// With [`DecimalMark::Comma`] a cell containing `,` reads `.` as the
/// thousands separator; a cell with only `.` keeps it as the decimal point.
pub fn parse_number_with(raw: &str, mark: DecimalMark) -> Option<f64> {
    let s = raw.trim().trim_matches('"').trim();
    if s.is_empty()
        || s == "-"
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("null")
        || s.eq_ignore_ascii_case("n/a")
    {
        return None;
    }
    let s = s.trim_end_matches('%').trim_end();

    let comma_is_decimal = match mark {
        DecimalMark::Comma => s.contains(','),
        DecimalMark::Point => decimal_comma_re().is_some_and(|re| re.is_match(s)),
    };
    let cleaned: String = if comma_is_decimal {
        s.chars()
            .filter(|c| *c != '.' && !is_group_separator(*c))
            .map(|c| if c == ',' { '.' } else { c })
            .collect()
    } else {
        s.chars().filter(|c| *c != ',' && !is_group_separator(*c)).collect()
    };
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ============================================================================
// Unit Normalization
// ============================================================================

/// Conversion from a logged unit to the unit detectors expect
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitConversion {
    Identity,
    Scale(f64),
    FahrenheitToCelsius,
}

impl UnitConversion {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Identity => value,
            Self::Scale(k) => value * k,
            Self::FahrenheitToCelsius => (value - 32.0) * 5.0 / 9.0,
        }
    }
}

/// Miles to kilometres
const MPH_TO_KMH: f64 = 1.609_344;
/// Pounds per square inch to kilopascals
const PSI_TO_KPA: f64 = 6.894_757;
/// Inches of mercury to kilopascals
const INHG_TO_KPA: f64 = 3.386_389;
/// Pounds per minute to grams per second
const LBMIN_TO_GS: f64 = 7.559_873;

/// Map a logged unit onto (normalized unit, conversion).
///
/// Unknown units are kept as written with no conversion.
pub fn normalize_unit(unit: &str) -> (String, UnitConversion) {
    let key = unit.trim().to_lowercase().replace(' ', "");
    let (canonical, conversion) = match key.as_str() {
        "°f" | "f" | "degf" | "ºf" | "fahrenheit" => ("°C", UnitConversion::FahrenheitToCelsius),
        "°c" | "c" | "degc" | "ºc" | "celsius" => ("°C", UnitConversion::Identity),
        "mph" => ("km/h", UnitConversion::Scale(MPH_TO_KMH)),
        "km/h" | "kph" | "kmh" | "kmph" => ("km/h", UnitConversion::Identity),
        "psi" => ("kPa", UnitConversion::Scale(PSI_TO_KPA)),
        "bar" => ("kPa", UnitConversion::Scale(100.0)),
        "inhg" => ("kPa", UnitConversion::Scale(INHG_TO_KPA)),
        "kpa" => ("kPa", UnitConversion::Identity),
        "lb/min" => ("g/s", UnitConversion::Scale(LBMIN_TO_GS)),
        "g/s" | "gps" => ("g/s", UnitConversion::Identity),
        "v" | "volt" | "volts" => ("V", UnitConversion::Identity),
        "rpm" | "r/min" => ("rpm", UnitConversion::Identity),
        "%" | "percent" => ("%", UnitConversion::Identity),
        _ => return (unit.trim().to_string(), UnitConversion::Identity),
    };
    (canonical.to_string(), conversion)
}
