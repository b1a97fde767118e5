//! Parameter Canonicalizer
//!
//! Maps raw column / parameter names from heterogeneous logging tools onto the
//! fixed vocabulary in [`params`]. The mapping is open-world: an unknown name
//! passes through unchanged, so `canonicalize` is total and idempotent.
//!
//! Lookup keys are normalized (lower-cased, trimmed, `_` treated as a space,
//! runs of whitespace collapsed) and resolved through a hash table built once.
//! Companion functions classify a parameter into a [`ParameterCategory`] and
//! infer a display unit from substring heuristics.

pub mod params;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use params::*;

// ============================================================================
// Alias Table
// ============================================================================

/// (canonical id, raw aliases). Aliases are written in normalized form.
const ALIASES: &[(&str, &[&str])] = &[
    (ENGINE_RPM, &["rpm", "engine rpm", "engine speed", "enginerpm", "rpm engine", "0x0c", "010c"]),
    (VEHICLE_SPEED, &["speed", "vehicle speed", "speed obd", "speed (obd)", "obd speed", "vss", "vehicle speed sensor", "0x0d", "010d"]),
    (ENGINE_LOAD, &["load", "engine load", "calc load", "calculated load", "calculated load value", "0x04", "0104"]),
    (THROTTLE_POSITION, &["throttle", "throttle position", "throttle pos", "tps", "absolute throttle position", "relative throttle position", "0x11", "0111"]),
    (ACCELERATOR_POSITION, &["accelerator pedal position", "pedal position", "accelerator pedal position d", "app", "0x49", "0149"]),
    (ENGINE_RUN_TIME, &["run time", "engine run time", "runtime", "time since engine start", "0x1f", "011f"]),
    (COOLANT_TEMP, &["coolant", "coolant temp", "coolant temperature", "engine coolant temp", "engine coolant temperature", "ect", "water temp", "0x05", "0105"]),
    (INTAKE_AIR_TEMP, &["iat", "intake air temp", "intake temp", "intake air temperature", "0x0f", "010f"]),
    (AMBIENT_AIR_TEMP, &["ambient air temp", "ambient temp", "ambiant air temp", "outside temp", "outside air temperature", "0x46", "0146"]),
    (OIL_TEMP, &["oil temp", "engine oil temp", "oil temperature", "eot", "0x5c", "015c"]),
    (TRANS_FLUID_TEMP, &["transmission temp", "transmission fluid temp", "trans temp", "atf temp", "transmission temperature", "tft"]),
    (CATALYST_TEMP_B1S1, &["catalyst temp", "catalyst temperature", "cat temp", "catalyst temp b1s1", "catalyst temperature b1s1", "0x3c", "013c"]),
    (MAF, &["maf", "mass air flow", "maf rate", "maf air flow rate", "air flow rate", "0x10", "0110"]),
    (MAP, &["map", "manifold pressure", "intake manifold pressure", "intake pressure", "intake map", "0x0b", "010b"]),
    (BAROMETRIC_PRESSURE, &["baro", "baro pressure", "barometric", "barometric pressure from vehicle", "0x33", "0133"]),
    (BOOST_PRESSURE, &["boost", "turbo boost", "boost gauge", "turbo boost and vacuum gauge"]),
    (OIL_PRESSURE, &["oil pressure", "oil press", "eop"]),
    (TIMING_ADVANCE, &["timing", "timing advance", "ignition timing", "spark advance", "ignition advance", "0x0e", "010e"]),
    (KNOCK_RETARD, &["knock", "knock retard", "knock correction", "spark retard"]),
    (STFT_B1, &["stft", "stft1", "stft b1", "short term fuel trim", "short fuel trim 1", "short term fuel trim b1", "fuel trim short term bank 1", "0x06", "0106"]),
    (LTFT_B1, &["ltft", "ltft1", "ltft b1", "long term fuel trim", "long fuel trim 1", "long term fuel trim b1", "fuel trim long term bank 1", "0x07", "0107"]),
    (STFT_B2, &["stft2", "stft b2", "short fuel trim 2", "short term fuel trim b2", "fuel trim short term bank 2", "0x08", "0108"]),
    (LTFT_B2, &["ltft2", "ltft b2", "long fuel trim 2", "long term fuel trim b2", "fuel trim long term bank 2", "0x09", "0109"]),
    (FUEL_RAIL_PRESSURE, &["fuel pressure", "frp", "rail pressure", "fuel rail pressure direct", "fuel rail pressure (direct)", "0x23", "0123"]),
    (FUEL_LEVEL, &["fuel", "fuel level input", "fuel tank level", "fuel tank", "0x2f", "012f"]),
    (O2_B1S1, &["o2 b1s1", "o2 s1", "o2 sensor 1", "o2 bank 1 sensor 1", "o2 voltage b1s1", "upstream o2", "o2 sensor1", "0x14", "0114"]),
    (O2_B1S2, &["o2 b1s2", "o2 s2", "o2 sensor 2", "o2 bank 1 sensor 2", "o2 voltage b1s2", "downstream o2", "o2 sensor2", "0x15", "0115"]),
    (EQUIVALENCE_RATIO, &["lambda", "commanded lambda", "equivalence ratio", "commanded equivalence ratio lambda", "0x44", "0144"]),
    (COMMANDED_EGR, &["egr", "egr commanded", "commanded egr percent", "0x2c", "012c"]),
    (EGR_ERROR, &["egr err", "egr error percent", "0x2d", "012d"]),
    (EVAP_PURGE, &["purge", "evap purge", "commanded evap purge", "evaporative purge", "purge duty", "0x2e", "012e"]),
    (EVAP_VAPOR_PRESSURE, &["evap pressure", "evap vapor pressure", "evaporative system vapor pressure", "evap vp", "0x32", "0132"]),
    (DISTANCE_WITH_MIL, &["distance with mil on", "mil distance", "distance mil on", "0x21", "0121"]),
    (CONTROL_MODULE_VOLTAGE, &["voltage", "battery voltage", "battery", "module voltage", "ecu voltage", "voltage control module", "voltage (control module)", "obd voltage", "0x42", "0142"]),
    (CURRENT_GEAR, &["gear", "transmission gear", "gear position", "selected gear"]),
];

fn alias_table() -> &'static HashMap<String, &'static str> {
    static TABLE: OnceLock<HashMap<String, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::with_capacity(ALIASES.len() * 8);
        for (canonical, aliases) in ALIASES {
            for alias in *aliases {
                table.insert(normalize_key(alias), *canonical);
            }
        }
        // Identity entries last so a canonical id always maps to itself
        for canonical in ALL {
            table.insert(normalize_key(canonical), *canonical);
        }
        table
    })
}

/// Lower-case, trim, treat `_` as a space and collapse whitespace
fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Canonicalization
// ============================================================================

/// Map a raw parameter name onto its canonical id.
///
/// Unknown names are returned unchanged.
pub fn canonicalize(raw: &str) -> String {
    lookup(raw).map_or_else(|| raw.to_string(), str::to_string)
}

/// Canonical id for a raw name, if one is known
pub fn lookup(raw: &str) -> Option<&'static str> {
    alias_table().get(&normalize_key(raw)).copied()
}

/// True if `id` is part of the canonical vocabulary
pub fn is_canonical(id: &str) -> bool {
    ALL.contains(&id)
}

// ============================================================================
// Category & Unit Inference
// ============================================================================

/// Semantic grouping of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterCategory {
    Engine,
    FuelSystem,
    Emissions,
    Electrical,
    Temperature,
    Transmission,
    Vehicle,
    Other,
}

impl fmt::Display for ParameterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Engine => "Engine",
            Self::FuelSystem => "Fuel System",
            Self::Emissions => "Emissions",
            Self::Electrical => "Electrical",
            Self::Temperature => "Temperature",
            Self::Transmission => "Transmission",
            Self::Vehicle => "Vehicle",
            Self::Other => "Other",
        };
        write!(f, "{label}")
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Best-effort category of a (canonical or raw) parameter id
pub fn category(id: &str) -> ParameterCategory {
    let key = normalize_key(id);

    if contains_any(&key, &["temperature", "temp"]) {
        ParameterCategory::Temperature
    } else if contains_any(&key, &["fuel", "trim", "injector"]) {
        ParameterCategory::FuelSystem
    } else if contains_any(&key, &["o2", "oxygen", "catalyst", "egr", "evap", "purge", "equivalence", "lambda", "mil on"]) {
        ParameterCategory::Emissions
    } else if contains_any(&key, &["gear", "transmission", "clutch"]) {
        ParameterCategory::Transmission
    } else if contains_any(&key, &["voltage", "battery", "alternator"]) {
        ParameterCategory::Electrical
    } else if contains_any(&key, &["rpm", "load", "throttle", "timing", "knock", "air flow", "manifold", "boost", "oil", "barometric", "pedal", "run time"]) {
        ParameterCategory::Engine
    } else if contains_any(&key, &["speed", "distance", "odometer", "gps"]) {
        ParameterCategory::Vehicle
    } else {
        ParameterCategory::Other
    }
}

/// Best-effort display unit; empty when nothing matches
pub fn infer_unit(id: &str) -> &'static str {
    let key = normalize_key(id);

    if contains_any(&key, &["temperature", "temp"]) {
        "°C"
    } else if contains_any(&key, &["voltage", "battery"]) {
        "V"
    } else if key.contains("rpm") {
        "rpm"
    } else if key.contains("speed") {
        "km/h"
    } else if key.contains("air flow") {
        "g/s"
    } else if key.contains("vapor pressure") {
        "Pa"
    } else if key.contains("pressure") {
        "kPa"
    } else if contains_any(&key, &["timing", "advance", "retard"]) {
        "°"
    } else if contains_any(&key, &["equivalence", "lambda"]) {
        "λ"
    } else if contains_any(&key, &["trim", "position", "load", "level", "purge", "egr"]) {
        "%"
    } else if key.contains("distance") {
        "km"
    } else if key.contains("run time") {
        "s"
    } else {
        ""
    }
}
