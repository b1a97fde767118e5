//! Per-trip summary metrics

use serde::{Deserialize, Serialize};

/// Fixed-schema summary of one trip.
///
/// Every metric is optional: a parameter missing from the trip summarizes to
/// `None`, never to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub trip_id: String,
    /// Span between the earliest and latest sample (minutes)
    pub duration_min: Option<f64>,
    /// Vehicle speed (km/h)
    pub speed_avg: Option<f64>,
    pub speed_max: Option<f64>,
    /// Engine coolant temperature (°C)
    pub coolant_min: Option<f64>,
    pub coolant_max: Option<f64>,
    /// Minutes from trip start until coolant first reached 80 °C
    pub warmup_to_80c_min: Option<f64>,
    pub rpm_max: Option<f64>,
    /// Median mass air flow at idle (g/s)
    pub maf_idle_median: Option<f64>,
    /// Median mass air flow under load (g/s)
    pub maf_load_median: Option<f64>,
    /// Control module / battery voltage (V)
    pub battery_min: Option<f64>,
    pub battery_max: Option<f64>,
    /// Fuel trims, bank 1 (%)
    pub stft_avg: Option<f64>,
    pub ltft_avg: Option<f64>,
    /// Number of samples retained for the trip
    pub sample_count: usize,
}

impl TripSummary {
    /// Empty summary for a trip with no usable data
    pub fn empty(trip_id: impl Into<String>) -> Self {
        Self {
            trip_id: trip_id.into(),
            ..Default::default()
        }
    }
}
