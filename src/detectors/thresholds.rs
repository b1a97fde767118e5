//! Fixed detector thresholds.
//!
//! Calibrated for typical petrol passenger vehicles. These are reproducible
//! constants, not tunables: changing one changes which findings a log
//! produces.

// ============================================================================
// Operating States
// ============================================================================

/// Engine considered running above this RPM
pub const RUNNING_RPM: f64 = 500.0;

/// Vehicle considered stationary at or below this speed (km/h)
pub const STATIONARY_KMH: f64 = 2.0;

/// Idle RPM window used to pick idle samples
pub const IDLE_RPM_MIN: f64 = 400.0;
pub const IDLE_RPM_MAX: f64 = 1500.0;

/// Cruise: steady road speed (km/h)
pub const CRUISE_SPEED_MIN_KMH: f64 = 60.0;
pub const CRUISE_SPEED_MAX_KMH: f64 = 120.0;

/// Engine load treated as heavy (%)
pub const HIGH_LOAD_PCT: f64 = 70.0;

/// Coolant temperature after which the engine is considered warm (°C)
pub const WARM_ENGINE_C: f64 = 70.0;

/// Minimum qualifying points for a conditional statistic
pub const MIN_CONDITIONAL_POINTS: usize = 10;

// ============================================================================
// Engine
// ============================================================================

pub const RPM_MAX_WARN: f64 = 6_500.0;
pub const RPM_MAX_FAIL: f64 = 7_200.0;

/// Idle RPM standard deviation (rough idle)
pub const IDLE_RPM_STDDEV_WARN: f64 = 50.0;
pub const IDLE_RPM_STDDEV_FAIL: f64 = 100.0;

/// Mean idle RPM bounds
pub const IDLE_RPM_LOW_WARN: f64 = 600.0;
pub const IDLE_RPM_LOW_FAIL: f64 = 500.0;
pub const IDLE_RPM_HIGH_WARN: f64 = 1_000.0;

/// Share of samples above `HEAVY_LOAD_PCT`
pub const HEAVY_LOAD_PCT: f64 = 85.0;
pub const HEAVY_LOAD_SHARE_INFO: f64 = 0.2;
pub const HEAVY_LOAD_SHARE_WARN: f64 = 0.4;

/// Stall: RPM falls from running to below this, then recovers
pub const STALL_RPM: f64 = 100.0;
pub const STALLS_WARN: usize = 1;
pub const STALLS_FAIL: usize = 3;

/// Oil pressure above 1500 rpm, 10th percentile (kPa)
pub const OIL_PRESSURE_RPM: f64 = 1_500.0;
pub const OIL_PRESSURE_WARN_KPA: f64 = 140.0;
pub const OIL_PRESSURE_FAIL_KPA: f64 = 100.0;

pub const OIL_TEMP_WARN_C: f64 = 130.0;
pub const OIL_TEMP_FAIL_C: f64 = 145.0;

// ============================================================================
// Cooling
// ============================================================================

/// Mean coolant temperature (°C)
pub const COOLANT_MEAN_WARN_C: f64 = 95.0;
pub const COOLANT_MEAN_FAIL_C: f64 = 105.0;

/// Peak coolant temperature (°C)
pub const COOLANT_PEAK_WARN_C: f64 = 104.0;
pub const COOLANT_PEAK_FAIL_C: f64 = 110.0;

/// Coolant standard deviation once warm (°C)
pub const COOLANT_CYCLING_STDDEV_C: f64 = 8.0;

/// Minutes to reach 80 °C from a cold start
pub const WARMUP_SLOW_WARN_MIN: f64 = 15.0;
pub const WARMUP_SLOW_FAIL_MIN: f64 = 25.0;
/// A start counts as cold below this coolant temperature (°C)
pub const COLD_START_C: f64 = 50.0;

/// Thermostat stuck open: long trip that never gets warm
pub const THERMOSTAT_MIN_TRIP_MIN: f64 = 20.0;
pub const THERMOSTAT_MAX_COOLANT_C: f64 = 75.0;

// ============================================================================
// Fuel
// ============================================================================

/// |mean| fuel trim (%)
pub const TRIM_WARN_PCT: f64 = 10.0;
pub const TRIM_FAIL_PCT: f64 = 20.0;

/// |mean| short + long term trim (%)
pub const TOTAL_TRIM_WARN_PCT: f64 = 15.0;
pub const TOTAL_TRIM_FAIL_PCT: f64 = 25.0;

/// |LTFT bank 1 - LTFT bank 2| (%)
pub const BANK_IMBALANCE_WARN_PCT: f64 = 8.0;
pub const BANK_IMBALANCE_FAIL_PCT: f64 = 15.0;

/// STFT standard deviation (unstable closed loop)
pub const STFT_STDDEV_WARN_PCT: f64 = 10.0;

/// Mean STFT under heavy load (fuel delivery)
pub const LOAD_STFT_WARN_PCT: f64 = 15.0;

/// Rail pressure minimum relative to its median
pub const RAIL_SAG_WARN_RATIO: f64 = 0.7;
pub const RAIL_SAG_FAIL_RATIO: f64 = 0.5;

// ============================================================================
// Emissions
// ============================================================================

/// Narrowband O2 switching point (V)
pub const O2_SWITCH_V: f64 = 0.45;
/// Upstream O2 voltage range (V)
pub const O2_STUCK_RANGE_V: f64 = 0.1;
/// Upstream switches per minute
pub const O2_SLOW_SWITCH_PER_MIN: f64 = 3.0;

/// Downstream / upstream switch ratio (catalyst efficiency)
pub const CAT_RATIO_WARN: f64 = 0.7;
pub const CAT_RATIO_FAIL: f64 = 0.9;
pub const CAT_MIN_UPSTREAM_SWITCHES: usize = 10;

/// Mean |EGR error| (%)
pub const EGR_ERROR_WARN_PCT: f64 = 15.0;
pub const EGR_ERROR_FAIL_PCT: f64 = 30.0;

/// Catalyst temperature (°C)
pub const CAT_TEMP_WARN_C: f64 = 900.0;
pub const CAT_TEMP_FAIL_C: f64 = 1_000.0;

/// Distance with MIL lit (km)
pub const MIL_DISTANCE_FAIL_KM: f64 = 100.0;

/// Commanded rich (λ below this) share
pub const RICH_LAMBDA: f64 = 0.9;
pub const RICH_SHARE_INFO: f64 = 0.25;

// ============================================================================
// Transmission
// ============================================================================

pub const TRANS_TEMP_WARN_C: f64 = 110.0;
pub const TRANS_TEMP_FAIL_C: f64 = 125.0;

/// Gear changes per minute
pub const GEAR_CHANGES_WARN_PER_MIN: f64 = 6.0;
pub const GEAR_CHANGES_FAIL_PER_MIN: f64 = 12.0;

/// Coefficient of variation of RPM/speed within one gear
pub const GEAR_RATIO_CV_WARN: f64 = 0.08;
pub const GEAR_RATIO_CV_FAIL: f64 = 0.15;
/// Speed floor for gear-ratio checks (km/h)
pub const GEAR_RATIO_MIN_KMH: f64 = 20.0;

/// RPM flare: single-step rise with near-constant speed
pub const FLARE_RPM_STEP: f64 = 800.0;
pub const FLARE_MAX_SPEED_STEP_KMH: f64 = 2.0;
pub const FLARES_WARN: usize = 3;

// ============================================================================
// Electrical
// ============================================================================

/// Mean voltage while running (V)
pub const CHARGING_LOW_WARN_V: f64 = 13.2;
pub const CHARGING_LOW_FAIL_V: f64 = 12.6;

/// Peak voltage while running (V)
pub const CHARGING_HIGH_WARN_V: f64 = 14.8;
pub const CHARGING_HIGH_FAIL_V: f64 = 15.5;

/// Minimum voltage anywhere in the trip (V)
pub const BATTERY_MIN_WARN_V: f64 = 11.5;
pub const BATTERY_MIN_FAIL_V: f64 = 10.5;

/// Voltage standard deviation while running (V)
pub const RIPPLE_WARN_V: f64 = 0.3;
pub const RIPPLE_FAIL_V: f64 = 0.5;

// ============================================================================
// Induction
// ============================================================================

/// Median MAF under heavy load (g/s)
pub const RESTRICTION_MAF_WARN_GS: f64 = 15.0;
pub const RESTRICTION_MAF_FAIL_GS: f64 = 8.0;

/// Idle MAF median (g/s)
pub const IDLE_MAF_WARN_GS: f64 = 3.0;
pub const IDLE_MAF_FAIL_GS: f64 = 2.0;

/// Pearson r between MAF and RPM
pub const MAF_RPM_R_WARN: f64 = 0.5;
pub const MAF_RPM_R_FAIL: f64 = 0.2;

/// Peak boost (kPa gauge)
pub const OVERBOOST_WARN_KPA: f64 = 180.0;
pub const OVERBOOST_FAIL_KPA: f64 = 220.0;

/// Median boost under heavy load (kPa gauge)
pub const UNDERBOOST_WARN_KPA: f64 = 30.0;
pub const UNDERBOOST_FAIL_KPA: f64 = 10.0;

/// Mean MAP at idle (kPa); high means weak vacuum
pub const IDLE_MAP_WARN_KPA: f64 = 50.0;
pub const IDLE_MAP_FAIL_KPA: f64 = 65.0;

/// Mean intake air temperature (°C)
pub const IAT_WARN_C: f64 = 60.0;
pub const IAT_FAIL_C: f64 = 75.0;

// ============================================================================
// Ignition
// ============================================================================

/// Mean timing advance at cruise (° BTDC)
pub const CRUISE_TIMING_WARN_DEG: f64 = 15.0;
pub const CRUISE_TIMING_FAIL_DEG: f64 = 8.0;

/// Peak knock retard (°)
pub const KNOCK_RETARD_WARN_DEG: f64 = 4.0;
pub const KNOCK_RETARD_FAIL_DEG: f64 = 8.0;

/// Timing standard deviation at idle (°)
pub const IDLE_TIMING_STDDEV_WARN_DEG: f64 = 5.0;

/// Drop below the 5-sample moving average counted as a timing pull (°)
pub const TIMING_PULL_DEG: f64 = 8.0;
pub const TIMING_PULLS_WARN: usize = 5;
pub const TIMING_PULLS_FAIL: usize = 20;

// ============================================================================
// EVAP
// ============================================================================

/// |mean| vapor pressure (Pa)
pub const EVAP_PRESSURE_WARN_PA: f64 = 2_500.0;
pub const EVAP_PRESSURE_FAIL_PA: f64 = 5_000.0;

/// Purge considered active above this duty (%)
pub const PURGE_ACTIVE_PCT: f64 = 10.0;

/// STFT shift when purge opens (%)
pub const PURGE_STFT_SHIFT_PCT: f64 = 10.0;

/// Vapor pressure during purge that shows no vacuum (Pa)
pub const PURGE_NO_VACUUM_PA: f64 = -100.0;

// ============================================================================
// Data Integrity
// ============================================================================

/// Share of backward time steps that escalates to a warning
pub const BACKWARD_SHARE_WARN: f64 = 0.1;

/// Speed change within one second that no road vehicle achieves (km/h)
pub const IMPOSSIBLE_SPEED_STEP_KMH: f64 = 40.0;
pub const IMPOSSIBLE_STEPS_FAIL: usize = 3;

/// Gap between consecutive samples flagged as a logging interruption (s)
pub const LOGGING_GAP_S: f64 = 300.0;

// ============================================================================
// Sensor Health
// ============================================================================

/// Readings needed before a flat line is suspicious
pub const FLATLINE_MIN_SAMPLES: usize = 60;

/// Share of readings outside plausible bounds
pub const OUT_OF_RANGE_FAIL_SHARE: f64 = 0.05;

/// Share of empty readings
pub const MISSING_INFO_SHARE: f64 = 0.2;
pub const MISSING_WARN_SHARE: f64 = 0.5;
pub const MISSING_MIN_SAMPLES: usize = 20;

/// Coolant vs intake air disagreement on a cold start (°C)
pub const COLD_START_SENSOR_DELTA_C: f64 = 15.0;

// ============================================================================
// Driving Behavior
// ============================================================================

/// Acceleration / braking per second (km/h/s)
pub const HARSH_ACCEL_KMH_S: f64 = 12.0;
pub const HARSH_BRAKE_KMH_S: f64 = 15.0;
pub const HARSH_EVENTS_INFO: usize = 3;
pub const HARSH_EVENTS_WARN: usize = 10;

/// Share of running samples spent idling
pub const IDLING_SHARE_INFO: f64 = 0.3;
pub const IDLING_SHARE_WARN: f64 = 0.5;

/// High RPM before the engine is warm
pub const COLD_REV_RPM: f64 = 4_000.0;
pub const COLD_REV_COOLANT_C: f64 = 60.0;
pub const COLD_REVS_WARN: usize = 5;

/// Speed (km/h)
pub const SPEED_MAX_WARN_KMH: f64 = 160.0;

/// Trip too short to reach operating temperature
pub const SHORT_TRIP_MIN: f64 = 10.0;
