//! Canonical parameter identifiers
//!
//! The fixed vocabulary every raw column name is mapped onto. Detectors,
//! summaries and the pattern engine refer to parameters only through these.

pub const ENGINE_RPM: &str = "Engine RPM";
pub const VEHICLE_SPEED: &str = "Vehicle speed";
pub const ENGINE_LOAD: &str = "Calculated engine load";
pub const THROTTLE_POSITION: &str = "Throttle position";
pub const ACCELERATOR_POSITION: &str = "Accelerator pedal position";
pub const ENGINE_RUN_TIME: &str = "Run time since engine start";

// Temperatures (°C)
pub const COOLANT_TEMP: &str = "Engine coolant temperature";
pub const INTAKE_AIR_TEMP: &str = "Intake air temperature";
pub const AMBIENT_AIR_TEMP: &str = "Ambient air temperature";
pub const OIL_TEMP: &str = "Engine oil temperature";
pub const TRANS_FLUID_TEMP: &str = "Transmission fluid temperature";
pub const CATALYST_TEMP_B1S1: &str = "Catalyst temperature bank 1 sensor 1";

// Air path
pub const MAF: &str = "Mass air flow rate";
pub const MAP: &str = "Intake manifold absolute pressure";
pub const BAROMETRIC_PRESSURE: &str = "Barometric pressure";
pub const BOOST_PRESSURE: &str = "Boost pressure";
pub const OIL_PRESSURE: &str = "Engine oil pressure";

// Ignition
pub const TIMING_ADVANCE: &str = "Ignition timing advance";
pub const KNOCK_RETARD: &str = "Knock retard";

// Fuel system
pub const STFT_B1: &str = "Short term fuel trim bank 1";
pub const LTFT_B1: &str = "Long term fuel trim bank 1";
pub const STFT_B2: &str = "Short term fuel trim bank 2";
pub const LTFT_B2: &str = "Long term fuel trim bank 2";
pub const FUEL_RAIL_PRESSURE: &str = "Fuel rail pressure";
pub const FUEL_LEVEL: &str = "Fuel level";

// Emissions
pub const O2_B1S1: &str = "O2 sensor voltage bank 1 sensor 1";
pub const O2_B1S2: &str = "O2 sensor voltage bank 1 sensor 2";
pub const EQUIVALENCE_RATIO: &str = "Commanded equivalence ratio";
pub const COMMANDED_EGR: &str = "Commanded EGR";
pub const EGR_ERROR: &str = "EGR error";
pub const EVAP_PURGE: &str = "Commanded evaporative purge";
pub const EVAP_VAPOR_PRESSURE: &str = "Evap system vapor pressure";
pub const DISTANCE_WITH_MIL: &str = "Distance traveled with MIL on";

// Electrical / driveline
pub const CONTROL_MODULE_VOLTAGE: &str = "Control module voltage";
pub const CURRENT_GEAR: &str = "Current gear";

/// Every canonical id
pub const ALL: &[&str] = &[
    ENGINE_RPM,
    VEHICLE_SPEED,
    ENGINE_LOAD,
    THROTTLE_POSITION,
    ACCELERATOR_POSITION,
    ENGINE_RUN_TIME,
    COOLANT_TEMP,
    INTAKE_AIR_TEMP,
    AMBIENT_AIR_TEMP,
    OIL_TEMP,
    TRANS_FLUID_TEMP,
    CATALYST_TEMP_B1S1,
    MAF,
    MAP,
    BAROMETRIC_PRESSURE,
    BOOST_PRESSURE,
    OIL_PRESSURE,
    TIMING_ADVANCE,
    KNOCK_RETARD,
    STFT_B1,
    LTFT_B1,
    STFT_B2,
    LTFT_B2,
    FUEL_RAIL_PRESSURE,
    FUEL_LEVEL,
    O2_B1S1,
    O2_B1S2,
    EQUIVALENCE_RATIO,
    COMMANDED_EGR,
    EGR_ERROR,
    EVAP_PURGE,
    EVAP_VAPOR_PRESSURE,
    DISTANCE_WITH_MIL,
    CONTROL_MODULE_VOLTAGE,
    CURRENT_GEAR,
];
