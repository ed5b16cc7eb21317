//! Telemetry Snapshot

use serde::{Deserialize, Serialize};

/// Wire names of the telemetry fields
pub mod field {
    pub const VEHICLE_AGE: &str = "Vehicle_Age_Years";
    pub const ODOMETER: &str = "Odometer_Reading_km";
    pub const AMBIENT_TEMP: &str = "Ambient_Temperature_C";
    pub const ENGINE_TEMP: &str = "Engine_Temp_C";
    pub const ENGINE_RPM: &str = "Engine_RPM";
    pub const OIL_PRESSURE: &str = "Oil_Pressure_psi";
    pub const COOLANT_LEVEL: &str = "Coolant_Level_pct";
    pub const BATTERY_VOLTAGE: &str = "Battery_Voltage_V";
    pub const MASS_AIRFLOW: &str = "Mass_Airflow_Rate_gs";
    pub const THROTTLE_POSITION: &str = "Throttle_Position_pct";
    pub const BRAKE_PAD_WEAR: &str = "Brake_Pad_Wear_pct";
    pub const TIRE_PRESSURE: &str = "Tire_Pressure_psi";
    pub const VIBRATION: &str = "Vibration_Level_mm_s";
    pub const FUEL_CONSUMPTION: &str = "Fuel_Consumption_L_100km";
    pub const BRAND: &str = "brand";
}

/// Every numeric field a request must carry, in parse order
pub const REQUIRED_FIELDS: [&str; 14] = [
    field::VEHICLE_AGE,
    field::ODOMETER,
    field::ENGINE_TEMP,
    field::AMBIENT_TEMP,
    field::ENGINE_RPM,
    field::OIL_PRESSURE,
    field::COOLANT_LEVEL,
    field::BATTERY_VOLTAGE,
    field::MASS_AIRFLOW,
    field::THROTTLE_POSITION,
    field::BRAKE_PAD_WEAR,
    field::TIRE_PRESSURE,
    field::VIBRATION,
    field::FUEL_CONSUMPTION,
];

/// A single validated telemetry reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub vehicle_age_years: f64,
    pub odometer_km: f64,
    pub ambient_temp_c: f64,
    pub engine_temp_c: f64,
    pub engine_rpm: f64,
    pub oil_pressure_psi: f64,
    pub coolant_level_pct: f64,
    pub battery_voltage_v: f64,
    pub mass_airflow_gs: f64,
    pub throttle_position_pct: f64,
    pub brake_pad_wear_pct: f64,
    pub tire_pressure_psi: f64,
    pub vibration_mm_s: f64,
    pub fuel_consumption_l_100km: f64,
    /// Vehicle brand as supplied, empty values dropped
    pub brand: Option<String>,
}

impl TelemetrySnapshot {
    /// Raw sensor readings keyed by their model column names.
    ///
    /// Vehicle age is not a model input; it only feeds the derived
    /// `km_per_year` feature.
    pub fn raw_features(&self) -> [(&'static str, f64); 13] {
        [
            (field::ODOMETER, self.odometer_km),
            (field::AMBIENT_TEMP, self.ambient_temp_c),
            (field::ENGINE_TEMP, self.engine_temp_c),
            (field::ENGINE_RPM, self.engine_rpm),
            (field::OIL_PRESSURE, self.oil_pressure_psi),
            (field::COOLANT_LEVEL, self.coolant_level_pct),
            (field::BATTERY_VOLTAGE, self.battery_voltage_v),
            (field::MASS_AIRFLOW, self.mass_airflow_gs),
            (field::THROTTLE_POSITION, self.throttle_position_pct),
            (field::BRAKE_PAD_WEAR, self.brake_pad_wear_pct),
            (field::TIRE_PRESSURE, self.tire_pressure_psi),
            (field::VIBRATION, self.vibration_mm_s),
            (field::FUEL_CONSUMPTION, self.fuel_consumption_l_100km),
        ]
    }
}
