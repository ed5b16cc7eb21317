//! Payload Validator

use crate::error::ValidationError;
use crate::snapshot::{field, TelemetrySnapshot};
use serde_json::{Map, Value};
use tracing::debug;

/// Parses request payloads into [`TelemetrySnapshot`]s
#[derive(Debug, Clone)]
pub struct Validator {
    /// Reject NaN and infinities even when they parse
    reject_non_finite: bool,
}

impl Validator {
    /// Create a new validator
    pub fn new(reject_non_finite: bool) -> Self {
        Self { reject_non_finite }
    }

    /// Validate a JSON document, which must be an object
    pub fn parse(&self, payload: &Value) -> Result<TelemetrySnapshot, ValidationError> {
        match payload {
            Value::Object(map) => self.parse_object(map),
            other => Err(ValidationError::InvalidFormat(format!(
                "expected a JSON object, got {}",
                json_type_name(other)
            ))),
        }
    }

    /// Validate a JSON object
    pub fn parse_object(&self, map: &Map<String, Value>) -> Result<TelemetrySnapshot, ValidationError> {
        let number = |name: &'static str| -> Result<f64, ValidationError> {
            let raw = map.get(name).ok_or(ValidationError::MissingField(name))?;
            self.number(name, raw)
        };

        let vehicle_age_years = number(field::VEHICLE_AGE)?;
        let odometer_km = number(field::ODOMETER)?;
        let engine_temp_c = number(field::ENGINE_TEMP)?;
        let ambient_temp_c = number(field::AMBIENT_TEMP)?;
        let engine_rpm = number(field::ENGINE_RPM)?;
        let oil_pressure_psi = number(field::OIL_PRESSURE)?;
        let coolant_level_pct = number(field::COOLANT_LEVEL)?;
        let battery_voltage_v = number(field::BATTERY_VOLTAGE)?;
        let mass_airflow_gs = number(field::MASS_AIRFLOW)?;
        let throttle_position_pct = number(field::THROTTLE_POSITION)?;
        let brake_pad_wear_pct = number(field::BRAKE_PAD_WEAR)?;
        let tire_pressure_psi = number(field::TIRE_PRESSURE)?;
        let vibration_mm_s = number(field::VIBRATION)?;
        let fuel_consumption_l_100km = number(field::FUEL_CONSUMPTION)?;

        let brand = extract_brand(map);
        debug!(brand = ?brand, "Parsed telemetry snapshot");

        Ok(TelemetrySnapshot {
            vehicle_age_years,
            odometer_km,
            ambient_temp_c,
            engine_temp_c,
            engine_rpm,
            oil_pressure_psi,
            coolant_level_pct,
            battery_voltage_v,
            mass_airflow_gs,
            throttle_position_pct,
            brake_pad_wear_pct,
            tire_pressure_psi,
            vibration_mm_s,
            fuel_consumption_l_100km,
            brand,
        })
    }

    fn number(&self, name: &'static str, raw: &Value) -> Result<f64, ValidationError> {
        let value = parse_number(name, raw)?;
        if self.reject_non_finite && !value.is_finite() {
            return Err(ValidationError::InvalidField {
                field: name,
                reason: format!("{} is not a finite number", value),
            });
        }
        Ok(value)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Coerce a JSON value to `f64`.
///
/// Numbers pass through; strings are trimmed and parsed, since HTML forms
/// submit every input as text.
pub fn parse_number(name: &'static str, raw: &Value) -> Result<f64, ValidationError> {
    match raw {
        Value::Number(n) => n.as_f64().ok_or_else(|| ValidationError::InvalidField {
            field: name,
            reason: format!("{} is not representable as a float", n),
        }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| ValidationError::InvalidField {
            field: name,
            reason: format!("could not convert string to float: '{}'", s),
        }),
        other => Err(ValidationError::InvalidField {
            field: name,
            reason: format!("expected a number, got {}", json_type_name(other)),
        }),
    }
}

/// First non-empty brand value, trying `brand`, then `Brand`, then any
/// other casing of the key.
fn extract_brand(map: &Map<String, Value>) -> Option<String> {
    let exact = [field::BRAND, "Brand"]
        .into_iter()
        .filter_map(|key| map.get(key));
    let any_case = map
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(field::BRAND))
        .map(|(_, value)| value);

    exact.chain(any_case).find_map(|value| match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "Vehicle_Age_Years": 5,
            "Odometer_Reading_km": 50000,
            "Ambient_Temperature_C": 25,
            "Engine_Temp_C": 95,
            "Engine_RPM": 2500,
            "Oil_Pressure_psi": 40,
            "Coolant_Level_pct": 80,
            "Battery_Voltage_V": 12.6,
            "Mass_Airflow_Rate_gs": 15,
            "Throttle_Position_pct": 20,
            "Brake_Pad_Wear_pct": 30,
            "Tire_Pressure_psi": 32,
            "Vibration_Level_mm_s": 1.5,
            "Fuel_Consumption_L_100km": 8.2
        })
    }

    #[test]
    fn test_valid_payload() {
        let snapshot = Validator::default().parse(&payload()).unwrap();
        assert_eq!(snapshot.vehicle_age_years, 5.0);
        assert_eq!(snapshot.engine_temp_c, 95.0);
        assert_eq!(snapshot.battery_voltage_v, 12.6);
        assert_eq!(snapshot.brand, None);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let mut body = payload();
        body["Engine_RPM"] = json!(" 3100.5 ");
        let snapshot = Validator::default().parse(&body).unwrap();
        assert_eq!(snapshot.engine_rpm, 3100.5);
    }

    #[test]
    fn test_missing_field() {
        let mut body = payload();
        body.as_object_mut().unwrap().remove("Tire_Pressure_psi");
        let err = Validator::default().parse(&body).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("Tire_Pressure_psi"));
    }

    #[test]
    fn test_invalid_field_is_named() {
        let mut body = payload();
        body["Oil_Pressure_psi"] = json!("forty");
        let err = Validator::default().parse(&body).unwrap_err();
        assert_eq!(err.field(), Some("Oil_Pressure_psi"));
        assert!(err.to_string().contains("forty"));

        body["Oil_Pressure_psi"] = Value::Null;
        let err = Validator::default().parse(&body).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { field: "Oil_Pressure_psi", .. }));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut body = payload();
        body["Engine_Temp_C"] = json!("NaN");
        assert!(Validator::default().parse(&body).is_err());
        assert!(Validator::new(false).parse(&body).is_ok());
    }

    #[test]
    fn test_non_object_rejected() {
        let err = Validator::default().parse(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat(_)));
    }

    #[test]
    fn test_brand_key_is_case_insensitive() {
        let mut body = payload();
        body["BRAND"] = json!("toyota");
        let snapshot = Validator::default().parse(&body).unwrap();
        assert_eq!(snapshot.brand.as_deref(), Some("toyota"));
    }

    #[test]
    fn test_brand_lowercase_key_wins_unless_empty() {
        let mut body = payload();
        body["brand"] = json!("");
        body["Brand"] = json!("Ford");
        let snapshot = Validator::default().parse(&body).unwrap();
        assert_eq!(snapshot.brand.as_deref(), Some("Ford"));

        body["brand"] = json!("honda");
        let snapshot = Validator::default().parse(&body).unwrap();
        assert_eq!(snapshot.brand.as_deref(), Some("honda"));
    }

    proptest! {
        #[test]
        fn prop_parse_number_accepts_numbers_and_padded_strings(
            value in any::<f64>().prop_filter("finite", |v| v.is_finite()),
            pad in " {0,3}",
        ) {
            prop_assert_eq!(parse_number(field::ENGINE_RPM, &json!(value)).unwrap(), value);

            let text = format!("{pad}{value}{pad}");
            prop_assert_eq!(parse_number(field::ENGINE_RPM, &json!(text)).unwrap(), value);
        }
    }
}
