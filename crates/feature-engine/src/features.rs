//! Feature Vector Assembly

use crate::frame::FeatureFrame;
use data_validator::{TelemetrySnapshot, ValidationError, Validator};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Derived column: distance driven per year of vehicle age
pub const KM_PER_YEAR: &str = "km_per_year";
/// Derived column: engine temperature above ambient
pub const TEMP_DIFFERENCE: &str = "temp_difference";
/// Prefix of the one-hot brand indicator columns
pub const BRAND_PREFIX: &str = "Brand_";

/// Features computed from raw readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedFeatures {
    pub km_per_year: f64,
    pub temp_difference: f64,
}

impl DerivedFeatures {
    /// Compute derived features. A non-positive vehicle age yields zero
    /// distance per year rather than failing.
    pub fn from_snapshot(snapshot: &TelemetrySnapshot) -> Self {
        let km_per_year = if snapshot.vehicle_age_years > 0.0 {
            snapshot.odometer_km / snapshot.vehicle_age_years
        } else {
            0.0
        };

        Self {
            km_per_year,
            temp_difference: snapshot.engine_temp_c - snapshot.ambient_temp_c,
        }
    }
}

/// Builds feature frames aligned to a trained column layout
#[derive(Debug, Clone, Default)]
pub struct FeatureAssembler {
    validator: Validator,
}

impl FeatureAssembler {
    /// Create a new assembler
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    /// Validate a raw request payload and assemble it
    pub fn assemble_payload(
        &self,
        payload: &Value,
        feature_columns: &[String],
    ) -> Result<FeatureFrame, ValidationError> {
        let snapshot = self.validator.parse(payload)?;
        Ok(self.assemble(&snapshot, feature_columns))
    }

    /// Assemble a frame over `feature_columns`.
    ///
    /// Every column starts at zero. Raw and derived features are written by
    /// exact name; names missing from the layout are dropped.
    pub fn assemble(&self, snapshot: &TelemetrySnapshot, feature_columns: &[String]) -> FeatureFrame {
        let mut frame = FeatureFrame::zeros(feature_columns);
        let derived = DerivedFeatures::from_snapshot(snapshot);

        let derived_values = [
            (KM_PER_YEAR, derived.km_per_year),
            (TEMP_DIFFERENCE, derived.temp_difference),
        ];
        let mut dropped = Vec::new();
        for (name, value) in snapshot.raw_features().into_iter().chain(derived_values) {
            if !frame.set(name, value) {
                dropped.push(name);
            }
        }
        if !dropped.is_empty() {
            debug!(?dropped, "Features absent from column layout");
        }

        if let Some(brand) = snapshot.brand.as_deref() {
            let column = brand_column(brand);
            if frame.set(&column, 1.0) {
                debug!(%column, "Brand indicator set");
            } else {
                debug!(%column, "Unknown brand ignored");
            }
        }

        frame
    }
}

/// One-hot column name for a brand value
pub fn brand_column(brand: &str) -> String {
    format!("{}{}", BRAND_PREFIX, title_case(brand))
}

/// Title-case a string: the first letter of every run of letters is
/// uppercased and the rest lowercased. Any non-letter starts a new word.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
