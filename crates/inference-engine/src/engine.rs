//! Inference Engine Implementation
//!
//! Staged prediction: a screening pass with the detection model, then the
//! diagnosis, unit and severity models only when a fault is detected.

use crate::loader::ModelSet;
use crate::models::{ClassLabel, ModelError, Predictor};
use crate::scaling::scale;
use crate::InferenceError;
use feature_engine::FeatureAssembler;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of the staged pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "fault_status")]
pub enum Diagnosis {
    #[serde(rename = "No Fault Detected")]
    NoFault,
    #[serde(rename = "Fault Detected")]
    Fault {
        #[serde(serialize_with = "label_json")]
        fault_type: ClassLabel,
        #[serde(serialize_with = "label_json")]
        faulty_unit: ClassLabel,
        fault_severity: i64,
    },
}

impl Diagnosis {
    pub fn is_fault(&self) -> bool {
        matches!(self, Diagnosis::Fault { .. })
    }
}

fn label_json<S: serde::Serializer>(label: &ClassLabel, serializer: S) -> Result<S::Ok, S::Error> {
    label.to_json().serialize(serializer)
}

/// Result of inference operation
#[derive(Debug, Clone)]
pub struct InferenceResult {
    pub diagnosis: Diagnosis,
    /// Inference latency in milliseconds
    pub latency_ms: u64,
}

/// Runs requests against a loaded model set
pub struct InferenceEngine {
    models: Arc<ModelSet>,
    assembler: FeatureAssembler,
}

impl InferenceEngine {
    /// Create a new inference engine
    pub fn new(models: ModelSet) -> Self {
        Self::with_assembler(models, FeatureAssembler::default())
    }

    pub fn with_assembler(models: ModelSet, assembler: FeatureAssembler) -> Self {
        info!(kinds = ?models.kinds(), "Creating inference engine");
        Self {
            models: Arc::new(models),
            assembler,
        }
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    /// Fails when the column layouts could not be recovered at load time
    pub fn ensure_ready(&self) -> Result<(), InferenceError> {
        self.columns().map(|_| ())
    }

    fn columns(&self) -> Result<(&[String], &[String]), InferenceError> {
        let feature_columns = self
            .models
            .feature_columns()
            .ok_or(InferenceError::MissingColumnMetadata("FEATURE_COLUMNS"))?;
        let scaler_columns = self
            .models
            .scaler_columns()
            .ok_or(InferenceError::MissingColumnMetadata("SCALER_COLUMNS"))?;
        Ok((feature_columns, scaler_columns))
    }

    /// Validate, assemble, scale and predict one request body
    pub fn predict_payload(&self, payload: &Value) -> Result<InferenceResult, InferenceError> {
        let start = Instant::now();
        let (feature_columns, scaler_columns) = self.columns()?;

        let mut frame = self.assembler.assemble_payload(payload, feature_columns)?;
        scale(&mut frame, self.models.scaler(), Some(scaler_columns))?;

        // Padding only appends, so every feature column is still present
        let row = frame.select(feature_columns).ok_or_else(|| InferenceError::PredictionFailed {
            model: "Detection",
            source: ModelError::Runtime("feature columns missing after scaling".to_string()),
        })?;

        let diagnosis = self.diagnose(&row)?;
        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(latency_ms, fault = diagnosis.is_fault(), "Inference completed");

        Ok(InferenceResult { diagnosis, latency_ms })
    }

    /// Run the staged pipeline on an ordered feature row
    pub fn diagnose(&self, row: &[f64]) -> Result<Diagnosis, InferenceError> {
        // Only a numeric zero means healthy; a text label "0" is a fault class
        let detected = run("Detection", self.models.detection(), row)?;
        if matches!(detected, ClassLabel::Number(v) if v == 0.0) {
            return Ok(Diagnosis::NoFault);
        }

        let fault_type = run("Diagnosis", self.models.diagnosis(), row)?;
        let faulty_unit = run("Unit", self.models.unit(), row)?;
        let severity = run("Severity", self.models.severity(), row)?;
        let fault_severity = severity
            .as_f64()
            .filter(|v| v.is_finite())
            .map(|v| v.round_ties_even() as i64)
            .ok_or_else(|| InferenceError::PredictionFailed {
                model: "Severity",
                source: ModelError::Runtime(format!("severity {} is not numeric", severity)),
            })?;

        Ok(Diagnosis::Fault {
            fault_type,
            faulty_unit,
            fault_severity,
        })
    }

    /// Predict on the blocking pool so slow models do not stall the runtime
    pub async fn predict_async(self: Arc<Self>, payload: Value) -> Result<InferenceResult, InferenceError> {
        tokio::task::spawn_blocking(move || self.predict_payload(&payload))
            .await
            .map_err(|e| InferenceError::TaskFailed(e.to_string()))?
    }
}

fn run(model: &'static str, predictor: &dyn Predictor, row: &[f64]) -> Result<ClassLabel, InferenceError> {
    predictor
        .predict(row)
        .map_err(|source| InferenceError::PredictionFailed { model, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnSource;
    use crate::models::{InputSchema, StandardScaler, Transformer};
    use data_validator::ValidationError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const COLUMNS: [&str; 5] = ["Engine_Temp_C", "Engine_RPM", "km_per_year", "temp_difference", "Brand_Ford"];

    struct Fixed {
        label: ClassLabel,
        calls: Arc<AtomicUsize>,
        inputs: InputSchema,
    }

    impl Fixed {
        fn new(label: ClassLabel) -> (Box<dyn Predictor>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let model = Fixed {
                label,
                calls: calls.clone(),
                inputs: InputSchema::default(),
            };
            (Box::new(model), calls)
        }
    }

    impl Predictor for Fixed {
        fn kind(&self) -> &'static str {
            "Fixed"
        }
        fn inputs(&self) -> &InputSchema {
            &self.inputs
        }
        fn predict(&self, _row: &[f64]) -> Result<ClassLabel, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.label.clone())
        }
    }

    /// Echoes one input column so tests can observe the row
    struct Echo(usize, InputSchema);

    impl Predictor for Echo {
        fn kind(&self) -> &'static str {
            "Echo"
        }
        fn inputs(&self) -> &InputSchema {
            &self.1
        }
        fn predict(&self, row: &[f64]) -> Result<ClassLabel, ModelError> {
            Ok(ClassLabel::Number(row[self.0]))
        }
    }

    fn columns() -> Vec<String> {
        COLUMNS.iter().map(|s| s.to_string()).collect()
    }

    fn identity_scaler() -> Box<dyn Transformer> {
        Box::new(StandardScaler::new(Some(vec![0.0; 2]), None, InputSchema::default()).unwrap())
    }

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
            "Mass_Airflow_Rate_gs": 10,
            "Throttle_Position_pct": 20,
            "Brake_Pad_Wear_pct": 30,
            "Tire_Pressure_psi": 32,
            "Vibration_Level_mm_s": 1.5,
            "Fuel_Consumption_L_100km": 8,
            "brand": "ford"
        })
    }

    fn engine_with(
        detection: Box<dyn Predictor>,
        diagnosis: Box<dyn Predictor>,
        unit: Box<dyn Predictor>,
        severity: Box<dyn Predictor>,
    ) -> InferenceEngine {
        let models = ModelSet::new(identity_scaler(), detection, diagnosis, unit, severity)
            .with_feature_columns(columns(), ColumnSource::JsonFile)
            .with_scaler_columns(columns()[..2].to_vec(), ColumnSource::JsonFile);
        InferenceEngine::new(models)
    }

    #[test]
    fn test_no_fault_short_circuits() {
        let (detection, _) = Fixed::new(ClassLabel::Number(0.0));
        let (diagnosis, diagnosis_calls) = Fixed::new(ClassLabel::Text("Overheating".into()));
        let (unit, unit_calls) = Fixed::new(ClassLabel::Text("Engine".into()));
        let (severity, severity_calls) = Fixed::new(ClassLabel::Number(2.0));
        let engine = engine_with(detection, diagnosis, unit, severity);

        let result = engine.predict_payload(&payload()).unwrap();
        assert_eq!(result.diagnosis, Diagnosis::NoFault);
        assert_eq!(diagnosis_calls.load(Ordering::SeqCst), 0);
        assert_eq!(unit_calls.load(Ordering::SeqCst), 0);
        assert_eq!(severity_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_text_zero_label_is_a_fault() {
        let (detection, _) = Fixed::new(ClassLabel::Text("0".into()));
        let (diagnosis, diagnosis_calls) = Fixed::new(ClassLabel::Text("x".into()));
        let (unit, _) = Fixed::new(ClassLabel::Text("y".into()));
        let (severity, _) = Fixed::new(ClassLabel::Number(1.0));
        let engine = engine_with(detection, diagnosis, unit, severity);

        let diagnosis = engine.diagnose(&[0.0; 5]).unwrap();
        assert!(diagnosis.is_fault());
        assert_eq!(diagnosis_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_negative_zero_is_no_fault() {
        let (detection, _) = Fixed::new(ClassLabel::Number(-0.0));
        let (diagnosis, _) = Fixed::new(ClassLabel::Text("x".into()));
        let (unit, _) = Fixed::new(ClassLabel::Text("y".into()));
        let (severity, _) = Fixed::new(ClassLabel::Number(1.0));
        let engine = engine_with(detection, diagnosis, unit, severity);
        assert_eq!(engine.diagnose(&[0.0; 5]).unwrap(), Diagnosis::NoFault);
    }

    #[test]
    fn test_fault_reports_all_fields() {
        let (detection, _) = Fixed::new(ClassLabel::Number(1.0));
        let (diagnosis, _) = Fixed::new(ClassLabel::Text("Overheating".into()));
        let (unit, _) = Fixed::new(ClassLabel::Text("Engine".into()));
        let (severity, _) = Fixed::new(ClassLabel::Number(2.6));
        let engine = engine_with(detection, diagnosis, unit, severity);

        let result = engine.predict_payload(&payload()).unwrap();
        assert_eq!(
            result.diagnosis,
            Diagnosis::Fault {
                fault_type: ClassLabel::Text("Overheating".into()),
                faulty_unit: ClassLabel::Text("Engine".into()),
                fault_severity: 3,
            }
        );
        assert_eq!(
            serde_json::to_value(&result.diagnosis).unwrap(),
            json!({
                "fault_status": "Fault Detected",
                "fault_type": "Overheating",
                "faulty_unit": "Engine",
                "fault_severity": 3
            })
        );
    }

    #[test]
    fn test_severity_rounds_half_to_even() {
        for (raw, expected) in [(2.5, 2), (3.5, 4), (-0.5, 0), (1.49, 1)] {
            let (detection, _) = Fixed::new(ClassLabel::Number(1.0));
            let (diagnosis, _) = Fixed::new(ClassLabel::Number(4.0));
            let (unit, _) = Fixed::new(ClassLabel::Number(2.0));
            let (severity, _) = Fixed::new(ClassLabel::Number(raw));
            let engine = engine_with(detection, diagnosis, unit, severity);
            match engine.diagnose(&[0.0; 5]).unwrap() {
                Diagnosis::Fault { fault_severity, .. } => assert_eq!(fault_severity, expected, "raw {raw}"),
                other => panic!("unexpected diagnosis: {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_numeric_severity_fails() {
        let (detection, _) = Fixed::new(ClassLabel::Number(1.0));
        let (diagnosis, _) = Fixed::new(ClassLabel::Number(4.0));
        let (unit, _) = Fixed::new(ClassLabel::Number(2.0));
        let (severity, _) = Fixed::new(ClassLabel::Text("high".into()));
        let engine = engine_with(detection, diagnosis, unit, severity);
        let err = engine.diagnose(&[0.0; 5]).unwrap_err();
        assert!(matches!(err, InferenceError::PredictionFailed { model: "Severity", .. }));
    }

    #[test]
    fn test_row_is_ordered_feature_columns() {
        for (index, expected) in [(0, 95.0), (1, 2500.0), (2, 10000.0), (3, 70.0), (4, 1.0)] {
            let (diagnosis, _) = Fixed::new(ClassLabel::Number(4.0));
            let (unit, _) = Fixed::new(ClassLabel::Number(2.0));
            let models = ModelSet::new(
                identity_scaler(),
                Box::new(Echo(index, InputSchema::default())),
                diagnosis,
                unit,
                Box::new(Echo(index, InputSchema::default())),
            )
            .with_feature_columns(columns(), ColumnSource::JsonFile)
            .with_scaler_columns(columns()[..2].to_vec(), ColumnSource::JsonFile);
            let result = InferenceEngine::new(models).predict_payload(&payload()).unwrap();
            match result.diagnosis {
                Diagnosis::Fault { fault_severity, .. } => assert_eq!(fault_severity as f64, expected),
                other => panic!("unexpected diagnosis: {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_column_metadata() {
        let (detection, _) = Fixed::new(ClassLabel::Number(0.0));
        let (diagnosis, _) = Fixed::new(ClassLabel::Number(0.0));
        let (unit, _) = Fixed::new(ClassLabel::Number(0.0));
        let (severity, _) = Fixed::new(ClassLabel::Number(0.0));
        let models = ModelSet::new(identity_scaler(), detection, diagnosis, unit, severity)
            .with_feature_columns(columns(), ColumnSource::JsonFile);
        let err = InferenceEngine::new(models).predict_payload(&payload()).unwrap_err();
        assert!(matches!(err, InferenceError::MissingColumnMetadata("SCALER_COLUMNS")));
    }

    #[test]
    fn test_invalid_input_is_reported() {
        let (detection, calls) = Fixed::new(ClassLabel::Number(0.0));
        let (diagnosis, _) = Fixed::new(ClassLabel::Number(0.0));
        let (unit, _) = Fixed::new(ClassLabel::Number(0.0));
        let (severity, _) = Fixed::new(ClassLabel::Number(0.0));
        let engine = engine_with(detection, diagnosis, unit, severity);

        let mut body = payload();
        body["Engine_RPM"] = json!("fast");
        let err = engine.predict_payload(&body).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::InvalidInput(ValidationError::InvalidField { field: "Engine_RPM", .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_scaling_error_propagates() {
        let (detection, _) = Fixed::new(ClassLabel::Number(0.0));
        let (diagnosis, _) = Fixed::new(ClassLabel::Number(0.0));
        let (unit, _) = Fixed::new(ClassLabel::Number(0.0));
        let (severity, _) = Fixed::new(ClassLabel::Number(0.0));
        let models = ModelSet::new(identity_scaler(), detection, diagnosis, unit, severity)
            .with_feature_columns(columns(), ColumnSource::JsonFile)
            .with_scaler_columns(columns(), ColumnSource::JsonFile);
        let err = InferenceEngine::new(models).predict_payload(&payload()).unwrap_err();
        assert!(matches!(err, InferenceError::Scaling(_)));
    }

    #[tokio::test]
    async fn test_predict_async() {
        let (detection, _) = Fixed::new(ClassLabel::Number(0.0));
        let (diagnosis, _) = Fixed::new(ClassLabel::Number(0.0));
        let (unit, _) = Fixed::new(ClassLabel::Number(0.0));
        let (severity, _) = Fixed::new(ClassLabel::Number(0.0));
        let engine = Arc::new(engine_with(detection, diagnosis, unit, severity));

        let result = engine.predict_async(payload()).await.unwrap();
        assert_eq!(result.diagnosis, Diagnosis::NoFault);
        assert_eq!(
            serde_json::to_value(&result.diagnosis).unwrap(),
            json!({ "fault_status": "No Fault Detected" })
        );
    }
}
