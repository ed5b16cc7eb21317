//! Model artifact loading

use crate::artifact::ArtifactEnvelope;
use crate::columns::{resolve_feature_columns, resolve_scaler_columns, ColumnContext, ColumnSource};
use crate::locator::ArtifactLocator;
use crate::models::{Predictor, Transformer};
use crate::ArtifactError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SCALER_FILE: &str = "scaler.joblib";
pub const DETECTION_MODEL_FILE: &str = "Vehicle_Fault_Detection_Model.pkl";
pub const DIAGNOSIS_MODEL_FILE: &str = "Vehicle_Fault_Diagnosis_Model.pkl";
pub const UNIT_MODEL_FILE: &str = "Vehicle_Fault_Unit_Model.pkl";
pub const SEVERITY_MODEL_FILE: &str = "Vehicle_Fault_Severity_Model.pkl";

/// Files that must all be present for a load to be attempted
pub const REQUIRED_ARTIFACTS: [&str; 5] = [
    SCALER_FILE,
    DETECTION_MODEL_FILE,
    DIAGNOSIS_MODEL_FILE,
    UNIT_MODEL_FILE,
    SEVERITY_MODEL_FILE,
];

/// Serialized kind of each loaded artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ArtifactKinds {
    pub scaler: &'static str,
    pub detection: &'static str,
    pub diagnosis: &'static str,
    pub unit: &'static str,
    pub severity: &'static str,
}

/// The fully loaded, immutable model bundle
pub struct ModelSet {
    scaler: Box<dyn Transformer>,
    detection: Box<dyn Predictor>,
    diagnosis: Box<dyn Predictor>,
    unit: Box<dyn Predictor>,
    severity: Box<dyn Predictor>,
    feature_columns: Option<Vec<String>>,
    feature_source: Option<ColumnSource>,
    scaler_columns: Option<Vec<String>>,
    scaler_source: Option<ColumnSource>,
    schema_id: Option<String>,
    kinds: ArtifactKinds,
    dir: Option<PathBuf>,
}

impl ModelSet {
    /// Bundle already built runtimes. Column metadata starts unset.
    pub fn new(
        scaler: Box<dyn Transformer>,
        detection: Box<dyn Predictor>,
        diagnosis: Box<dyn Predictor>,
        unit: Box<dyn Predictor>,
        severity: Box<dyn Predictor>,
    ) -> Self {
        let kinds = ArtifactKinds {
            scaler: scaler.kind(),
            detection: detection.kind(),
            diagnosis: diagnosis.kind(),
            unit: unit.kind(),
            severity: severity.kind(),
        };
        Self {
            scaler,
            detection,
            diagnosis,
            unit,
            severity,
            feature_columns: None,
            feature_source: None,
            scaler_columns: None,
            scaler_source: None,
            schema_id: None,
            kinds,
            dir: None,
        }
    }

    pub fn with_feature_columns(mut self, columns: Vec<String>, source: ColumnSource) -> Self {
        self.feature_columns = Some(columns);
        self.feature_source = Some(source);
        self
    }

    pub fn with_scaler_columns(mut self, columns: Vec<String>, source: ColumnSource) -> Self {
        self.scaler_columns = Some(columns);
        self.scaler_source = Some(source);
        self
    }

    pub fn scaler(&self) -> &dyn Transformer {
        self.scaler.as_ref()
    }

    pub fn detection(&self) -> &dyn Predictor {
        self.detection.as_ref()
    }

    pub fn diagnosis(&self) -> &dyn Predictor {
        self.diagnosis.as_ref()
    }

    pub fn unit(&self) -> &dyn Predictor {
        self.unit.as_ref()
    }

    pub fn severity(&self) -> &dyn Predictor {
        self.severity.as_ref()
    }

    pub fn feature_columns(&self) -> Option<&[String]> {
        self.feature_columns.as_deref()
    }

    pub fn feature_source(&self) -> Option<ColumnSource> {
        self.feature_source
    }

    pub fn scaler_columns(&self) -> Option<&[String]> {
        self.scaler_columns.as_deref()
    }

    pub fn scaler_source(&self) -> Option<ColumnSource> {
        self.scaler_source
    }

    /// Training schema shared by the artifacts, if any declared one
    pub fn schema_id(&self) -> Option<&str> {
        self.schema_id.as_deref()
    }

    pub fn kinds(&self) -> &ArtifactKinds {
        &self.kinds
    }

    /// Directory the set was loaded from
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSet")
            .field("kinds", &self.kinds)
            .field("feature_columns", &self.feature_columns.as_ref().map(Vec::len))
            .field("scaler_columns", &self.scaler_columns.as_ref().map(Vec::len))
            .field("schema_id", &self.schema_id)
            .field("dir", &self.dir)
            .finish()
    }
}

/// Loads the artifact bundle from one directory
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    dir: PathBuf,
}

impl ArtifactLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Required files absent from the directory, in declaration order
    pub fn missing_artifacts(&self) -> Vec<String> {
        REQUIRED_ARTIFACTS
            .iter()
            .filter(|file| !self.dir.join(file).is_file())
            .map(|file| file.to_string())
            .collect()
    }

    /// Load every artifact. Nothing is returned unless all five load.
    pub fn load(&self) -> Result<ModelSet, ArtifactError> {
        info!(dir = %self.dir.display(), "Loading model artifacts");
        for file in REQUIRED_ARTIFACTS {
            info!(file, exists = self.dir.join(file).is_file(), "Checking artifact");
        }

        let missing = self.missing_artifacts();
        if !missing.is_empty() {
            warn!(
                dir = %self.dir.display(),
                listing = ?self.listing(),
                ?missing,
                "Model artifacts missing"
            );
            return Err(ArtifactError::MissingArtifacts {
                dir: self.dir.clone(),
                files: missing,
            });
        }

        let envelopes = REQUIRED_ARTIFACTS
            .iter()
            .map(|&file| self.read_envelope(file).map(|envelope| (file, envelope)))
            .collect::<Result<Vec<_>, _>>()?;
        let schema_id = check_schema(&envelopes)?;

        let mut runtimes = envelopes.into_iter();
        let scaler = match runtimes.next() {
            Some((file, envelope)) => envelope
                .model
                .into_transformer()
                .map_err(|reason| corrupt(file, reason))?,
            None => return Err(corrupt(SCALER_FILE, "artifact was not read".to_string())),
        };
        let mut predictors = Vec::with_capacity(4);
        for (file, envelope) in runtimes {
            predictors.push(envelope.model.into_predictor().map_err(|reason| corrupt(file, reason))?);
        }
        let [detection, diagnosis, unit, severity]: [Box<dyn Predictor>; 4] = predictors
            .try_into()
            .map_err(|_| corrupt(DETECTION_MODEL_FILE, "predictor artifacts were not read".to_string()))?;

        let mut models = ModelSet::new(scaler, detection, diagnosis, unit, severity);
        models.schema_id = schema_id;
        models.dir = Some(self.dir.clone());
        self.attach_columns(&mut models);

        info!(
            kinds = ?models.kinds,
            schema_id = ?models.schema_id,
            feature_columns = models.feature_columns.as_ref().map(Vec::len),
            scaler_columns = models.scaler_columns.as_ref().map(Vec::len),
            "Model artifacts loaded"
        );
        Ok(models)
    }

    fn read_envelope(&self, file: &'static str) -> Result<ArtifactEnvelope, ArtifactError> {
        let bytes = std::fs::read(self.dir.join(file)).map_err(|e| corrupt(file, e.to_string()))?;
        let (envelope, format) = ArtifactEnvelope::decode(&bytes).map_err(|reason| corrupt(file, reason))?;
        info!(file, ?format, kind = envelope.model.kind(), "Artifact decoded");
        Ok(envelope)
    }

    /// Best-effort column metadata; absence is left for the request path
    fn attach_columns(&self, models: &mut ModelSet) {
        let mut ctx = ColumnContext {
            dir: &self.dir,
            scaler: models.scaler.as_ref(),
            detection: models.detection.as_ref(),
            feature_columns: None,
        };
        let features = resolve_feature_columns(&ctx);
        ctx.feature_columns = features.as_ref().map(|f| f.names.as_slice());
        let scaler = resolve_scaler_columns(&ctx);

        if let (Some(features), Some(expected)) = (&features, models.detection.n_features_in()) {
            if features.names.len() != expected {
                warn!(
                    feature_columns = features.names.len(),
                    detection_n_features_in = expected,
                    "Feature column count differs from detection model input width"
                );
            }
        }

        if let Some(features) = features {
            models.feature_columns = Some(features.names);
            models.feature_source = Some(features.source);
        }
        if let Some(scaler) = scaler {
            models.scaler_columns = Some(scaler.names);
            models.scaler_source = Some(scaler.source);
        }
    }

    fn listing(&self) -> Vec<String> {
        match std::fs::read_dir(&self.dir) {
            Ok(entries) => {
                let mut names: Vec<String> = entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect();
                names.sort();
                names
            }
            Err(e) => vec![format!("<unreadable: {}>", e)],
        }
    }
}

fn corrupt(file: &str, reason: String) -> ArtifactError {
    ArtifactError::CorruptArtifact {
        file: file.to_string(),
        reason,
    }
}

/// Artifacts declaring a schema fingerprint must all declare the same one
fn check_schema(envelopes: &[(&'static str, ArtifactEnvelope)]) -> Result<Option<String>, ArtifactError> {
    let mut declared = envelopes
        .iter()
        .filter_map(|(file, envelope)| envelope.schema_id.as_deref().map(|id| (*file, id)));
    let Some((first_file, first_id)) = declared.next() else {
        return Ok(None);
    };
    if let Some((file, id)) = declared.find(|(_, id)| *id != first_id) {
        return Err(ArtifactError::IncompatibleArtifacts(format!(
            "{} declares schema {} but {} declares {}",
            first_file, first_id, file, id
        )));
    }
    Ok(Some(first_id.to_string()))
}

/// Outcome of locating and loading at startup
#[derive(Debug)]
pub struct LoadReport {
    pub models_dir: Option<PathBuf>,
    pub result: Result<ModelSet, ArtifactError>,
}

/// Locate the models directory and load it. Never panics; failures are
/// carried in the report.
pub fn locate_and_load(locator: &ArtifactLocator) -> LoadReport {
    let Some(dir) = locator.locate() else {
        warn!(candidates = ?locator.candidates(), "Models directory not found");
        return LoadReport {
            models_dir: None,
            result: Err(ArtifactError::NotFound),
        };
    };

    let result = ArtifactLoader::new(&dir).load();
    if let Err(e) = &result {
        warn!(error = %e, "Model artifacts failed to load");
    }
    LoadReport {
        models_dir: Some(dir),
        result,
    }
}
