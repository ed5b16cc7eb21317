//! Scaler application over a feature frame

use crate::models::Transformer;
use crate::{ExpectedColumns, ScalingError};
use feature_engine::FeatureFrame;
use tracing::debug;

/// Columns of the frame reported with a scaling failure
const PROVIDED_SAMPLE: usize = 20;

/// Scale the scaler's columns of `frame` in place.
///
/// Columns come from `scaler_columns`, else the scaler's recorded input
/// names, else every frame column. Expected columns missing from the frame
/// are appended as zeros first. Columns outside the selection are left
/// untouched.
pub fn scale(
    frame: &mut FeatureFrame,
    scaler: &dyn Transformer,
    scaler_columns: Option<&[String]>,
) -> Result<(), ScalingError> {
    let expected: Option<Vec<String>> = scaler_columns
        .map(<[String]>::to_vec)
        .or_else(|| scaler.feature_names_in().map(<[String]>::to_vec))
        .or_else(|| scaler.feature_names_out());

    let selected = match &expected {
        Some(columns) => {
            let padded: Vec<&String> = columns.iter().filter(|c| frame.ensure_column(c)).collect();
            if !padded.is_empty() {
                debug!(?padded, "Padded missing scaler columns with zeros");
            }
            columns.clone()
        }
        None => frame.columns().to_vec(),
    };

    let failure = |frame: &FeatureFrame, message: String| ScalingError {
        message,
        provided_columns: frame.columns().iter().take(PROVIDED_SAMPLE).cloned().collect(),
        expected: match &expected {
            Some(columns) => ExpectedColumns::Names(columns.clone()),
            None => scaler
                .n_features_in()
                .map(ExpectedColumns::Count)
                .unwrap_or(ExpectedColumns::Unknown),
        },
    };

    let row = match frame.select(&selected) {
        Some(row) => row,
        None => return Err(failure(frame, "selected columns are missing from the frame".to_string())),
    };
    let transformed = scaler
        .transform(&selected, &row)
        .map_err(|e| failure(frame, e.to_string()))?;
    if transformed.len() != selected.len() {
        return Err(failure(
            frame,
            format!(
                "scaler returned {} values for {} columns",
                transformed.len(),
                selected.len()
            ),
        ));
    }

    frame.assign(&selected, &transformed);
    debug!(columns = selected.len(), "Scaled feature frame");
    Ok(())
}
