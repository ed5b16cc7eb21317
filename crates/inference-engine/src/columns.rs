//! Column metadata recovery
//!
//! Feature and scaler column lists are each produced by an ordered list of
//! resolvers. The first resolver returning a non-empty list wins; a list no
//! resolver can produce stays unset.

use crate::artifact::decode_with_fallback;
use crate::models::{Predictor, Transformer};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

pub(crate) const FEATURE_COLUMNS_BINARY: &str = "feature_columns.pkl";
pub(crate) const FEATURE_COLUMNS_JSON: &str = "feature_columns.json";
pub(crate) const SCALER_COLUMNS_BINARY: &str = "scaler_columns.pkl";
pub(crate) const SCALER_COLUMNS_JSON: &str = "scaler_columns.json";

/// Where a column list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSource {
    BinaryFile,
    JsonFile,
    ScalerFeatureNamesIn,
    ScalerFeatureNamesOut,
    DetectionFeatureNamesIn,
    DetectionLegacyFeatureNames,
    ScalerFeatureCountPrefix,
}

/// A recovered column list
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumns {
    pub names: Vec<String>,
    pub source: ColumnSource,
}

/// Everything the resolvers may inspect
pub struct ColumnContext<'a> {
    pub dir: &'a Path,
    pub scaler: &'a dyn Transformer,
    pub detection: &'a dyn Predictor,
    /// Feature columns, once resolved
    pub feature_columns: Option<&'a [String]>,
}

type Resolver = fn(&ColumnContext<'_>) -> Option<Vec<String>>;

const FEATURE_RESOLVERS: [(ColumnSource, Resolver); 4] = [
    (ColumnSource::BinaryFile, feature_binary_file),
    (ColumnSource::JsonFile, feature_json_file),
    (ColumnSource::DetectionFeatureNamesIn, detection_names_in),
    (ColumnSource::DetectionLegacyFeatureNames, detection_legacy_names),
];

const SCALER_RESOLVERS: [(ColumnSource, Resolver); 5] = [
    (ColumnSource::BinaryFile, scaler_binary_file),
    (ColumnSource::JsonFile, scaler_json_file),
    (ColumnSource::ScalerFeatureNamesIn, scaler_names_in),
    (ColumnSource::ScalerFeatureNamesOut, scaler_names_out),
    (ColumnSource::ScalerFeatureCountPrefix, feature_prefix),
];

/// Recover the predictor input layout
pub fn resolve_feature_columns(ctx: &ColumnContext<'_>) -> Option<ResolvedColumns> {
    resolve("feature", &FEATURE_RESOLVERS, ctx)
}

/// Recover the scaler input layout. Set `ctx.feature_columns` first so the
/// prefix resolver can apply.
pub fn resolve_scaler_columns(ctx: &ColumnContext<'_>) -> Option<ResolvedColumns> {
    resolve("scaler", &SCALER_RESOLVERS, ctx)
}

fn resolve(
    list: &'static str,
    resolvers: &[(ColumnSource, Resolver)],
    ctx: &ColumnContext<'_>,
) -> Option<ResolvedColumns> {
    let resolved = resolvers.iter().find_map(|(source, resolver)| {
        resolver(ctx)
            .filter(|names| !names.is_empty())
            .map(|names| ResolvedColumns {
                names,
                source: *source,
            })
    });

    match &resolved {
        Some(columns) => debug!(
            list,
            source = ?columns.source,
            count = columns.names.len(),
            "Resolved column list"
        ),
        None => warn!(list, "No column list could be recovered"),
    }
    resolved
}

fn feature_binary_file(ctx: &ColumnContext<'_>) -> Option<Vec<String>> {
    read_binary_list(&ctx.dir.join(FEATURE_COLUMNS_BINARY))
}

fn feature_json_file(ctx: &ColumnContext<'_>) -> Option<Vec<String>> {
    read_json_list(&ctx.dir.join(FEATURE_COLUMNS_JSON))
}

fn detection_names_in(ctx: &ColumnContext<'_>) -> Option<Vec<String>> {
    ctx.detection.feature_names_in().map(<[String]>::to_vec)
}

fn detection_legacy_names(ctx: &ColumnContext<'_>) -> Option<Vec<String>> {
    ctx.detection.legacy_feature_names().map(<[String]>::to_vec)
}

fn scaler_binary_file(ctx: &ColumnContext<'_>) -> Option<Vec<String>> {
    read_binary_list(&ctx.dir.join(SCALER_COLUMNS_BINARY))
}

fn scaler_json_file(ctx: &ColumnContext<'_>) -> Option<Vec<String>> {
    read_json_list(&ctx.dir.join(SCALER_COLUMNS_JSON))
}

fn scaler_names_in(ctx: &ColumnContext<'_>) -> Option<Vec<String>> {
    ctx.scaler.feature_names_in().map(<[String]>::to_vec)
}

fn scaler_names_out(ctx: &ColumnContext<'_>) -> Option<Vec<String>> {
    ctx.scaler.feature_names_out()
}

/// Leading feature columns, as many as the scaler takes
fn feature_prefix(ctx: &ColumnContext<'_>) -> Option<Vec<String>> {
    let count = ctx.scaler.n_features_in()?;
    let features = ctx.feature_columns?;
    Some(features.iter().take(count).cloned().collect())
}

/// Binary list file, tolerating a JSON body under the binary name
fn read_binary_list(path: &Path) -> Option<Vec<String>> {
    let bytes = read_optional(path)?;
    match decode_with_fallback::<Vec<String>, _>(&bytes, |_| Ok(())) {
        Ok((names, format)) => {
            debug!(path = %path.display(), ?format, "Loaded column list");
            Some(names)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to decode column list");
            None
        }
    }
}

fn read_json_list(path: &Path) -> Option<Vec<String>> {
    let bytes = read_optional(path)?;
    match serde_json::from_slice::<Vec<String>>(&bytes) {
        Ok(names) => {
            debug!(path = %path.display(), "Loaded column list");
            Some(names)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to decode column list");
            None
        }
    }
}

fn read_optional(path: &Path) -> Option<Vec<u8>> {
    if !path.is_file() {
        return None;
    }
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read column list");
            None
        }
    }
}
