//! Artifact directory layout for trained predictors.
//!
//! Each predictor kind owns a subdirectory of the artifacts root holding the
//! triple produced at training time: the model, its scaler or encoders, and
//! the ordered feature names the model was fit on.
//!
//! ```text
//! artifacts/
//!   carbon/carbon_emission_model.{onnx,json}
//!   carbon/feature_scaler.json
//!   carbon/feature_names.txt
//!   price/price_prediction_model.{onnx,json}
//!   price/label_encoders.json
//!   price/feature_names.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use greenthread_core::PredictorKind;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::StoreError;

/// Root directory containing one artifact subdirectory per predictor kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDir {
    root: PathBuf,
}

/// Resolved file locations for one predictor kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub kind: PredictorKind,
    pub dir: PathBuf,
    /// ONNX export of the model. Used only when ONNX support is compiled in.
    pub model_onnx: PathBuf,
    /// JSON export of the model (linear or tree ensemble).
    pub model_json: PathBuf,
    /// Scaler (carbon) or label encoders (price).
    pub transform: PathBuf,
    /// Ordered feature names the model was trained on.
    pub feature_names: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File locations for a predictor kind. Nothing is checked on disk.
    pub fn paths(&self, kind: PredictorKind) -> ArtifactPaths {
        let dir = self.root.join(kind.as_str());
        let (model_stem, transform, feature_names) = match kind {
            PredictorKind::Carbon => (
                "carbon_emission_model",
                "feature_scaler.json",
                "feature_names.txt",
            ),
            PredictorKind::Price => (
                "price_prediction_model",
                "label_encoders.json",
                "feature_names.json",
            ),
        };
        ArtifactPaths {
            kind,
            model_onnx: dir.join(format!("{model_stem}.onnx")),
            model_json: dir.join(format!("{model_stem}.json")),
            transform: dir.join(transform),
            feature_names: dir.join(feature_names),
            dir,
        }
    }
}

impl ArtifactPaths {
    /// Required files that are absent.
    ///
    /// The ONNX export satisfies the model only when the `onnx` feature is
    /// built; otherwise the JSON export is required.
    pub fn missing(&self) -> Vec<PathBuf> {
        let mut missing = Vec::new();
        let onnx_present = cfg!(feature = "onnx") && self.model_onnx.exists();
        if !onnx_present && !self.model_json.exists() {
            missing.push(self.model_json.clone());
        }
        for path in [&self.transform, &self.feature_names] {
            if !path.exists() {
                missing.push(path.clone());
            }
        }
        missing
    }
}

/// Read an ordered feature-name sequence.
///
/// `.json` files hold a JSON array of strings; anything else is read as one
/// name per line, trimmed, with blank lines skipped.
pub fn read_feature_names(path: &Path) -> Result<Vec<String>, StoreError> {
    if path.extension().is_some_and(|ext| ext == "json") {
        return read_json(path);
    }
    let text = read_text(path)?;
    let names: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    debug!(path = %path.display(), count = names.len(), "read feature names");
    Ok(names)
}

/// Write a feature-name sequence in the format implied by the extension.
pub fn write_feature_names(path: &Path, names: &[String]) -> Result<(), StoreError> {
    if path.extension().is_some_and(|ext| ext == "json") {
        return write_json(path, &names);
    }
    let mut text = names.join("\n");
    text.push('\n');
    write_text(path, &text)
}

/// Read and decode a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode and write a JSON artifact, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_text(path, &text)
}

/// Read raw bytes of an artifact (e.g. an ONNX model).
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, StoreError> {
    if !path.exists() {
        return Err(StoreError::ArtifactNotFound(path.to_path_buf()));
    }
    fs::read(path).map_err(|e| StoreError::io(path, e))
}

fn read_text(path: &Path) -> Result<String, StoreError> {
    if !path.exists() {
        return Err(StoreError::ArtifactNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| StoreError::io(path, e))
}

fn write_text(path: &Path, text: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| StoreError::io(path, e))
}
