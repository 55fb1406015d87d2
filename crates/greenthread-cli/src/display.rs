//! Output rendering for the `greenthread` binary.
//!
//! Predictions go to stdout as JSON; bundle inspection is a short
//! human-readable report.

use std::fmt::Write;

use greenthread_ai::{ArtifactBundle, Transform};
use greenthread_core::{Prediction, PredictorKind};
use greenthread_store::ArtifactPaths;
use serde_json::{Value, json};

/// Feature names listed before the report truncates.
const MAX_LISTED_FEATURES: usize = 10;

/// JSON response for one prediction, with the kind's unit attached.
pub fn prediction_json(kind: PredictorKind, prediction: &Prediction) -> Value {
    let mut body = json!({
        "predicted_value": prediction.predicted_value,
        "provenance": prediction.provenance.as_str(),
    });
    let (key, unit) = match kind {
        PredictorKind::Carbon => ("unit", "kgCO2e"),
        PredictorKind::Price => ("currency", "INR"),
    };
    body[key] = Value::from(unit);
    body
}

/// Summary of a loaded bundle.
pub fn bundle_report(bundle: &ArtifactBundle) -> String {
    let names = bundle.expected_feature_name_sequence();
    let mut out = String::new();

    let _ = writeln!(out, "predictor: {}", bundle.kind());
    let _ = writeln!(out, "model:     {}", bundle.model().describe());
    let _ = writeln!(out, "features:  {}", names.len());
    for name in names.iter().take(MAX_LISTED_FEATURES) {
        let _ = writeln!(out, "  {name}");
    }
    if names.len() > MAX_LISTED_FEATURES {
        let _ = writeln!(out, "  ... {} more", names.len() - MAX_LISTED_FEATURES);
    }

    match bundle.fitted_transform() {
        Transform::Scaler(scaler) => {
            let columns = scaler.feature_names.len();
            let _ = writeln!(out, "transform: standard scaler over {columns} columns");
        }
        Transform::Encoders(encoders) => {
            let _ = writeln!(out, "transform: label encoders");
            for (column, encoder) in encoders.columns() {
                let _ = writeln!(out, "  {column}: {} classes", encoder.classes().len());
            }
        }
    }
    out
}

/// Report for a bundle that failed to load.
pub fn missing_report(paths: &ArtifactPaths, error: &dyn std::error::Error) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "predictor: {} (unavailable, requests use the fallback estimate)",
        paths.kind
    );
    let _ = writeln!(out, "error:     {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = writeln!(out, "  caused by: {cause}");
        source = cause.source();
    }
    let missing = paths.missing();
    if !missing.is_empty() {
        let _ = writeln!(out, "missing:");
        for path in missing {
            let _ = writeln!(out, "  {}", path.display());
        }
    }
    out
}
