//! Standard scaling over Arrow feature frames.
//!
//! The carbon model was trained on standardised numeric features. The request
//! is turned into a one-row [`RecordBatch`] whose schema fixes column names
//! and order, and the fitted scaler maps that batch to a scaled batch.

use std::collections::BTreeSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use greenthread_core::Features;
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Fitted per-column standardisation: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Scaler that leaves values unchanged.
    pub fn identity(feature_names: Vec<String>) -> Self {
        let n = feature_names.len();
        Self {
            feature_names,
            mean: vec![0.0; n],
            scale: vec![1.0; n],
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let n = self.feature_names.len();
        if self.mean.len() != n || self.scale.len() != n {
            return Err(format!(
                "{n} feature names but {} means and {} scales",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err("non-finite mean or scale".into());
        }
        Ok(())
    }

    /// Scale every column of `batch`.
    ///
    /// The batch columns must be exactly the fitted feature names, in fit
    /// order, all `Float64`.
    pub fn transform(&self, batch: &RecordBatch) -> Result<RecordBatch, PipelineError> {
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        if names != self.feature_names {
            return Err(PipelineError::FeatureMismatch(format!(
                "scaler was fit on {:?}, frame has {:?}",
                self.feature_names, names
            )));
        }

        let mut columns: Vec<ArrayRef> = Vec::with_capacity(names.len());
        for (i, column) in batch.columns().iter().enumerate() {
            let values = column
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| {
                    PipelineError::FeatureMismatch(format!(
                        "column {} is {}, expected Float64",
                        names[i],
                        column.data_type()
                    ))
                })?;
            let (mean, scale) = (self.mean[i], self.scale[i]);
            // Zero-variance columns were fit with unit scale.
            let scale = if scale == 0.0 { 1.0 } else { scale };
            let scaled: Float64Array = values
                .iter()
                .map(|v| v.map(|x| (x - mean) / scale))
                .collect();
            columns.push(Arc::new(scaled));
        }

        RecordBatch::try_new(schema, columns)
            .map_err(|e| PipelineError::FeatureMismatch(e.to_string()))
    }
}

/// Build a one-row frame from named features.
///
/// The feature names must be exactly the schema's field names; extra or
/// missing names are a [`PipelineError::FeatureMismatch`].
pub fn features_to_batch(
    schema: SchemaRef,
    features: &Features,
) -> Result<RecordBatch, PipelineError> {
    let expected: BTreeSet<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    let provided: BTreeSet<&str> = features.keys().map(String::as_str).collect();
    if expected != provided {
        let missing: Vec<&str> = expected.difference(&provided).copied().collect();
        let unexpected: Vec<&str> = provided.difference(&expected).copied().collect();
        return Err(PipelineError::FeatureMismatch(format!(
            "missing {missing:?}, unexpected {unexpected:?}"
        )));
    }

    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|f| Arc::new(Float64Array::from(vec![features[f.name()]])) as ArrayRef)
        .collect();

    RecordBatch::try_new(schema, columns).map_err(|e| PipelineError::FeatureMismatch(e.to_string()))
}

/// Read the first row of a `Float64` frame back into named features.
pub fn first_row(batch: &RecordBatch) -> Result<Features, PipelineError> {
    if batch.num_rows() == 0 {
        return Err(PipelineError::FeatureMismatch("empty feature frame".into()));
    }
    let schema = batch.schema();
    let mut out = Features::new();
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let values = column
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                PipelineError::FeatureMismatch(format!("column {} is not Float64", field.name()))
            })?;
        let value = if values.is_null(0) { 0.0 } else { values.value(0) };
        out.insert(field.name().clone(), value);
    }
    Ok(out)
}
