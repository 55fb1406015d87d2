//! Model adapters behind a single prediction capability.
//!
//! The pipeline only needs `predict(vector) -> f64`. Trained models arrive as
//! JSON exports (a linear model or a random-forest tree ensemble) or, with the
//! `onnx` feature, as an ONNX graph.

use serde::{Deserialize, Serialize};
use tracing::info;

use greenthread_store::{ArtifactPaths, StoreError, artifacts};

use crate::PipelineError;

/// Anything that maps one aligned feature vector to one prediction.
///
/// Implementations must be safe to call from many threads at once.
pub trait Regressor: Send + Sync {
    /// Input width the model was trained on, if the artifact records it.
    fn n_features(&self) -> Option<usize>;

    fn predict(&self, x: &[f64]) -> Result<f64, PipelineError>;

    /// Short human-readable description for inspection output.
    fn describe(&self) -> String;
}

/// A model exported to JSON by the training script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonModel {
    Linear(LinearModel),
    Forest(ForestModel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// Random-forest regressor: the prediction is the mean of the tree outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub n_features: usize,
    pub trees: Vec<Tree>,
}

/// One regression tree in flattened array form.
///
/// Node `i` is a leaf when `children_left[i] == -1`. Otherwise samples with
/// `x[feature[i]] <= threshold[i]` go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

const LEAF: i64 = -1;

impl JsonModel {
    /// Structural checks run once at load time so `predict` can index freely.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Linear(m) => {
                if m.coefficients.is_empty() {
                    return Err("linear model has no coefficients".into());
                }
                Ok(())
            }
            Self::Forest(m) => {
                if m.trees.is_empty() {
                    return Err("forest has no trees".into());
                }
                for (i, tree) in m.trees.iter().enumerate() {
                    tree.validate(m.n_features)
                        .map_err(|e| format!("tree {i}: {e}"))?;
                }
                Ok(())
            }
        }
    }
}

impl Tree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        let n = self.value.len();
        if n == 0 {
            return Err("empty tree".into());
        }
        if [
            self.children_left.len(),
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err("node arrays differ in length".into());
        }
        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                continue;
            }
            // Children always follow their parent, so traversal terminates.
            for child in [left, right] {
                if child <= node as i64 || child as usize >= n {
                    return Err(format!("node {node} has invalid child {child}"));
                }
            }
            let f = self.feature[node];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {node} splits on feature {f}"));
            }
        }
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let f = self.feature[node] as usize;
            node = if x[f] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }
}

impl Regressor for JsonModel {
    fn n_features(&self) -> Option<usize> {
        match self {
            Self::Linear(m) => Some(m.coefficients.len()),
            Self::Forest(m) => Some(m.n_features),
        }
    }

    fn predict(&self, x: &[f64]) -> Result<f64, PipelineError> {
        if let Some(width) = self.n_features()
            && x.len() != width
        {
            return Err(PipelineError::PredictionFailure(format!(
                "model expects {width} features, got {}",
                x.len()
            )));
        }
        let y = match self {
            Self::Linear(m) => {
                m.intercept
                    + m.coefficients
                        .iter()
                        .zip(x)
                        .map(|(c, v)| c * v)
                        .sum::<f64>()
            }
            Self::Forest(m) => {
                m.trees.iter().map(|t| t.predict(x)).sum::<f64>() / m.trees.len() as f64
            }
        };
        Ok(y)
    }

    fn describe(&self) -> String {
        match self {
            Self::Linear(m) => format!("linear ({} coefficients)", m.coefficients.len()),
            Self::Forest(m) => format!(
                "random forest ({} trees, {} features)",
                m.trees.len(),
                m.n_features
            ),
        }
    }
}

/// Load the model for a bundle, preferring the ONNX export when supported.
pub fn load_model(paths: &ArtifactPaths) -> Result<Box<dyn Regressor>, StoreError> {
    #[cfg(feature = "onnx")]
    if paths.model_onnx.exists() {
        let model = crate::onnx::OnnxRegressor::load(&paths.model_onnx)?;
        return Ok(Box::new(model));
    }

    let model: JsonModel = artifacts::read_json(&paths.model_json)?;
    model.validate().map_err(|e| {
        StoreError::Other(format!("invalid model {}: {e}", paths.model_json.display()))
    })?;
    info!(
        kind = %paths.kind,
        model = %model.describe(),
        path = %paths.model_json.display(),
        "loaded model"
    );
    Ok(Box::new(model))
}
