//! ONNX Runtime adapter for regressors exported with skl2onnx.
//!
//! The graph takes one `float32[1, n]` input and yields one value.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use greenthread_store::{StoreError, artifacts};

use crate::PipelineError;
use crate::model::Regressor;

/// Regressor backed by an ONNX Runtime session.
///
/// Running a session needs exclusive access, so calls are serialised.
pub struct OnnxRegressor {
    session: Mutex<Session>,
    n_features: Option<usize>,
    path: PathBuf,
}

impl OnnxRegressor {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = artifacts::read_bytes(path)?;
        let session = open_session(&bytes)
            .map_err(|e| StoreError::Other(format!("load {}: {e}", path.display())))?;
        let n_features = session
            .inputs()
            .first()
            .and_then(|input| infer_width(input.dtype()));

        info!(?n_features, model = %path.display(), "loaded onnx model");
        Ok(Self {
            session: Mutex::new(session),
            n_features,
            path: path.to_path_buf(),
        })
    }
}

fn open_session(model: &[u8]) -> ort::Result<Session> {
    Session::builder()?.commit_from_memory(model)
}

impl Regressor for OnnxRegressor {
    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn predict(&self, x: &[f64]) -> Result<f64, PipelineError> {
        let fail = |e: ort::Error| PipelineError::PredictionFailure(format!("onnx: {e}"));

        let input: Vec<f32> = x.iter().map(|&v| v as f32).collect();
        let shape = [1i64, input.len() as i64];
        let tensor = Tensor::from_array((shape, input.into_boxed_slice())).map_err(fail)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PipelineError::PredictionFailure("onnx session poisoned".into()))?;
        let outputs = session.run(ort::inputs![tensor]).map_err(fail)?;
        let (_, data) = outputs[0].try_extract_tensor::<f32>().map_err(fail)?;

        data.first()
            .map(|&y| y as f64)
            .ok_or_else(|| PipelineError::PredictionFailure("onnx model returned no values".into()))
    }

    fn describe(&self) -> String {
        format!("onnx ({})", self.path.display())
    }
}

/// Input width from the declared `[batch, n]` shape, if it is static.
fn infer_width(input_type: &ort::value::ValueType) -> Option<usize> {
    match input_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
