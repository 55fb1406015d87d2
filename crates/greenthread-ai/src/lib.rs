//! Inference layer: fitted transforms, feature alignment, model adapters,
//! and the orchestrator that falls back to heuristics when the model path fails.

pub mod align;
pub mod bundle;
pub mod encoding;
mod error;
pub mod fallback;
pub mod model;
#[cfg(feature = "onnx")]
mod onnx;
pub mod predictor;
pub mod scaler;

#[cfg(test)]
mod fixtures;

pub use align::FeatureVector;
pub use bundle::{ArtifactBundle, BundleCache, Transform};
pub use encoding::{CategoryCode, LabelEncoders};
pub use error::{PipelineError, UnseenLabel};
pub use model::{JsonModel, Regressor};
#[cfg(feature = "onnx")]
pub use onnx::OnnxRegressor;
pub use predictor::{Predictor, Stage, StageError};
pub use scaler::StandardScaler;
