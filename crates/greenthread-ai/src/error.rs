use greenthread_core::PredictorKind;
use greenthread_store::StoreError;
use thiserror::Error;

/// Failures that send a request down the fallback path.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A bundle file is absent, unreadable, or inconsistent with the others.
    #[error("{kind} artifacts unavailable: {source}")]
    ArtifactMissing {
        kind: PredictorKind,
        #[source]
        source: StoreError,
    },

    /// The numeric features do not match the transform's fixed input schema.
    #[error("feature mismatch: {0}")]
    FeatureMismatch(String),

    /// Wrong vector length, or the model itself failed.
    #[error("prediction failed: {0}")]
    PredictionFailure(String),
}

impl PipelineError {
    pub(crate) fn missing(kind: PredictorKind, source: StoreError) -> Self {
        Self::ArtifactMissing { kind, source }
    }

    pub(crate) fn corrupt(kind: PredictorKind, reason: impl Into<String>) -> Self {
        Self::ArtifactMissing {
            kind,
            source: StoreError::Other(reason.into()),
        }
    }
}

/// A categorical value outside the vocabulary an encoder was fit on.
///
/// Never surfaced to callers: encoding collapses it to the default class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unseen label {value:?} for column {column}")]
pub struct UnseenLabel {
    pub column: String,
    pub value: String,
}
