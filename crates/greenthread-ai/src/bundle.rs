//! Artifact bundles and their process-wide cache.
//!
//! A bundle is the triple written at training time: the model, its fitted
//! transform (a scaler for carbon, label encoders for price), and the ordered
//! feature names the model consumes. Bundles are loaded on first use and then
//! shared read-only for the life of the process.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use greenthread_core::schema::{carbon, price};
use greenthread_core::{Features, PredictorKind};
use greenthread_store::{ArtifactDir, StoreError, artifacts};
use tracing::info;

use crate::PipelineError;
use crate::align::{FeatureVector, align};
use crate::encoding::{CategoryCode, LabelEncoders, dummy_column};
use crate::model::{Regressor, load_model};
use crate::scaler::{StandardScaler, features_to_batch, first_row};

/// Fitted input transform for a predictor kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Standard scaler over the fixed carbon feature frame.
    Scaler(StandardScaler),
    /// Per-column label encoders; numeric features pass through unscaled.
    Encoders(LabelEncoders),
}

/// Loaded model, transform, and expected feature order for one predictor.
pub struct ArtifactBundle {
    kind: PredictorKind,
    model: Box<dyn Regressor>,
    transform: Transform,
    feature_names: Arc<[String]>,
    name_set: HashSet<String>,
}

impl std::fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("kind", &self.kind)
            .field("model", &self.model.describe())
            .field("features", &self.feature_names.len())
            .finish()
    }
}

impl ArtifactBundle {
    /// Read every file of a bundle from disk.
    ///
    /// Any absent, undecodable, or mutually inconsistent file is reported as
    /// [`PipelineError::ArtifactMissing`].
    pub fn load(kind: PredictorKind, dir: &ArtifactDir) -> Result<Self, PipelineError> {
        let paths = dir.paths(kind);
        let missing = |e: StoreError| PipelineError::missing(kind, e);

        let feature_names = artifacts::read_feature_names(&paths.feature_names).map_err(missing)?;
        let transform = match kind {
            PredictorKind::Carbon => {
                let scaler: StandardScaler =
                    artifacts::read_json(&paths.transform).map_err(missing)?;
                scaler
                    .validate()
                    .map_err(|e| PipelineError::corrupt(kind, format!("scaler: {e}")))?;
                Transform::Scaler(scaler)
            }
            PredictorKind::Price => {
                let classes: BTreeMap<String, Vec<String>> =
                    artifacts::read_json(&paths.transform).map_err(missing)?;
                Transform::Encoders(LabelEncoders::from_classes(classes))
            }
        };
        let model = load_model(&paths).map_err(missing)?;

        let bundle = Self::from_parts(kind, model, transform, feature_names)?;
        info!(
            kind = %kind,
            features = bundle.feature_names.len(),
            dir = %paths.dir.display(),
            "loaded artifact bundle"
        );
        Ok(bundle)
    }

    /// Assemble a bundle from already-loaded parts.
    ///
    /// Fails when the model declares an input width different from the number
    /// of feature names, since such a triple can never predict.
    pub fn from_parts(
        kind: PredictorKind,
        model: Box<dyn Regressor>,
        transform: Transform,
        feature_names: Vec<String>,
    ) -> Result<Self, PipelineError> {
        if feature_names.is_empty() {
            return Err(PipelineError::corrupt(kind, "feature name list is empty"));
        }
        if let Some(width) = model.n_features()
            && width != feature_names.len()
        {
            return Err(PipelineError::corrupt(
                kind,
                format!(
                    "model expects {width} features but {} names were recorded",
                    feature_names.len()
                ),
            ));
        }
        let name_set = feature_names.iter().cloned().collect();
        Ok(Self {
            kind,
            model,
            transform,
            feature_names: feature_names.into(),
            name_set,
        })
    }

    pub fn kind(&self) -> PredictorKind {
        self.kind
    }

    /// Feature names in the order the model consumes them.
    pub fn expected_feature_name_sequence(&self) -> &[String] {
        &self.feature_names
    }

    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    pub fn fitted_transform(&self) -> &Transform {
        &self.transform
    }

    /// Apply the fitted numeric transform.
    ///
    /// The input must carry exactly the transform's declared features: the 17
    /// carbon scaler columns, or the four price numeric columns.
    pub fn transform(&self, features: &Features) -> Result<Features, PipelineError> {
        match &self.transform {
            Transform::Scaler(scaler) => {
                let batch = features_to_batch(Arc::new(carbon::scaler_input_schema()), features)?;
                first_row(&scaler.transform(&batch)?)
            }
            Transform::Encoders(_) => {
                let provided: Vec<&str> = features.keys().map(String::as_str).collect();
                let mut declared = price::NUMERIC_FEATURES.to_vec();
                declared.sort_unstable();
                if provided != declared {
                    return Err(PipelineError::FeatureMismatch(format!(
                        "expected {declared:?}, got {provided:?}"
                    )));
                }
                Ok(features.clone())
            }
        }
    }

    /// Resolve one categorical value under this bundle's convention.
    ///
    /// Never fails: unseen labels become class 0, unknown dummies `NoMatch`.
    pub fn encode_category(&self, column: &str, raw: Option<&str>) -> CategoryCode {
        match &self.transform {
            Transform::Encoders(encoders) => {
                CategoryCode::Index(encoders.encode(column, raw.unwrap_or_default()))
            }
            Transform::Scaler(_) => match raw.and_then(|v| dummy_column(column, v)) {
                Some(dummy) if self.name_set.contains(&dummy) => CategoryCode::Dummy(dummy),
                _ => CategoryCode::NoMatch,
            },
        }
    }

    /// Zero-filled vector over the expected feature names.
    pub fn align(&self, numeric: &Features, hits: &[String]) -> FeatureVector {
        align(&self.feature_names, numeric, hits)
    }

    /// Run the model on an aligned vector.
    pub fn predict(&self, vector: &[f64]) -> Result<f64, PipelineError> {
        if vector.len() != self.feature_names.len() {
            return Err(PipelineError::PredictionFailure(format!(
                "vector has {} values, bundle expects {}",
                vector.len(),
                self.feature_names.len()
            )));
        }
        let y = self.model.predict(vector)?;
        if !y.is_finite() {
            return Err(PipelineError::PredictionFailure(format!(
                "model returned {y}"
            )));
        }
        Ok(y)
    }
}

/// One lazily-filled bundle slot.
#[derive(Default)]
struct Slot {
    bundle: OnceLock<Arc<ArtifactBundle>>,
    load_lock: Mutex<()>,
    loads: AtomicUsize,
}

/// Process-wide bundle cache, one slot per predictor kind.
///
/// The first successful load is kept forever. Concurrent first requests
/// serialise on the slot's lock so the files are read once; failures are not
/// cached and the next request tries again.
pub struct BundleCache {
    dir: ArtifactDir,
    carbon: Slot,
    price: Slot,
}

impl BundleCache {
    pub fn new(dir: ArtifactDir) -> Self {
        Self {
            dir,
            carbon: Slot::default(),
            price: Slot::default(),
        }
    }

    fn slot(&self, kind: PredictorKind) -> &Slot {
        match kind {
            PredictorKind::Carbon => &self.carbon,
            PredictorKind::Price => &self.price,
        }
    }

    /// The bundle for `kind`, loading it on first use.
    pub fn get(&self, kind: PredictorKind) -> Result<Arc<ArtifactBundle>, PipelineError> {
        let slot = self.slot(kind);
        if let Some(bundle) = slot.bundle.get() {
            return Ok(Arc::clone(bundle));
        }

        let _guard = slot.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bundle) = slot.bundle.get() {
            return Ok(Arc::clone(bundle));
        }

        slot.loads.fetch_add(1, Ordering::Relaxed);
        let bundle = Arc::new(ArtifactBundle::load(kind, &self.dir)?);
        Ok(Arc::clone(slot.bundle.get_or_init(|| bundle)))
    }

    /// Number of load attempts made for `kind`.
    pub fn load_attempts(&self, kind: PredictorKind) -> usize {
        self.slot(kind).loads.load(Ordering::Relaxed)
    }
}
