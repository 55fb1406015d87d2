//! Inference orchestration.
//!
//! Every request walks the same stages:
//!
//! ```text
//! Received → Derived → Encoded → Aligned → Predicted → Responded
//!                         │          │          │
//!                         └──────────┴──────────┴──→ Degraded → Responded
//! ```
//!
//! A missing bundle, a feature mismatch, or a failed prediction moves the
//! request straight to `Degraded`, where a closed-form heuristic answers
//! instead. There are no retries and no partial results: the caller always
//! gets a finite value tagged with its provenance.

use std::sync::Arc;

use greenthread_core::derive::{derive_carbon, derive_price};
use greenthread_core::schema::{carbon, price};
use greenthread_core::{Prediction, PredictorKind, RawInput};
use greenthread_store::ArtifactDir;
use tracing::{debug, trace, warn};

use crate::align::FeatureVector;
use crate::bundle::{ArtifactBundle, BundleCache};
use crate::encoding::CategoryCode;
use crate::{PipelineError, fallback};

/// Pipeline stage a request is in.
///
/// `Encoded` is reached once the bundle is resolved; the transform, category
/// encoding and alignment then move the request to `Aligned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Derived,
    Encoded,
    Aligned,
    Predicted,
    Degraded,
    Responded,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Derived => "derived",
            Self::Encoded => "encoded",
            Self::Aligned => "aligned",
            Self::Predicted => "predicted",
            Self::Degraded => "degraded",
            Self::Responded => "responded",
        }
    }
}

/// A pipeline failure and the stage it stopped at.
#[derive(Debug)]
pub struct StageError {
    /// Last stage reached before the failure.
    pub stage: Stage,
    pub error: PipelineError,
}

/// Serves both predictors from one shared bundle cache.
#[derive(Clone)]
pub struct Predictor {
    cache: Arc<BundleCache>,
}

impl Predictor {
    pub fn new(dir: ArtifactDir) -> Self {
        Self::with_cache(Arc::new(BundleCache::new(dir)))
    }

    pub fn with_cache(cache: Arc<BundleCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &BundleCache {
        &self.cache
    }

    /// Predict for one request. Never fails.
    pub fn predict(&self, kind: PredictorKind, raw: &RawInput) -> Prediction {
        let prediction = match self.try_predict(kind, raw) {
            Ok(value) => {
                debug!(kind = %kind, value, "model prediction");
                Prediction::model(value)
            }
            Err(StageError { stage, error }) => {
                enter(kind, Stage::Degraded);
                let value = fallback::estimate(kind, raw);
                warn!(
                    kind = %kind,
                    stage = stage.as_str(),
                    error = %error,
                    value,
                    "degraded to fallback estimate"
                );
                Prediction::fallback(value)
            }
        };
        enter(kind, Stage::Responded);
        prediction
    }

    /// Model path only: derive, encode, align, predict.
    pub fn try_predict(&self, kind: PredictorKind, raw: &RawInput) -> Result<f64, StageError> {
        let (bundle, vector) = self.build(kind, raw)?;
        let value = bundle.predict(vector.values()).map_err(|error| StageError {
            stage: Stage::Aligned,
            error,
        })?;
        enter(kind, Stage::Predicted);
        Ok(value)
    }

    /// The aligned vector the model would receive for this request.
    pub fn feature_vector(
        &self,
        kind: PredictorKind,
        raw: &RawInput,
    ) -> Result<FeatureVector, StageError> {
        self.build(kind, raw).map(|(_, vector)| vector)
    }

    fn build(
        &self,
        kind: PredictorKind,
        raw: &RawInput,
    ) -> Result<(Arc<ArtifactBundle>, FeatureVector), StageError> {
        enter(kind, Stage::Received);
        let derived = match kind {
            PredictorKind::Carbon => derive_carbon(raw),
            PredictorKind::Price => derive_price(raw),
        };
        enter(kind, Stage::Derived);

        let bundle = self.cache.get(kind).map_err(|error| StageError {
            stage: Stage::Derived,
            error,
        })?;
        enter(kind, Stage::Encoded);

        let at_encoded = |error| StageError {
            stage: Stage::Encoded,
            error,
        };
        let vector = match kind {
            PredictorKind::Carbon => {
                let scaled = bundle.transform(&derived).map_err(at_encoded)?;
                let hits: Vec<String> = carbon::ONE_HOT_FIELDS
                    .iter()
                    .filter_map(|field| {
                        match bundle.encode_category(field, raw.text(field).as_deref()) {
                            CategoryCode::Dummy(column) => Some(column),
                            _ => None,
                        }
                    })
                    .collect();
                bundle.align(&scaled, &hits)
            }
            PredictorKind::Price => {
                let mut numeric = bundle.transform(&derived).map_err(at_encoded)?;
                for (key, column) in price::CATEGORICAL_COLUMNS {
                    if let CategoryCode::Index(i) =
                        bundle.encode_category(column, raw.text(key).as_deref())
                    {
                        numeric.insert(column.to_string(), i as f64);
                    }
                }
                bundle.align(&numeric, &[])
            }
        };

        debug_assert_eq!(vector.len(), bundle.expected_feature_name_sequence().len());
        enter(kind, Stage::Aligned);
        Ok((bundle, vector))
    }
}

fn enter(kind: PredictorKind, stage: Stage) {
    trace!(kind = %kind, stage = stage.as_str(), "stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use greenthread_core::Provenance;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn raw(v: serde_json::Value) -> RawInput {
        serde_json::from_value(v).unwrap()
    }

    fn carbon_request() -> RawInput {
        raw(json!({
            "material_quantity_kg": 1.8,
            "energy_used_kwh": 5.5,
            "transport_distance_km": 300,
            "product_weight_kg": 2.0,
            "recycled_material_percent": 60,
            "primary_material": "wood",
            "production_type": "handmade"
        }))
    }

    fn price_request() -> RawInput {
        raw(json!({
            "product_name": "Madhubani Painting",
            "material": "Marble",
            "category": "Footwear",
            "region": "Delhi",
            "size_cm": "95x10x10",
            "weight_g": 3531,
            "description_keywords": "handcrafted, eco-friendly, cultural"
        }))
    }

    #[test]
    fn carbon_scenario_uses_model() {
        let tmp = TempDir::new().unwrap();
        let predictor = Predictor::new(fixtures::write_carbon(tmp.path()));
        let request = carbon_request();

        let vector = predictor.feature_vector(PredictorKind::Carbon, &request).unwrap();
        assert_eq!(vector.len(), fixtures::carbon_feature_names().len());
        assert_eq!(vector.get("organic_material"), Some(1.0));
        assert_eq!(vector.get("handmade_level"), Some(1.0));
        assert_eq!(vector.get("local_or_export"), Some(0.0));
        assert_eq!(vector.get("material_efficiency"), Some(2.0 / 1.8));
        assert_eq!(vector.get("primary_material_wood"), Some(1.0));
        assert_eq!(vector.get("production_type_handmade"), Some(1.0));
        assert_eq!(vector.get("primary_material_clay"), Some(0.0));
        assert_eq!(vector.get("product_id_P0001"), Some(0.0));

        let model = fixtures::carbon_model();
        let expected = model.intercept
            + model
                .coefficients
                .iter()
                .zip(vector.values())
                .map(|(c, x)| c * x)
                .sum::<f64>();

        let prediction = predictor.predict(PredictorKind::Carbon, &request);
        assert_eq!(prediction.provenance, Provenance::Model);
        assert!((prediction.predicted_value - expected).abs() < 1e-9);
    }

    #[test]
    fn carbon_without_bundle_falls_back() {
        let tmp = TempDir::new().unwrap();
        let dir = fixtures::write_carbon(tmp.path());
        fs::remove_dir_all(dir.paths(PredictorKind::Carbon).dir).unwrap();
        let predictor = Predictor::new(dir);
        let request = carbon_request();

        let err = predictor.try_predict(PredictorKind::Carbon, &request).unwrap_err();
        assert_eq!(err.stage, Stage::Derived);
        assert!(matches!(err.error, PipelineError::ArtifactMissing { .. }));

        let prediction = predictor.predict(PredictorKind::Carbon, &request);
        assert!(prediction.is_fallback());
        assert!(prediction.predicted_value.is_finite());
        assert_eq!(
            prediction.predicted_value,
            fallback::carbon_estimate(&request)
        );
    }

    #[test]
    fn unknown_categories_only_zero_their_dummies() {
        let tmp = TempDir::new().unwrap();
        let predictor = Predictor::new(fixtures::write_carbon(tmp.path()));
        let request = raw(json!({
            "material_quantity_kg": "2",
            "primary_material": "Recycled Steel",
            "production_type": "Machine Made"
        }));

        let vector = predictor.feature_vector(PredictorKind::Carbon, &request).unwrap();
        for dummy in fixtures::CARBON_DUMMIES {
            let expected = if *dummy == "production_type_machine_made" { 1.0 } else { 0.0 };
            assert_eq!(vector.get(dummy), Some(expected), "{dummy}");
        }
        assert_eq!(vector.get("handmade_level"), Some(0.0));

        let prediction = predictor.predict(PredictorKind::Carbon, &request);
        assert_eq!(prediction.provenance, Provenance::Model);
    }

    #[test]
    fn scaler_schema_drift_degrades() {
        let tmp = TempDir::new().unwrap();
        let dir = fixtures::write_carbon(tmp.path());
        let paths = dir.paths(PredictorKind::Carbon);
        let mut names: Vec<String> =
            carbon::SCALER_FEATURES.iter().map(|s| s.to_string()).collect();
        names.swap(0, 1);
        greenthread_store::artifacts::write_json(
            &paths.transform,
            &crate::scaler::StandardScaler::identity(names),
        )
        .unwrap();

        let predictor = Predictor::new(dir);
        let err = predictor.try_predict(PredictorKind::Carbon, &carbon_request()).unwrap_err();
        assert_eq!(err.stage, Stage::Encoded);
        assert!(matches!(err.error, PipelineError::FeatureMismatch(_)));
        assert!(predictor.predict(PredictorKind::Carbon, &carbon_request()).is_fallback());
    }

    #[test]
    fn price_scenario_uses_model() {
        let tmp = TempDir::new().unwrap();
        let predictor = Predictor::new(fixtures::write_price(tmp.path()));
        let request = price_request();

        let vector = predictor.feature_vector(PredictorKind::Price, &request).unwrap();
        assert_eq!(
            vector.values(),
            &[2.0, 1.0, 0.0, 0.0, 3531.0, 95.0, 10.0, 10.0]
        );

        // Marble (class 1) → 500; 3531 g → 900.
        let prediction = predictor.predict(PredictorKind::Price, &request);
        assert_eq!(prediction, Prediction::model(700.0));
    }

    #[test]
    fn price_unseen_material_resolves_to_default_index() {
        let tmp = TempDir::new().unwrap();
        let predictor = Predictor::new(fixtures::write_price(tmp.path()));
        let request = raw(json!({"material": "Unobtainium", "region": "Mars", "weight_g": 10}));

        let vector = predictor.feature_vector(PredictorKind::Price, &request).unwrap();
        assert_eq!(vector.get("Material"), Some(0.0));
        assert_eq!(vector.get("Region"), Some(0.0));

        let prediction = predictor.predict(PredictorKind::Price, &request);
        assert_eq!(prediction, Prediction::model(400.0));
    }

    #[test]
    fn price_without_bundle_uses_heuristic() {
        let tmp = TempDir::new().unwrap();
        let predictor = Predictor::new(ArtifactDir::new(tmp.path()));
        let request = raw(json!({"material": "Silk", "region": "India"}));

        let prediction = predictor.predict(PredictorKind::Price, &request);
        assert_eq!(prediction, Prediction::fallback((30.0 + 40.0 - 5.0) * 80.0));
    }

    #[test]
    fn bundle_rejects_short_vector() {
        use crate::bundle::Transform;
        use crate::encoding::LabelEncoders;
        use crate::model::{JsonModel, LinearModel};

        let bundle = ArtifactBundle::from_parts(
            PredictorKind::Price,
            Box::new(JsonModel::Linear(LinearModel {
                intercept: 0.0,
                coefficients: vec![1.0; 8],
            })),
            Transform::Encoders(LabelEncoders::default()),
            fixtures::price_feature_names(),
        )
        .unwrap();
        assert!(matches!(
            bundle.predict(&[1.0; 7]),
            Err(PipelineError::PredictionFailure(_))
        ));
    }

    #[test]
    fn non_finite_model_output_degrades() {
        let tmp = TempDir::new().unwrap();
        let predictor = Predictor::new(fixtures::write_carbon(tmp.path()));
        let request = raw(json!({
            "material_quantity_kg": 1e308,
            "recycled_material_percent": 200
        }));

        let err = predictor.try_predict(PredictorKind::Carbon, &request).unwrap_err();
        assert_eq!(err.stage, Stage::Aligned);
        assert!(matches!(err.error, PipelineError::PredictionFailure(_)), "{}", err.error);

        let prediction = predictor.predict(PredictorKind::Carbon, &request);
        assert!(prediction.is_fallback());
        assert!(prediction.predicted_value.is_finite());
    }

    #[test]
    fn every_request_gets_a_finite_answer() {
        let tmp = TempDir::new().unwrap();
        fixtures::write_carbon(tmp.path());
        fixtures::write_price(tmp.path());
        let predictor = Predictor::new(ArtifactDir::new(tmp.path()));

        let requests = [
            json!({}),
            json!({"material_quantity_kg": "NaN", "transport_distance_km": "inf"}),
            json!({"primary_material": 42, "production_type": null, "weight_g": [1]}),
            json!({"size_cm": "1x2", "material": {"nested": true}}),
            json!({"energy_used_kwh": -5, "recycled_material_percent": "120"}),
        ];
        for request in requests {
            let request = raw(request);
            for kind in PredictorKind::ALL {
                let p = predictor.predict(kind, &request);
                assert!(p.predicted_value.is_finite(), "{kind}: {request:?}");
                assert_eq!(p.provenance, Provenance::Model, "{kind}: {request:?}");
            }
        }
    }

    #[test]
    fn concurrent_requests_share_one_load() {
        let tmp = TempDir::new().unwrap();
        let predictor = Predictor::new(fixtures::write_carbon(tmp.path()));
        let request = carbon_request();

        let results: Vec<Prediction> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| predictor.predict(PredictorKind::Carbon, &request)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(predictor.cache().load_attempts(PredictorKind::Carbon), 1);
        assert!(results.iter().all(|p| *p == results[0]));
        assert_eq!(results[0].provenance, Provenance::Model);
    }
}
