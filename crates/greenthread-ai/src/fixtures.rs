//! Small but complete artifact bundles written to temporary directories.

use std::collections::BTreeMap;
use std::path::Path;

use greenthread_core::PredictorKind;
use greenthread_core::schema::carbon;
use greenthread_store::{ArtifactDir, artifacts};

use crate::model::{ForestModel, JsonModel, LinearModel, Tree};
use crate::scaler::StandardScaler;

pub const CARBON_DUMMIES: &[&str] = &[
    "primary_material_wood",
    "primary_material_clay",
    "primary_material_palm_leaf",
    "production_type_handmade",
    "production_type_machine_made",
    "product_id_P0001",
];

/// Scaler columns followed by one-hot dummies, as the training frame had them.
pub fn carbon_feature_names() -> Vec<String> {
    carbon::SCALER_FEATURES
        .iter()
        .chain(CARBON_DUMMIES)
        .map(|s| s.to_string())
        .collect()
}

/// Coefficient `0.1 * (i + 1)` for position `i`, intercept 2.0.
pub fn carbon_model() -> LinearModel {
    let n = carbon_feature_names().len();
    LinearModel {
        intercept: 2.0,
        coefficients: (0..n).map(|i| 0.1 * (i + 1) as f64).collect(),
    }
}

/// Identity scaler, so aligned values equal derived values.
pub fn write_carbon(root: &Path) -> ArtifactDir {
    let dir = ArtifactDir::new(root);
    let paths = dir.paths(PredictorKind::Carbon);
    let scaler = StandardScaler::identity(
        carbon::SCALER_FEATURES.iter().map(|s| s.to_string()).collect(),
    );

    artifacts::write_feature_names(&paths.feature_names, &carbon_feature_names()).unwrap();
    artifacts::write_json(&paths.transform, &scaler).unwrap();
    artifacts::write_json(&paths.model_json, &JsonModel::Linear(carbon_model())).unwrap();
    dir
}

pub fn price_feature_names() -> Vec<String> {
    [
        "Product_Name",
        "Material",
        "Category",
        "Region",
        "Weight(g)",
        "Size_L",
        "Size_W",
        "Size_H",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn price_encoders() -> BTreeMap<String, Vec<String>> {
    let column = |classes: &[&str]| classes.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    BTreeMap::from([
        (
            "Product_Name".to_string(),
            column(&["Bamboo Basket", "Jute Bag", "Madhubani Painting"]),
        ),
        ("Material".to_string(), column(&["Bamboo", "Marble", "Silk"])),
        ("Category".to_string(), column(&["Footwear", "Home Decor", "Textiles"])),
        ("Region".to_string(), column(&["Delhi", "Gujarat", "West Bengal"])),
    ])
}

/// Two stumps: material index (position 1) and weight (position 4).
///
/// Material class <= 1 → 500 else 1500; weight <= 1000 g → 300 else 900.
pub fn price_model() -> ForestModel {
    let stump = |feature: i64, threshold: f64, left: f64, right: f64| Tree {
        children_left: vec![1, -1, -1],
        children_right: vec![2, -1, -1],
        feature: vec![feature, -2, -2],
        threshold: vec![threshold, -2.0, -2.0],
        value: vec![0.0, left, right],
    };
    ForestModel {
        n_features: price_feature_names().len(),
        trees: vec![stump(1, 1.5, 500.0, 1500.0), stump(4, 1000.0, 300.0, 900.0)],
    }
}

pub fn write_price(root: &Path) -> ArtifactDir {
    let dir = ArtifactDir::new(root);
    let paths = dir.paths(PredictorKind::Price);

    artifacts::write_feature_names(&paths.feature_names, &price_feature_names()).unwrap();
    artifacts::write_json(&paths.transform, &price_encoders()).unwrap();
    artifacts::write_json(&paths.model_json, &JsonModel::Forest(price_model())).unwrap();
    dir
}
