//! Raw feature derivation.
//!
//! Pure rules that turn loosely-typed request fields into named scalars.
//! Nothing here is learned and nothing here fails: unparsable input takes the
//! documented neutral value instead.
//!
//! # Carbon features
//!
//! The carbon scaler was fit on 17 columns. Five come straight from the
//! request, three are scored from text or distance, six were never collected
//! from sellers and take the training-set defaults, and three are ratios of
//! the others.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::input::{RawInput, parse_number};
use crate::schema::{carbon, price};

/// Named scalar features, ordered by name.
pub type Features = BTreeMap<String, f64>;

/// Material keywords counted as organic. Matched as lowercase substrings.
pub const ORGANIC_KEYWORDS: &[&str] = &[
    "wood",
    "cotton",
    "jute",
    "cane",
    "bamboo",
    "wool",
    "silk",
    "paper",
    "leather",
    "clay",
    "canvas",
    "palm leaf",
];

/// Distance beyond which a shipment counts as export.
pub const EXPORT_DISTANCE_KM: f64 = 1000.0;

// Training-set defaults for fields the request does not carry.
pub const DEFAULT_RECYCLABLE_PACKAGING: f64 = 0.494;
pub const DEFAULT_PACKAGING_WEIGHT_KG: f64 = 0.5;
pub const DEFAULT_PRODUCTION_TIME_HOURS: f64 = 10.0;
pub const DEFAULT_UNITS_PER_BATCH: f64 = 100.0;
pub const DEFAULT_RENEWABLE_ENERGY_PERCENT: f64 = 20.0;
pub const DEFAULT_TRANSPORT_LOAD_KG: f64 = 1000.0;

/// 1.0 if the material mentions any organic keyword, else 0.0.
pub fn organic_score(material: &str) -> f64 {
    let material = material.to_lowercase();
    if ORGANIC_KEYWORDS.iter().any(|k| material.contains(k)) {
        1.0
    } else {
        0.0
    }
}

/// 1.0 for handmade, 0.0 for machine-made, 0.5 when unknown.
pub fn handmade_score(production_type: &str) -> f64 {
    let production_type = production_type.to_lowercase();
    if production_type.contains("handmade") {
        1.0
    } else if production_type.contains("machine") {
        0.0
    } else {
        0.5
    }
}

/// 1.0 if the transport distance exceeds [`EXPORT_DISTANCE_KM`], else 0.0.
pub fn locality_flag(distance_km: &Value) -> f64 {
    match parse_number(distance_km) {
        Ok(d) if d > EXPORT_DISTANCE_KM => 1.0,
        _ => 0.0,
    }
}

/// `numerator / denominator`, or 0.0 unless the denominator is positive.
pub fn efficiency_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Split an `"LxWxH"` size string into its three dimensions.
///
/// The separator is case-insensitive. Anything other than exactly three
/// numeric parts gives `(0, 0, 0)`.
pub fn parse_size(size: &str) -> (f64, f64, f64) {
    let lower = size.to_lowercase();
    let parts: Vec<&str> = lower.split('x').collect();
    if parts.len() != 3 {
        return (0.0, 0.0, 0.0);
    }
    let dims: Result<Vec<f64>, _> = parts.iter().map(|p| p.trim().parse::<f64>()).collect();
    match dims {
        Ok(d) if d.iter().all(|v| v.is_finite()) => (d[0], d[1], d[2]),
        _ => (0.0, 0.0, 0.0),
    }
}

/// Derive the 17 scaler features for the carbon predictor.
pub fn derive_carbon(raw: &RawInput) -> Features {
    let material_quantity = raw.number_or_zero(carbon::MATERIAL_QUANTITY_KG);
    let energy_used = raw.number_or_zero(carbon::ENERGY_USED_KWH);
    let transport_distance = raw.number_or_zero(carbon::TRANSPORT_DISTANCE_KM);
    let product_weight = raw.number_or_zero(carbon::PRODUCT_WEIGHT_KG);
    let recycled_percent = raw.number_or_zero(carbon::RECYCLED_MATERIAL_PERCENT);

    let material = raw.text(carbon::PRIMARY_MATERIAL).unwrap_or_default();
    let production_type = raw.text(carbon::PRODUCTION_TYPE).unwrap_or_default();
    let local_or_export = raw
        .get(carbon::TRANSPORT_DISTANCE_KM)
        .map_or(0.0, locality_flag);

    let values = [
        ("material_quantity_kg", material_quantity),
        ("energy_used_kwh", energy_used),
        ("transport_distance_km", transport_distance),
        ("product_weight_kg", product_weight),
        ("recycled_material_percent", recycled_percent),
        ("organic_material", organic_score(&material)),
        ("handmade_level", handmade_score(&production_type)),
        ("local_or_export", local_or_export),
        ("recyclable_packaging", DEFAULT_RECYCLABLE_PACKAGING),
        ("packaging_weight_kg", DEFAULT_PACKAGING_WEIGHT_KG),
        ("production_time_hours", DEFAULT_PRODUCTION_TIME_HOURS),
        ("units_per_batch", DEFAULT_UNITS_PER_BATCH),
        ("renewable_energy_percent", DEFAULT_RENEWABLE_ENERGY_PERCENT),
        ("transport_load_kg", DEFAULT_TRANSPORT_LOAD_KG),
        (
            "material_efficiency",
            efficiency_ratio(product_weight, material_quantity),
        ),
        (
            "production_efficiency",
            efficiency_ratio(DEFAULT_UNITS_PER_BATCH, DEFAULT_PRODUCTION_TIME_HOURS),
        ),
        (
            "total_recycled_material_kg",
            material_quantity * (recycled_percent / 100.0),
        ),
    ];

    values
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Derive the numeric price features: weight and the three size dimensions.
pub fn derive_price(raw: &RawInput) -> Features {
    let weight = raw.number_or_zero(price::WEIGHT_G);
    let (l, w, h) = raw
        .text(price::SIZE_CM)
        .map_or((0.0, 0.0, 0.0), |s| parse_size(&s));

    let [weight_col, l_col, w_col, h_col] = price::NUMERIC_FEATURES;
    Features::from([
        (weight_col.to_string(), weight),
        (l_col.to_string(), l),
        (w_col.to_string(), w),
        (h_col.to_string(), h),
    ])
}
