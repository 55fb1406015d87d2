//! Closed-form estimates used when the model path cannot answer.
//!
//! These read raw request fields directly and never touch artifacts.

use greenthread_core::schema::{carbon, price};
use greenthread_core::{PredictorKind, RawInput};

/// kg CO2e per kg of material.
pub const CARBON_PER_MATERIAL_KG: f64 = 2.5;
/// kg CO2e per kWh consumed in production.
pub const CARBON_PER_KWH: f64 = 0.4;

/// Base price in USD before material and region adjustments.
pub const PRICE_BASE_USD: f64 = 30.0;
pub const USD_TO_INR: f64 = 80.0;

/// Heuristic estimate for `kind`. Always finite.
pub fn estimate(kind: PredictorKind, raw: &RawInput) -> f64 {
    let value = match kind {
        PredictorKind::Carbon => carbon_estimate(raw),
        PredictorKind::Price => price_estimate(raw),
    };
    if value.is_finite() { value } else { 0.0 }
}

/// Weighted sum of material quantity and energy used.
pub fn carbon_estimate(raw: &RawInput) -> f64 {
    CARBON_PER_MATERIAL_KG * raw.number_or_zero(carbon::MATERIAL_QUANTITY_KG)
        + CARBON_PER_KWH * raw.number_or_zero(carbon::ENERGY_USED_KWH)
}

/// Material and region adjusted base price, converted to INR.
///
/// Substring checks are case-sensitive.
pub fn price_estimate(raw: &RawInput) -> f64 {
    let material = raw.text(price::MATERIAL).unwrap_or_default();
    let region = raw.text(price::REGION).unwrap_or_default();

    let mut usd = PRICE_BASE_USD;
    if material.contains("Silk") {
        usd += 40.0;
    }
    if material.contains("Bamboo") {
        usd += 15.0;
    }
    if region.contains("India") {
        usd -= 5.0;
    }
    usd * USD_TO_INR
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawInput {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn carbon_weighted_sum() {
        let r = raw(json!({
            "material_quantity_kg": 1.8,
            "energy_used_kwh": 5.5,
            "transport_distance_km": 300
        }));
        let expected = 1.8 * 2.5 + 5.5 * 0.4;
        assert!((carbon_estimate(&r) - expected).abs() < 1e-12);
    }

    #[test]
    fn carbon_ignores_distance() {
        let near = raw(json!({"material_quantity_kg": 2, "transport_distance_km": 10}));
        let far = raw(json!({"material_quantity_kg": 2, "transport_distance_km": 9000}));
        assert_eq!(carbon_estimate(&near), 5.0);
        assert_eq!(carbon_estimate(&far), 5.0);
    }

    #[test]
    fn carbon_ignores_garbage() {
        let r = raw(json!({"material_quantity_kg": "a lot", "energy_used_kwh": null}));
        assert_eq!(estimate(PredictorKind::Carbon, &r), 0.0);
    }

    #[test]
    fn price_adjustments() {
        assert_eq!(price_estimate(&RawInput::default()), 2400.0);
        assert_eq!(price_estimate(&raw(json!({"material": "Silk"}))), 5600.0);
        assert_eq!(
            price_estimate(&raw(json!({"material": "Bamboo Silk", "region": "South India"}))),
            (30.0 + 40.0 + 15.0 - 5.0) * 80.0
        );
        // Case-sensitive, as the adjustments were defined.
        assert_eq!(price_estimate(&raw(json!({"material": "silk"}))), 2400.0);
    }

    #[test]
    fn overflow_collapses_to_zero() {
        let r = raw(json!({"material_quantity_kg": 1e308, "energy_used_kwh": 1e308}));
        assert_eq!(estimate(PredictorKind::Carbon, &r), 0.0);
    }
}
