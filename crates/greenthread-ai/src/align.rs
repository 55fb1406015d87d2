//! Feature vector alignment.
//!
//! The model dictates the vector: its length and the meaning of each position
//! come from the bundle's feature names, never from what the request happened
//! to contain.

use std::collections::HashSet;
use std::sync::Arc;

use greenthread_core::Features;

/// Ordered model input paired with the names it was aligned against.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at the first position named `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }
}

/// Build the model input for `expected` names.
///
/// Every position starts at 0.0. Numeric features overwrite positions with the
/// same name; category hits (dummy column names) set their position to 1.0.
/// Names in neither stay 0.0, and inputs with no matching position are
/// dropped. The result always has exactly `expected.len()` values.
pub fn align(expected: &Arc<[String]>, numeric: &Features, hits: &[String]) -> FeatureVector {
    let hits: HashSet<&str> = hits.iter().map(String::as_str).collect();
    let values = expected
        .iter()
        .map(|name| {
            if hits.contains(name.as_str()) {
                1.0
            } else {
                numeric.get(name).copied().unwrap_or(0.0)
            }
        })
        .collect();

    FeatureVector {
        names: Arc::clone(expected),
        values,
    }
}
