//! Predictor kinds and the response contract shared by every transport.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which trained predictor a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictorKind {
    /// Carbon emission per product, in kg CO2e.
    Carbon,
    /// Resale price, in INR.
    Price,
}

impl PredictorKind {
    pub const ALL: [PredictorKind; 2] = [PredictorKind::Carbon, PredictorKind::Price];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Carbon => "carbon",
            Self::Price => "price",
        }
    }
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "carbon" => Ok(Self::Carbon),
            "price" => Ok(Self::Price),
            other => Err(format!("unknown predictor kind: {other}")),
        }
    }
}

/// Where a predicted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// The trained model produced the value.
    Model,
    /// Artifacts or inputs did not line up; a closed-form heuristic was used.
    Fallback,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Fallback => "fallback",
        }
    }
}

/// Final answer for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_value: f64,
    pub provenance: Provenance,
}

impl Prediction {
    pub fn model(value: f64) -> Self {
        Self {
            predicted_value: value,
            provenance: Provenance::Model,
        }
    }

    pub fn fallback(value: f64) -> Self {
        Self {
            predicted_value: value,
            provenance: Provenance::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }
}
