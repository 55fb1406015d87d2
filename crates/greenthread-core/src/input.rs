//! Loosely-typed request payloads.
//!
//! A request is any JSON object. Fields may be missing, null, numbers, or
//! strings holding numbers; nothing is validated up front. Accessors return
//! explicit results so callers decide where a failure collapses to a default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a raw field could not be read as a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericParseError {
    #[error("field is absent or null")]
    Missing,
    #[error("cannot parse {0:?} as a number")]
    Malformed(String),
    #[error("value {0} is not finite")]
    NonFinite(f64),
}

/// Payload of a single prediction request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInput {
    fields: Map<String, Value>,
}

impl RawInput {
    /// Parse a request body. Anything other than a JSON object is rejected.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Raw value of a field, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field rendered as text. Numbers and booleans are stringified; null,
    /// absent, arrays and objects give `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Field parsed as a finite `f64`.
    pub fn number(&self, key: &str) -> Result<f64, NumericParseError> {
        match self.fields.get(key) {
            Some(value) => parse_number(value),
            None => Err(NumericParseError::Missing),
        }
    }

    /// Field parsed as a number, or 0.0 on any parse failure.
    pub fn number_or_zero(&self, key: &str) -> f64 {
        or_zero(key, self.number(key))
    }
}

/// Best-effort cast of a JSON value to a finite `f64`.
///
/// Numeric strings are trimmed before parsing. Booleans count as 1/0.
pub fn parse_number(value: &Value) -> Result<f64, NumericParseError> {
    let n = match value {
        Value::Null => return Err(NumericParseError::Missing),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| NumericParseError::Malformed(n.to_string()))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| NumericParseError::Malformed(s.clone()))?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        other => return Err(NumericParseError::Malformed(other.to_string())),
    };
    if n.is_finite() {
        Ok(n)
    } else {
        Err(NumericParseError::NonFinite(n))
    }
}

/// Collapse a parse result to 0.0. Absent fields are silent; malformed ones
/// are logged at debug.
pub fn or_zero(key: &str, parsed: Result<f64, NumericParseError>) -> f64 {
    match parsed {
        Ok(n) => n,
        Err(NumericParseError::Missing) => 0.0,
        Err(e) => {
            tracing::debug!(field = key, error = %e, "numeric field defaulted to 0.0");
            0.0
        }
    }
}
