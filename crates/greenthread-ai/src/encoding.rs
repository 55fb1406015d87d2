//! Categorical reconciliation.
//!
//! Two conventions exist, one per predictor:
//!
//! - **Label index** (price): each column has a fitted vocabulary and a value
//!   encodes to its position. Lookup is exact and case-sensitive. Values
//!   outside the vocabulary encode to class 0.
//! - **One-hot** (carbon): the model's feature names include dummy columns
//!   named `<field>_<value>`. A value is lowercased, trimmed, and has spaces
//!   replaced by underscores; if the resulting dummy name is a model feature
//!   it is switched on, otherwise nothing is.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::UnseenLabel;

/// Index used for values outside an encoder's vocabulary.
pub const DEFAULT_CLASS: usize = 0;

/// How one categorical value resolved against a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryCode {
    /// Label-encoded class index.
    Index(usize),
    /// Dummy column to set to 1.0.
    Dummy(String),
    /// No dummy column exists for this value.
    NoMatch,
}

/// Vocabulary learned for one column. A value's code is its position.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            index.entry(class.clone()).or_insert(i);
        }
        Self { classes, index }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self, column: &str, value: &str) -> Result<usize, UnseenLabel> {
        self.index.get(value).copied().ok_or_else(|| UnseenLabel {
            column: column.to_string(),
            value: value.to_string(),
        })
    }
}

/// Fitted label encoders keyed by training column name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelEncoders {
    columns: BTreeMap<String, LabelEncoder>,
}

impl LabelEncoders {
    pub fn from_classes(classes: BTreeMap<String, Vec<String>>) -> Self {
        let columns = classes
            .into_iter()
            .map(|(column, classes)| (column, LabelEncoder::new(classes)))
            .collect();
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.columns.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &LabelEncoder)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Exact lookup. A column without an encoder has an empty vocabulary.
    pub fn try_encode(&self, column: &str, value: &str) -> Result<usize, UnseenLabel> {
        match self.columns.get(column) {
            Some(encoder) => encoder.transform(column, value),
            None => Err(UnseenLabel {
                column: column.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Lookup with unseen labels collapsed to [`DEFAULT_CLASS`].
    pub fn encode(&self, column: &str, value: &str) -> usize {
        self.try_encode(column, value).unwrap_or_else(|unseen| {
            debug!(%unseen, "encoded as default class");
            DEFAULT_CLASS
        })
    }
}

/// Candidate dummy column for a one-hot field, or `None` for an empty value.
pub fn dummy_column(field: &str, value: &str) -> Option<String> {
    let normalized = value.to_lowercase();
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return None;
    }
    Some(format!("{field}_{}", normalized.replace(' ', "_")))
}
