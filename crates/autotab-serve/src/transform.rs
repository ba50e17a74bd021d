//! Contract replay: raw feature values to the model's numeric layout.
//!
//! This is the inference-time mirror of the fit-time encoding. It reads
//! only from the immutable contract; nothing here writes state, so
//! concurrent predictions against one model need no coordination.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use autotab_model::{PreprocessingContract, UNKNOWN_CATEGORY_CODE, format_numeric};

use crate::error::PredictError;

/// A raw feature value supplied by a prediction caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl FeatureValue {
    /// String form used for categorical lookup, matching the fit-time
    /// canonical form: integral floats render without a fractional part.
    pub fn string_form(&self) -> String {
        match self {
            Self::Number(n) => format_numeric(*n),
            Self::Bool(b) => b.to_string(),
            Self::Text(t) => t.clone(),
        }
    }

    /// Numeric coercion for numeric features. Text is parsed; failure to
    /// parse is the caller's error, not a fallback case.
    fn coerce_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(t) => t.trim().parse::<f64>().ok(),
        }
    }
}

/// Names from `feature_columns` absent from the supplied features, in
/// contract order.
pub fn missing_features(
    contract: &PreprocessingContract,
    raw_features: &BTreeMap<String, FeatureValue>,
) -> Vec<String> {
    contract
        .feature_columns
        .iter()
        .filter(|name| !raw_features.contains_key(*name))
        .cloned()
        .collect()
}

/// Encode one row of raw features into the exact column order the model
/// expects.
///
/// Categorical lookups fall back to the unknown-category sentinel for
/// values never seen at fit time; numeric coercion failures are structural
/// misuse and error out with the offending column and value.
pub fn encode_row(
    contract: &PreprocessingContract,
    raw_features: &BTreeMap<String, FeatureValue>,
) -> Result<Vec<f64>, PredictError> {
    let missing = missing_features(contract, raw_features);
    if !missing.is_empty() {
        return Err(PredictError::MissingFeatures(missing));
    }

    let mut encoded = Vec::with_capacity(contract.feature_columns.len());
    for column in &contract.feature_columns {
        let value = &raw_features[column];
        if contract.is_categorical(column) {
            let code = contract
                .categorical_mappings
                .get(column)
                .and_then(|mapping| mapping.get(&value.string_form()).copied())
                .unwrap_or(UNKNOWN_CATEGORY_CODE);
            encoded.push(code as f64);
        } else {
            let number = value
                .coerce_number()
                .ok_or_else(|| PredictError::InvalidFeatureValue {
                    column: column.clone(),
                    value: value.string_form(),
                })?;
            encoded.push(number);
        }
    }
    Ok(encoded)
}
