//! The preprocessing contract: the serialized boundary between training and
//! inference.
//!
//! A contract is produced once at the end of a successful fit and never
//! mutated afterwards. Retraining produces a new contract. The JSON field
//! names and nesting here are an external format: the training side writes
//! them and the inference side — possibly a different process or runtime —
//! reads them back unmodified.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::roles::FeatureType;

/// Per-numeric-feature statistics captured from the original (pre-encoding)
/// training distribution. Consumed by validation and input forms, not by the
/// transform itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub is_integer: bool,
}

impl NumericStats {
    /// Stats over present values; `None` when there are none to summarize.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut stats: Option<NumericStats> = None;
        for value in values {
            stats = Some(match stats {
                None => NumericStats {
                    min: value,
                    max: value,
                    is_integer: value.fract() == 0.0,
                },
                Some(s) => NumericStats {
                    min: s.min.min(value),
                    max: s.max.max(value),
                    is_integer: s.is_integer && value.fract() == 0.0,
                },
            });
        }
        stats
    }
}

/// Snapshot of fit-time preprocessing state.
///
/// `feature_columns` order is load-bearing: it defines the exact layout of
/// the numeric vector the model expects and must be preserved bit-for-bit
/// between fit and every subsequent transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingContract {
    /// Ordered feature column names defining the model input layout.
    pub feature_columns: Vec<String>,
    /// Columns excluded by the classifier, kept for transparency only.
    pub dropped_columns: Vec<String>,
    /// Column → numeric/categorical.
    pub feature_types: BTreeMap<String, FeatureType>,
    /// Column → (original value → integer code), categorical features only.
    pub categorical_mappings: BTreeMap<String, BTreeMap<String, i64>>,
    /// Column → min/max/is_integer over the original training values.
    pub numeric_stats: BTreeMap<String, NumericStats>,
    /// Encoded label → original label; present only for classification with
    /// a non-numeric target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mapping: Option<BTreeMap<i64, String>>,
}

impl PreprocessingContract {
    /// Check structural invariants that must hold for any usable contract.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.feature_columns.is_empty() {
            return Err(ContractError::EmptyFeatureColumns);
        }
        for column in self.categorical_mappings.keys() {
            if !self.feature_columns.iter().any(|c| c == column) {
                return Err(ContractError::UnknownCategoricalColumn(column.clone()));
            }
        }
        Ok(())
    }

    /// Parse a contract from JSON, rejecting structurally invalid ones.
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        let contract: Self = serde_json::from_str(json)?;
        contract.validate()?;
        Ok(contract)
    }

    pub fn to_json(&self) -> Result<String, ContractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Feature type for a column; columns missing from the map are numeric,
    /// matching the training-side default.
    pub fn feature_type(&self, column: &str) -> FeatureType {
        self.feature_types
            .get(column)
            .copied()
            .unwrap_or(FeatureType::Numeric)
    }

    pub fn is_categorical(&self, column: &str) -> bool {
        self.feature_type(column) == FeatureType::Categorical
    }

    /// Allowed values for a categorical column, in code order.
    pub fn allowed_values(&self, column: &str) -> Option<Vec<&str>> {
        let mapping = self.categorical_mappings.get(column)?;
        let mut pairs: Vec<(&String, &i64)> = mapping.iter().collect();
        pairs.sort_by_key(|(_, code)| **code);
        Some(pairs.into_iter().map(|(value, _)| value.as_str()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_from_values() {
        let stats = NumericStats::from_values([3.0, 1.0, 2.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert!(stats.is_integer);

        let stats = NumericStats::from_values([1.5, 2.0]).unwrap();
        assert!(!stats.is_integer);

        assert!(NumericStats::from_values([]).is_none());
    }

    #[test]
    fn allowed_values_follow_code_order() {
        let mut mappings = BTreeMap::new();
        mappings.insert(
            "city".to_string(),
            BTreeMap::from([("NYC".to_string(), 0), ("LA".to_string(), 1)]),
        );
        let contract = PreprocessingContract {
            feature_columns: vec!["city".to_string()],
            dropped_columns: vec![],
            feature_types: BTreeMap::from([("city".to_string(), FeatureType::Categorical)]),
            categorical_mappings: mappings,
            numeric_stats: BTreeMap::new(),
            target_mapping: None,
        };
        // BTreeMap iteration would give LA first; code order must win.
        assert_eq!(contract.allowed_values("city"), Some(vec!["NYC", "LA"]));
    }
}
