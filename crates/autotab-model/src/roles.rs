//! Column roles and problem types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a raw column, computed once per column per fit.
///
/// Roles are mutually exclusive. The first three are excluded from training;
/// the rest participate in the feature matrix or as the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Identifier,
    Constant,
    HighCardinalityCategorical,
    NumericFeature,
    CategoricalFeature,
    Target,
}

impl ColumnRole {
    /// True for roles excluded from the feature matrix.
    pub fn is_dropped(self) -> bool {
        matches!(
            self,
            Self::Identifier | Self::Constant | Self::HighCardinalityCategorical
        )
    }

    /// Human-readable reason used in fit summaries and reports.
    pub fn description(self) -> &'static str {
        match self {
            Self::Identifier => "ID/identifier column",
            Self::Constant => "constant column",
            Self::HighCardinalityCategorical => "high-cardinality categorical",
            Self::NumericFeature => "numeric feature",
            Self::CategoricalFeature => "categorical feature",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Whether a fit is a classification or regression problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    Classification,
    Regression,
}

impl ProblemType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Regression => "regression",
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature dtype recorded in the contract, one per feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Numeric,
    Categorical,
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => f.write_str("numeric"),
            Self::Categorical => f.write_str("categorical"),
        }
    }
}
