//! Training-side orchestration and the trainer seam.
//!
//! [`fit_pipeline`] runs the whole preprocessing path for one dataset and
//! returns the split matrices together with the [`PreprocessingContract`]
//! that must be persisted alongside whatever model the external trainer
//! produces. The trainer itself is opaque: this crate only defines the
//! [`ModelTrainer`] interface and passes its metrics through.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{info, info_span};

use autotab_model::{PreprocessingContract, ProblemType, Table};

use crate::error::FitError;
use crate::matrix::FeatureMatrix;
use crate::preprocess::{FitOptions, FitOutput, Preprocessor};

/// Output of [`fit_pipeline`]: everything the training side needs to hand to
/// a trainer plus the contract for the inference side.
#[derive(Debug, Clone)]
pub struct FitArtifacts {
    pub train_features: FeatureMatrix,
    pub test_features: FeatureMatrix,
    pub train_labels: Vec<f64>,
    pub test_labels: Vec<f64>,
    pub problem_type: ProblemType,
    pub contract: PreprocessingContract,
}

/// Result of an external model search: an opaque artifact plus the metrics
/// and importances reported by the trainer, passed through untouched.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub artifact: Vec<u8>,
    pub metrics: BTreeMap<String, f64>,
    pub feature_importance: BTreeMap<String, f64>,
}

/// The external AutoML search. Implementations own model selection and
/// fitting entirely; the pipeline only supplies numeric matrices and reads
/// the results back.
pub trait ModelTrainer {
    fn fit(
        &self,
        train_features: &FeatureMatrix,
        test_features: &FeatureMatrix,
        train_labels: &[f64],
        test_labels: &[f64],
        problem_type: ProblemType,
        time_budget: Duration,
    ) -> anyhow::Result<TrainedModel>;
}

/// Fit the preprocessing pipeline for one table and target column.
pub fn fit_pipeline(
    table: &Table,
    target_column: &str,
    options: &FitOptions,
) -> Result<FitArtifacts, FitError> {
    let span = info_span!("fit_pipeline", target = %target_column);
    let _guard = span.enter();

    let mut preprocessor = Preprocessor::new(target_column);
    let FitOutput {
        train_features,
        test_features,
        train_labels,
        test_labels,
        problem_type,
        fitted,
    } = preprocessor.preprocess(table, options)?;

    let contract = fitted.contract();
    info!(
        %problem_type,
        train_rows = train_features.n_rows(),
        test_rows = test_features.n_rows(),
        features = contract.feature_columns.len(),
        dropped = contract.dropped_columns.len(),
        "preprocessing complete"
    );

    Ok(FitArtifacts {
        train_features,
        test_features,
        train_labels,
        test_labels,
        problem_type,
        contract,
    })
}
