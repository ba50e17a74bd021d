//! The fit-time preprocessor.
//!
//! `Preprocessor` accumulates state only while a fit runs: dropped columns,
//! per-column label encodings, the feature column order, numeric stats, and
//! the optional target encoding. The result of a fit is an immutable
//! [`FittedPreprocessor`] snapshot; transform paths read from it (or from
//! the contract derived from it) and never write back. Re-fitting builds a
//! fresh preprocessor — fitted state is never updated in place.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use autotab_model::{
    Column, FeatureType, LabelEncoding, NumericStats, PreprocessingContract, ProblemType,
    RawValue, Table,
};

use crate::detect;
use crate::error::FitError;
use crate::matrix::FeatureMatrix;
use crate::split;

/// Placeholder for a categorical column with no present values at all.
pub const MISSING_CATEGORY_PLACEHOLDER: &str = "Unknown";

/// Knobs for a fit run. Defaults hold out 20% with a fixed seed so fits are
/// reproducible unless a caller opts out.
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl FitOptions {
    #[must_use]
    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Everything a successful fit produces.
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub train_features: FeatureMatrix,
    pub test_features: FeatureMatrix,
    pub train_labels: Vec<f64>,
    pub test_labels: Vec<f64>,
    pub problem_type: ProblemType,
    pub fitted: FittedPreprocessor,
}

/// Stateful transformer for one fit run.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    target_column: String,
    dropped_columns: Vec<String>,
    encoders: BTreeMap<String, LabelEncoding>,
    feature_columns: Vec<String>,
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_stats: BTreeMap<String, NumericStats>,
    target_encoding: Option<LabelEncoding>,
}

impl Preprocessor {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            ..Self::default()
        }
    }

    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped_columns
    }

    /// Classify every non-target column and record the excluded set.
    ///
    /// The target column is never included, whatever its own shape: a
    /// constant target may make training fail downstream, but it is not this
    /// stage's call to drop the label silently.
    pub fn detect_useless_columns(&mut self, table: &Table) -> BTreeSet<String> {
        let mut useless = BTreeSet::new();
        for column in table.columns() {
            if column.name == self.target_column {
                continue;
            }
            let role = detect::column_role(&column.name, column);
            if role.is_dropped() {
                debug!(column = %column.name, %role, "dropping column");
                useless.insert(column.name.clone());
            }
        }
        self.dropped_columns = useless.iter().cloned().collect();
        useless
    }

    /// Fill absent values: numeric columns with the column median,
    /// categorical columns with the mode, or the "Unknown" placeholder when
    /// a column has no present values at all. Returns a new table.
    pub fn handle_missing_values(&self, table: &Table) -> Table {
        let mut filled = Table::default();
        for column in table.columns() {
            filled.push_column(fill_column(column));
        }
        filled
    }

    /// Replace categorical values with dense integer codes.
    ///
    /// With `fit = true`, a fresh encoding is built per categorical column
    /// from the observed values (first-seen order) and stored. With
    /// `fit = false`, the stored encodings are reused and values never seen
    /// during fitting encode to the -1 sentinel — never an error. Numeric
    /// columns pass through unchanged in both modes.
    pub fn encode_categorical(&mut self, table: &Table, fit: bool) -> Table {
        if fit {
            self.categorical_columns = table
                .columns()
                .iter()
                .filter(|c| !c.is_numeric())
                .map(|c| c.name.clone())
                .collect();
        }

        let mut encoded = Table::default();
        for column in table.columns() {
            if column.is_numeric() {
                encoded.push_column(column.clone());
                continue;
            }
            if fit {
                let encoding =
                    LabelEncoding::fit(column.values.iter().map(RawValue::string_form));
                let codes = encode_with(column, &encoding);
                self.encoders.insert(column.name.clone(), encoding);
                encoded.push_column(codes);
            } else if let Some(encoding) = self.encoders.get(&column.name) {
                encoded.push_column(encode_with(column, encoding));
            } else {
                encoded.push_column(column.clone());
            }
        }
        encoded
    }

    /// Run the full fit path: target split-off, useless-column drop, problem
    /// type detection, imputation, encoding, target encoding, and the
    /// deterministic train/test split.
    ///
    /// Degenerate but legal inputs (single-class target, all-numeric or
    /// all-categorical tables) do not error. A missing target column or a
    /// table with zero surviving feature columns is unrecoverable and does.
    pub fn preprocess(
        &mut self,
        table: &Table,
        options: &FitOptions,
    ) -> Result<FitOutput, FitError> {
        let target = table
            .column(&self.target_column)
            .ok_or_else(|| FitError::MissingTargetColumn(self.target_column.clone()))?
            .clone();

        let mut excluded = self.detect_useless_columns(table);
        excluded.insert(self.target_column.clone());
        let features = table.without_columns(&excluded);
        if features.width() == 0 {
            return Err(FitError::NoUsableFeatures {
                dropped: self.dropped_columns.clone(),
            });
        }

        let problem_type = detect::detect_problem_type(&target);
        info!(
            target = %self.target_column,
            %problem_type,
            feature_count = features.width(),
            dropped_count = self.dropped_columns.len(),
            "problem type detected"
        );

        let features = self.handle_missing_values(&features);

        // This fixes the contract's feature_columns: the order is
        // load-bearing from here on.
        self.feature_columns = features
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        self.numeric_columns = features
            .columns()
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.clone())
            .collect();
        self.capture_numeric_stats(table);

        let encoded = self.encode_categorical(&features, true);

        let labels = self.encode_target(&target, problem_type);

        let (train_idx, test_idx) = if problem_type == ProblemType::Classification {
            split::stratified_split(&labels, options.test_fraction, options.seed)
        } else {
            split::train_test_split(labels.len(), options.test_fraction, options.seed)
        };

        let (train_features, train_labels) = gather(&encoded, &self.feature_columns, &labels, &train_idx);
        let (test_features, test_labels) = gather(&encoded, &self.feature_columns, &labels, &test_idx);

        let fitted = FittedPreprocessor {
            target_column: self.target_column.clone(),
            problem_type,
            feature_columns: self.feature_columns.clone(),
            dropped_columns: self.dropped_columns.clone(),
            categorical_columns: self.categorical_columns.clone(),
            encoders: self.encoders.clone(),
            numeric_stats: self.numeric_stats.clone(),
            target_encoding: self.target_encoding.clone(),
        };

        Ok(FitOutput {
            train_features,
            test_features,
            train_labels,
            test_labels,
            problem_type,
            fitted,
        })
    }

    /// Stats come from the original table, before imputation, so the median
    /// fill cannot shift min/max or flip integer-ness.
    fn capture_numeric_stats(&mut self, original: &Table) {
        self.numeric_stats.clear();
        for name in &self.numeric_columns {
            if let Some(column) = original.column(name)
                && let Some(stats) = NumericStats::from_values(column.numeric_values())
            {
                self.numeric_stats.insert(name.clone(), stats);
            }
        }
    }

    /// Labels as a numeric vector; a non-numeric classification target gets
    /// its own label encoding, with the inverse kept for decoding.
    fn encode_target(&mut self, target: &Column, problem_type: ProblemType) -> Vec<f64> {
        if problem_type == ProblemType::Classification && !target.is_numeric() {
            let encoding = LabelEncoding::fit(target.values.iter().map(RawValue::string_form));
            let labels = target
                .values
                .iter()
                .map(|v| encoding.code_for(&v.string_form()) as f64)
                .collect();
            self.target_encoding = Some(encoding);
            labels
        } else {
            target
                .values
                .iter()
                .map(|v| v.as_number().unwrap_or(f64::NAN))
                .collect()
        }
    }
}

/// Immutable snapshot of a completed fit.
///
/// This is the only preprocessing state that survives the fit; everything a
/// transform needs is derivable from it via [`FittedPreprocessor::contract`].
#[derive(Debug, Clone)]
pub struct FittedPreprocessor {
    target_column: String,
    problem_type: ProblemType,
    feature_columns: Vec<String>,
    dropped_columns: Vec<String>,
    categorical_columns: Vec<String>,
    encoders: BTreeMap<String, LabelEncoding>,
    numeric_stats: BTreeMap<String, NumericStats>,
    target_encoding: Option<LabelEncoding>,
}

impl FittedPreprocessor {
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn problem_type(&self) -> ProblemType {
        self.problem_type
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped_columns
    }

    /// Flatten the fit state into the serializable contract.
    pub fn contract(&self) -> PreprocessingContract {
        let mut feature_types = BTreeMap::new();
        for name in &self.feature_columns {
            let feature_type = if self.categorical_columns.contains(name) {
                FeatureType::Categorical
            } else {
                FeatureType::Numeric
            };
            feature_types.insert(name.clone(), feature_type);
        }

        let categorical_mappings = self
            .encoders
            .iter()
            .filter(|(name, _)| self.feature_columns.contains(name))
            .map(|(name, encoding)| (name.clone(), encoding.mapping().clone()))
            .collect();

        PreprocessingContract {
            feature_columns: self.feature_columns.clone(),
            dropped_columns: self.dropped_columns.clone(),
            feature_types,
            categorical_mappings,
            numeric_stats: self.numeric_stats.clone(),
            target_mapping: self.target_encoding.as_ref().map(LabelEncoding::inverse),
        }
    }
}

fn fill_column(column: &Column) -> Column {
    let has_missing = column.values.iter().any(RawValue::is_missing);
    if !has_missing {
        return column.clone();
    }

    if column.is_numeric() {
        let median = median(&column.numeric_values());
        let values = column
            .values
            .iter()
            .map(|v| {
                if v.is_missing() {
                    RawValue::Number(median)
                } else {
                    v.clone()
                }
            })
            .collect();
        return Column::new(column.name.clone(), values);
    }

    let fill = mode(column).unwrap_or_else(|| MISSING_CATEGORY_PLACEHOLDER.to_string());
    let values = column
        .values
        .iter()
        .map(|v| {
            if v.is_missing() {
                RawValue::Text(fill.clone())
            } else {
                v.clone()
            }
        })
        .collect();
    Column::new(column.name.clone(), values)
}

/// Median of present values, interpolating between the two middle values
/// for even counts.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Most frequent present value; ties break to the smallest value so the
/// result does not depend on row order.
fn mode(column: &Column) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in column.present() {
        *counts.entry(value.string_form()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_value, a_count), (b_value, b_count)| {
            a_count.cmp(b_count).then(b_value.cmp(a_value))
        })
        .map(|(value, _)| value)
}

fn encode_with(column: &Column, encoding: &LabelEncoding) -> Column {
    let values = column
        .values
        .iter()
        .map(|v| RawValue::Number(encoding.code_for(&v.string_form()) as f64))
        .collect();
    Column::new(column.name.clone(), values)
}

/// Materialize selected rows into a feature matrix and label vector.
fn gather(
    encoded: &Table,
    feature_columns: &[String],
    labels: &[f64],
    indices: &[usize],
) -> (FeatureMatrix, Vec<f64>) {
    let columns: Vec<&Column> = feature_columns
        .iter()
        .filter_map(|name| encoded.column(name))
        .collect();

    let mut matrix = FeatureMatrix::new(feature_columns.to_vec());
    let mut gathered_labels = Vec::with_capacity(indices.len());
    for &idx in indices {
        let row = columns
            .iter()
            .map(|column| {
                column
                    .values
                    .get(idx)
                    .and_then(RawValue::as_number)
                    .unwrap_or(f64::NAN)
            })
            .collect();
        matrix.push_row(row);
        gathered_labels.push(labels[idx]);
    }
    (matrix, gathered_labels)
}
