//! The inference engine.
//!
//! One engine instance is constructed at process start and handed by
//! reference to every request path; the embedded cache is the only shared
//! mutable state. Predictions are read-only with respect to contracts and
//! other cache entries — the only observable side effect of a successful
//! prediction is that a cold model may now be resident.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info_span};

use autotab_model::{FeatureType, ProblemType};

use crate::cache::{DEFAULT_MODEL_CACHE_CAPACITY, ModelCache};
use crate::error::PredictError;
use crate::model::{
    ClassScores, FeatureVector, MetadataStore, ModelLoader, ModelMeta, ModelOutput, RawPrediction,
};
use crate::transform;

pub use crate::transform::FeatureValue;

/// A decoded prediction, either a regression number or a class label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictedValue {
    Number(f64),
    Label(String),
}

/// Response returned for one prediction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub prediction: PredictedValue,
    /// Confidence of the predicted class; classification only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    /// Per-class probabilities keyed by decoded label; classification only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f64>>,
    pub problem_type: ProblemType,
}

/// Model input description served to form-building callers. Purely derived
/// from the stored contract; no computation beyond reshaping.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionInfo {
    pub problem_type: ProblemType,
    pub feature_columns: Vec<String>,
    pub feature_count: usize,
    pub feature_types: BTreeMap<String, FeatureType>,
    /// Allowed values per categorical column, in code order.
    pub allowed_values: BTreeMap<String, Vec<String>>,
    /// A plausible input: first allowed value for categoricals, the
    /// training minimum for numerics.
    pub example_request: BTreeMap<String, FeatureValue>,
}

/// Serves predictions for deployed models.
pub struct InferenceEngine {
    store: Arc<dyn MetadataStore>,
    loader: Arc<dyn ModelLoader>,
    cache: ModelCache,
}

impl InferenceEngine {
    pub fn new(store: Arc<dyn MetadataStore>, loader: Arc<dyn ModelLoader>) -> Self {
        Self::with_cache_capacity(store, loader, DEFAULT_MODEL_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(
        store: Arc<dyn MetadataStore>,
        loader: Arc<dyn ModelLoader>,
        capacity: usize,
    ) -> Self {
        Self {
            store,
            loader,
            cache: ModelCache::new(capacity),
        }
    }

    /// Predict against a deployed model from raw feature values.
    ///
    /// Preconditions are checked in order, each with its own failure kind:
    /// a contract must exist, every contract feature must be supplied, and
    /// the model handle must be obtainable. The transform then replays the
    /// contract exactly as at fit time.
    pub fn predict(
        &self,
        model_id: &str,
        raw_features: &BTreeMap<String, FeatureValue>,
    ) -> Result<PredictionResult, PredictError> {
        let span = info_span!("predict", model_id);
        let _guard = span.enter();

        let meta = self.model_meta(model_id)?;

        let missing = transform::missing_features(&meta.contract, raw_features);
        if !missing.is_empty() {
            return Err(PredictError::MissingFeatures(missing));
        }

        let model = self
            .cache
            .get_or_load(model_id, || self.loader.load(model_id))
            .map_err(|source| PredictError::ModelUnavailable {
                model_id: model_id.to_string(),
                source,
            })?;

        let encoded = transform::encode_row(&meta.contract, raw_features)?;
        let input = FeatureVector::from_values(model.input_dtype(), &encoded);
        debug!(features = input.len(), "running inference");

        let output = model
            .run(&input)
            .map_err(|source| PredictError::ModelUnavailable {
                model_id: model_id.to_string(),
                source,
            })?;

        Ok(decode_output(&meta, output))
    }

    /// Input description for a deployed model, for building request forms.
    pub fn prediction_info(&self, model_id: &str) -> Result<PredictionInfo, PredictError> {
        let meta = self.model_meta(model_id)?;
        let contract = &meta.contract;

        let mut feature_types = BTreeMap::new();
        let mut allowed_values = BTreeMap::new();
        let mut example_request = BTreeMap::new();
        for column in &contract.feature_columns {
            let feature_type = contract.feature_type(column);
            feature_types.insert(column.clone(), feature_type);
            match feature_type {
                FeatureType::Categorical => {
                    let values: Vec<String> = contract
                        .allowed_values(column)
                        .unwrap_or_default()
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    if let Some(first) = values.first() {
                        example_request
                            .insert(column.clone(), FeatureValue::Text(first.clone()));
                    }
                    allowed_values.insert(column.clone(), values);
                }
                FeatureType::Numeric => {
                    let example = contract
                        .numeric_stats
                        .get(column)
                        .map_or(0.0, |stats| stats.min);
                    example_request.insert(column.clone(), FeatureValue::Number(example));
                }
            }
        }

        Ok(PredictionInfo {
            problem_type: meta.problem_type,
            feature_columns: contract.feature_columns.clone(),
            feature_count: contract.feature_columns.len(),
            feature_types,
            allowed_values,
            example_request,
        })
    }

    fn model_meta(&self, model_id: &str) -> Result<ModelMeta, PredictError> {
        self.store
            .model_meta(model_id)
            .map_err(PredictError::Metadata)?
            .ok_or_else(|| PredictError::NotConfigured(model_id.to_string()))
    }
}

/// Decode raw model output into a problem-type-appropriate response.
fn decode_output(meta: &ModelMeta, output: ModelOutput) -> PredictionResult {
    match meta.problem_type {
        ProblemType::Regression => PredictionResult {
            prediction: decode_primary(&output.primary, None),
            probability: None,
            probabilities: None,
            problem_type: ProblemType::Regression,
        },
        ProblemType::Classification => {
            let mapping = meta.contract.target_mapping.as_ref();
            let prediction = decode_primary(&output.primary, mapping);
            let probabilities = output.scores.map(|scores| decode_scores(scores, mapping));
            let probability = probabilities.as_ref().and_then(|probs| {
                probs
                    .values()
                    .copied()
                    .fold(None, |best: Option<f64>, p| {
                        Some(best.map_or(p, |b| b.max(p)))
                    })
            });
            PredictionResult {
                prediction,
                probability,
                probabilities,
                problem_type: ProblemType::Classification,
            }
        }
    }
}

/// Translate the primary output, mapping internal class codes back to their
/// original labels when an inverse target mapping was recorded.
fn decode_primary(
    primary: &RawPrediction,
    mapping: Option<&BTreeMap<i64, String>>,
) -> PredictedValue {
    match primary {
        RawPrediction::Number(n) => {
            if let Some(mapping) = mapping
                && n.fract() == 0.0
                && let Some(label) = mapping.get(&(*n as i64))
            {
                return PredictedValue::Label(label.clone());
            }
            PredictedValue::Number(*n)
        }
        RawPrediction::Label(label) => PredictedValue::Label(label.clone()),
    }
}

/// Normalize either probability shape into a single label → probability map.
fn decode_scores(
    scores: ClassScores,
    mapping: Option<&BTreeMap<i64, String>>,
) -> BTreeMap<String, f64> {
    let decode_key = |key: &str| -> String {
        if let Some(mapping) = mapping
            && let Ok(code) = key.parse::<i64>()
            && let Some(label) = mapping.get(&code)
        {
            return label.clone();
        }
        key.to_string()
    };

    match scores {
        ClassScores::PerClassMap(map) => map
            .into_iter()
            .map(|(key, probability)| (decode_key(&key), probability))
            .collect(),
        ClassScores::IndexedArray(probabilities) => probabilities
            .into_iter()
            .enumerate()
            .map(|(index, probability)| (decode_key(&index.to_string()), probability))
            .collect(),
    }
}
