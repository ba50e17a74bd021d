use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use autotab_model::{FeatureType, NumericStats, PreprocessingContract, ProblemType};
use autotab_serve::{
    ClassScores, FeatureValue, FeatureVector, InferenceEngine, InputDtype, LoadedModel,
    MetadataStore, ModelLoader, ModelMeta, ModelOutput, PredictError, PredictedValue,
    RawPrediction,
};

/// A model stub that records the last input it saw.
struct RecordingModel {
    dtype: InputDtype,
    output: ModelOutput,
    last_input: Mutex<Option<FeatureVector>>,
}

impl RecordingModel {
    fn new(dtype: InputDtype, output: ModelOutput) -> Arc<Self> {
        Arc::new(Self {
            dtype,
            output,
            last_input: Mutex::new(None),
        })
    }

    fn last_input(&self) -> Option<FeatureVector> {
        self.last_input.lock().unwrap().clone()
    }
}

impl LoadedModel for RecordingModel {
    fn input_dtype(&self) -> InputDtype {
        self.dtype
    }

    fn run(&self, input: &FeatureVector) -> anyhow::Result<ModelOutput> {
        *self.last_input.lock().unwrap() = Some(input.clone());
        Ok(self.output.clone())
    }
}

struct StubLoader {
    models: BTreeMap<String, Arc<RecordingModel>>,
    loads: AtomicUsize,
}

impl StubLoader {
    fn new(models: BTreeMap<String, Arc<RecordingModel>>) -> Arc<Self> {
        Arc::new(Self {
            models,
            loads: AtomicUsize::new(0),
        })
    }

    fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelLoader for StubLoader {
    fn load(&self, model_id: &str) -> anyhow::Result<Arc<dyn LoadedModel>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.models
            .get(model_id)
            .map(|model| Arc::clone(model) as Arc<dyn LoadedModel>)
            .ok_or_else(|| anyhow::anyhow!("artifact fetch failed for '{model_id}'"))
    }
}

struct StubStore {
    metas: BTreeMap<String, ModelMeta>,
}

impl MetadataStore for StubStore {
    fn model_meta(&self, model_id: &str) -> anyhow::Result<Option<ModelMeta>> {
        Ok(self.metas.get(model_id).cloned())
    }
}

/// Contract with a deliberately non-alphabetical feature order.
fn demo_contract() -> PreprocessingContract {
    PreprocessingContract {
        feature_columns: vec!["income".to_string(), "age".to_string(), "city".to_string()],
        dropped_columns: vec!["customer_id".to_string()],
        feature_types: BTreeMap::from([
            ("income".to_string(), FeatureType::Numeric),
            ("age".to_string(), FeatureType::Numeric),
            ("city".to_string(), FeatureType::Categorical),
        ]),
        categorical_mappings: BTreeMap::from([(
            "city".to_string(),
            BTreeMap::from([("NYC".to_string(), 0), ("LA".to_string(), 1)]),
        )]),
        numeric_stats: BTreeMap::from([(
            "age".to_string(),
            NumericStats {
                min: 18.0,
                max: 80.0,
                is_integer: true,
            },
        )]),
        target_mapping: Some(BTreeMap::from([
            (0, "stayed".to_string()),
            (1, "churned".to_string()),
        ])),
    }
}

fn classifier_output() -> ModelOutput {
    ModelOutput {
        primary: RawPrediction::Number(1.0),
        scores: Some(ClassScores::IndexedArray(vec![0.2, 0.8])),
    }
}

fn engine_with(
    model_id: &str,
    problem_type: ProblemType,
    model: Arc<RecordingModel>,
) -> (InferenceEngine, Arc<StubLoader>) {
    let store = Arc::new(StubStore {
        metas: BTreeMap::from([(
            model_id.to_string(),
            ModelMeta {
                contract: demo_contract(),
                problem_type,
            },
        )]),
    });
    let loader = StubLoader::new(BTreeMap::from([(model_id.to_string(), model)]));
    let engine = InferenceEngine::new(store, Arc::clone(&loader) as Arc<dyn ModelLoader>);
    (engine, loader)
}

fn full_features() -> BTreeMap<String, FeatureValue> {
    BTreeMap::from([
        ("age".to_string(), FeatureValue::Number(30.0)),
        ("income".to_string(), FeatureValue::Number(55000.0)),
        ("city".to_string(), FeatureValue::Text("NYC".to_string())),
    ])
}

#[test]
fn unknown_model_is_not_configured() {
    let model = RecordingModel::new(InputDtype::Float32, classifier_output());
    let (engine, _) = engine_with("m1", ProblemType::Classification, model);
    let error = engine.predict("nope", &full_features()).unwrap_err();
    assert!(matches!(error, PredictError::NotConfigured(id) if id == "nope"));
}

#[test]
fn missing_features_are_reported_together() {
    let model = RecordingModel::new(InputDtype::Float32, classifier_output());
    let (engine, loader) = engine_with("m1", ProblemType::Classification, model);
    let raw = BTreeMap::from([("age".to_string(), FeatureValue::Number(30.0))]);
    let error = engine.predict("m1", &raw).unwrap_err();
    assert!(matches!(
        error,
        PredictError::MissingFeatures(names) if names == vec!["income", "city"]
    ));
    // Input validation failed before any model load.
    assert_eq!(loader.load_count(), 0);
}

#[test]
fn unknown_category_is_encoded_not_rejected() {
    let model = RecordingModel::new(InputDtype::Float32, classifier_output());
    let (engine, _) = engine_with("m1", ProblemType::Classification, Arc::clone(&model));
    let mut raw = full_features();
    raw.insert("city".to_string(), FeatureValue::Text("Chicago".to_string()));
    engine.predict("m1", &raw).unwrap();
    let input = model.last_input().unwrap();
    assert_eq!(input.as_f64(), vec![55000.0, 30.0, -1.0]);
}

#[test]
fn input_vector_follows_contract_order() {
    // BTreeMap iteration would give age, city, income; the contract says
    // income, age, city and must win.
    let model = RecordingModel::new(InputDtype::Float64, classifier_output());
    let (engine, _) = engine_with("m1", ProblemType::Classification, Arc::clone(&model));
    engine.predict("m1", &full_features()).unwrap();
    let input = model.last_input().unwrap();
    assert_eq!(input, FeatureVector::F64(vec![55000.0, 30.0, 0.0]));
}

#[test]
fn input_dtype_comes_from_the_model() {
    let model = RecordingModel::new(InputDtype::Float32, classifier_output());
    let (engine, _) = engine_with("m1", ProblemType::Classification, Arc::clone(&model));
    engine.predict("m1", &full_features()).unwrap();
    assert!(matches!(model.last_input().unwrap(), FeatureVector::F32(_)));
}

#[test]
fn classification_decodes_labels_and_probabilities() {
    let model = RecordingModel::new(InputDtype::Float32, classifier_output());
    let (engine, _) = engine_with("m1", ProblemType::Classification, model);
    let result = engine.predict("m1", &full_features()).unwrap();

    assert_eq!(
        result.prediction,
        PredictedValue::Label("churned".to_string())
    );
    assert_eq!(result.probability, Some(0.8));
    let probabilities = result.probabilities.unwrap();
    assert_eq!(probabilities["stayed"], 0.2);
    assert_eq!(probabilities["churned"], 0.8);
    assert_eq!(result.problem_type, ProblemType::Classification);
}

#[test]
fn per_class_map_scores_decode_identically() {
    let output = ModelOutput {
        primary: RawPrediction::Number(0.0),
        scores: Some(ClassScores::PerClassMap(BTreeMap::from([
            ("0".to_string(), 0.7),
            ("1".to_string(), 0.3),
        ]))),
    };
    let model = RecordingModel::new(InputDtype::Float32, output);
    let (engine, _) = engine_with("m1", ProblemType::Classification, model);
    let result = engine.predict("m1", &full_features()).unwrap();

    assert_eq!(result.prediction, PredictedValue::Label("stayed".to_string()));
    assert_eq!(result.probability, Some(0.7));
    let probabilities = result.probabilities.unwrap();
    assert_eq!(probabilities["stayed"], 0.7);
    assert_eq!(probabilities["churned"], 0.3);
}

#[test]
fn regression_returns_a_plain_number() {
    let output = ModelOutput {
        primary: RawPrediction::Number(123.45),
        scores: None,
    };
    let model = RecordingModel::new(InputDtype::Float64, output);
    let (engine, _) = engine_with("m1", ProblemType::Regression, model);
    let result = engine.predict("m1", &full_features()).unwrap();
    assert_eq!(result.prediction, PredictedValue::Number(123.45));
    assert!(result.probability.is_none());
    assert!(result.probabilities.is_none());
}

#[test]
fn predict_is_idempotent() {
    let model = RecordingModel::new(InputDtype::Float32, classifier_output());
    let (engine, loader) = engine_with("m1", ProblemType::Classification, model);
    let first = engine.predict("m1", &full_features()).unwrap();
    let second = engine.predict("m1", &full_features()).unwrap();
    assert_eq!(first, second);
    // The second prediction reused the cached handle.
    assert_eq!(loader.load_count(), 1);
}

#[test]
fn loader_failure_is_model_unavailable() {
    let store = Arc::new(StubStore {
        metas: BTreeMap::from([(
            "m1".to_string(),
            ModelMeta {
                contract: demo_contract(),
                problem_type: ProblemType::Classification,
            },
        )]),
    });
    let loader = StubLoader::new(BTreeMap::new());
    let engine = InferenceEngine::new(store, loader);
    let error = engine.predict("m1", &full_features()).unwrap_err();
    assert!(matches!(
        error,
        PredictError::ModelUnavailable { model_id, .. } if model_id == "m1"
    ));
}

#[test]
fn invalid_numeric_value_is_surfaced() {
    let model = RecordingModel::new(InputDtype::Float32, classifier_output());
    let (engine, _) = engine_with("m1", ProblemType::Classification, model);
    let mut raw = full_features();
    raw.insert("age".to_string(), FeatureValue::Text("thirty".to_string()));
    let error = engine.predict("m1", &raw).unwrap_err();
    assert!(matches!(
        error,
        PredictError::InvalidFeatureValue { column, value }
            if column == "age" && value == "thirty"
    ));
}

#[test]
fn result_serializes_to_the_wire_shape() {
    let model = RecordingModel::new(InputDtype::Float32, classifier_output());
    let (engine, _) = engine_with("m1", ProblemType::Classification, model);
    let result = engine.predict("m1", &full_features()).unwrap();
    let value = serde_json::to_value(&result).unwrap();

    // Untagged prediction: a bare string label, not an object.
    assert_eq!(value["prediction"], serde_json::json!("churned"));
    assert_eq!(value["problem_type"], serde_json::json!("classification"));
    assert_eq!(value["probability"], serde_json::json!(0.8));

    // Regression omits the probability fields entirely.
    let output = ModelOutput {
        primary: RawPrediction::Number(7.5),
        scores: None,
    };
    let model = RecordingModel::new(InputDtype::Float64, output);
    let (engine, _) = engine_with("m2", ProblemType::Regression, model);
    let result = engine.predict("m2", &full_features()).unwrap();
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["prediction"], serde_json::json!(7.5));
    assert!(value.get("probability").is_none());
    assert!(value.get("probabilities").is_none());
}

#[test]
fn prediction_info_is_derived_from_the_contract() {
    let model = RecordingModel::new(InputDtype::Float32, classifier_output());
    let (engine, _) = engine_with("m1", ProblemType::Classification, model);
    let info = engine.prediction_info("m1").unwrap();

    assert_eq!(info.feature_columns, vec!["income", "age", "city"]);
    assert_eq!(info.feature_count, 3);
    assert_eq!(info.feature_types["city"], FeatureType::Categorical);
    assert_eq!(info.allowed_values["city"], vec!["NYC", "LA"]);
    assert_eq!(
        info.example_request["city"],
        FeatureValue::Text("NYC".to_string())
    );
    assert_eq!(info.example_request["age"], FeatureValue::Number(18.0));
    // No recorded stats for income: example falls back to zero.
    assert_eq!(info.example_request["income"], FeatureValue::Number(0.0));
}
