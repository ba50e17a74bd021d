//! Interfaces to the external model runtime and metadata storage.
//!
//! The inference engine never touches a model format or a storage backend
//! directly; it talks to these traits. A loaded model is immutable after
//! load, expensive to construct, and cheap to reuse, which is why handles
//! are shared as `Arc` and cached.

use std::sync::Arc;

use autotab_model::{PreprocessingContract, ProblemType};

/// Element type the compiled model expects for its input vector.
///
/// Dictated by the model, not by the caller: the engine queries this from
/// the handle before assembling the vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDtype {
    Float32,
    Float64,
}

/// A single-row input vector in the model's declared element type.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureVector {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl FeatureVector {
    /// Narrow (or keep) encoded f64 values to the model's input dtype.
    pub fn from_values(dtype: InputDtype, values: &[f64]) -> Self {
        match dtype {
            InputDtype::Float32 => Self::F32(values.iter().map(|v| *v as f32).collect()),
            InputDtype::Float64 => Self::F64(values.to_vec()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::F32(values) => values.len(),
            Self::F64(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values widened back to f64, mostly useful for assertions and logs.
    pub fn as_f64(&self) -> Vec<f64> {
        match self {
            Self::F32(values) => values.iter().map(|v| f64::from(*v)).collect(),
            Self::F64(values) => values.clone(),
        }
    }
}

/// The primary model output: a regression scalar or a predicted class.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPrediction {
    Number(f64),
    Label(String),
}

/// Per-class probabilities as emitted by the model runtime.
///
/// Runtimes produce one of two shapes; which one a given model uses is a
/// property of the model, resolved here as an explicit tagged value instead
/// of being re-sniffed on every request.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassScores {
    /// Map from class key (an internal code or a label) to probability.
    PerClassMap(std::collections::BTreeMap<String, f64>),
    /// Flat probabilities aligned by class index.
    IndexedArray(Vec<f64>),
}

/// One inference run's outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub primary: RawPrediction,
    pub scores: Option<ClassScores>,
}

/// A loaded, ready-to-execute model bound to one model identifier.
pub trait LoadedModel: Send + Sync {
    fn input_dtype(&self) -> InputDtype;
    fn run(&self, input: &FeatureVector) -> anyhow::Result<ModelOutput>;
}

/// Fetches and compiles a model artifact. Loading may block on network and
/// deserialization; the engine keeps it outside the cache's critical
/// section.
pub trait ModelLoader: Send + Sync {
    fn load(&self, model_id: &str) -> anyhow::Result<Arc<dyn LoadedModel>>;
}

/// Metadata recorded for a deployed model.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    pub contract: PreprocessingContract,
    pub problem_type: ProblemType,
}

/// Read side of the job/model metadata store.
pub trait MetadataStore: Send + Sync {
    /// Metadata for a deployed model, or `None` when the model id is
    /// unknown or has no preprocessing contract yet.
    fn model_meta(&self, model_id: &str) -> anyhow::Result<Option<ModelMeta>>;
}
