//! Inference for the AutoTab platform.
//!
//! Given a deployed model identifier and raw feature values, this crate
//! replays the preprocessing contract recorded at training time, executes
//! the loaded model, and decodes its output into a problem-type-appropriate
//! response. Loaded models are kept in a small shared [`ModelCache`].

pub mod cache;
pub mod engine;
pub mod error;
pub mod model;
pub mod transform;

pub use cache::{DEFAULT_MODEL_CACHE_CAPACITY, ModelCache};
pub use engine::{FeatureValue, InferenceEngine, PredictedValue, PredictionInfo, PredictionResult};
pub use error::PredictError;
pub use model::{
    ClassScores, InputDtype, FeatureVector, LoadedModel, MetadataStore, ModelLoader, ModelMeta,
    ModelOutput, RawPrediction,
};
