use thiserror::Error;

/// Failures surfaced to prediction callers.
///
/// The first three kinds mean the request is wrong and retrying is
/// pointless; `ModelUnavailable` means the service side is unhealthy.
/// Unknown categories and absent optional data are not errors anywhere on
/// this path — they are handled by the documented fallback values.
#[derive(Debug, Error)]
pub enum PredictError {
    /// No preprocessing contract exists for the requested model.
    #[error("no preprocessing contract configured for model '{0}'")]
    NotConfigured(String),
    /// The caller omitted required features; all missing names are
    /// reported at once.
    #[error("missing required features: {}", .0.join(", "))]
    MissingFeatures(Vec<String>),
    /// A numeric feature received a value that cannot be coerced.
    #[error("cannot convert '{value}' to a number for feature '{column}'")]
    InvalidFeatureValue { column: String, value: String },
    /// The model could not be loaded or executed.
    #[error("model '{model_id}' is unavailable")]
    ModelUnavailable {
        model_id: String,
        #[source]
        source: anyhow::Error,
    },
    /// The metadata store itself failed.
    #[error("metadata store failure")]
    Metadata(#[source] anyhow::Error),
}
