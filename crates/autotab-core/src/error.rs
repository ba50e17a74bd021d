use thiserror::Error;

/// Unrecoverable fit configurations.
///
/// Data imperfections (absent values, unseen categories, single-class
/// targets) are handled in place and never reach this enum; only structural
/// misuse of the fit API does.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("target column '{0}' not found in table")]
    MissingTargetColumn(String),
    #[error("no usable feature columns remain after dropping: {}", .dropped.join(", "))]
    NoUsableFeatures { dropped: Vec<String> },
}
