use thiserror::Error;

/// Structural failures when reading or validating a preprocessing contract.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("invalid contract JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("contract has no feature columns")]
    EmptyFeatureColumns,
    #[error("categorical mapping references unknown column '{0}'")]
    UnknownCategoricalColumn(String),
}
