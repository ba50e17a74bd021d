use thiserror::Error;

/// Failures while reading a CSV into a table.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV has no header row")]
    MissingHeader,
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}
