//! Data model for the AutoTab tabular-ML platform.
//!
//! This crate owns the types that cross crate boundaries: raw tabular values,
//! column roles and problem types, label encodings, and the
//! [`PreprocessingContract`] — the serialized snapshot of fit-time state that
//! the inference side replays unmodified.

pub mod contract;
pub mod encoding;
pub mod error;
pub mod roles;
pub mod value;

pub use contract::{NumericStats, PreprocessingContract};
pub use encoding::{LabelEncoding, UNKNOWN_CATEGORY_CODE};
pub use error::ContractError;
pub use roles::{ColumnRole, FeatureType, ProblemType};
pub use value::{Column, RawValue, Table, format_numeric};
