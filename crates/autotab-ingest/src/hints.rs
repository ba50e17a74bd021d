//! Per-column summary hints for reporting and form building.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use autotab_model::{Column, Table};

/// Lightweight column profile computed at ingest time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnHint {
    pub is_numeric: bool,
    pub unique_ratio: f64,
    pub null_ratio: f64,
}

impl ColumnHint {
    fn from_column(column: &Column) -> Self {
        let total = column.len();
        let present = column.present_count();
        let unique_ratio = if present == 0 {
            0.0
        } else {
            column.distinct_present_count() as f64 / present as f64
        };
        let null_ratio = if total == 0 {
            1.0
        } else {
            (total - present) as f64 / total as f64
        };
        Self {
            is_numeric: column.is_numeric(),
            unique_ratio,
            null_ratio,
        }
    }
}

/// Build hints for every column of a table.
pub fn build_column_hints(table: &Table) -> BTreeMap<String, ColumnHint> {
    table
        .columns()
        .iter()
        .map(|column| (column.name.clone(), ColumnHint::from_column(column)))
        .collect()
}
