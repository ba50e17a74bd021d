//! CSV reading with per-column dtype sniffing.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use autotab_model::{Column, RawValue, Table};

use crate::error::IngestError;

/// Cell contents treated as missing, in addition to the empty string.
/// Mirrors the NA tokens the upstream CSV writers produce.
const MISSING_TOKENS: [&str; 6] = ["NA", "N/A", "NaN", "nan", "null", "NULL"];

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn is_missing_cell(cell: &str) -> bool {
    cell.is_empty() || MISSING_TOKENS.contains(&cell)
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse a cell as a finite number. Non-finite parses ("inf", overflow) are
/// rejected so a column containing them falls back to text.
fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnDtype {
    Number,
    Bool,
    Text,
}

/// Sniff the dtype of one column from its non-missing cells.
///
/// A column is numeric only if every non-missing cell parses as a finite
/// number, boolean only if every non-missing cell is true/false. A column
/// with no non-missing cells is text, which routes it through the
/// categorical imputation path.
fn sniff_dtype(cells: &[String]) -> ColumnDtype {
    let mut any = false;
    let mut all_number = true;
    let mut all_bool = true;
    for cell in cells {
        if is_missing_cell(cell) {
            continue;
        }
        any = true;
        if all_number && parse_number(cell).is_none() {
            all_number = false;
        }
        if all_bool && parse_bool(cell).is_none() {
            all_bool = false;
        }
        if !all_number && !all_bool {
            return ColumnDtype::Text;
        }
    }
    if !any {
        ColumnDtype::Text
    } else if all_number {
        ColumnDtype::Number
    } else if all_bool {
        ColumnDtype::Bool
    } else {
        ColumnDtype::Text
    }
}

fn typed_value(cell: &str, dtype: ColumnDtype) -> RawValue {
    if is_missing_cell(cell) {
        return RawValue::Missing;
    }
    match dtype {
        ColumnDtype::Number => match parse_number(cell) {
            Some(n) => RawValue::Number(n),
            None => RawValue::Missing,
        },
        ColumnDtype::Bool => match parse_bool(cell) {
            Some(b) => RawValue::Bool(b),
            None => RawValue::Missing,
        },
        ColumnDtype::Text => RawValue::Text(cell.to_string()),
    }
}

/// Read a CSV file into a typed table.
pub fn read_csv_table(path: &Path) -> Result<Table, IngestError> {
    let file = std::fs::File::open(path)?;
    read_csv_table_from_reader(file)
}

/// Read CSV data from any reader into a typed table.
pub fn read_csv_table_from_reader<R: io::Read>(reader: R) -> Result<Table, IngestError> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::MissingHeader);
    }
    let mut seen = BTreeSet::new();
    for header in &headers {
        if !seen.insert(header.clone()) {
            return Err(IngestError::DuplicateColumn(header.clone()));
        }
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in csv_reader.records() {
        let record = record?;
        for (idx, column) in cells.iter_mut().enumerate() {
            let raw = record.get(idx).unwrap_or("").trim();
            column.push(raw.to_string());
        }
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (header, column_cells) in headers.into_iter().zip(cells) {
        let dtype = sniff_dtype(&column_cells);
        debug!(column = %header, ?dtype, "sniffed column dtype");
        let values = column_cells
            .iter()
            .map(|cell| typed_value(cell, dtype))
            .collect();
        columns.push(Column::new(header, values));
    }

    let table = Table::new(columns);
    debug!(
        rows = table.height(),
        columns = table.width(),
        "csv table loaded"
    );
    Ok(table)
}
