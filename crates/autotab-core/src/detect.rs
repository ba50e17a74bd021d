//! Column classification heuristics.
//!
//! Pure functions over a single column's values that decide, without human
//! annotation, whether a column is an identifier, a constant, or a
//! high-cardinality categorical, and whether a target column makes the fit a
//! classification or a regression problem.
//!
//! All checks are side-effect-free; the stateful bookkeeping (which columns
//! were dropped and why) lives in the preprocessor.

use std::sync::LazyLock;

use regex::Regex;

use autotab_model::{Column, ColumnRole, ProblemType};

/// Distinct/total ratio above which a categorical column is excluded.
pub const HIGH_CARDINALITY_THRESHOLD: f64 = 0.5;

/// Name patterns marking identifier columns, matched case-insensitively
/// against the trimmed column name.
const ID_NAME_PATTERNS: [&str; 16] = [
    r"^id$",
    r"_id$",
    r"^id_",
    r"_id_",
    r"^uuid$",
    r"^guid$",
    r"order.*id",
    r"customer.*id",
    r"user.*id",
    r"transaction.*id",
    r"product.*id",
    r"session.*id",
    r"^index$",
    r"^row.*num",
    r"^serial",
    r"^record.*id",
];

static ID_NAME_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ID_NAME_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("identifier pattern compiles"))
        .collect()
});

/// True when the column is an identifier with no predictive signal.
///
/// Name patterns are checked first and take precedence over the data: a
/// column named like an identifier matches even when empty. Otherwise a
/// numeric column of all-distinct, strictly sequential integer values, or a
/// string column that is almost entirely unique alphanumeric codes, is
/// flagged.
pub fn is_identifier_column(name: &str, column: &Column) -> bool {
    let lowered = name.trim().to_lowercase();
    if ID_NAME_REGEXES.iter().any(|re| re.is_match(&lowered)) {
        return true;
    }

    if column.is_numeric() {
        return is_sequential_numeric(column);
    }

    is_unique_code_column(column)
}

fn is_sequential_numeric(column: &Column) -> bool {
    let mut values = column.numeric_values();
    // All rows present, all distinct, all integer-valued.
    if values.len() != column.len() || values.len() != column.distinct_present_count() {
        return false;
    }
    if values.iter().any(|v| v.fract() != 0.0) {
        return false;
    }
    values.sort_by(f64::total_cmp);
    values.windows(2).all(|pair| pair[1] - pair[0] == 1.0)
}

fn is_unique_code_column(column: &Column) -> bool {
    if column.is_empty() {
        return false;
    }
    let unique_ratio = column.distinct_present_count() as f64 / column.len() as f64;
    if unique_ratio <= 0.95 {
        return false;
    }
    // Sample the head of the column and require a large majority of
    // alphanumeric-code-shaped values.
    let sample: Vec<String> = column
        .present()
        .take(100)
        .map(|value| value.string_form())
        .collect();
    if sample.is_empty() {
        return false;
    }
    let code_like = sample.iter().filter(|v| looks_like_code(v)).count();
    code_like as f64 / sample.len() as f64 > 0.9
}

fn looks_like_code(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

/// True when the column has at most one distinct present value.
///
/// An all-missing column counts as constant (zero distinct values).
pub fn is_constant_column(column: &Column) -> bool {
    column.distinct_present_count() <= 1
}

/// True when a non-numeric column's distinct/total ratio strictly exceeds
/// the threshold. Exactly at the threshold is NOT flagged.
pub fn is_high_cardinality_categorical(column: &Column, threshold: f64) -> bool {
    if column.is_numeric() || column.is_empty() {
        return false;
    }
    let ratio = column.distinct_present_count() as f64 / column.len() as f64;
    ratio > threshold
}

/// Decide whether a target column describes classification or regression.
///
/// Decision order: empty target and non-numeric targets are classification;
/// integer-valued targets with at most 10 distinct values are
/// classification; low-cardinality, low-ratio numeric targets are
/// classification; everything else is regression. Absent values are ignored
/// for the integer-valued and distinct-count checks.
///
/// An all-identical fractional-float target (every value 3.14, say) comes
/// out as regression: the integer-valued rule does not apply and the ratio
/// rule rarely fires on tiny data. Existing models were trained under this
/// rule, so it is preserved as-is.
pub fn detect_problem_type(target: &Column) -> ProblemType {
    if target.is_empty() {
        return ProblemType::Classification;
    }
    if !target.is_numeric() {
        return ProblemType::Classification;
    }

    let values = target.numeric_values();
    let distinct = target.distinct_present_count();
    let total = target.len();

    let integer_valued = values.iter().all(|v| v.fract() == 0.0);
    if integer_valued && distinct <= 10 {
        return ProblemType::Classification;
    }
    if distinct < 20 && (distinct as f64 / total as f64) < 0.05 {
        return ProblemType::Classification;
    }
    ProblemType::Regression
}

/// Role of a non-target column, combining the individual checks.
///
/// Exclusion checks run in precedence order: identifier, then constant,
/// then high cardinality. Surviving columns are numeric or categorical
/// features by dtype.
pub fn column_role(name: &str, column: &Column) -> ColumnRole {
    if is_identifier_column(name, column) {
        ColumnRole::Identifier
    } else if is_constant_column(column) {
        ColumnRole::Constant
    } else if is_high_cardinality_categorical(column, HIGH_CARDINALITY_THRESHOLD) {
        ColumnRole::HighCardinalityCategorical
    } else if column.is_numeric() {
        ColumnRole::NumericFeature
    } else {
        ColumnRole::CategoricalFeature
    }
}
