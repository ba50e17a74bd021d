//! Label encoding for categorical values.

use std::collections::BTreeMap;

/// Sentinel code for a value never observed during fitting.
///
/// Unseen categories at transform time are a data imperfection, not an
/// error; they encode to this sentinel instead of failing the request.
pub const UNKNOWN_CATEGORY_CODE: i64 = -1;

/// A fit-time mapping from distinct original values to dense integer codes.
///
/// Codes are assigned in first-seen order starting at 0 and are unique per
/// distinct input value. Once fitted the encoding is read-only: transform
/// paths look values up but never extend the vocabulary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelEncoding {
    classes: Vec<String>,
    index: BTreeMap<String, i64>,
}

impl LabelEncoding {
    /// Fit an encoding over observed values in first-seen order.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut encoding = Self::default();
        for value in values {
            let value = value.as_ref();
            if !encoding.index.contains_key(value) {
                let code = encoding.classes.len() as i64;
                encoding.classes.push(value.to_string());
                encoding.index.insert(value.to_string(), code);
            }
        }
        encoding
    }

    /// Rebuild an encoding from a stored value → code mapping.
    ///
    /// Classes are restored into code order so `classes()` round-trips.
    pub fn from_mapping(mapping: &BTreeMap<String, i64>) -> Self {
        let mut pairs: Vec<(&String, &i64)> = mapping.iter().collect();
        pairs.sort_by_key(|(_, code)| **code);
        Self {
            classes: pairs.iter().map(|(value, _)| (*value).clone()).collect(),
            index: mapping.clone(),
        }
    }

    /// Code for a value, or [`UNKNOWN_CATEGORY_CODE`] if never seen at fit.
    pub fn code_for(&self, value: &str) -> i64 {
        self.index
            .get(value)
            .copied()
            .unwrap_or(UNKNOWN_CATEGORY_CODE)
    }

    /// Distinct values in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Value → code view, as stored in the contract.
    pub fn mapping(&self) -> &BTreeMap<String, i64> {
        &self.index
    }

    /// Code → value view, used to decode predicted classes.
    pub fn inverse(&self) -> BTreeMap<i64, String> {
        self.index
            .iter()
            .map(|(value, code)| (*code, value.clone()))
            .collect()
    }
}
