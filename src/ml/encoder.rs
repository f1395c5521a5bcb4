use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Sentinel category for values never seen during fit
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Stable string-to-code encoding table for one categorical field.
///
/// The table is built once at fit time and never mutated afterwards, so any
/// number of readers may transform concurrently. Codes assigned during fit
/// stay valid for the lifetime of the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    codes: HashMap<String, usize>,
    unknown_code: usize,
}

impl CategoryEncoder {
    /// Build the encoding table from the training values for one field.
    ///
    /// Distinct normalized values get consecutive codes in sorted order, so
    /// repeated fits over the same corpus produce identical tables. The
    /// "unknown" sentinel is part of the table even when it never occurs in
    /// the data; it is the escape hatch for open-vocabulary input at
    /// prediction time.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: BTreeSet<String> = values
            .into_iter()
            .map(|value| normalize(value.as_ref()))
            .collect();
        classes.insert(UNKNOWN_CATEGORY.to_string());

        let codes: HashMap<String, usize> = classes
            .into_iter()
            .enumerate()
            .map(|(code, class)| (class, code))
            .collect();
        let unknown_code = codes[UNKNOWN_CATEGORY];

        Self {
            codes,
            unknown_code,
        }
    }

    /// Code for a value, falling back to the unknown sentinel.
    ///
    /// Never fails, whatever the input: values outside the fitted
    /// vocabulary all map to the unknown code.
    pub fn transform(&self, value: &str) -> usize {
        self.codes
            .get(&normalize(value))
            .copied()
            .unwrap_or(self.unknown_code)
    }

    /// Code reserved for unseen values
    pub fn unknown_code(&self) -> usize {
        self.unknown_code
    }

    /// Number of codes in the table, sentinel included
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Normalization applied identically at fit time and transform time
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
