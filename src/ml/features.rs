use crate::ml::encoder::CategoryEncoder;
use crate::models::IncidentRecord;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Number of feature columns produced per incident
pub const N_FEATURES: usize = 3;

/// Fitted encoding tables for the three categorical fields.
///
/// One set is fitted at startup and shared read-only by every subsequent
/// encode call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderSet {
    pub location: CategoryEncoder,
    pub time: CategoryEncoder,
    pub crime_type: CategoryEncoder,
}

impl EncoderSet {
    /// Fit one encoder per categorical field from the cleaned corpus.
    pub fn fit(records: &[IncidentRecord]) -> Self {
        Self {
            location: CategoryEncoder::fit(records.iter().map(|r| r.location.as_str())),
            time: CategoryEncoder::fit(records.iter().map(|r| r.time.as_str())),
            crime_type: CategoryEncoder::fit(records.iter().map(|r| r.crime_type.as_str())),
        }
    }

    /// Encode one incident's categorical fields as a feature row.
    ///
    /// Integer codes are consumed directly as numeric input; the feature
    /// space is small and low-cardinality, so no scaling is applied.
    pub fn encode(&self, location: &str, time: &str, crime_type: &str) -> Array1<f64> {
        Array1::from_vec(vec![
            self.location.transform(location) as f64,
            self.time.transform(time) as f64,
            self.crime_type.transform(crime_type) as f64,
        ])
    }
}

/// Build the training matrix and label vector from the cleaned corpus.
///
/// Row `i` of the matrix corresponds to `records[i]`; incomplete rows must
/// have been dropped upstream.
pub fn build_features(records: &[IncidentRecord], encoders: &EncoderSet) -> (Array2<f64>, Vec<String>) {
    let mut x = Array2::zeros((records.len(), N_FEATURES));
    let mut y = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        let row = encoders.encode(&record.location, &record.time, &record.crime_type);
        x.row_mut(i).assign(&row);
        y.push(record.severity.clone());
    }

    (x, y)
}
