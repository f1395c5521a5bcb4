use crate::error::{AppError, Result};
use crate::models::IncidentRecord;
use std::path::Path;
use tracing::{debug, info};

/// Columns the historical dataset must carry
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Location",
    "Time",
    "CrimeType",
    "Latitude",
    "Longitude",
    "Severity",
];

/// Load and clean the historical incident corpus from a CSV file.
///
/// A missing file or missing required columns is a fatal configuration
/// error. Rows with blank fields or unparseable coordinates are dropped
/// whole; "unknown" encoding is reserved for post-fit prediction inputs,
/// never for holes in the corpus.
pub fn load_csv(path: &Path) -> Result<Vec<IncidentRecord>> {
    if !path.exists() {
        return Err(AppError::Configuration(format!(
            "historical dataset not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns = ColumnIndices::resolve(&headers)?;

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in reader.records() {
        let row = row?;
        match columns.clean_row(&row) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, "dropped incomplete rows during cleaning");
    }
    info!(
        kept = records.len(),
        dropped,
        path = %path.display(),
        "loaded historical dataset"
    );

    Ok(records)
}

/// Resolved positions of the required columns in the CSV header
struct ColumnIndices {
    location: usize,
    time: usize,
    crime_type: usize,
    latitude: usize,
    longitude: usize,
    severity: usize,
}

impl ColumnIndices {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let mut indices = [0usize; REQUIRED_COLUMNS.len()];
        let mut missing = Vec::new();
        for (slot, column) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
            match find(column) {
                Some(index) => *slot = index,
                None => missing.push(column),
            }
        }
        if !missing.is_empty() {
            return Err(AppError::Configuration(format!(
                "dataset is missing required columns: {}",
                missing.join(", ")
            )));
        }

        let [location, time, crime_type, latitude, longitude, severity] = indices;
        Ok(Self {
            location,
            time,
            crime_type,
            latitude,
            longitude,
            severity,
        })
    }

    /// Turn one raw row into a record, or `None` when any field is blank
    /// or a coordinate fails to parse (record-level drop).
    fn clean_row(&self, row: &csv::StringRecord) -> Option<IncidentRecord> {
        let field = |index: usize| {
            row.get(index)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let location = field(self.location)?;
        let time = field(self.time)?;
        let crime_type = field(self.crime_type)?;
        let latitude: f64 = field(self.latitude)?.parse().ok()?;
        let longitude: f64 = field(self.longitude)?.parse().ok()?;
        let severity = field(self.severity)?;

        Some(IncidentRecord::new(
            location, time, crime_type, latitude, longitude, severity,
        ))
    }
}
