use serde::{Deserialize, Serialize};

/// A cleaned historical crime incident.
///
/// Records are immutable once loaded; the full historical set is the
/// training corpus and is only read after startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Where the incident happened (free-form place name)
    pub location: String,

    /// When the incident happened (free-form time bucket, e.g. "23:00")
    pub time: String,

    /// Kind of crime (e.g. "theft")
    pub crime_type: String,

    /// Latitude of the incident
    pub latitude: f64,

    /// Longitude of the incident
    pub longitude: f64,

    /// Severity label as recorded in the corpus
    pub severity: String,
}

impl IncidentRecord {
    pub fn new(
        location: impl Into<String>,
        time: impl Into<String>,
        crime_type: impl Into<String>,
        latitude: f64,
        longitude: f64,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            time: time.into(),
            crime_type: crime_type.into(),
            latitude,
            longitude,
            severity: severity.into(),
        }
    }
}

/// One spatial cluster of historical incidents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    /// Cluster index in `0..k`
    pub cluster: usize,

    /// Latitude of the cluster center
    pub center_latitude: f64,

    /// Longitude of the cluster center
    pub center_longitude: f64,

    /// Number of historical incidents assigned to this cluster
    pub incident_count: usize,
}

/// Fitted cluster summary handed to the presentation layer for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotReport {
    /// Mean latitude of the corpus, the natural map center
    pub map_center_latitude: f64,

    /// Mean longitude of the corpus
    pub map_center_longitude: f64,

    /// Per-cluster summaries, ordered by cluster index
    pub hotspots: Vec<Hotspot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_record_creation() {
        let record = IncidentRecord::new("chennai", "23:00", "theft", 13.08, 80.27, "3");

        assert_eq!(record.location, "chennai");
        assert_eq!(record.crime_type, "theft");
        assert_eq!(record.severity, "3");
        assert!((record.latitude - 13.08).abs() < 1e-9);
    }

    #[test]
    fn test_hotspot_report_serializes() {
        let report = HotspotReport {
            map_center_latitude: 13.05,
            map_center_longitude: 80.25,
            hotspots: vec![Hotspot {
                cluster: 0,
                center_latitude: 13.08,
                center_longitude: 80.27,
                incident_count: 12,
            }],
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"incident_count\":12"));
    }
}
