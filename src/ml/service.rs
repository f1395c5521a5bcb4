use crate::config::Config;
use crate::error::{AppError, Result};
use crate::ml::classifier::{Classifier, SeverityClassifier};
use crate::ml::cluster::HotspotClusterer;
use crate::ml::features::{self, EncoderSet};
use crate::ml::models::ModelMetadata;
use crate::models::{HotspotReport, IncidentRecord};
use ndarray::Array2;
use tracing::info;

/// Severity prediction entry point for the presentation layer.
///
/// Holds the shared encoding tables and the fitted classifier; both are
/// read-only after training, so concurrent predict calls need no locking.
#[derive(Debug)]
pub struct PredictionService {
    encoders: EncoderSet,
    classifier: SeverityClassifier,
}

impl PredictionService {
    /// Predict the severity label for a single incident.
    ///
    /// Blank inputs are a caller contract violation and are rejected before
    /// encoding; category values never seen in training are absorbed by the
    /// unknown sentinel and still produce a label from the trained set.
    pub fn predict(&self, location: &str, time: &str, crime_type: &str) -> Result<String> {
        let location = required_field("location", location)?;
        let time = required_field("time", time)?;
        let crime_type = required_field("crime_type", crime_type)?;

        let row = self.encoders.encode(location, time, crime_type);
        self.classifier.predict(&row)
    }

    /// Human-readable wrapper around `predict`
    pub fn predict_message(&self, location: &str, time: &str, crime_type: &str) -> Result<String> {
        let label = self.predict(location, time, crime_type)?;
        Ok(format!("Predicted Crime Severity: {}", label))
    }

    /// Shared encoding tables
    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    /// Metadata of the fitted classifier
    pub fn metadata(&self) -> &ModelMetadata {
        self.classifier.metadata()
    }

    /// Labels seen at fit time
    pub fn classes(&self) -> &[String] {
        self.classifier.classes()
    }
}

fn required_field<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::MissingField(name.to_string()));
    }
    Ok(trimmed)
}

/// Immutable trained state produced once at startup.
///
/// Built as an owned context rather than process globals so independent
/// contexts can coexist (and be tested) without cross-contamination. Any
/// replacement strategy would publish a fully built new instance rather
/// than mutate this one in place.
#[derive(Debug)]
pub struct TrainedPipeline {
    /// Encode-then-classify entry point
    pub service: PredictionService,

    /// Fitted spatial clusters
    pub hotspots: HotspotClusterer,

    map_center: (f64, f64),
}

impl TrainedPipeline {
    /// Cluster summary plus map framing for the presentation layer
    pub fn hotspot_report(&self) -> Result<HotspotReport> {
        Ok(HotspotReport {
            map_center_latitude: self.map_center.0,
            map_center_longitude: self.map_center.1,
            hotspots: self.hotspots.hotspots()?,
        })
    }
}

/// Fit encoders, classifier, and clusterer from the cleaned historical
/// corpus.
///
/// The single construction path for trained state: an empty corpus aborts
/// before any model fit is attempted.
pub fn train_pipeline(records: &[IncidentRecord], config: &Config) -> Result<TrainedPipeline> {
    if records.is_empty() {
        return Err(AppError::Configuration(
            "historical dataset is empty after cleaning".to_string(),
        ));
    }

    info!(records = records.len(), "training crime pipeline");

    let encoders = EncoderSet::fit(records);
    let (x, y) = features::build_features(records, &encoders);

    let mut classifier = SeverityClassifier::new(config.model.kernel, config.model.gamma);
    let metrics = classifier.fit(&x, &y)?;
    info!(
        accuracy = metrics.accuracy,
        classes = classifier.classes().len(),
        "severity classifier trained"
    );

    let coords = coordinate_matrix(records);
    let mut hotspots = HotspotClusterer::new(
        config.clustering.clusters,
        config.clustering.restarts,
        config.clustering.max_iterations,
        config.clustering.seed,
    );
    hotspots.fit(&coords)?;
    let inertia = hotspots.inertia()?;
    info!(
        clusters = config.clustering.clusters,
        inertia,
        "hotspot clusters fitted"
    );

    let n = records.len() as f64;
    let map_center = (
        records.iter().map(|r| r.latitude).sum::<f64>() / n,
        records.iter().map(|r| r.longitude).sum::<f64>() / n,
    );

    Ok(TrainedPipeline {
        service: PredictionService {
            encoders,
            classifier,
        },
        hotspots,
        map_center,
    })
}

fn coordinate_matrix(records: &[IncidentRecord]) -> Array2<f64> {
    let mut coords = Array2::zeros((records.len(), 2));
    for (i, record) in records.iter().enumerate() {
        coords[[i, 0]] = record.latitude;
        coords[[i, 1]] = record.longitude;
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A corpus with two severity groups and enough spatial spread for the
    /// five hotspot clusters.
    fn corpus() -> Vec<IncidentRecord> {
        let mut records = Vec::new();
        for i in 0..12 {
            let jitter = (i % 4) as f64 * 0.01;
            records.push(IncidentRecord::new(
                "chennai",
                "23:00",
                "theft",
                13.08 + jitter,
                80.27 + jitter,
                "3",
            ));
            records.push(IncidentRecord::new(
                "madurai",
                "09:00",
                "assault",
                9.93 + jitter,
                78.12 - jitter,
                "4",
            ));
        }
        records
    }

    #[test]
    fn test_empty_corpus_aborts_before_fit() {
        let err = train_pipeline(&[], &Config::default()).unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_trained_pipeline_predicts_known_inputs() {
        let pipeline = train_pipeline(&corpus(), &Config::default()).unwrap();

        let label = pipeline
            .service
            .predict("chennai", "23:00", "theft")
            .unwrap();
        assert!(pipeline.service.classes().contains(&label));

        let message = pipeline
            .service
            .predict_message("chennai", "23:00", "theft")
            .unwrap();
        assert_eq!(message, format!("Predicted Crime Severity: {}", label));
    }

    #[test]
    fn test_case_differences_do_not_hit_unknown_path() {
        let pipeline = train_pipeline(&corpus(), &Config::default()).unwrap();
        let encoders = pipeline.service.encoders();

        let trained = encoders.encode("chennai", "23:00", "theft");
        let cased = encoders.encode("Chennai", "23:00", "Theft");
        assert_eq!(trained.to_vec(), cased.to_vec());
        assert_ne!(cased[0] as usize, encoders.location.unknown_code());

        let a = pipeline.service.predict("chennai", "23:00", "theft").unwrap();
        let b = pipeline.service.predict("Chennai", "23:00", "Theft").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_unseen_inputs_still_get_a_label() {
        let pipeline = train_pipeline(&corpus(), &Config::default()).unwrap();
        let encoders = pipeline.service.encoders();

        let row = encoders.encode("Atlantis", "00:00", "Teleportation");
        assert_eq!(row[0] as usize, encoders.location.unknown_code());
        assert_eq!(row[1] as usize, encoders.time.unknown_code());
        assert_eq!(row[2] as usize, encoders.crime_type.unknown_code());

        let label = pipeline
            .service
            .predict("Atlantis", "00:00", "Teleportation")
            .unwrap();
        assert!(pipeline.service.classes().contains(&label));
    }

    #[test]
    fn test_blank_inputs_are_rejected() {
        let pipeline = train_pipeline(&corpus(), &Config::default()).unwrap();

        let err = pipeline.service.predict("", "23:00", "theft").unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");
        assert!(err.to_string().contains("location"));

        let err = pipeline
            .service
            .predict("chennai", "   ", "theft")
            .unwrap_err();
        assert!(err.to_string().contains("time"));
    }

    #[test]
    fn test_served_predictions_are_deterministic() {
        let pipeline = train_pipeline(&corpus(), &Config::default()).unwrap();

        let first = pipeline
            .service
            .predict("madurai", "09:00", "assault")
            .unwrap();
        for _ in 0..10 {
            let next = pipeline
                .service
                .predict("madurai", "09:00", "assault")
                .unwrap();
            assert_eq!(next, first);
        }
    }

    #[test]
    fn test_hotspot_report_covers_corpus() {
        let records = corpus();
        let pipeline = train_pipeline(&records, &Config::default()).unwrap();

        let report = pipeline.hotspot_report().unwrap();
        assert_eq!(report.hotspots.len(), 5);
        let total: usize = report.hotspots.iter().map(|h| h.incident_count).sum();
        assert_eq!(total, records.len());

        let mean_lat =
            records.iter().map(|r| r.latitude).sum::<f64>() / records.len() as f64;
        assert!((report.map_center_latitude - mean_lat).abs() < 1e-9);
    }

    #[test]
    fn test_independent_contexts_do_not_interfere() {
        let a = train_pipeline(&corpus(), &Config::default()).unwrap();

        let mut other = corpus();
        for record in &mut other {
            record.severity = "1".to_string();
        }
        let b = train_pipeline(&other, &Config::default()).unwrap();

        assert!(a.service.classes().contains(&"3".to_string()));
        assert_eq!(b.service.classes(), ["1"]);
    }
}
