//! Machine learning pipeline for crime incidents
//!
//! The trained core of the system:
//! - Stable categorical encoding with an "unknown" fallback
//! - Feature matrix assembly from the cleaned corpus
//! - Multi-class severity classification (one-vs-rest SVMs)
//! - K-means hotspot clustering over incident coordinates
//! - The prediction entry point consumed by the presentation layer

pub mod classifier;
pub mod cluster;
pub mod encoder;
pub mod features;
pub mod models;
pub mod service;

pub use classifier::{Classifier, SeverityClassifier};
pub use cluster::HotspotClusterer;
pub use encoder::{CategoryEncoder, UNKNOWN_CATEGORY};
pub use features::{build_features, EncoderSet, N_FEATURES};
pub use models::{ClassMetrics, KernelKind, ModelMetadata, ModelMetrics};
pub use service::{train_pipeline, PredictionService, TrainedPipeline};
