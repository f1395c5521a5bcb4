use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kernel used by the per-class support-vector machines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    /// f(x) = w.x - rho
    Linear,

    /// f(x) = sum(alpha_i * exp(-gamma * ||x - x_i||^2)) - rho
    #[default]
    Rbf,
}

impl std::fmt::Display for KernelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelKind::Linear => write!(f, "linear"),
            KernelKind::Rbf => write!(f, "rbf"),
        }
    }
}

/// Model evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMetrics {
    /// Training-set accuracy
    pub accuracy: f64,

    /// Macro-averaged precision
    pub precision: f64,

    /// Macro-averaged recall
    pub recall: f64,

    /// Macro-averaged F1 score
    pub f1_score: f64,

    /// Per-label metrics
    pub per_class_metrics: HashMap<String, ClassMetrics>,
}

/// Per-label evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Calculate accuracy and macro-averaged per-label metrics over a labeled
/// set and its predictions.
pub fn calculate_metrics(y_true: &[String], y_pred: &[String], classes: &[String]) -> ModelMetrics {
    let n_samples = y_true.len();
    if n_samples == 0 || classes.is_empty() {
        return ModelMetrics::default();
    }

    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    let accuracy = correct as f64 / n_samples as f64;

    let mut per_class = HashMap::new();

    for class in classes {
        let tp = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| *t == class && *p == class)
            .count();
        let fp = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| *t != class && *p == class)
            .count();
        let fn_count = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| *t == class && *p != class)
            .count();

        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_count > 0 {
            tp as f64 / (tp + fn_count) as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let support = y_true.iter().filter(|t| *t == class).count();

        per_class.insert(
            class.clone(),
            ClassMetrics {
                precision,
                recall,
                f1_score: f1,
                support,
            },
        );
    }

    let n_classes = classes.len() as f64;
    let avg_precision = per_class.values().map(|m| m.precision).sum::<f64>() / n_classes;
    let avg_recall = per_class.values().map(|m| m.recall).sum::<f64>() / n_classes;
    let avg_f1 = per_class.values().map(|m| m.f1_score).sum::<f64>() / n_classes;

    ModelMetrics {
        accuracy,
        precision: avg_precision,
        recall: avg_recall,
        f1_score: avg_f1,
        per_class_metrics: per_class,
    }
}

/// Metadata describing a fitted severity classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Kernel the model was fitted with
    pub kernel: KernelKind,

    /// Effective RBF width (ignored by the linear kernel)
    pub gamma: f64,

    /// Training timestamp
    pub trained_at: DateTime<Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Number of severity labels in the trained label set
    pub n_classes: usize,

    /// Training metrics
    pub training_metrics: ModelMetrics,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            kernel: KernelKind::default(),
            gamma: 1.0,
            trained_at: Utc::now(),
            n_training_samples: 0,
            n_features: 0,
            n_classes: 0,
            training_metrics: ModelMetrics::default(),
        }
    }
}
