use crate::error::{AppError, Result};
use crate::ml::models::{calculate_metrics, KernelKind, ModelMetadata, ModelMetrics};
use chrono::Utc;
use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use tracing::{debug, warn};

/// Trait for severity classifiers
pub trait Classifier: Send + Sync {
    /// Train the classifier on a feature matrix and its label vector
    fn fit(&mut self, x: &Array2<f64>, y: &[String]) -> Result<ModelMetrics>;

    /// Predict the label for a single feature row
    fn predict(&self, features: &Array1<f64>) -> Result<String>;

    /// Check if the model is trained
    fn is_trained(&self) -> bool;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;
}

/// Linear one-vs-rest member: f(x) = w.x - rho
#[derive(Debug, Clone)]
struct LinearDecision {
    label: String,
    weights: Array1<f64>,
    rho: f64,
}

impl LinearDecision {
    #[inline]
    fn decision_function(&self, x: &Array1<f64>) -> f64 {
        self.weights.dot(x) - self.rho
    }
}

/// RBF one-vs-rest member: f(x) = sum(alpha_i * k(x, x_i)) - rho
#[derive(Debug, Clone)]
struct RbfDecision {
    label: String,
    alpha: Vec<f64>,
    support_vectors: Array2<f64>,
    rho: f64,
    gamma: f64,
}

impl RbfDecision {
    #[inline]
    fn kernel(&self, x: &Array1<f64>, y: &Array1<f64>) -> f64 {
        let sq_dist: f64 = x
            .iter()
            .zip(y.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        (-self.gamma * sq_dist).exp()
    }

    fn decision_function(&self, x: &Array1<f64>) -> f64 {
        let mut sum = 0.0;
        for (i, alpha_i) in self.alpha.iter().enumerate() {
            let x_i = self.support_vectors.row(i).to_owned();
            sum += alpha_i * self.kernel(x, &x_i);
        }
        sum - self.rho
    }
}

/// One fitted per-label decision function
#[derive(Debug, Clone)]
enum Decision {
    Linear(LinearDecision),
    Rbf(RbfDecision),
}

impl Decision {
    fn label(&self) -> &str {
        match self {
            Decision::Linear(d) => &d.label,
            Decision::Rbf(d) => &d.label,
        }
    }

    fn decision_function(&self, x: &Array1<f64>) -> f64 {
        match self {
            Decision::Linear(d) => d.decision_function(x),
            Decision::Rbf(d) => d.decision_function(x),
        }
    }
}

/// Multi-class severity classifier built from one-vs-rest support-vector
/// machines.
///
/// One binary SVM is fitted per severity label; prediction picks the label
/// whose decision function scores highest, ties broken by sorted label
/// order. Fitting is done once at startup; afterwards the model is
/// read-only and safe to share across threads.
#[derive(Debug)]
pub struct SeverityClassifier {
    kernel: KernelKind,
    gamma: Option<f64>,
    classes: Vec<String>,
    decisions: Vec<Decision>,
    metadata: ModelMetadata,
    trained: bool,
}

impl SeverityClassifier {
    /// Create an unfitted classifier.
    ///
    /// `gamma` overrides the RBF width; when `None` the
    /// 1 / (n_features * var(X)) heuristic is used at fit time.
    pub fn new(kernel: KernelKind, gamma: Option<f64>) -> Self {
        Self {
            kernel,
            gamma,
            classes: Vec::new(),
            decisions: Vec::new(),
            metadata: ModelMetadata::default(),
            trained: false,
        }
    }

    /// Labels seen at fit time, sorted
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    fn fit_one_vs_rest(
        &mut self,
        x: &Array2<f64>,
        y: &[String],
        classes: &[String],
        gamma: f64,
    ) -> Result<()> {
        for label in classes {
            let targets = Array1::from_iter(y.iter().map(|l| l == label));
            let dataset = Dataset::new(x.clone(), targets);

            let fitted = match self.kernel {
                KernelKind::Linear => Svm::<_, bool>::params().linear_kernel().fit(&dataset),
                KernelKind::Rbf => Svm::<_, bool>::params().gaussian_kernel(gamma).fit(&dataset),
            };
            let svm = fitted.map_err(|e| {
                AppError::Training(format!("failed to fit model for label {}: {}", label, e))
            })?;

            let alpha = svm.alpha.clone();
            let rho = svm.rho;

            match self.kernel {
                KernelKind::Linear => {
                    // Collapse the dual form into a weight vector: w = sum(alpha_i * x_i)
                    let mut weights = Array1::zeros(x.ncols());
                    for (i, &alpha_i) in alpha.iter().enumerate() {
                        weights = weights + &(x.row(i).to_owned() * alpha_i);
                    }
                    self.decisions.push(Decision::Linear(LinearDecision {
                        label: label.clone(),
                        weights,
                        rho,
                    }));
                }
                KernelKind::Rbf => {
                    self.decisions.push(Decision::Rbf(RbfDecision {
                        label: label.clone(),
                        alpha,
                        support_vectors: x.clone(),
                        rho,
                        gamma,
                    }));
                }
            }
        }

        Ok(())
    }
}

impl Classifier for SeverityClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[String]) -> Result<ModelMetrics> {
        if x.nrows() == 0 {
            return Err(AppError::Training("empty feature matrix".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(AppError::Internal(format!(
                "feature matrix has {} rows but {} labels were given",
                x.nrows(),
                y.len()
            )));
        }

        let mut classes: Vec<String> = y.to_vec();
        classes.sort();
        classes.dedup();

        let gamma = self.gamma.unwrap_or_else(|| scale_gamma(x));
        debug!(kernel = %self.kernel, gamma, classes = classes.len(), "fitting severity classifier");

        self.decisions.clear();
        if classes.len() < 2 {
            // A single-label corpus degenerates to a constant predictor.
            warn!("training corpus has a single severity label");
        } else {
            self.fit_one_vs_rest(x, y, &classes, gamma)?;
        }

        self.classes = classes;
        self.trained = true;

        let predictions: Result<Vec<String>> = x
            .rows()
            .into_iter()
            .map(|row| self.predict(&row.to_owned()))
            .collect();
        let metrics = calculate_metrics(y, &predictions?, &self.classes);

        self.metadata = ModelMetadata {
            kernel: self.kernel,
            gamma,
            trained_at: Utc::now(),
            n_training_samples: x.nrows(),
            n_features: x.ncols(),
            n_classes: self.classes.len(),
            training_metrics: metrics.clone(),
        };

        Ok(metrics)
    }

    fn predict(&self, features: &Array1<f64>) -> Result<String> {
        if !self.trained {
            return Err(AppError::Untrained("severity classifier".to_string()));
        }

        let mut decisions = self.decisions.iter();
        let first = match decisions.next() {
            Some(first) => first,
            // Single-label corpus: every input gets the one trained label.
            None => {
                return self
                    .classes
                    .first()
                    .cloned()
                    .ok_or_else(|| AppError::Internal("trained model has no labels".to_string()))
            }
        };

        let mut best_label = first.label();
        let mut best_score = first.decision_function(features);
        for decision in decisions {
            let score = decision.decision_function(features);
            if score > best_score {
                best_score = score;
                best_label = decision.label();
            }
        }

        Ok(best_label.to_string())
    }

    fn is_trained(&self) -> bool {
        self.trained
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

/// RBF width heuristic: 1 / (n_features * var(X)), falling back to 1.0 for
/// degenerate (constant) feature matrices.
fn scale_gamma(x: &Array2<f64>) -> f64 {
    let n = x.len() as f64;
    if n == 0.0 {
        return 1.0;
    }
    let mean = x.iter().sum::<f64>() / n;
    let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    if var > f64::EPSILON {
        1.0 / (x.ncols() as f64 * var)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two label groups living in separate corners of the code space.
    fn separable_corpus() -> (Array2<f64>, Vec<String>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            let offset = (i % 3) as f64;
            rows.push([offset, offset, 0.0]);
            labels.push("low".to_string());
            rows.push([8.0 + offset, 8.0 + offset, 6.0]);
            labels.push("high".to_string());
        }

        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let x = Array2::from_shape_vec((rows.len(), 3), flat).unwrap();
        (x, labels)
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let classifier = SeverityClassifier::new(KernelKind::Linear, None);
        let err = classifier
            .predict(&Array1::from_vec(vec![0.0, 0.0, 0.0]))
            .unwrap_err();
        assert_eq!(err.error_code(), "MODEL_NOT_TRAINED");
    }

    #[test]
    fn test_linear_fit_separates_classes() {
        let (x, y) = separable_corpus();
        let mut classifier = SeverityClassifier::new(KernelKind::Linear, None);

        assert!(!classifier.is_trained());
        let metrics = classifier.fit(&x, &y).unwrap();
        assert!(classifier.is_trained());
        assert!(metrics.accuracy >= 0.0 && metrics.accuracy <= 1.0);

        let low = classifier
            .predict(&Array1::from_vec(vec![0.0, 0.0, 0.0]))
            .unwrap();
        let high = classifier
            .predict(&Array1::from_vec(vec![9.0, 9.0, 6.0]))
            .unwrap();
        assert_eq!(low, "low");
        assert_eq!(high, "high");
    }

    #[test]
    fn test_rbf_fit_separates_classes() {
        let (x, y) = separable_corpus();
        let mut classifier = SeverityClassifier::new(KernelKind::Rbf, None);
        classifier.fit(&x, &y).unwrap();

        let low = classifier
            .predict(&Array1::from_vec(vec![0.0, 1.0, 0.0]))
            .unwrap();
        let high = classifier
            .predict(&Array1::from_vec(vec![8.0, 9.0, 6.0]))
            .unwrap();
        assert_eq!(low, "low");
        assert_eq!(high, "high");
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let (x, y) = separable_corpus();
        let mut classifier = SeverityClassifier::new(KernelKind::Rbf, None);
        classifier.fit(&x, &y).unwrap();

        let row = Array1::from_vec(vec![4.0, 4.0, 3.0]);
        let first = classifier.predict(&row).unwrap();
        for _ in 0..20 {
            assert_eq!(classifier.predict(&row).unwrap(), first);
        }
    }

    #[test]
    fn test_prediction_stays_in_label_set() {
        let (x, y) = separable_corpus();
        let mut classifier = SeverityClassifier::new(KernelKind::Rbf, None);
        classifier.fit(&x, &y).unwrap();

        // A point far outside the training range still yields a trained label.
        let label = classifier
            .predict(&Array1::from_vec(vec![100.0, -50.0, 33.0]))
            .unwrap();
        assert!(classifier.classes().contains(&label));
    }

    #[test]
    fn test_single_label_corpus_is_constant() {
        let x = Array2::from_shape_vec((4, 3), vec![0.0; 12]).unwrap();
        let y = vec!["3".to_string(); 4];

        let mut classifier = SeverityClassifier::new(KernelKind::Rbf, None);
        let metrics = classifier.fit(&x, &y).unwrap();
        assert_eq!(metrics.accuracy, 1.0);

        let label = classifier
            .predict(&Array1::from_vec(vec![7.0, 7.0, 7.0]))
            .unwrap();
        assert_eq!(label, "3");
    }

    #[test]
    fn test_fit_rejects_empty_matrix() {
        let x = Array2::zeros((0, 3));
        let mut classifier = SeverityClassifier::new(KernelKind::Linear, None);
        let err = classifier.fit(&x, &[]).unwrap_err();
        assert_eq!(err.error_code(), "TRAINING_ERROR");
    }

    #[test]
    fn test_metadata_after_fit() {
        let (x, y) = separable_corpus();
        let mut classifier = SeverityClassifier::new(KernelKind::Linear, Some(0.5));
        classifier.fit(&x, &y).unwrap();

        let meta = classifier.metadata();
        assert_eq!(meta.kernel, KernelKind::Linear);
        assert_eq!(meta.n_training_samples, 20);
        assert_eq!(meta.n_features, 3);
        assert_eq!(meta.n_classes, 2);
    }
}
