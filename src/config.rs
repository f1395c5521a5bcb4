use crate::ml::KernelKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Historical dataset configuration
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Severity classifier configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Hotspot clustering configuration
    #[serde(default)]
    pub clustering: ClusteringConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: CRIME_INSIGHT_)
            .add_source(
                config::Environment::with_prefix("CRIME_INSIGHT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the historical incident CSV
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelConfig {
    /// Kernel used by the per-class support-vector machines
    #[serde(default)]
    pub kernel: KernelKind,

    /// RBF kernel width; defaults to 1 / (n_features * var(X)) when unset
    #[serde(default)]
    pub gamma: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Number of hotspot clusters
    #[serde(default = "default_clusters")]
    pub clusters: usize,

    /// Restarts from distinct initializations, lowest-inertia run kept
    #[serde(default = "default_restarts")]
    pub restarts: usize,

    /// Iteration cap per restart
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Base RNG seed for the restart sequence
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            clusters: default_clusters(),
            restarts: default_restarts(),
            max_iterations: default_max_iterations(),
            seed: default_seed(),
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/crime_data.csv")
}

fn default_clusters() -> usize {
    5
}

fn default_restarts() -> usize {
    10
}

fn default_max_iterations() -> usize {
    300
}

fn default_seed() -> u64 {
    42
}
