use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Fatal startup problems: dataset missing, empty after cleaning, or
    /// missing required columns
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required prediction input was absent or blank
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A model was asked to predict before it was fitted
    #[error("Model not trained: {0}")]
    Untrained(String),

    /// Model training failed
    #[error("Training error: {0}")]
    Training(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset parse errors
    #[error("Dataset error: {0}")]
    Dataset(#[from] csv::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::MissingField(_) => "MISSING_FIELD",
            AppError::Untrained(_) => "MODEL_NOT_TRAINED",
            AppError::Training(_) => "TRAINING_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Dataset(_) => "DATASET_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Configuration("test".to_string()).error_code(),
            "CONFIGURATION_ERROR"
        );
        assert_eq!(
            AppError::MissingField("location".to_string()).error_code(),
            "MISSING_FIELD"
        );
        assert_eq!(
            AppError::Untrained("classifier".to_string()).error_code(),
            "MODEL_NOT_TRAINED"
        );
    }

    #[test]
    fn test_error_display() {
        let err = AppError::MissingField("crime_type".to_string());
        assert_eq!(err.to_string(), "Missing field: crime_type");

        let err = AppError::Untrained("severity classifier".to_string());
        assert_eq!(err.to_string(), "Model not trained: severity classifier");
    }
}
