//! Error types shared by the monitoring core.

use thiserror::Error;

/// Errors raised by the drift, cost and alerting components.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A required sample, dataset or column is absent.
    #[error("Missing input: {what}")]
    MissingInput { what: String },

    /// Feature has too few unique values to bin. Recovered per feature, never fatal.
    #[error("Degenerate distribution for feature '{feature}'")]
    DegenerateDistribution { feature: String },

    /// Labels are not strictly binary or do not line up with the probabilities.
    #[error("Invalid labels: {reason}")]
    InvalidLabels { reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Model loading or inference failed.
    #[error("Scoring failed: {reason}")]
    Scoring { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl MonitorError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingInput { what: what.into() }
    }

    pub fn invalid_labels(reason: impl Into<String>) -> Self {
        Self::InvalidLabels {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn scoring(reason: impl Into<String>) -> Self {
        Self::Scoring {
            reason: reason.into(),
        }
    }

    /// Whether the error aborts the whole run rather than a single feature.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MonitorError::DegenerateDistribution { .. })
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::invalid_labels("labels must be 0 or 1, found 2");
        assert_eq!(err.to_string(), "Invalid labels: labels must be 0 or 1, found 2");

        let err = MonitorError::missing("column 'is_fraud'");
        assert_eq!(err.to_string(), "Missing input: column 'is_fraud'");
    }

    #[test]
    fn test_degenerate_is_soft() {
        let soft = MonitorError::DegenerateDistribution {
            feature: "amount".to_string(),
        };
        assert!(!soft.is_fatal());
        assert!(MonitorError::invalid_labels("x").is_fatal());
        assert!(MonitorError::missing("x").is_fatal());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MonitorError = io.into();
        assert!(matches!(err, MonitorError::Io(_)));
    }
}
