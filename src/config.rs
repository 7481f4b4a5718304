//! Configuration management for the fraud model monitor

use crate::error::{MonitorError, Result as MonitorResult};
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub dataset: DatasetConfig,
    pub drift: DriftConfig,
    pub cost: CostConfig,
    pub alerting: AlertingConfig,
    pub retraining: RetrainingConfig,
    pub live: LiveConfig,
    pub logging: LoggingConfig,
}

/// File locations. Everything is resolved against `base_dir`; the process
/// working directory is never changed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Project root all other paths are joined onto
    pub base_dir: PathBuf,
    /// Transactions CSV (features, label, id, optional probability)
    pub data_file: PathBuf,
    /// Directory for JSON metrics documents
    pub reports_dir: PathBuf,
    /// Alert log file name inside `reports_dir`
    pub alerts_file: String,
    /// ONNX scoring model
    pub model_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            data_file: PathBuf::from("data/raw/transactions.csv"),
            reports_dir: PathBuf::from("reports"),
            alerts_file: "alerts.json".to_string(),
            model_file: PathBuf::from("models/fraud_model.onnx"),
        }
    }
}

impl PathsConfig {
    pub fn data_path(&self) -> PathBuf {
        self.base_dir.join(&self.data_file)
    }

    pub fn reports_path(&self) -> PathBuf {
        self.base_dir.join(&self.reports_dir)
    }

    pub fn model_path(&self) -> PathBuf {
        self.base_dir.join(&self.model_file)
    }
}

/// Column layout of the transactions dataset
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub label_column: String,
    pub id_column: String,
    /// Optional column carrying pre-computed fraud probabilities
    pub probability_column: String,
    /// Leading share of rows used as the reference window
    pub reference_fraction: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            label_column: "is_fraud".to_string(),
            id_column: "transaction_id".to_string(),
            probability_column: "fraud_probability".to_string(),
            reference_fraction: 0.8,
        }
    }
}

/// Drift detection thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Number of quantile buckets built over the reference sample
    pub buckets: usize,
    /// PSI above this flags drift
    pub psi_threshold: f64,
    /// KS p-value below this flags drift
    pub ks_p_threshold: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            buckets: 10,
            psi_threshold: 0.1,
            ks_p_threshold: 0.05,
        }
    }
}

/// Business cost parameters for threshold optimization
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Cost of a missed fraud (chargeback + investigation)
    pub cost_false_negative: f64,
    /// Cost of a false alarm (customer friction, decline cost)
    pub cost_false_positive: f64,
    /// Threshold the savings are measured against
    pub baseline_threshold: f64,
    /// Spacing of the candidate threshold grid
    pub grid_step: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            cost_false_negative: 100.0,
            cost_false_positive: 5.0,
            baseline_threshold: 0.5,
            grid_step: 0.01,
        }
    }
}

/// Alert rule thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    /// Block rate above this raises a warning
    pub block_rate_threshold: f64,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            block_rate_threshold: 0.05,
        }
    }
}

/// Retraining trigger limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrainingConfig {
    pub max_drifted_features: usize,
    pub max_model_age_days: u64,
}

impl Default for RetrainingConfig {
    fn default() -> Self {
        Self {
            max_drifted_features: 2,
            max_model_age_days: 30,
        }
    }
}

/// Live prediction monitoring over NATS
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// NATS server URL
    pub nats_url: String,
    /// Subject the scoring service publishes prediction events on
    pub prediction_subject: String,
    /// Probability at or above which a prediction counts as blocked
    pub decision_threshold: f64,
    /// Seconds between summary + alert evaluation rounds
    pub report_interval_secs: u64,
    /// Concurrent event handlers
    pub workers: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            prediction_subject: "predictions".to_string(),
            decision_threshold: 0.29,
            report_interval_secs: 30,
            workers: 4,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app.validate().context("Configuration rejected")?;
        Ok(app)
    }

    /// Check value ranges the core relies on
    pub fn validate(&self) -> MonitorResult<()> {
        let unit = |name: &str, v: f64| {
            if v > 0.0 && v < 1.0 {
                Ok(())
            } else {
                Err(MonitorError::invalid_config(format!(
                    "{name} must be in (0, 1), got {v}"
                )))
            }
        };
        // NaN fails both comparisons, so test for the accepted range
        let non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(MonitorError::invalid_config(format!(
                    "{name} must be finite and non-negative, got {v}"
                )))
            }
        };

        if self.drift.buckets == 0 {
            return Err(MonitorError::invalid_config("drift.buckets must be positive"));
        }
        unit("drift.ks_p_threshold", self.drift.ks_p_threshold)?;
        non_negative("drift.psi_threshold", self.drift.psi_threshold)?;
        unit("dataset.reference_fraction", self.dataset.reference_fraction)?;
        unit("cost.baseline_threshold", self.cost.baseline_threshold)?;
        unit("cost.grid_step", self.cost.grid_step)?;
        unit("alerting.block_rate_threshold", self.alerting.block_rate_threshold)?;
        unit("live.decision_threshold", self.live.decision_threshold)?;
        non_negative("cost.cost_false_negative", self.cost.cost_false_negative)?;
        non_negative("cost.cost_false_positive", self.cost.cost_false_positive)?;
        Ok(())
    }
}
