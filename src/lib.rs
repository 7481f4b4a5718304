//! Fraud Model Monitor Library
//!
//! Watches a deployed fraud-scoring model for input drift and for a
//! suboptimal decision threshold under asymmetric business costs, and
//! turns both into alerts and retraining recommendations.

pub mod alerting;
pub mod config;
pub mod consumer;
pub mod cost;
pub mod dataset;
pub mod drift;
pub mod error;
pub mod metrics;
pub mod models;
pub mod reports;
pub mod retrain;
pub mod types;

pub use alerting::{AlertEvaluator, AlertLog, JsonlAlertLog, MemoryAlertLog};
pub use config::AppConfig;
pub use consumer::PredictionConsumer;
pub use cost::{optimize_threshold, CostReport};
pub use dataset::Dataset;
pub use drift::{compute_drift, DriftDetector, DriftReport};
pub use error::{MonitorError, Result};
pub use metrics::{MetricsReporter, PerformanceMetrics};
pub use models::{score_dataset, OnnxScorer, Scorer};
pub use reports::ReportStore;
pub use retrain::{RetrainingDecision, RetrainingTrigger};
pub use types::{Alert, DriftResult, DriftSummary, PerformanceSnapshot, PredictionEvent};
