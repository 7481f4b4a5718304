//! Type definitions for the fraud model monitor

pub mod alert;
pub mod cost;
pub mod drift;
pub mod performance;
pub mod prediction;

pub use alert::{Alert, AlertType, Severity};
pub use cost::{
    BusinessCosts, ConfusionCounts, CostCurvePoint, CostMetricsDocument, ThresholdRecommendation,
};
pub use drift::{DriftMetricsDocument, DriftResult, DriftSummary};
pub use performance::PerformanceSnapshot;
pub use prediction::{Decision, PredictionEvent};
