//! Drift detection result structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Per-feature comparison of the reference ("train") and current ("test") windows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftResult {
    /// Feature (column) name
    pub feature: String,

    /// Population Stability Index, NaN when either window is empty
    #[serde(serialize_with = "nan_as_null", deserialize_with = "null_as_nan")]
    pub psi: f64,

    /// Two-sample Kolmogorov-Smirnov statistic (0.0 - 1.0)
    pub ks_statistic: f64,

    /// Asymptotic KS p-value (0.0 - 1.0)
    pub ks_pvalue: f64,

    /// PSI above threshold or KS p-value below threshold
    pub drift_detected: bool,

    /// Reference window statistics
    pub train_mean: f64,
    pub train_std: f64,

    /// Current window statistics
    pub test_mean: f64,
    pub test_std: f64,
}

impl DriftResult {
    /// Result for a feature that could not be scored because a window was empty.
    /// Window statistics are zeroed.
    pub fn undefined(feature: &str) -> Self {
        Self {
            feature: feature.to_string(),
            psi: f64::NAN,
            ks_statistic: 0.0,
            ks_pvalue: 1.0,
            drift_detected: false,
            train_mean: 0.0,
            train_std: 0.0,
            test_mean: 0.0,
            test_std: 0.0,
        }
    }

    /// Whether the feature was actually scored and counts towards the summary
    pub fn is_scored(&self) -> bool {
        !self.psi.is_nan()
    }

    /// Absolute shift of the mean between windows
    pub fn mean_change(&self) -> f64 {
        (self.test_mean - self.train_mean).abs()
    }
}

fn nan_as_null<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_none()
    } else {
        serializer.serialize_f64(*value)
    }
}

fn null_as_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Aggregate over all scored features
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriftSummary {
    /// Features that were scored (empty windows excluded)
    pub total_features_checked: usize,
    /// Flagged features, in evaluation order
    pub features_with_drift: Vec<String>,
}

impl DriftSummary {
    /// Build a summary from results in evaluation order, skipping unscored features
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a DriftResult>) -> Self {
        let mut summary = Self::default();
        for result in results.into_iter().filter(|r| r.is_scored()) {
            summary.total_features_checked += 1;
            if result.drift_detected {
                summary.features_with_drift.push(result.feature.clone());
            }
        }
        summary
    }

    pub fn drifted_feature_count(&self) -> usize {
        self.features_with_drift.len()
    }

    pub fn has_drift(&self) -> bool {
        !self.features_with_drift.is_empty()
    }

    /// Percentage of checked features that drifted
    pub fn drift_percentage(&self) -> f64 {
        if self.total_features_checked == 0 {
            0.0
        } else {
            100.0 * self.drifted_feature_count() as f64 / self.total_features_checked as f64
        }
    }
}

/// Persisted drift metrics document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftMetricsDocument {
    pub timestamp: DateTime<Utc>,
    pub total_features_checked: usize,
    pub features_with_drift: Vec<String>,
    pub drift_count: usize,
    pub drift_percentage: f64,
    pub feature_details: BTreeMap<String, DriftResult>,
    pub psi_threshold: f64,
    pub ks_threshold: f64,
}

impl DriftMetricsDocument {
    /// Recover the summary the document was written from
    pub fn summary(&self) -> DriftSummary {
        DriftSummary {
            total_features_checked: self.total_features_checked,
            features_with_drift: self.features_with_drift.clone(),
        }
    }
}
