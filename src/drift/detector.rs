//! Per-feature drift detection between a reference and a current window

use super::ks::two_sample_ks;
use super::psi::population_stability_index;
use super::stats::{mean, std_dev};
use crate::config::DriftConfig;
use crate::dataset::Dataset;
use crate::error::MonitorError;
use crate::types::drift::{DriftMetricsDocument, DriftResult, DriftSummary};
use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Compare one feature's reference and current samples.
///
/// Never fails: an empty window yields an unscored result (PSI = NaN) and a
/// near-constant reference yields PSI = 0 without a drift flag. Both are
/// excluded or neutral in the aggregate, never fatal to the batch.
pub fn compute_drift(
    feature: &str,
    reference: &[f64],
    current: &[f64],
    config: &DriftConfig,
) -> DriftResult {
    if reference.is_empty() || current.is_empty() {
        warn!(
            feature = %feature,
            reference_len = reference.len(),
            current_len = current.len(),
            "Empty window, feature skipped"
        );
        return DriftResult::undefined(feature);
    }

    let (train_mean, train_std) = (mean(reference), std_dev(reference));
    let (test_mean, test_std) = (mean(current), std_dev(current));

    let Some(psi) = population_stability_index(reference, current, config.buckets) else {
        let skipped = MonitorError::DegenerateDistribution {
            feature: feature.to_string(),
        };
        warn!(error = %skipped, "Reporting PSI = 0 without a drift flag");
        return DriftResult {
            feature: feature.to_string(),
            psi: 0.0,
            ks_statistic: 0.0,
            ks_pvalue: 1.0,
            drift_detected: false,
            train_mean,
            train_std,
            test_mean,
            test_std,
        };
    };

    let ks = two_sample_ks(reference, current);
    let drift_detected = psi > config.psi_threshold || ks.p_value < config.ks_p_threshold;

    debug!(
        feature = %feature,
        psi = psi,
        ks_statistic = ks.statistic,
        ks_pvalue = ks.p_value,
        drift = drift_detected,
        "Feature compared"
    );

    DriftResult {
        feature: feature.to_string(),
        psi,
        ks_statistic: ks.statistic,
        ks_pvalue: ks.p_value,
        drift_detected,
        train_mean,
        train_std,
        test_mean,
        test_std,
    }
}

/// Outcome of a full drift run
#[derive(Debug, Clone)]
pub struct DriftReport {
    /// One result per feature, in dataset column order (unscored included)
    pub results: Vec<DriftResult>,
    pub summary: DriftSummary,
    psi_threshold: f64,
    ks_threshold: f64,
}

impl DriftReport {
    pub fn result(&self, feature: &str) -> Option<&DriftResult> {
        self.results.iter().find(|r| r.feature == feature)
    }

    /// Persistable metrics document; unscored features are left out
    pub fn to_document(&self) -> DriftMetricsDocument {
        DriftMetricsDocument {
            timestamp: Utc::now(),
            total_features_checked: self.summary.total_features_checked,
            features_with_drift: self.summary.features_with_drift.clone(),
            drift_count: self.summary.drifted_feature_count(),
            drift_percentage: self.summary.drift_percentage(),
            feature_details: self
                .results
                .iter()
                .filter(|r| r.is_scored())
                .map(|r| (r.feature.clone(), r.clone()))
                .collect(),
            psi_threshold: self.psi_threshold,
            ks_threshold: self.ks_threshold,
        }
    }
}

/// Drift detector over every feature of a dataset
#[derive(Debug, Clone, Default)]
pub struct DriftDetector {
    config: DriftConfig,
}

impl DriftDetector {
    pub fn new(config: DriftConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    /// Compare two samples of one feature with this detector's thresholds
    pub fn compare(&self, feature: &str, reference: &[f64], current: &[f64]) -> DriftResult {
        compute_drift(feature, reference, current, &self.config)
    }

    /// Run every feature of `reference` that `current` also carries.
    ///
    /// Features are independent and evaluated in parallel; results keep
    /// the reference column order.
    pub fn detect(&self, reference: &Dataset, current: &Dataset) -> DriftReport {
        let features: Vec<&String> = reference
            .feature_names()
            .iter()
            .filter(|name| current.column(name).is_some())
            .collect();

        info!(
            features = features.len(),
            reference_rows = reference.len(),
            current_rows = current.len(),
            "Checking features for drift"
        );

        let results: Vec<DriftResult> = features
            .par_iter()
            .map(|name| {
                let ref_values = reference.feature_values(name).unwrap_or_default();
                let cur_values = current.feature_values(name).unwrap_or_default();
                self.compare(name, &ref_values, &cur_values)
            })
            .collect();

        let summary = DriftSummary::from_results(&results);

        if summary.has_drift() {
            warn!(
                drifted = summary.drifted_feature_count(),
                checked = summary.total_features_checked,
                features = ?summary.features_with_drift,
                "Drift detected"
            );
        } else {
            info!(
                checked = summary.total_features_checked,
                "All features stable"
            );
        }

        DriftReport {
            results,
            summary,
            psi_threshold: self.config.psi_threshold,
            ks_threshold: self.config.ks_p_threshold,
        }
    }
}
