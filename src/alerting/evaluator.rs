//! Alert rules over drift and performance summaries

use super::log::AlertLog;
use crate::config::AlertingConfig;
use crate::error::Result;
use crate::types::alert::{Alert, AlertType, Severity};
use crate::types::drift::DriftSummary;
use crate::types::performance::PerformanceSnapshot;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Turns monitoring summaries into alerts and appends them to the log
pub struct AlertEvaluator {
    config: AlertingConfig,
    log: Arc<dyn AlertLog>,
}

impl AlertEvaluator {
    pub fn new(config: AlertingConfig, log: Arc<dyn AlertLog>) -> Self {
        Self { config, log }
    }

    pub fn log(&self) -> &Arc<dyn AlertLog> {
        &self.log
    }

    /// Apply every rule whose input is present.
    ///
    /// Each rule fires at most once per call. Alerts are not deduplicated
    /// against earlier calls.
    pub fn evaluate(
        &self,
        drift: Option<&DriftSummary>,
        performance: Option<&PerformanceSnapshot>,
    ) -> Result<Vec<Alert>> {
        let mut alerts = Vec::new();

        if let Some(summary) = drift {
            alerts.extend(drift_alert(summary));
        }
        if let Some(snapshot) = performance {
            alerts.extend(self.block_rate_alert(snapshot));
            alerts.extend(system_status_alert(snapshot));
        }

        for alert in &alerts {
            warn!(
                alert_type = %alert.alert_type,
                severity = %alert.severity,
                message = %alert.message,
                "Alert fired"
            );
            self.log.append(alert)?;
        }

        if alerts.is_empty() {
            info!("No alerts fired");
        }

        Ok(alerts)
    }

    fn block_rate_alert(&self, snapshot: &PerformanceSnapshot) -> Option<Alert> {
        (snapshot.block_rate > self.config.block_rate_threshold).then(|| {
            Alert::new(
                AlertType::HighBlockRate,
                Severity::Warning,
                format!(
                    "Block rate is {:.1}% - review for false positives",
                    100.0 * snapshot.block_rate
                ),
            )
            .with_details(json!({ "block_rate": snapshot.block_rate }))
        })
    }
}

fn drift_alert(summary: &DriftSummary) -> Option<Alert> {
    summary.has_drift().then(|| {
        Alert::new(
            AlertType::DataDrift,
            Severity::Warning,
            format!(
                "Data drift detected in {} features",
                summary.drifted_feature_count()
            ),
        )
        .with_details(json!({ "drifted_features": summary.features_with_drift }))
    })
}

fn system_status_alert(snapshot: &PerformanceSnapshot) -> Option<Alert> {
    (snapshot.total_predictions == 0).then(|| {
        Alert::new(
            AlertType::SystemStatus,
            Severity::Critical,
            "No predictions recorded - system may be offline",
        )
    })
}
