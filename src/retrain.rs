//! Retraining recommendation from drift and model age

use crate::config::RetrainingConfig;
use crate::types::drift::DriftMetricsDocument;
use serde::Serialize;
use tracing::info;

/// Whether the model should be retrained, and why
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrainingDecision {
    pub needed: bool,
    pub reasons: Vec<String>,
}

pub struct RetrainingTrigger {
    config: RetrainingConfig,
}

impl RetrainingTrigger {
    pub fn new(config: RetrainingConfig) -> Self {
        Self { config }
    }

    /// Missing inputs simply contribute no reason
    pub fn check(
        &self,
        drift: Option<&DriftMetricsDocument>,
        model_age_days: Option<u64>,
    ) -> RetrainingDecision {
        let mut reasons = Vec::new();

        if let Some(doc) = drift {
            if doc.drift_count > self.config.max_drifted_features {
                reasons.push(format!(
                    "Data drift detected in {} features",
                    doc.drift_count
                ));
            }
        }

        if let Some(days) = model_age_days {
            if days > self.config.max_model_age_days {
                reasons.push(format!(
                    "Model is {days} days old - periodic retraining recommended"
                ));
            }
        }

        let decision = RetrainingDecision {
            needed: !reasons.is_empty(),
            reasons,
        };
        info!(
            needed = decision.needed,
            reasons = decision.reasons.len(),
            "Retraining check complete"
        );
        decision
    }
}
