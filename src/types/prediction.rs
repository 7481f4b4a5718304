//! Scored prediction events emitted by the scoring service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decision the scoring service took for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Block,
    Approve,
}

impl Decision {
    /// Decision implied by a probability at the given threshold
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Decision::Block
        } else {
            Decision::Approve
        }
    }
}

/// One scored transaction as published by the scoring service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionEvent {
    /// Transaction/record identifier
    #[serde(alias = "ID")]
    pub transaction_id: String,

    /// Predicted fraud probability (0.0 - 1.0)
    #[serde(alias = "probability")]
    pub fraud_probability: f64,

    /// Decision taken by the scorer, if it reported one
    #[serde(default)]
    pub decision: Option<Decision>,

    /// Scoring time
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl PredictionEvent {
    pub fn new(transaction_id: String, fraud_probability: f64) -> Self {
        Self {
            transaction_id,
            fraud_probability,
            decision: None,
            timestamp: Utc::now(),
        }
    }

    /// Reported decision, falling back to the monitor's own threshold
    pub fn decision_at(&self, threshold: f64) -> Decision {
        self.decision
            .unwrap_or_else(|| Decision::from_probability(self.fraud_probability, threshold))
    }
}
