//! Scoring performance snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted performance metrics document, also the input of the alert rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_predictions: u64,
    pub blocked_count: u64,
    pub approved_count: u64,
    /// blocked / total, 0 when nothing was scored
    pub block_rate: f64,
    #[serde(default)]
    pub avg_fraud_probability: f64,
    #[serde(default)]
    pub min_fraud_probability: f64,
    #[serde(default)]
    pub max_fraud_probability: f64,
    #[serde(default)]
    pub median_fraud_probability: f64,
}

impl PerformanceSnapshot {
    /// Snapshot of a scored batch; a prediction is blocked when `p >= threshold`
    pub fn from_probabilities(probabilities: &[f64], threshold: f64) -> Self {
        let total = probabilities.len() as u64;
        let blocked = probabilities.iter().filter(|&&p| p >= threshold).count() as u64;

        let mut snapshot = Self::empty();
        snapshot.total_predictions = total;
        snapshot.blocked_count = blocked;
        snapshot.approved_count = total - blocked;
        snapshot.block_rate = if total > 0 {
            blocked as f64 / total as f64
        } else {
            0.0
        };

        if !probabilities.is_empty() {
            let mut sorted = probabilities.to_vec();
            sorted.sort_by(f64::total_cmp);
            let n = sorted.len();
            snapshot.avg_fraud_probability = sorted.iter().sum::<f64>() / n as f64;
            snapshot.min_fraud_probability = sorted[0];
            snapshot.max_fraud_probability = sorted[n - 1];
            snapshot.median_fraud_probability = if n % 2 == 0 {
                (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
            } else {
                sorted[n / 2]
            };
        }

        snapshot
    }

    /// Snapshot with no recorded predictions
    pub fn empty() -> Self {
        Self {
            timestamp: Utc::now(),
            total_predictions: 0,
            blocked_count: 0,
            approved_count: 0,
            block_rate: 0.0,
            avg_fraud_probability: 0.0,
            min_fraud_probability: 0.0,
            max_fraud_probability: 0.0,
            median_fraud_probability: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_probabilities() {
        let probs = [0.1, 0.5, 0.2, 0.9];
        let snapshot = PerformanceSnapshot::from_probabilities(&probs, 0.29);

        assert_eq!(snapshot.total_predictions, 4);
        assert_eq!(snapshot.blocked_count, 2);
        assert_eq!(snapshot.approved_count, 2);
        assert_eq!(snapshot.block_rate, 0.5);
        assert_eq!(snapshot.min_fraud_probability, 0.1);
        assert_eq!(snapshot.max_fraud_probability, 0.9);
        assert!((snapshot.median_fraud_probability - 0.35).abs() < 1e-12);
        assert!((snapshot.avg_fraud_probability - 0.425).abs() < 1e-12);
    }

    #[test]
    fn test_empty_snapshot_has_zero_block_rate() {
        let snapshot = PerformanceSnapshot::from_probabilities(&[], 0.5);
        assert_eq!(snapshot.total_predictions, 0);
        assert_eq!(snapshot.block_rate, 0.0);
    }

    #[test]
    fn test_minimal_document_parses() {
        let json = r#"{
            "timestamp": "2026-01-05T10:00:00Z",
            "total_predictions": 500,
            "blocked_count": 40,
            "approved_count": 460,
            "block_rate": 0.08
        }"#;
        let snapshot: PerformanceSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.total_predictions, 500);
        assert_eq!(snapshot.block_rate, 0.08);
    }
}
