//! Cost-sensitive evaluation structures

use serde::{Deserialize, Serialize};

/// Per-deployment business costs. Correct approvals and correct blocks cost nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BusinessCosts {
    /// Cost of a missed fraud
    pub cost_false_negative: f64,
    /// Cost of a false alarm
    pub cost_false_positive: f64,
}

impl Default for BusinessCosts {
    fn default() -> Self {
        Self {
            cost_false_negative: 100.0,
            cost_false_positive: 5.0,
        }
    }
}

/// Confusion counts at a single decision threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    #[serde(rename = "tn")]
    pub true_negatives: u64,
    #[serde(rename = "fp")]
    pub false_positives: u64,
    #[serde(rename = "fn")]
    pub false_negatives: u64,
    #[serde(rename = "tp")]
    pub true_positives: u64,
}

impl ConfusionCounts {
    /// Classify every transaction as fraud when `probability >= threshold`.
    /// Labels are assumed already validated as 0/1.
    pub fn at_threshold(labels: &[u8], probabilities: &[f64], threshold: f64) -> Self {
        let mut counts = Self::default();
        for (&label, &p) in labels.iter().zip(probabilities) {
            match (label == 1, p >= threshold) {
                (true, true) => counts.true_positives += 1,
                (false, true) => counts.false_positives += 1,
                (true, false) => counts.false_negatives += 1,
                (false, false) => counts.true_negatives += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u64 {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    pub fn cost_false_negatives(&self, costs: &BusinessCosts) -> f64 {
        self.false_negatives as f64 * costs.cost_false_negative
    }

    pub fn cost_false_positives(&self, costs: &BusinessCosts) -> f64 {
        self.false_positives as f64 * costs.cost_false_positive
    }

    /// `fn * cost_fn + fp * cost_fp`
    pub fn total_cost(&self, costs: &BusinessCosts) -> f64 {
        self.cost_false_negatives(costs) + self.cost_false_positives(costs)
    }

    /// tp / (tp + fp), `None` when nothing was predicted positive
    pub fn precision(&self) -> Option<f64> {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// tp / (tp + fn), `None` when there are no actual frauds
    pub fn recall(&self) -> Option<f64> {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }
}

fn ratio(num: u64, den: u64) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

/// One point of the cost curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostCurvePoint {
    pub threshold: f64,
    #[serde(flatten)]
    pub confusion: ConfusionCounts,
    pub total_cost: f64,
}

/// Recommended operating point derived from the cost curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRecommendation {
    pub optimal_threshold: f64,
    pub minimum_cost: f64,
    pub baseline_threshold: f64,
    pub baseline_cost: f64,
    /// `baseline_cost - minimum_cost`
    pub cost_savings: f64,
    /// Confusion counts at the optimal threshold
    pub confusion: ConfusionCounts,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

/// Persisted cost metrics document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostMetricsDocument {
    pub optimal_threshold: f64,
    pub optimal_cost: f64,
    /// `None` when the batch has no frauds
    pub cost_per_fraud: Option<f64>,
    pub savings_vs_default: f64,
    /// `None` when the baseline cost is zero
    pub savings_percent: Option<f64>,
    pub confusion_matrix: ConfusionCounts,
    pub recall: Option<f64>,
    pub precision: Option<f64>,
    /// `None` when only one class is present
    pub roc_auc: Option<f64>,
    pub cost_fn_total: f64,
    pub cost_fp_total: f64,
    pub business_costs: BusinessCosts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_at_threshold() {
        let labels = [0, 0, 1, 1, 0];
        let probs = [0.1, 0.6, 0.7, 0.4, 0.5];

        let c = ConfusionCounts::at_threshold(&labels, &probs, 0.5);

        assert_eq!(c.true_positives, 1);
        assert_eq!(c.false_positives, 2);
        assert_eq!(c.false_negatives, 1);
        assert_eq!(c.true_negatives, 1);
        assert_eq!(c.total(), 5);
    }

    #[test]
    fn test_cost_ignores_correct_decisions() {
        let costs = BusinessCosts::default();
        let c = ConfusionCounts {
            true_negatives: 1000,
            false_positives: 4,
            false_negatives: 2,
            true_positives: 50,
        };
        assert_eq!(c.total_cost(&costs), 2.0 * 100.0 + 4.0 * 5.0);
    }

    #[test]
    fn test_undefined_metrics_are_none() {
        let no_positive_predictions = ConfusionCounts {
            true_negatives: 10,
            false_negatives: 2,
            ..Default::default()
        };
        assert_eq!(no_positive_predictions.precision(), None);
        assert_eq!(no_positive_predictions.recall(), Some(0.0));

        let no_frauds = ConfusionCounts {
            true_negatives: 10,
            false_positives: 1,
            ..Default::default()
        };
        assert_eq!(no_frauds.recall(), None);
        assert_eq!(no_frauds.precision(), Some(0.0));
    }

    #[test]
    fn test_confusion_serializes_short_names() {
        let c = ConfusionCounts {
            true_negatives: 1,
            false_positives: 2,
            false_negatives: 3,
            true_positives: 4,
        };
        let json = serde_json::to_value(c).unwrap();
        assert_eq!(json["tn"], 1);
        assert_eq!(json["fp"], 2);
        assert_eq!(json["fn"], 3);
        assert_eq!(json["tp"], 4);
    }

    #[test]
    fn test_undefined_precision_serializes_as_null() {
        let point = ThresholdRecommendation {
            optimal_threshold: 0.99,
            minimum_cost: 200.0,
            baseline_threshold: 0.5,
            baseline_cost: 200.0,
            cost_savings: 0.0,
            confusion: ConfusionCounts::default(),
            precision: None,
            recall: Some(0.0),
        };
        let json = serde_json::to_value(&point).unwrap();
        assert!(json["precision"].is_null());
        assert_eq!(json["recall"], 0.0);
    }
}
