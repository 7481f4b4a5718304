//! Cost-sensitive threshold optimization

pub mod optimizer;
pub mod roc;

pub use optimizer::{optimize_threshold, threshold_grid};
pub use roc::roc_auc;

use crate::config::CostConfig;
use crate::error::Result;
use crate::types::cost::{BusinessCosts, CostCurvePoint, CostMetricsDocument, ThresholdRecommendation};

impl From<&CostConfig> for BusinessCosts {
    fn from(config: &CostConfig) -> Self {
        Self {
            cost_false_negative: config.cost_false_negative,
            cost_false_positive: config.cost_false_positive,
        }
    }
}

/// Full outcome of a cost analysis run
#[derive(Debug, Clone)]
pub struct CostReport {
    pub curve: Vec<CostCurvePoint>,
    pub recommendation: ThresholdRecommendation,
    pub document: CostMetricsDocument,
}

impl CostReport {
    /// Optimize over the configured grid and derive the persisted document
    pub fn analyze(labels: &[u8], probabilities: &[f64], config: &CostConfig) -> Result<Self> {
        let costs = BusinessCosts::from(config);
        let grid = threshold_grid(config.grid_step)?;
        let (curve, recommendation) =
            optimize_threshold(labels, probabilities, &costs, &grid, config.baseline_threshold)?;

        let fraud_count = labels.iter().filter(|&&l| l == 1).count();
        let document = Self::from_recommendation(
            &recommendation,
            &costs,
            fraud_count,
            roc_auc(labels, probabilities),
        );

        Ok(Self {
            curve,
            recommendation,
            document,
        })
    }

    /// Cost metrics document for a recommendation
    pub fn from_recommendation(
        recommendation: &ThresholdRecommendation,
        costs: &BusinessCosts,
        fraud_count: usize,
        roc_auc: Option<f64>,
    ) -> CostMetricsDocument {
        let confusion = recommendation.confusion;
        CostMetricsDocument {
            optimal_threshold: recommendation.optimal_threshold,
            optimal_cost: recommendation.minimum_cost,
            cost_per_fraud: (fraud_count > 0)
                .then(|| recommendation.minimum_cost / fraud_count as f64),
            savings_vs_default: recommendation.cost_savings,
            savings_percent: (recommendation.baseline_cost > 0.0)
                .then(|| 100.0 * recommendation.cost_savings / recommendation.baseline_cost),
            confusion_matrix: confusion,
            recall: recommendation.recall,
            precision: recommendation.precision,
            roc_auc,
            cost_fn_total: confusion.cost_false_negatives(costs),
            cost_fp_total: confusion.cost_false_positives(costs),
            business_costs: *costs,
        }
    }
}
