//! Cost-curve threshold search

use crate::error::{MonitorError, Result};
use crate::types::cost::{BusinessCosts, ConfusionCounts, CostCurvePoint, ThresholdRecommendation};
use rayon::prelude::*;
use tracing::{debug, info};

/// Grid values are rounded to this precision so they compare exactly
const GRID_PRECISION: f64 = 1e10;

/// Ascending candidate thresholds `step, 2*step, ...` strictly below 1.
///
/// The default step of 0.01 gives the 99 points 0.01..=0.99.
pub fn threshold_grid(step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0 && step < 1.0) {
        return Err(MonitorError::invalid_config(format!(
            "threshold grid step must be in (0, 1), got {step}"
        )));
    }
    let grid = (1u32..)
        .map(|i| (f64::from(i) * step * GRID_PRECISION).round() / GRID_PRECISION)
        .take_while(|&t| t < 1.0)
        .collect();
    Ok(grid)
}

/// Reject anything the cost curve cannot be computed from
fn validate(labels: &[u8], probabilities: &[f64]) -> Result<()> {
    if labels.is_empty() {
        return Err(MonitorError::invalid_labels("no labelled predictions"));
    }
    if labels.len() != probabilities.len() {
        return Err(MonitorError::invalid_labels(format!(
            "{} labels but {} probabilities",
            labels.len(),
            probabilities.len()
        )));
    }
    if let Some(bad) = labels.iter().find(|&&l| l > 1) {
        return Err(MonitorError::invalid_labels(format!(
            "labels must be 0 or 1, found {bad}"
        )));
    }
    if let Some(bad) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(MonitorError::invalid_labels(format!(
            "probabilities must be in [0, 1], found {bad}"
        )));
    }
    Ok(())
}

/// Costs must be finite and non-negative or every curve point is meaningless
fn validate_costs(costs: &BusinessCosts) -> Result<()> {
    for (name, cost) in [
        ("cost_false_negative", costs.cost_false_negative),
        ("cost_false_positive", costs.cost_false_positive),
    ] {
        if !(cost.is_finite() && cost >= 0.0) {
            return Err(MonitorError::invalid_config(format!(
                "{name} must be finite and non-negative, got {cost}"
            )));
        }
    }
    Ok(())
}

/// Sweep `grid` and pick the threshold with the lowest business cost.
///
/// A transaction is predicted fraud when `probability >= threshold`. Ties on
/// cost resolve to the lowest threshold. The baseline is evaluated with the
/// same rule, whether or not it lies on the grid.
pub fn optimize_threshold(
    labels: &[u8],
    probabilities: &[f64],
    costs: &BusinessCosts,
    grid: &[f64],
    baseline_threshold: f64,
) -> Result<(Vec<CostCurvePoint>, ThresholdRecommendation)> {
    validate(labels, probabilities)?;
    validate_costs(costs)?;
    if grid.is_empty() {
        return Err(MonitorError::invalid_config("empty threshold grid"));
    }

    let curve: Vec<CostCurvePoint> = grid
        .par_iter()
        .map(|&threshold| {
            let confusion = ConfusionCounts::at_threshold(labels, probabilities, threshold);
            CostCurvePoint {
                threshold,
                confusion,
                total_cost: confusion.total_cost(costs),
            }
        })
        .collect();

    // strict `<` keeps the first (lowest) threshold among equal costs
    let mut best = &curve[0];
    for point in &curve[1..] {
        if point.total_cost < best.total_cost {
            best = point;
        }
    }

    let baseline = ConfusionCounts::at_threshold(labels, probabilities, baseline_threshold);
    let baseline_cost = baseline.total_cost(costs);

    debug!(points = curve.len(), "Cost curve computed");
    info!(
        optimal_threshold = best.threshold,
        minimum_cost = best.total_cost,
        baseline_threshold = baseline_threshold,
        baseline_cost = baseline_cost,
        "Threshold optimized"
    );

    let recommendation = ThresholdRecommendation {
        optimal_threshold: best.threshold,
        minimum_cost: best.total_cost,
        baseline_threshold,
        baseline_cost,
        cost_savings: baseline_cost - best.total_cost,
        confusion: best.confusion,
        precision: best.confusion.precision(),
        recall: best.confusion.recall(),
    };

    Ok((curve, recommendation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn default_grid() -> Vec<f64> {
        threshold_grid(0.01).unwrap()
    }

    #[test]
    fn test_default_grid() {
        let grid = default_grid();
        assert_eq!(grid.len(), 99);
        assert_eq!(grid[0], 0.01);
        assert_eq!(grid[98], 0.99);
        assert_eq!(grid[29], 0.3);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_grid_rejects_bad_step() {
        assert!(threshold_grid(0.0).is_err());
        assert!(threshold_grid(1.0).is_err());
        assert!(threshold_grid(f64::NAN).is_err());
        assert_eq!(threshold_grid(0.3).unwrap(), vec![0.3, 0.6, 0.9]);
    }

    #[test]
    fn test_perfect_separation_costs_nothing() {
        let labels = [0, 0, 0, 1];
        let probs = [0.1, 0.2, 0.3, 0.9];

        let (curve, rec) =
            optimize_threshold(&labels, &probs, &BusinessCosts::default(), &default_grid(), 0.5)
                .unwrap();

        assert_eq!(curve.len(), 99);
        assert_eq!(rec.minimum_cost, 0.0);
        // first threshold that rejects 0.3
        assert_eq!(rec.optimal_threshold, 0.31);
        assert_eq!(rec.precision, Some(1.0));
        assert_eq!(rec.recall, Some(1.0));
        assert_eq!(rec.baseline_cost, 0.0);
        assert_eq!(rec.cost_savings, 0.0);
    }

    #[test]
    fn test_ties_pick_lowest_threshold() {
        let labels = [0, 1];
        let probs = [0.2, 0.8];

        let (curve, rec) =
            optimize_threshold(&labels, &probs, &BusinessCosts::default(), &default_grid(), 0.5)
                .unwrap();

        // every threshold in (0.2, 0.8] costs 0
        let zero_cost: Vec<f64> = curve
            .iter()
            .filter(|p| p.total_cost == 0.0)
            .map(|p| p.threshold)
            .collect();
        assert!(zero_cost.len() > 1);
        assert_eq!(rec.optimal_threshold, zero_cost[0]);
        assert_eq!(rec.optimal_threshold, 0.21);
    }

    #[test]
    fn test_curve_keeps_grid_order() {
        let labels = [0, 1, 0, 1, 0];
        let probs = [0.05, 0.6, 0.4, 0.95, 0.7];
        let grid = default_grid();

        let (curve, _) =
            optimize_threshold(&labels, &probs, &BusinessCosts::default(), &grid, 0.5).unwrap();

        let thresholds: Vec<f64> = curve.iter().map(|p| p.threshold).collect();
        assert_eq!(thresholds, grid);
    }

    #[test]
    fn test_baseline_off_grid() {
        let labels = [0, 1, 1];
        let probs = [0.4, 0.45, 0.9];
        let grid = vec![0.5, 0.6];

        let (_, rec) =
            optimize_threshold(&labels, &probs, &BusinessCosts::default(), &grid, 0.42).unwrap();

        // at 0.42 only the 0.4 legitimate is approved: no errors
        assert_eq!(rec.baseline_cost, 0.0);
        // on the grid 0.45 is always missed
        assert_eq!(rec.minimum_cost, 100.0);
        assert_abs_diff_eq!(rec.cost_savings, -100.0);
    }

    #[test]
    fn test_no_fraud_leaves_recall_undefined() {
        let labels = [0, 0, 0];
        let probs = [0.1, 0.5, 0.995];

        let (_, rec) =
            optimize_threshold(&labels, &probs, &BusinessCosts::default(), &default_grid(), 0.5)
                .unwrap();

        assert_eq!(rec.recall, None);
        assert_eq!(rec.minimum_cost, 5.0);
        assert_eq!(rec.precision, Some(0.0));
    }

    #[test]
    fn test_invalid_inputs() {
        let grid = default_grid();
        let costs = BusinessCosts::default();

        let cases: [(&[u8], &[f64]); 5] = [
            (&[], &[]),
            (&[0, 1], &[0.5]),
            (&[0, 2], &[0.1, 0.9]),
            (&[0, 1], &[0.1, 1.5]),
            (&[0, 1], &[0.1, f64::NAN]),
        ];
        for (labels, probs) in cases {
            let err = optimize_threshold(labels, probs, &costs, &grid, 0.5).unwrap_err();
            assert!(matches!(err, MonitorError::InvalidLabels { .. }), "{err}");
        }
    }

    #[test]
    fn test_rejects_unusable_costs() {
        let labels = [0, 1];
        let probs = [0.2, 0.8];
        let grid = default_grid();

        let bad = [
            (f64::NAN, 5.0),
            (100.0, f64::NAN),
            (f64::INFINITY, 5.0),
            (100.0, -1.0),
            (-0.5, 5.0),
        ];
        for (cost_fn, cost_fp) in bad {
            let costs = BusinessCosts {
                cost_false_negative: cost_fn,
                cost_false_positive: cost_fp,
            };
            let err = optimize_threshold(&labels, &probs, &costs, &grid, 0.5).unwrap_err();
            assert!(matches!(err, MonitorError::InvalidConfig { .. }), "{err}");
        }

        // zero costs are allowed
        let free = BusinessCosts {
            cost_false_negative: 0.0,
            cost_false_positive: 0.0,
        };
        let (_, rec) = optimize_threshold(&labels, &probs, &free, &grid, 0.5).unwrap();
        assert_eq!(rec.minimum_cost, 0.0);
        assert_eq!(rec.optimal_threshold, 0.01);
    }

    proptest! {
        #[test]
        fn prop_optimum_is_minimal(
            rows in prop::collection::vec((0u8..=1, 0.0f64..=1.0), 1..60),
            cost_fn in 0.0f64..500.0,
            cost_fp in 0.0f64..50.0,
        ) {
            let (labels, probs): (Vec<u8>, Vec<f64>) = rows.into_iter().unzip();
            let costs = BusinessCosts { cost_false_negative: cost_fn, cost_false_positive: cost_fp };
            let grid = default_grid();

            let (curve, rec) = optimize_threshold(&labels, &probs, &costs, &grid, 0.5).unwrap();

            for point in &curve {
                prop_assert!(rec.minimum_cost <= point.total_cost);
                if point.total_cost == rec.minimum_cost {
                    prop_assert!(rec.optimal_threshold <= point.threshold);
                }
            }
        }
    }
}
