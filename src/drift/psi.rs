//! Population Stability Index over reference-quantile bins.
//!
//! PSI = Σ (ref% - cur%) * ln(ref% / cur%)
//!
//! Bin edges come from the reference sample only, which makes the index
//! asymmetric: swapping the two windows generally changes the value.

use super::stats::{quantile_sorted, sorted};

/// Floor applied to empty-bin proportions so the log-ratio stays finite
pub const PROPORTION_EPSILON: f64 = 1e-6;

/// `buckets + 1` quantile cut points over the reference sample, with
/// adjacent duplicates removed. The result is strictly increasing.
pub fn quantile_edges(reference: &[f64], buckets: usize) -> Vec<f64> {
    if reference.is_empty() || buckets == 0 {
        return Vec::new();
    }
    let sorted = sorted(reference);
    let mut edges: Vec<f64> = Vec::with_capacity(buckets + 1);
    for i in 0..=buckets {
        let cut = quantile_sorted(&sorted, i as f64 / buckets as f64);
        if edges.last().map_or(true, |&last| cut > last) {
            edges.push(cut);
        }
    }
    edges
}

/// Bin counts over `edges`. Bins are `[e_i, e_{i+1})` except the last,
/// which also includes the top edge. Values outside the edges are dropped.
pub fn bin_counts(sample: &[f64], edges: &[f64]) -> Vec<usize> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let bins = edges.len() - 1;
    let (low, high) = (edges[0], edges[bins]);
    let mut counts = vec![0usize; bins];
    for &value in sample {
        if !(low..=high).contains(&value) {
            continue;
        }
        // first edge strictly greater than value, minus one
        let idx = edges.partition_point(|&e| e <= value).saturating_sub(1);
        counts[idx.min(bins - 1)] += 1;
    }
    counts
}

/// Bin counts as proportions of the whole sample, floored at [`PROPORTION_EPSILON`].
///
/// The denominator is the full sample length, not the in-range count, so
/// values that fall outside the reference edges still lower every bin and
/// a shifted window registers as drift.
pub fn bin_proportions(sample: &[f64], edges: &[f64]) -> Vec<f64> {
    let total = sample.len() as f64;
    bin_counts(sample, edges)
        .into_iter()
        .map(|count| {
            let p = if total > 0.0 { count as f64 / total } else { 0.0 };
            if p == 0.0 {
                PROPORTION_EPSILON
            } else {
                p
            }
        })
        .collect()
}

/// Divergence between two aligned proportion vectors
pub fn psi_from_proportions(reference: &[f64], current: &[f64]) -> f64 {
    reference
        .iter()
        .zip(current)
        .map(|(&r, &c)| (r - c) * (r / c).ln())
        .sum()
}

/// PSI of `current` against `reference`.
///
/// Returns `None` when the reference has fewer than two distinct cut points
/// (near-constant feature) and the index is not meaningful. Both samples
/// must be non-empty.
pub fn population_stability_index(
    reference: &[f64],
    current: &[f64],
    buckets: usize,
) -> Option<f64> {
    let edges = quantile_edges(reference, buckets);
    if edges.len() < 2 {
        return None;
    }
    let ref_pct = bin_proportions(reference, &edges);
    let cur_pct = bin_proportions(current, &edges);
    Some(psi_from_proportions(&ref_pct, &cur_pct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn one_to_hundred() -> Vec<f64> {
        (1..=100).map(f64::from).collect()
    }

    #[test]
    fn test_edges_strictly_increasing_and_deduplicated() {
        let reference = [1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 10.0];
        let edges = quantile_edges(&reference, 10);

        assert!(edges.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(edges.first(), Some(&1.0));
        assert_eq!(edges.last(), Some(&10.0));
    }

    #[test]
    fn test_bin_counts_last_bin_closed() {
        let edges = [0.0, 1.0, 2.0];
        let counts = bin_counts(&[0.0, 0.5, 1.0, 2.0, 2.5, -1.0], &edges);
        assert_eq!(counts, vec![2, 2]);
    }

    #[test]
    fn test_psi_identical_is_zero() {
        let x = one_to_hundred();
        let psi = population_stability_index(&x, &x, 10).unwrap();
        assert_abs_diff_eq!(psi, 0.0);
    }

    #[test]
    fn test_psi_scaled_current_exceeds_threshold() {
        let reference = one_to_hundred();
        let current: Vec<f64> = reference.iter().map(|v| v * 1.5).collect();

        let psi = population_stability_index(&reference, &current, 10).unwrap();

        assert!(psi > 0.1, "psi = {psi}");
    }

    #[test]
    fn test_psi_is_asymmetric() {
        let a = one_to_hundred();
        let b: Vec<f64> = a.iter().map(|v| v * 1.5).collect();

        let forward = population_stability_index(&a, &b, 10).unwrap();
        let backward = population_stability_index(&b, &a, 10).unwrap();

        assert!(
            (forward - backward).abs() > 1e-3,
            "PSI(a,b) = {forward}, PSI(b,a) = {backward}"
        );
    }

    #[test]
    fn test_constant_reference_is_degenerate() {
        let reference = vec![5.0; 50];
        let current: Vec<f64> = (0..50).map(f64::from).collect();
        assert_eq!(population_stability_index(&reference, &current, 10), None);
    }

    #[test]
    fn test_current_outside_reference_range_stays_finite() {
        let reference = one_to_hundred();
        let current = vec![1000.0; 20];

        let psi = population_stability_index(&reference, &current, 10).unwrap();

        assert!(psi.is_finite());
        assert!(psi > 1.0);
    }

    proptest! {
        #[test]
        fn prop_psi_non_negative(
            reference in prop::collection::vec(-1e3f64..1e3, 1..200),
            current in prop::collection::vec(-1e3f64..1e3, 1..200),
            buckets in 1usize..20,
        ) {
            if let Some(psi) = population_stability_index(&reference, &current, buckets) {
                prop_assert!(psi >= 0.0);
                prop_assert!(psi.is_finite());
            }
        }

        #[test]
        fn prop_psi_self_is_zero(sample in prop::collection::vec(-1e3f64..1e3, 2..200)) {
            if let Some(psi) = population_stability_index(&sample, &sample, 10) {
                prop_assert!(psi.abs() < 1e-12);
            }
        }
    }
}
