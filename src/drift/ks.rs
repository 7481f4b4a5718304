//! Two-sample Kolmogorov-Smirnov test.

use super::stats::sorted;
use serde::{Deserialize, Serialize};

/// Outcome of a two-sample KS test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsTest {
    /// Maximum absolute difference between the two empirical CDFs
    pub statistic: f64,
    /// Asymptotic p-value for "both samples share a distribution"
    pub p_value: f64,
}

/// Run the test on two non-empty samples
pub fn two_sample_ks(a: &[f64], b: &[f64]) -> KsTest {
    let statistic = ks_statistic(a, b);
    KsTest {
        statistic,
        p_value: ks_p_value(statistic, a.len(), b.len()),
    }
}

/// Supremum distance between the empirical CDFs of `a` and `b`.
///
/// Sorts both samples and walks them together; tied values advance both
/// sides before the distance is measured.
pub fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a = sorted(a);
    let b = sorted(b);
    let (n, m) = (a.len() as f64, b.len() as f64);

    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n - j as f64 / m).abs());
    }
    d
}

/// Asymptotic p-value of statistic `d` for sample sizes `n` and `m`.
///
/// Uses the Kolmogorov distribution with the Stephens small-sample
/// correction on the effective size `sqrt(n*m/(n+m))`.
pub fn ks_p_value(d: f64, n: usize, m: usize) -> f64 {
    if n == 0 || m == 0 {
        return 1.0;
    }
    let en = ((n * m) as f64 / (n + m) as f64).sqrt();
    kolmogorov_q((en + 0.12 + 0.11 / en) * d)
}

/// Q_KS(λ) = 2 Σ_{k≥1} (-1)^{k-1} exp(-2 k² λ²)
pub fn kolmogorov_q(lambda: f64) -> f64 {
    // series converges too slowly below this; Q is 1 to double precision anyway
    if lambda < 0.2 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=100 {
        let term = sign * (a2 * f64::from(k * k)).exp();
        sum += term;
        if term.abs() < 1e-12 * sum.abs() || term.abs() < 1e-300 {
            break;
        }
        sign = -sign;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}
