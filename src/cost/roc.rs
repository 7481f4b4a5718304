//! Area under the ROC curve

/// ROC AUC via the Mann-Whitney rank sum, with tied scores sharing their
/// average rank. `None` when either class is absent.
pub fn roc_auc(labels: &[u8], probabilities: &[f64]) -> Option<f64> {
    let len = labels.len().min(probabilities.len());
    let positives = labels[..len].iter().filter(|&&l| l == 1).count();
    let negatives = len - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| probabilities[a].total_cmp(&probabilities[b]));

    let mut ranks = vec![0.0; order.len()];
    let mut start = 0;
    while start < order.len() {
        let value = probabilities[order[start]];
        let mut end = start + 1;
        while end < order.len() && probabilities[order[end]] == value {
            end += 1;
        }
        // ranks are 1-based; the tied run start..end shares the mean
        let average = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = average;
        }
        start = end;
    }

    let positive_rank_sum: f64 = ranks
        .iter()
        .zip(labels)
        .filter(|(_, &l)| l == 1)
        .map(|(r, _)| r)
        .sum();
    let (p, n) = (positives as f64, negatives as f64);
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}
