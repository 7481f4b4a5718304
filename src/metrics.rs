//! Live prediction metrics for the deployed fraud model.

use crate::alerting::AlertEvaluator;
use crate::reports::{ReportStore, PERFORMANCE_METRICS_FILE};
use crate::types::performance::PerformanceSnapshot;
use crate::types::prediction::{Decision, PredictionEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Probabilities kept for the distribution statistics
const PROBABILITY_WINDOW: usize = 10_000;

/// Counters for predictions observed on the live stream
pub struct PerformanceMetrics {
    /// Total predictions observed
    pub total_predictions: AtomicU64,
    /// Predictions at or above the decision threshold
    pub blocked_count: AtomicU64,
    /// Messages that could not be decoded
    pub malformed_events: AtomicU64,
    /// Recent fraud probabilities
    probabilities: RwLock<Vec<f64>>,
    /// Probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    decision_threshold: f64,
    start_time: Instant,
}

impl PerformanceMetrics {
    pub fn new(decision_threshold: f64) -> Self {
        Self {
            total_predictions: AtomicU64::new(0),
            blocked_count: AtomicU64::new(0),
            malformed_events: AtomicU64::new(0),
            probabilities: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            decision_threshold,
            start_time: Instant::now(),
        }
    }

    pub fn decision_threshold(&self) -> f64 {
        self.decision_threshold
    }

    /// Record one scored prediction.
    ///
    /// A probability outside [0, 1] counts as a malformed event and leaves
    /// the prediction counters untouched. Returns whether it was recorded.
    pub fn record_prediction(&self, event: &PredictionEvent) -> bool {
        let p = event.fraud_probability;
        if !(0.0..=1.0).contains(&p) {
            warn!(
                transaction_id = %event.transaction_id,
                fraud_probability = p,
                "Probability out of range"
            );
            self.record_malformed();
            return false;
        }

        self.total_predictions.fetch_add(1, Ordering::Relaxed);

        if event.decision_at(self.decision_threshold) == Decision::Block {
            self.blocked_count.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut probs) = self.probabilities.write() {
            probs.push(p);
            if probs.len() > PROBABILITY_WINDOW {
                probs.drain(0..PROBABILITY_WINDOW / 2);
            }
        }

        let bucket = (p * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
        true
    }

    pub fn record_malformed(&self) {
        self.malformed_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Current performance document.
    ///
    /// Counts cover every prediction; the probability statistics cover the
    /// most recent window.
    pub fn snapshot(&self) -> PerformanceSnapshot {
        let probs = self
            .probabilities
            .read()
            .map(|p| p.clone())
            .unwrap_or_default();

        let mut snapshot = PerformanceSnapshot::from_probabilities(&probs, self.decision_threshold);
        let total = self.total_predictions.load(Ordering::Relaxed);
        let blocked = self.blocked_count.load(Ordering::Relaxed);
        snapshot.total_predictions = total;
        snapshot.blocked_count = blocked;
        snapshot.approved_count = total.saturating_sub(blocked);
        snapshot.block_rate = if total > 0 {
            blocked as f64 / total as f64
        } else {
            0.0
        };
        snapshot
    }

    /// Predictions per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_predictions.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let throughput = self.get_throughput();
        let malformed = self.malformed_events.load(Ordering::Relaxed);
        let score_dist = self.get_score_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            FRAUD MODEL MONITOR - PREDICTION SUMMARY          ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions:  {:>8}  │  Throughput: {:>8.1} pred/s        ║",
            snapshot.total_predictions, throughput
        );
        info!(
            "║ Blocked:      {:>8}  │  Block Rate: {:>7.1}%              ║",
            snapshot.blocked_count,
            snapshot.block_rate * 100.0
        );
        info!(
            "║ Approved:     {:>8}  │  Malformed:  {:>8}               ║",
            snapshot.approved_count, malformed
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Fraud Probability: avg={:.3} median={:.3} min={:.3} max={:.3} ║",
            snapshot.avg_fraud_probability,
            snapshot.median_fraud_probability,
            snapshot.min_fraud_probability,
            snapshot.max_fraud_probability
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Probability Distribution:                                    ║");
        let total: u64 = score_dist.iter().sum();
        for (i, &count) in score_dist.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

/// Performance document for a batch-scored dataset, persisted like the live one
pub fn record_batch(
    store: &ReportStore,
    probabilities: &[f64],
    decision_threshold: f64,
) -> crate::error::Result<PerformanceSnapshot> {
    let snapshot = PerformanceSnapshot::from_probabilities(probabilities, decision_threshold);
    store.write_json(PERFORMANCE_METRICS_FILE, &snapshot)?;
    info!(
        total = snapshot.total_predictions,
        blocked = snapshot.blocked_count,
        approved = snapshot.approved_count,
        block_rate = format!("{:.2}%", snapshot.block_rate * 100.0),
        "Batch performance recorded"
    );
    Ok(snapshot)
}

/// Periodically summarizes the live metrics, persists them and runs the
/// performance alert rules
pub struct MetricsReporter {
    metrics: Arc<PerformanceMetrics>,
    evaluator: AlertEvaluator,
    store: ReportStore,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(
        metrics: Arc<PerformanceMetrics>,
        evaluator: AlertEvaluator,
        store: ReportStore,
        interval_secs: u64,
    ) -> Self {
        Self {
            metrics,
            evaluator,
            store,
            interval_secs,
        }
    }

    /// One reporting round
    pub fn report_once(&self) -> crate::error::Result<PerformanceSnapshot> {
        self.metrics.print_summary();
        let snapshot = self.metrics.snapshot();
        self.store.write_json(PERFORMANCE_METRICS_FILE, &snapshot)?;
        self.evaluator.evaluate(None, Some(&snapshot))?;
        Ok(snapshot)
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // the first tick completes immediately, before any prediction could arrive
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = self.report_once() {
                error!(error = %e, "Metrics report failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::{AlertLog, MemoryAlertLog};
    use crate::config::AlertingConfig;
    use crate::types::alert::AlertType;

    fn event(p: f64) -> PredictionEvent {
        PredictionEvent::new("T1".to_string(), p)
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = PerformanceMetrics::new(0.29);

        metrics.record_prediction(&event(0.1));
        metrics.record_prediction(&event(0.29));
        metrics.record_prediction(&event(0.95));
        metrics.record_prediction(&event(0.2));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_predictions, 4);
        assert_eq!(snapshot.blocked_count, 2);
        assert_eq!(snapshot.approved_count, 2);
        assert_eq!(snapshot.block_rate, 0.5);
        assert_eq!(snapshot.max_fraud_probability, 0.95);
        assert_eq!(metrics.get_score_distribution().iter().sum::<u64>(), 4);
    }

    #[test]
    fn test_out_of_range_probability_is_malformed() {
        let metrics = PerformanceMetrics::new(0.5);

        assert!(metrics.record_prediction(&event(0.7)));
        assert!(!metrics.record_prediction(&event(1.5)));
        assert!(!metrics.record_prediction(&event(-0.1)));
        assert!(!metrics.record_prediction(&event(f64::NAN)));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_predictions, 1);
        assert_eq!(snapshot.blocked_count, 1);
        assert_eq!(snapshot.max_fraud_probability, 0.7);
        assert_eq!(snapshot.min_fraud_probability, 0.7);
        assert_eq!(metrics.malformed_events.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.get_score_distribution().iter().sum::<u64>(), 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let metrics = PerformanceMetrics::new(0.5);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_predictions, 0);
        assert_eq!(snapshot.block_rate, 0.0);
    }

    #[test]
    fn test_record_batch_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("reports"));
        let probs = [0.05, 0.1, 0.3, 0.29, 0.9, 0.2, 0.01, 0.02];

        let snapshot = record_batch(&store, &probs, 0.29).unwrap();
        assert_eq!(snapshot.total_predictions, 8);
        assert_eq!(snapshot.blocked_count, 3);
        assert_eq!(snapshot.approved_count, 5);

        let persisted: PerformanceSnapshot =
            store.read_json(PERFORMANCE_METRICS_FILE).unwrap().unwrap();
        assert_eq!(persisted, snapshot);
        assert_eq!(persisted.block_rate, 0.375);
    }

    #[test]
    fn test_record_empty_batch_raises_system_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let log = Arc::new(MemoryAlertLog::new());

        let snapshot = record_batch(&store, &[], 0.5).unwrap();
        let alerts = AlertEvaluator::new(AlertingConfig::default(), log)
            .evaluate(None, Some(&snapshot))
            .unwrap();

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::SystemStatus);
    }

    #[test]
    fn test_report_once_writes_and_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let log = Arc::new(MemoryAlertLog::new());
        let metrics = Arc::new(PerformanceMetrics::new(0.5));
        for p in [0.9, 0.8, 0.1] {
            metrics.record_prediction(&event(p));
        }

        let reporter = MetricsReporter::new(
            metrics,
            AlertEvaluator::new(AlertingConfig::default(), log.clone()),
            store.clone(),
            30,
        );
        let snapshot = reporter.report_once().unwrap();

        let persisted: PerformanceSnapshot =
            store.read_json(PERFORMANCE_METRICS_FILE).unwrap().unwrap();
        assert_eq!(persisted.total_predictions, 3);
        assert_eq!(persisted.block_rate, snapshot.block_rate);

        let alerts = log.entries().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::HighBlockRate);
    }
}
