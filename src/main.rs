//! Fraud Model Monitor - Main Entry Point
//!
//! Batch drift and cost analysis over the transactions dataset, alert
//! evaluation, retraining checks, and a live monitor that consumes scored
//! predictions from NATS.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fraud_model_monitor::{
    alerting::{AlertEvaluator, AlertLog, AlertLogSummary},
    config::AppConfig,
    consumer::{handle_payload, PredictionConsumer},
    cost::CostReport,
    dataset::Dataset,
    drift::DriftDetector,
    metrics::{record_batch, MetricsReporter, PerformanceMetrics},
    models::{score_dataset, OnnxScorer},
    reports::{
        model_age_days, ReportStore, COST_METRICS_FILE, DRIFT_METRICS_FILE,
        PERFORMANCE_METRICS_FILE,
    },
    retrain::RetrainingTrigger,
    types::{DriftMetricsDocument, PerformanceSnapshot},
};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Fraud model monitoring CLI
#[derive(Debug, Parser)]
#[clap(name = "fraud-monitor", version, about = "Drift and cost monitoring for a fraud-scoring model")]
struct Cli {
    /// Configuration file path
    #[clap(short, long, default_value = "config/config.toml", global = true)]
    config: PathBuf,

    /// Log level override (trace, debug, info, warn, error)
    #[clap(long, env = "FRAUD_MONITOR_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[clap(long, env = "FRAUD_MONITOR_LOG_JSON", global = true)]
    log_json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare the reference and current windows feature by feature
    Drift,
    /// Find the cost-minimizing decision threshold
    Cost {
        /// Cost of a missed fraud
        #[clap(long = "cost-fn")]
        cost_fn: Option<f64>,

        /// Cost of a false alarm
        #[clap(long = "cost-fp")]
        cost_fp: Option<f64>,
    },
    /// Score the dataset and record block/approve counts
    Performance,
    /// Evaluate alert rules over the latest drift and performance reports
    Alerts,
    /// Decide whether the model should be retrained
    RetrainCheck,
    /// Consume live predictions from NATS
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    init_logging(
        cli.log_level.as_deref().unwrap_or(&config.logging.level),
        cli.log_json || config.logging.format == "json",
    )?;
    info!(config = %cli.config.display(), "Configuration loaded successfully");

    let store = ReportStore::new(config.paths.reports_path());

    match cli.command {
        Commands::Drift => run_drift(&config, &store),
        Commands::Cost { cost_fn, cost_fp } => run_cost(config, &store, cost_fn, cost_fp),
        Commands::Performance => run_performance(&config, &store),
        Commands::Alerts => run_alerts(&config, &store),
        Commands::RetrainCheck => run_retrain_check(&config, &store),
        Commands::Watch => run_watch(config, store).await,
    }
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fraud_model_monitor={level}").parse()?)
        .add_directive(format!("fraud_monitor={level}").parse()?);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn load_dataset(config: &AppConfig) -> Result<Dataset> {
    let path = config.paths.data_path();
    Dataset::from_csv_path(&path, &config.dataset)
        .with_context(|| format!("Failed to load dataset {}", path.display()))
}

/// The dataset's probability column, or the model's scores when it has none
fn dataset_probabilities(config: &AppConfig, dataset: &Dataset) -> Result<Vec<f64>> {
    if let Some(p) = dataset.probabilities() {
        return Ok(p.to_vec());
    }
    let model_path = config.paths.model_path();
    info!(model = %model_path.display(), "No probability column, scoring with model");
    let scorer = OnnxScorer::load(&model_path, 1)?;
    Ok(score_dataset(&scorer, dataset)?)
}

fn run_drift(config: &AppConfig, store: &ReportStore) -> Result<()> {
    let dataset = load_dataset(config)?;
    let (reference, current) = dataset.split(config.dataset.reference_fraction);
    info!(
        reference_rows = reference.len(),
        current_rows = current.len(),
        "Dataset split into reference and current windows"
    );

    let report = DriftDetector::new(config.drift.clone()).detect(&reference, &current);
    let document = report.to_document();
    store.write_json(DRIFT_METRICS_FILE, &document)?;

    let mut ranked: Vec<_> = document.feature_details.values().collect();
    ranked.sort_by(|a, b| b.psi.total_cmp(&a.psi));
    for result in ranked.iter().take(5) {
        info!(
            feature = %result.feature,
            psi = format!("{:.4}", result.psi),
            ks_pvalue = format!("{:.4}", result.ks_pvalue),
            drift = result.drift_detected,
            mean_change = format!("{:.2}", result.mean_change()),
            "Top PSI feature"
        );
    }

    info!(
        checked = document.total_features_checked,
        drifted = document.drift_count,
        drift_percentage = format!("{:.1}%", document.drift_percentage),
        "Drift analysis complete"
    );
    Ok(())
}

fn run_cost(
    mut config: AppConfig,
    store: &ReportStore,
    cost_fn: Option<f64>,
    cost_fp: Option<f64>,
) -> Result<()> {
    if let Some(cost) = cost_fn {
        config.cost.cost_false_negative = cost;
    }
    if let Some(cost) = cost_fp {
        config.cost.cost_false_positive = cost;
    }
    config.validate()?;

    let dataset = load_dataset(&config)?;
    let labels = dataset.labels()?;

    let probabilities = dataset_probabilities(&config, &dataset)?;

    let report = CostReport::analyze(labels, &probabilities, &config.cost)?;
    store.write_json(COST_METRICS_FILE, &report.document)?;

    let doc = &report.document;
    let confusion = doc.confusion_matrix;
    info!(
        cost_fn = doc.business_costs.cost_false_negative,
        cost_fp = doc.business_costs.cost_false_positive,
        "Business costs"
    );
    info!(
        optimal_threshold = doc.optimal_threshold,
        optimal_cost = doc.optimal_cost,
        baseline_threshold = report.recommendation.baseline_threshold,
        baseline_cost = report.recommendation.baseline_cost,
        savings = doc.savings_vs_default,
        savings_percent = ?doc.savings_percent,
        "Threshold recommendation"
    );
    info!(
        tp = confusion.true_positives,
        fp = confusion.false_positives,
        fn_ = confusion.false_negatives,
        tn = confusion.true_negatives,
        precision = ?doc.precision,
        recall = ?doc.recall,
        roc_auc = ?doc.roc_auc,
        "Confusion at optimal threshold"
    );
    Ok(())
}

fn run_performance(config: &AppConfig, store: &ReportStore) -> Result<()> {
    let dataset = load_dataset(config)?;
    let probabilities = dataset_probabilities(config, &dataset)?;
    let snapshot = record_batch(store, &probabilities, config.live.decision_threshold)?;

    info!(
        threshold = config.live.decision_threshold,
        avg = format!("{:.4}", snapshot.avg_fraud_probability),
        median = format!("{:.4}", snapshot.median_fraud_probability),
        "Fraud probability distribution"
    );
    Ok(())
}

fn run_alerts(config: &AppConfig, store: &ReportStore) -> Result<()> {
    let drift: Option<DriftMetricsDocument> = store.read_json(DRIFT_METRICS_FILE)?;
    let performance: Option<PerformanceSnapshot> = store.read_json(PERFORMANCE_METRICS_FILE)?;
    if drift.is_none() && performance.is_none() {
        warn!("No drift or performance report found, nothing to evaluate");
    }

    let log: Arc<dyn AlertLog> = Arc::new(store.alert_log(&config.paths.alerts_file)?);
    let evaluator = AlertEvaluator::new(config.alerting.clone(), log.clone());
    let summary = drift.as_ref().map(DriftMetricsDocument::summary);
    let fired = evaluator.evaluate(summary.as_ref(), performance.as_ref())?;

    let history = AlertLogSummary::from_entries(&log.entries()?, 10);
    info!(
        fired = fired.len(),
        total = history.total,
        critical = history.critical,
        warning = history.warning,
        info = history.info,
        "Alert summary"
    );
    for alert in &history.recent {
        info!(
            "[{}] {}: {} ({})",
            alert.severity,
            alert.alert_type,
            alert.message,
            alert.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

fn run_retrain_check(config: &AppConfig, store: &ReportStore) -> Result<()> {
    let drift: Option<DriftMetricsDocument> = store.read_json(DRIFT_METRICS_FILE)?;
    let age = model_age_days(config.paths.model_path())?;

    let decision = RetrainingTrigger::new(config.retraining.clone()).check(drift.as_ref(), age);

    if decision.needed {
        warn!("Retraining recommended");
        for reason in &decision.reasons {
            warn!("  - {}", reason);
        }
    } else {
        info!(model_age_days = ?age, "Model is current, no retraining needed");
    }
    Ok(())
}

async fn run_watch(config: AppConfig, store: ReportStore) -> Result<()> {
    let live = config.live.clone();
    let metrics = Arc::new(PerformanceMetrics::new(live.decision_threshold));

    let client = async_nats::connect(&live.nats_url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", live.nats_url))?;
    info!("Connected to NATS at {}", live.nats_url);

    let log: Arc<dyn AlertLog> = Arc::new(store.alert_log(&config.paths.alerts_file)?);
    let reporter = MetricsReporter::new(
        metrics.clone(),
        AlertEvaluator::new(config.alerting.clone(), log),
        store,
        live.report_interval_secs,
    );
    tokio::spawn(reporter.start());

    let consumer = PredictionConsumer::new(client, &live.prediction_subject);
    let mut subscription = consumer.subscribe().await?;

    info!(
        workers = live.workers,
        subject = %consumer.subject(),
        threshold = live.decision_threshold,
        "Watching live predictions"
    );

    // Semaphore to limit concurrent handlers
    let semaphore = Arc::new(Semaphore::new(live.workers.max(1)));

    loop {
        tokio::select! {
            message = subscription.next() => {
                let Some(message) = message else { break };
                let permit = semaphore.clone().acquire_owned().await?;
                let metrics = metrics.clone();
                tokio::spawn(async move {
                    handle_payload(&message.payload, &metrics);
                    drop(permit);
                });
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Monitor shutting down...");
    metrics.print_summary();
    Ok(())
}
