//! Test Prediction Producer
//!
//! Publishes synthetic scored predictions to NATS for exercising the live monitor.

use chrono::Utc;
use clap::Parser;
use fraud_model_monitor::types::{Decision, PredictionEvent};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[clap(name = "prediction-producer", about = "Publish synthetic fraud predictions")]
struct Args {
    #[clap(long, default_value = "nats://localhost:4222")]
    nats_url: String,

    #[clap(long, default_value = "predictions")]
    subject: String,

    /// Number of predictions to publish
    #[clap(long, default_value_t = 100)]
    count: u64,

    /// Share of transactions that look fraudulent
    #[clap(long, default_value_t = 0.1)]
    fraud_rate: f64,

    /// Decision threshold stamped on the events
    #[clap(long, default_value_t = 0.29)]
    threshold: f64,

    #[clap(long, default_value_t = 100)]
    delay_ms: u64,
}

/// Prediction generator for testing
struct PredictionGenerator {
    rng: rand::rngs::ThreadRng,
    counter: u64,
    threshold: f64,
}

impl PredictionGenerator {
    fn new(threshold: f64) -> Self {
        Self {
            rng: rand::thread_rng(),
            counter: 0,
            threshold,
        }
    }

    fn next(&mut self, suspicious: bool) -> PredictionEvent {
        self.counter += 1;
        let fraud_probability = if suspicious {
            self.rng.gen_range(0.4..1.0)
        } else {
            // legitimate traffic clusters near zero
            self.rng.gen_range(0.0f64..1.0).powi(4) * 0.5
        };
        PredictionEvent {
            transaction_id: format!("TXN_{:08}", self.counter),
            fraud_probability,
            decision: Some(Decision::from_probability(fraud_probability, self.threshold)),
            timestamp: Utc::now(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prediction_producer=info".parse()?),
        )
        .init();

    let args = Args::parse();
    info!(
        nats_url = %args.nats_url,
        subject = %args.subject,
        count = args.count,
        fraud_rate = args.fraud_rate,
        delay_ms = args.delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(&args.nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            Some(c)
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            None
        }
    };

    let mut generator = PredictionGenerator::new(args.threshold);
    let mut rng = rand::thread_rng();
    let mut blocked = 0u64;

    for i in 0..args.count {
        let event = generator.next(rng.gen_bool(args.fraud_rate.clamp(0.0, 1.0)));
        if event.decision == Some(Decision::Block) {
            blocked += 1;
        }

        match &client {
            Some(client) => {
                let payload = serde_json::to_vec(&event)?;
                client.publish(args.subject.clone(), payload.into()).await?;
            }
            None if i == 0 || (i + 1) % 10 == 0 => {
                info!("Sample prediction {}:\n{}", i + 1, serde_json::to_string_pretty(&event)?);
            }
            None => {}
        }

        if (i + 1) % 10 == 0 {
            info!("Published {}/{} predictions ({} blocked)", i + 1, args.count, blocked);
        }

        tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
    }

    if let Some(client) = client {
        client.flush().await?;
    }

    info!("Completed! Published {} predictions ({} blocked)", args.count, blocked);
    Ok(())
}
