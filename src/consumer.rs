//! NATS consumer for prediction events published by the scoring service

use crate::metrics::PerformanceMetrics;
use crate::types::prediction::PredictionEvent;
use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::{debug, info, warn};

/// Consumer for receiving scored predictions from NATS
pub struct PredictionConsumer {
    client: Client,
    subject: String,
}

impl PredictionConsumer {
    /// Create a new prediction consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the prediction subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to prediction subject");
        Ok(subscriber)
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Decode one message payload and record it. Malformed payloads are counted
/// and dropped.
pub fn handle_payload(payload: &[u8], metrics: &PerformanceMetrics) -> Option<PredictionEvent> {
    match serde_json::from_slice::<PredictionEvent>(payload) {
        Ok(event) => {
            if !metrics.record_prediction(&event) {
                return None;
            }
            debug!(
                transaction_id = %event.transaction_id,
                fraud_probability = event.fraud_probability,
                "Prediction recorded"
            );
            Some(event)
        }
        Err(e) => {
            metrics.record_malformed();
            warn!(error = %e, "Failed to deserialize prediction event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    // Subscription tests would require a running NATS server
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_handle_payload_records_prediction() {
        let metrics = PerformanceMetrics::new(0.5);
        let payload = br#"{"transaction_id":"TXN_1","fraud_probability":0.8}"#;

        let event = handle_payload(payload, &metrics).unwrap();

        assert_eq!(event.transaction_id, "TXN_1");
        assert_eq!(metrics.total_predictions.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.blocked_count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_handle_payload_counts_malformed() {
        let metrics = PerformanceMetrics::new(0.5);

        assert!(handle_payload(b"not json", &metrics).is_none());
        assert_eq!(metrics.total_predictions.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.malformed_events.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_handle_payload_rejects_out_of_range_probability() {
        let metrics = PerformanceMetrics::new(0.5);
        let payload = br#"{"transaction_id":"TXN_2","fraud_probability":1.7}"#;

        assert!(handle_payload(payload, &metrics).is_none());
        assert_eq!(metrics.total_predictions.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.blocked_count.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.malformed_events.load(Ordering::Relaxed), 1);
    }
}
