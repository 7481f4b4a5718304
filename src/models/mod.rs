//! Scoring model collaborators

pub mod inference;
pub mod loader;

pub use inference::OnnxScorer;
pub use loader::{LoadedModel, ModelLoader};

use crate::dataset::Dataset;
use crate::error::{MonitorError, Result};
use tracing::info;

/// A model that turns one feature row into a fraud probability
pub trait Scorer: Send + Sync {
    fn name(&self) -> &str;

    /// Probability of the fraud class for features in dataset column order
    fn predict_probability(&self, features: &[f32]) -> Result<f64>;
}

/// Score every row of `dataset`, in row order
pub fn score_dataset(scorer: &dyn Scorer, dataset: &Dataset) -> Result<Vec<f64>> {
    let mut probabilities = Vec::with_capacity(dataset.len());
    for index in 0..dataset.len() {
        let p = scorer.predict_probability(&dataset.row(index))?;
        if !(0.0..=1.0).contains(&p) {
            return Err(MonitorError::scoring(format!(
                "model '{}' returned {p} for row {index}",
                scorer.name()
            )));
        }
        probabilities.push(p);
    }
    info!(
        model = %scorer.name(),
        rows = probabilities.len(),
        "Dataset scored"
    );
    Ok(probabilities)
}
