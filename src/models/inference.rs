//! ONNX-backed fraud scorer

use super::loader::{scoring_error, LoadedModel, ModelLoader};
use super::Scorer;
use crate::error::{MonitorError, Result};
use anyhow::{anyhow, Context};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Binary fraud classifier exported to ONNX.
///
/// Handles both plain probability tensors (XGBoost, random forest exports)
/// and seq(map(int64, float)) outputs (CatBoost, LightGBM exports).
pub struct OnnxScorer {
    /// Session runs need exclusive access
    model: Mutex<LoadedModel>,
    name: String,
}

impl OnnxScorer {
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MonitorError::missing(format!("model {}", path.display())));
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        let model = ModelLoader::with_threads(onnx_threads)?.load_model(path, &name)?;
        Ok(Self {
            model: Mutex::new(model),
            name,
        })
    }

    fn run(&self, features: &[f32]) -> anyhow::Result<f64> {
        use ort::value::Tensor;

        // shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features.to_vec())).context("Failed to create input tensor")?;

        let mut model = self
            .model
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;
        let input_name = model.input_name.clone();
        let output_name = model.output_name.clone();

        let outputs = model.session.run(ort::inputs![&input_name => input_tensor])?;
        extract_probability(&outputs, &output_name, &self.name)
    }
}

impl Scorer for OnnxScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_probability(&self, features: &[f32]) -> Result<f64> {
        self.run(features).map_err(scoring_error)
    }
}

/// Fraud-class probability from the named output, falling back to any
/// non-label output
fn extract_probability(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
    model_name: &str,
) -> anyhow::Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        let dtype = output.dtype();

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let prob = fraud_prob_from_tensor(&dims, data)?;
            debug!(model = %model_name, prob = prob, "Extracted from tensor");
            return Ok(prob);
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            if let Ok(prob) = extract_from_sequence_map(output, model_name) {
                return Ok(prob);
            }
        }
    }

    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }

        let dtype = output.dtype();

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let prob = fraud_prob_from_tensor(&dims, data)?;
            debug!(model = %model_name, output = %name, prob = prob, "Extracted from tensor (fallback)");
            return Ok(prob);
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            if let Ok(prob) = extract_from_sequence_map(&output, model_name) {
                return Ok(prob);
            }
        }
    }

    Err(anyhow!("no probability output found for model '{model_name}'"))
}

/// Probability from seq(map(int64, float)), as CatBoost and LightGBM export it
fn extract_from_sequence_map(output: &ort::value::DynValue, model_name: &str) -> anyhow::Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    // batch size is always 1
    let map_value = maps.first().ok_or_else(|| anyhow!("Empty sequence"))?;
    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
        debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
        return Ok(f64::from(*prob));
    }
    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
        return Ok(1.0 - f64::from(*prob));
    }

    Err(anyhow!("No probability found in map"))
}

/// Fraud-class entry of a `[classes]` or `[batch, classes]` tensor
fn fraud_prob_from_tensor(shape: &[i64], data: &[f32]) -> anyhow::Result<f64> {
    let classes = shape.last().copied().unwrap_or(0);
    let index = if classes >= 2 { 1 } else { 0 };
    data.get(index)
        .map(|&v| f64::from(v))
        .ok_or_else(|| anyhow!("empty probability tensor"))
}

impl std::fmt::Debug for OnnxScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxScorer").field("name", &self.name).finish()
    }
}
