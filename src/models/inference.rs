//! ONNX Runtime backed churn classifier

use crate::error::PipelineError;
use crate::models::loader::LoadedModel;
use crate::models::{check_probabilities, Classifier};
use anyhow::{Context, Result};
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

/// Classifier running an exported model through ONNX Runtime.
///
/// The session needs exclusive access while running, so concurrent
/// requests serialize on it.
pub struct OnnxClassifier {
    name: String,
    model: Mutex<LoadedModel>,
}

impl OnnxClassifier {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            name: model.name.clone(),
            model: Mutex::new(model),
        }
    }

    fn run(&self, rows: &[Vec<f32>]) -> Result<Vec<f32>> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != width) {
            anyhow::bail!("ragged input batch");
        }

        // Input tensor - shape [batch, num_features]
        let shape = vec![rows.len() as i64, width as i64];
        let data: Vec<f32> = rows.iter().flatten().copied().collect();
        let input_tensor =
            Tensor::from_array((shape, data)).context("Failed to create input tensor")?;

        let mut guard = self
            .model
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let model = &mut *guard;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        let output = outputs
            .get(&model.output_name)
            .with_context(|| format!("Model produced no {:?} output", model.output_name))?;
        let (shape, data) = output.try_extract_tensor::<f32>()?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        extract_churn_column(&dims, data, rows.len())
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_width(&self) -> Option<usize> {
        None
    }

    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<f32>, PipelineError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let probabilities = self
            .run(rows)
            .map_err(|e| PipelineError::Inference(format!("{:#}", e)))?;
        check_probabilities(rows.len(), &probabilities)?;

        debug!(model = %self.name, batch = rows.len(), "ONNX inference complete");
        Ok(probabilities)
    }
}

/// Pull the churn probability for each row out of the model's output tensor.
///
/// Accepts a single sigmoid column (`[batch, 1]` or `[batch]`) or a two-class
/// softmax (`[batch, 2]`, churn at index 1).
fn extract_churn_column(dims: &[i64], data: &[f32], batch: usize) -> Result<Vec<f32>> {
    match dims {
        [n] | [n, 1] if *n as usize == batch => Ok(data.to_vec()),
        [n, 2] if *n as usize == batch => Ok(data.chunks(2).map(|c| c[1]).collect()),
        _ => anyhow::bail!("unexpected output shape {:?} for batch of {}", dims, batch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sigmoid_column() {
        let probs = extract_churn_column(&[2, 1], &[0.2, 0.7], 2).unwrap();
        assert_eq!(probs, vec![0.2, 0.7]);

        let probs = extract_churn_column(&[1], &[0.4], 1).unwrap();
        assert_eq!(probs, vec![0.4]);
    }

    #[test]
    fn test_extract_two_class_output() {
        let probs = extract_churn_column(&[2, 2], &[0.8, 0.2, 0.1, 0.9], 2).unwrap();
        assert_eq!(probs, vec![0.2, 0.9]);
    }

    #[test]
    fn test_extract_rejects_wrong_shape() {
        assert!(extract_churn_column(&[3, 1], &[0.1, 0.2, 0.3], 2).is_err());
        assert!(extract_churn_column(&[1, 4], &[0.1, 0.2, 0.3, 0.4], 1).is_err());
    }
}
