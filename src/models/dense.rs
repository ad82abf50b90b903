//! Feed-forward network evaluated from exported dense-layer weights
//!
//! Weights are stored the way Keras keeps them for a `Dense` layer: a
//! `[inputs][units]` kernel plus a `[units]` bias. Evaluation is in `f32`
//! to match the precision the network was trained in.

use crate::error::{ArtifactLoadError, PipelineError};
use crate::models::{check_probabilities, Classifier};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layer activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Linear,
}

impl Activation {
    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Linear => x,
        }
    }
}

/// One fully connected layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Kernel, `kernel[i][j]` connects input `i` to unit `j`
    pub kernel: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.kernel.len()
    }

    fn units(&self) -> usize {
        self.bias.len()
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut out = self.bias.clone();
        for (x, row) in input.iter().zip(&self.kernel) {
            for (o, w) in out.iter_mut().zip(row) {
                *o += x * w;
            }
        }
        out.into_iter().map(|v| self.activation.apply(v)).collect()
    }
}

/// Sequential stack of dense layers ending in a single sigmoid unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseNetwork {
    #[serde(default = "default_name")]
    pub name: String,
    pub layers: Vec<DenseLayer>,
}

fn default_name() -> String {
    "dense".to_string()
}

impl DenseNetwork {
    /// Load and validate a network from its JSON export.
    pub fn from_file(path: &Path) -> Result<Self, ArtifactLoadError> {
        let network: Self = crate::artifacts::read_json(path)?;
        network.validate()?;
        Ok(network)
    }

    /// Check layer shapes chain together and the network ends in one probability.
    pub fn validate(&self) -> Result<(), ArtifactLoadError> {
        let invalid = |reason: String| ArtifactLoadError::Invalid {
            artifact: "model",
            reason,
        };

        let last = self
            .layers
            .last()
            .ok_or_else(|| invalid("network has no layers".to_string()))?;

        let mut width = self.layers[0].inputs();
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.inputs() != width || layer.inputs() == 0 {
                return Err(invalid(format!(
                    "layer {} expects {} inputs, previous layer produces {}",
                    i,
                    layer.inputs(),
                    width
                )));
            }
            if layer.kernel.iter().any(|row| row.len() != layer.units()) {
                return Err(invalid(format!(
                    "layer {} kernel rows do not match its {} units",
                    i,
                    layer.units()
                )));
            }
            if layer
                .kernel
                .iter()
                .flatten()
                .chain(&layer.bias)
                .any(|w| !w.is_finite())
            {
                return Err(invalid(format!("layer {} has non-finite weights", i)));
            }
            width = layer.units();
        }

        if last.units() != 1 || last.activation != Activation::Sigmoid {
            return Err(invalid(
                "output layer must be a single sigmoid unit".to_string(),
            ));
        }
        Ok(())
    }

    fn forward(&self, row: &[f32]) -> Result<f32, PipelineError> {
        let output = self
            .layers
            .iter()
            .fold(row.to_vec(), |acc, layer| layer.forward(&acc));
        output
            .first()
            .copied()
            .ok_or_else(|| PipelineError::Inference("network produced no output".to_string()))
    }
}

impl Classifier for DenseNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_width(&self) -> Option<usize> {
        self.layers.first().map(|l| l.inputs())
    }

    fn verify(&self) -> Result<(), ArtifactLoadError> {
        self.validate()
    }

    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<f32>, PipelineError> {
        let width = self.input_width().unwrap_or(0);
        if let Some(row) = rows.iter().find(|r| r.len() != width) {
            return Err(PipelineError::Inference(format!(
                "input shape mismatch: model expects {} features, got {}",
                width,
                row.len()
            )));
        }

        let probabilities = rows
            .iter()
            .map(|row| self.forward(row))
            .collect::<Result<Vec<f32>, _>>()?;
        check_probabilities(rows.len(), &probabilities)?;
        Ok(probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2 inputs -> 2 relu units -> 1 sigmoid unit
    fn network() -> DenseNetwork {
        DenseNetwork {
            name: "tiny".to_string(),
            layers: vec![
                DenseLayer {
                    kernel: vec![vec![1.0, -1.0], vec![1.0, 1.0]],
                    bias: vec![0.0, 0.0],
                    activation: Activation::Relu,
                },
                DenseLayer {
                    kernel: vec![vec![1.0], vec![-1.0]],
                    bias: vec![0.0],
                    activation: Activation::Sigmoid,
                },
            ],
        }
    }

    #[test]
    fn test_forward_pass() {
        let network = network();
        assert!(network.validate().is_ok());

        // hidden = relu([1+1, -1+1]) = [2, 0]; out = sigmoid(2)
        let probs = network.predict(&[vec![1.0, 1.0]]).unwrap();
        let expected = 1.0 / (1.0 + (-2.0f32).exp());
        assert!((probs[0] - expected).abs() < 1e-6);

        // zero input -> sigmoid(0)
        let probs = network.predict(&[vec![0.0, 0.0]]).unwrap();
        assert_eq!(probs, vec![0.5]);
    }

    #[test]
    fn test_batch_prediction() {
        let probs = network()
            .predict(&[vec![1.0, 1.0], vec![0.0, 0.0], vec![-3.0, 3.0]])
            .unwrap();
        assert_eq!(probs.len(), 3);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_wrong_input_width() {
        let err = network().predict(&[vec![1.0, 1.0, 1.0]]).unwrap_err();
        assert_eq!(err.kind(), "inference_error");
    }

    #[test]
    fn test_validate_rejects_broken_networks() {
        let mut broken = network();
        broken.layers[1].kernel = vec![vec![1.0], vec![1.0], vec![1.0]];
        assert!(broken.validate().is_err());

        let mut linear_head = network();
        linear_head.layers[1].activation = Activation::Linear;
        assert!(linear_head.validate().is_err());

        let empty = DenseNetwork {
            name: "empty".to_string(),
            layers: vec![],
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_empty_output_layer_is_an_error() {
        let hollow = DenseNetwork {
            name: "hollow".to_string(),
            layers: vec![DenseLayer {
                kernel: vec![vec![]; 2],
                bias: vec![],
                activation: Activation::Sigmoid,
            }],
        };
        assert!(hollow.verify().is_err());

        let err = hollow.predict(&[vec![1.0, 1.0]]).unwrap_err();
        assert_eq!(err.kind(), "inference_error");
    }

    #[test]
    fn test_deserialize() {
        let json = r#"{
            "layers": [
                {"kernel": [[0.5], [0.25]], "bias": [0.1], "activation": "sigmoid"}
            ]
        }"#;
        let network: DenseNetwork = serde_json::from_str(json).unwrap();
        assert_eq!(network.name, "dense");
        assert_eq!(network.input_width(), Some(2));
        assert!(network.validate().is_ok());
    }
}
