//! Churn classifiers: the opaque model behind the pipeline

pub mod dense;
pub mod inference;
pub mod loader;

use crate::error::{ArtifactLoadError, PipelineError};
use std::path::Path;

pub use dense::DenseNetwork;
pub use inference::OnnxClassifier;
pub use loader::ModelLoader;

/// A pretrained binary classifier.
///
/// `predict` takes a `[batch, n_features]` matrix of scaled features and
/// returns one churn probability per row.
pub trait Classifier: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &str;

    /// Expected row width, when the model can tell ahead of time.
    fn input_width(&self) -> Option<usize>;

    /// Structural checks run when artifacts are assembled.
    fn verify(&self) -> Result<(), ArtifactLoadError> {
        Ok(())
    }

    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<f32>, PipelineError>;
}

/// Load a classifier, choosing the backend from the file extension
/// (`.onnx` for ONNX Runtime, `.json` for exported dense weights).
pub fn load_classifier(
    path: &Path,
    onnx_threads: usize,
) -> Result<Box<dyn Classifier>, ArtifactLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("onnx") => {
            let loader =
                ModelLoader::with_threads(onnx_threads).map_err(|e| ArtifactLoadError::Model {
                    path: path.to_path_buf(),
                    reason: format!("{:#}", e),
                })?;
            let model = loader
                .load_model(path)
                .map_err(|e| ArtifactLoadError::Model {
                    path: path.to_path_buf(),
                    reason: format!("{:#}", e),
                })?;
            Ok(Box::new(OnnxClassifier::new(model)))
        }
        Some("json") => Ok(Box::new(DenseNetwork::from_file(path)?)),
        other => Err(ArtifactLoadError::Model {
            path: path.to_path_buf(),
            reason: format!("unsupported model format {:?}", other.unwrap_or("")),
        }),
    }
}

/// Check a model's output column: one finite probability per input row.
pub(crate) fn check_probabilities(batch: usize, output: &[f32]) -> Result<(), PipelineError> {
    if output.len() != batch {
        return Err(PipelineError::Inference(format!(
            "expected {} outputs, got {}",
            batch,
            output.len()
        )));
    }
    if let Some(p) = output
        .iter()
        .find(|p| !p.is_finite() || !(0.0..=1.0).contains(*p))
    {
        return Err(PipelineError::Inference(format!(
            "output {} is not a probability",
            p
        )));
    }
    Ok(())
}
