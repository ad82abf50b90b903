//! Error types for artifact loading and per-request scoring.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while scoring a single customer profile.
///
/// These are caught at the request boundary and turned into a rejection
/// message; none of them terminate the service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A categorical value outside the encoder's fitted vocabulary
    #[error("unknown {field} category: {value:?}")]
    UnknownCategory { field: &'static str, value: String },

    /// A raw field outside its documented domain
    #[error("{field} out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    /// Assembled vector width disagrees with the fitted column count
    #[error("feature dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The classifier rejected its input or failed internally
    #[error("inference failed: {0}")]
    Inference(String),
}

impl PipelineError {
    /// Short, stable identifier used for metrics and rejection payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnknownCategory { .. } => "unknown_category",
            PipelineError::OutOfRange { .. } => "out_of_range",
            PipelineError::DimensionMismatch { .. } => "dimension_mismatch",
            PipelineError::Inference(_) => "inference_error",
        }
    }

    /// Whether the caller can fix the request by changing its input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::UnknownCategory { .. } | PipelineError::OutOfRange { .. }
        )
    }

    /// Message suitable for showing to whoever submitted the profile.
    ///
    /// Validation failures are explained; internal failures are not.
    pub fn user_message(&self) -> String {
        if self.is_validation() {
            self.to_string()
        } else {
            "prediction failed".to_string()
        }
    }
}

/// Failure while loading the fitted artifacts at startup. Always fatal.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("failed to read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {artifact} artifact: {reason}")]
    Invalid {
        artifact: &'static str,
        reason: String,
    },

    #[error("feature schema mismatch at column {index}: assembler has {assembled:?}, scaler was fitted on {fitted:?}")]
    SchemaMismatch {
        index: usize,
        assembled: String,
        fitted: String,
    },

    #[error("failed to load model {}: {reason}", .path.display())]
    Model { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_explain_themselves() {
        let err = PipelineError::UnknownCategory {
            field: "geography",
            value: "Atlantis".to_string(),
        };
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "unknown geography category: \"Atlantis\"");
        assert_eq!(err.kind(), "unknown_category");
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let err = PipelineError::DimensionMismatch {
            expected: 12,
            got: 11,
        };
        assert!(!err.is_validation());
        assert_eq!(err.user_message(), "prediction failed");

        let err = PipelineError::Inference("bad shape".to_string());
        assert_eq!(err.user_message(), "prediction failed");
        assert_eq!(err.kind(), "inference_error");
    }
}
