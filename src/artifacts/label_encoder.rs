//! Label encoding for the gender column

use crate::error::{ArtifactLoadError, PipelineError};
use serde::{Deserialize, Serialize};

/// Fitted label encoder: each known class maps to its position in `classes`.
///
/// The class order is whatever the encoder was fitted with (sorted, for
/// scikit-learn exports) and is never reordered here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Build an encoder from fitted classes, rejecting empty or duplicated vocabularies.
    pub fn new(classes: Vec<String>) -> Result<Self, ArtifactLoadError> {
        let encoder = Self { classes };
        encoder.validate()?;
        Ok(encoder)
    }

    /// Check the structural invariants of a deserialized encoder.
    pub fn validate(&self) -> Result<(), ArtifactLoadError> {
        if self.classes.is_empty() {
            return Err(ArtifactLoadError::Invalid {
                artifact: "gender encoder",
                reason: "no classes".to_string(),
            });
        }
        for (i, class) in self.classes.iter().enumerate() {
            if self.classes[..i].contains(class) {
                return Err(ArtifactLoadError::Invalid {
                    artifact: "gender encoder",
                    reason: format!("duplicate class {:?}", class),
                });
            }
        }
        Ok(())
    }

    /// Known labels in index order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Map a label to its fitted index.
    pub fn transform(&self, label: &str) -> Result<usize, PipelineError> {
        self.classes
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| PipelineError::UnknownCategory {
                field: "gender",
                value: label.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> LabelEncoder {
        LabelEncoder::new(vec!["Female".to_string(), "Male".to_string()]).unwrap()
    }

    #[test]
    fn test_transform_uses_fitted_index() {
        let encoder = encoder();
        assert_eq!(encoder.transform("Female").unwrap(), 0);
        assert_eq!(encoder.transform("Male").unwrap(), 1);
        // Deterministic
        assert_eq!(encoder.transform("Male"), encoder.transform("Male"));
    }

    #[test]
    fn test_unknown_label() {
        let err = encoder().transform("male").unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnknownCategory {
                field: "gender",
                value: "male".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_bad_vocabularies() {
        assert!(LabelEncoder::new(vec![]).is_err());
        assert!(LabelEncoder::new(vec!["Male".to_string(), "Male".to_string()]).is_err());
    }

    #[test]
    fn test_deserialize() {
        let encoder: LabelEncoder =
            serde_json::from_str(r#"{"classes": ["Female", "Male"]}"#).unwrap();
        assert_eq!(encoder, self::encoder());
    }
}
