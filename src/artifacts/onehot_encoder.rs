//! One-hot encoding for the geography column

use crate::error::{ArtifactLoadError, PipelineError};
use serde::{Deserialize, Serialize};

/// Fitted one-hot encoder over a single categorical column.
///
/// Output rows have one slot per category, in fitted order, and the
/// generated column names follow `<prefix>_<category>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn new(categories: Vec<String>) -> Result<Self, ArtifactLoadError> {
        let encoder = Self { categories };
        encoder.validate()?;
        Ok(encoder)
    }

    /// Check the structural invariants of a deserialized encoder.
    pub fn validate(&self) -> Result<(), ArtifactLoadError> {
        if self.categories.is_empty() {
            return Err(ArtifactLoadError::Invalid {
                artifact: "geography encoder",
                reason: "no categories".to_string(),
            });
        }
        for (i, category) in self.categories.iter().enumerate() {
            if self.categories[..i].contains(category) {
                return Err(ArtifactLoadError::Invalid {
                    artifact: "geography encoder",
                    reason: format!("duplicate category {:?}", category),
                });
            }
        }
        Ok(())
    }

    /// Known categories in column order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Width of every encoded row.
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Encode a label as a row with a single 1.0 at the category's slot.
    pub fn transform(&self, label: &str) -> Result<Vec<f64>, PipelineError> {
        let slot = self
            .categories
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| PipelineError::UnknownCategory {
                field: "geography",
                value: label.to_string(),
            })?;

        let mut row = vec![0.0; self.categories.len()];
        row[slot] = 1.0;
        Ok(row)
    }

    /// Output column names, e.g. `Geography_France`.
    pub fn feature_names(&self, prefix: &str) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", prefix, c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> OneHotEncoder {
        OneHotEncoder::new(vec![
            "France".to_string(),
            "Germany".to_string(),
            "Spain".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn test_every_category_is_a_single_hot_slot() {
        let encoder = encoder();
        for (i, category) in encoder.categories().iter().enumerate() {
            let row = encoder.transform(category).unwrap();
            assert_eq!(row.len(), 3);
            assert_eq!(row.iter().sum::<f64>(), 1.0);
            assert_eq!(row.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(row[i], 1.0);
        }
    }

    #[test]
    fn test_transform_is_deterministic() {
        let encoder = encoder();
        assert_eq!(encoder.transform("Spain"), encoder.transform("Spain"));
    }

    #[test]
    fn test_unknown_category() {
        let err = encoder().transform("Atlantis").unwrap_err();
        assert_eq!(err.kind(), "unknown_category");
    }

    #[test]
    fn test_feature_names() {
        assert_eq!(
            encoder().feature_names("Geography"),
            vec!["Geography_France", "Geography_Germany", "Geography_Spain"]
        );
    }

    #[test]
    fn test_rejects_empty_vocabulary() {
        let encoder: OneHotEncoder = serde_json::from_str(r#"{"categories": []}"#).unwrap();
        assert!(encoder.validate().is_err());
    }
}
