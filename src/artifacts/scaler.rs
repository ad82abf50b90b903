//! Standardization of assembled feature vectors

use crate::error::{ArtifactLoadError, PipelineError};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// Fitted standard scaler: `(x - mean) / scale` per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
    /// Column names seen at fit time, when the scaler was fitted on a named frame
    #[serde(default)]
    feature_names_in: Option<Vec<String>>,
}

impl StandardScaler {
    pub fn new(
        mean: Vec<f64>,
        scale: Vec<f64>,
        feature_names_in: Option<Vec<String>>,
    ) -> Result<Self, ArtifactLoadError> {
        let scaler = Self {
            mean,
            scale,
            feature_names_in,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check the structural invariants of a deserialized scaler.
    pub fn validate(&self) -> Result<(), ArtifactLoadError> {
        let invalid = |reason: String| ArtifactLoadError::Invalid {
            artifact: "scaler",
            reason,
        };

        if self.mean.is_empty() {
            return Err(invalid("no columns".to_string()));
        }
        if self.mean.len() != self.scale.len() {
            return Err(invalid(format!(
                "{} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(names) = &self.feature_names_in {
            if names.len() != self.mean.len() {
                return Err(invalid(format!(
                    "{} feature names for {} columns",
                    names.len(),
                    self.mean.len()
                )));
            }
        }
        for (i, (&m, &s)) in self.mean.iter().zip(&self.scale).enumerate() {
            if !m.is_finite() {
                return Err(invalid(format!("non-finite mean at column {}: {}", i, m)));
            }
            // Fitted constant columns carry scale 1.0, never 0.0
            if !s.is_finite() || s == 0.0 {
                return Err(invalid(format!("unusable scale at column {}: {}", i, s)));
            }
        }
        Ok(())
    }

    /// Number of columns the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn feature_names_in(&self) -> Option<&[String]> {
        self.feature_names_in.as_deref()
    }

    /// Standardize one assembled vector.
    pub fn scale(&self, features: &FeatureVector) -> Result<FeatureVector, PipelineError> {
        let values = features.as_slice();
        if values.len() != self.mean.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.mean.len(),
                got: values.len(),
            });
        }

        let scaled = values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (&mean, &scale))| (x - mean) / scale)
            .collect();

        Ok(FeatureVector::new(scaled))
    }

    /// Standardize a batch of rows; any row of the wrong width fails the whole batch.
    pub fn transform(&self, rows: &[FeatureVector]) -> Result<Vec<FeatureVector>, PipelineError> {
        rows.iter().map(|row| self.scale(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> StandardScaler {
        StandardScaler::new(vec![10.0, 0.0, 5.0], vec![2.0, 1.0, 0.5], None).unwrap()
    }

    #[test]
    fn test_scale() {
        let scaled = scaler()
            .scale(&FeatureVector::new(vec![14.0, -3.0, 5.0]))
            .unwrap();
        assert_eq!(scaled.as_slice(), &[2.0, -3.0, 0.0]);
    }

    #[test]
    fn test_short_vector_is_rejected() {
        let err = scaler()
            .scale(&FeatureVector::new(vec![14.0, -3.0]))
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::DimensionMismatch {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn test_long_vector_is_rejected() {
        let err = scaler()
            .scale(&FeatureVector::new(vec![1.0, 2.0, 3.0, 4.0]))
            .unwrap_err();
        assert_eq!(err.kind(), "dimension_mismatch");
    }

    #[test]
    fn test_batch_fails_on_any_bad_row() {
        let rows = vec![
            FeatureVector::new(vec![10.0, 0.0, 5.0]),
            FeatureVector::new(vec![10.0, 0.0]),
        ];
        assert!(scaler().transform(&rows).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(StandardScaler::new(vec![1.0, 2.0], vec![1.0], None).is_err());
        assert!(StandardScaler::new(vec![1.0], vec![0.0], None).is_err());
        assert!(StandardScaler::new(vec![f64::NAN], vec![1.0], None).is_err());
        assert!(
            StandardScaler::new(vec![1.0], vec![1.0], Some(vec!["a".into(), "b".into()]))
                .is_err()
        );
    }
}
