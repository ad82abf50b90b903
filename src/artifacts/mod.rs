//! Fitted artifacts: encoders, scaler and classifier.
//!
//! All four are loaded once at startup and never mutated afterwards. Loading
//! also verifies that the columns the assembler produces line up with what
//! the scaler and model were fitted on, so a mismatched artifact set stops
//! the process before any request is served.

pub mod label_encoder;
pub mod onehot_encoder;
pub mod scaler;

use crate::config::ArtifactsConfig;
use crate::error::ArtifactLoadError;
use crate::features::{FeatureAssembler, GEOGRAPHY_PREFIX};
use crate::models::{load_classifier, Classifier};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;
use tracing::info;

pub use label_encoder::LabelEncoder;
pub use onehot_encoder::OneHotEncoder;
pub use scaler::StandardScaler;

/// Read and deserialize a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactLoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| ArtifactLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The complete, immutable set of fitted artifacts.
pub struct Artifacts {
    pub gender_encoder: LabelEncoder,
    pub geography_encoder: OneHotEncoder,
    pub scaler: StandardScaler,
    pub classifier: Box<dyn Classifier>,
}

impl fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifacts")
            .field("gender_encoder", &self.gender_encoder)
            .field("geography_encoder", &self.geography_encoder)
            .field("scaler", &self.scaler)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

impl Artifacts {
    /// Load every artifact named in the configuration and check they agree.
    pub fn load(config: &ArtifactsConfig) -> Result<Self, ArtifactLoadError> {
        let dir = Path::new(&config.dir);

        let gender_encoder: LabelEncoder = read_json(&dir.join(&config.gender_encoder_file))?;
        let geography_encoder: OneHotEncoder =
            read_json(&dir.join(&config.geography_encoder_file))?;
        let scaler: StandardScaler = read_json(&dir.join(&config.scaler_file))?;
        let classifier = load_classifier(&dir.join(&config.model_file), config.onnx_threads)?;

        let artifacts = Self::from_parts(gender_encoder, geography_encoder, scaler, classifier)?;

        info!(
            dir = %dir.display(),
            model = %artifacts.classifier.name(),
            genders = ?artifacts.gender_encoder.classes(),
            geographies = ?artifacts.geography_encoder.categories(),
            features = artifacts.scaler.n_features(),
            "Artifacts loaded"
        );

        Ok(artifacts)
    }

    /// Assemble artifacts that were loaded elsewhere, running the same
    /// consistency checks as [`Artifacts::load`].
    pub fn from_parts(
        gender_encoder: LabelEncoder,
        geography_encoder: OneHotEncoder,
        scaler: StandardScaler,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, ArtifactLoadError> {
        gender_encoder.validate()?;
        geography_encoder.validate()?;
        scaler.validate()?;
        classifier.verify()?;

        let artifacts = Self {
            gender_encoder,
            geography_encoder,
            scaler,
            classifier,
        };
        artifacts.check_schema()?;
        artifacts.probe_classifier()?;
        Ok(artifacts)
    }

    /// Feature assembler laid out for this artifact set's geography vocabulary.
    pub fn assembler(&self) -> FeatureAssembler {
        FeatureAssembler::new(self.geography_encoder.feature_names(GEOGRAPHY_PREFIX))
    }

    fn check_schema(&self) -> Result<(), ArtifactLoadError> {
        let assembled = self.assembler().feature_names();

        if assembled.len() != self.scaler.n_features() {
            return Err(ArtifactLoadError::Invalid {
                artifact: "scaler",
                reason: format!(
                    "fitted on {} columns but the encoders produce {}",
                    self.scaler.n_features(),
                    assembled.len()
                ),
            });
        }

        if let Some(fitted) = self.scaler.feature_names_in() {
            if let Some((index, (a, f))) = assembled
                .iter()
                .zip(fitted)
                .enumerate()
                .find(|(_, (a, f))| a != f)
            {
                return Err(ArtifactLoadError::SchemaMismatch {
                    index,
                    assembled: a.clone(),
                    fitted: f.clone(),
                });
            }
        }

        if let Some(width) = self.classifier.input_width() {
            if width != assembled.len() {
                return Err(ArtifactLoadError::Invalid {
                    artifact: "model",
                    reason: format!(
                        "expects {} features but the encoders produce {}",
                        width,
                        assembled.len()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Run one all-zero row through the classifier.
    fn probe_classifier(&self) -> Result<(), ArtifactLoadError> {
        let row = vec![0.0f32; self.scaler.n_features()];
        self.classifier
            .predict(&[row])
            .map(|_| ())
            .map_err(|e| ArtifactLoadError::Invalid {
                artifact: "model",
                reason: format!("probe prediction failed: {}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dense::{Activation, DenseLayer, DenseNetwork};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn logistic(width: usize) -> Box<dyn Classifier> {
        Box::new(DenseNetwork {
            name: "logistic".to_string(),
            layers: vec![DenseLayer {
                kernel: vec![vec![0.1]; width],
                bias: vec![0.0],
                activation: Activation::Sigmoid,
            }],
        })
    }

    fn fitted_names() -> Vec<String> {
        names(&[
            "CreditScore",
            "Gender",
            "Age",
            "Tenure",
            "Balance",
            "NumOfProducts",
            "HasCrCard",
            "IsActiveMember",
            "EstimatedSalary",
            "Geography_France",
            "Geography_Germany",
            "Geography_Spain",
        ])
    }

    fn parts(
        fitted: Option<Vec<String>>,
    ) -> (LabelEncoder, OneHotEncoder, StandardScaler) {
        (
            LabelEncoder::new(names(&["Female", "Male"])).unwrap(),
            OneHotEncoder::new(names(&["France", "Germany", "Spain"])).unwrap(),
            StandardScaler::new(vec![0.0; 12], vec![1.0; 12], fitted).unwrap(),
        )
    }

    #[test]
    fn test_consistent_parts() {
        let (gender, geo, scaler) = parts(Some(fitted_names()));
        let artifacts = Artifacts::from_parts(gender, geo, scaler, logistic(12)).unwrap();
        assert_eq!(artifacts.assembler().feature_count(), 12);
    }

    #[test]
    fn test_reordered_scaler_columns_are_rejected() {
        let mut fitted = fitted_names();
        fitted.swap(10, 11);
        let (gender, geo, scaler) = parts(Some(fitted));

        let err = Artifacts::from_parts(gender, geo, scaler, logistic(12)).unwrap_err();
        match err {
            ArtifactLoadError::SchemaMismatch {
                index,
                assembled,
                fitted,
            } => {
                assert_eq!(index, 10);
                assert_eq!(assembled, "Geography_Germany");
                assert_eq!(fitted, "Geography_Spain");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_scaler_width_must_match_encoders() {
        let (gender, _, scaler) = parts(None);
        let geo = OneHotEncoder::new(names(&["France", "Spain"])).unwrap();
        assert!(Artifacts::from_parts(gender, geo, scaler, logistic(11)).is_err());
    }

    #[test]
    fn test_hollow_network_is_rejected_at_assembly() {
        let (gender, geo, scaler) = parts(Some(fitted_names()));
        let hollow = Box::new(DenseNetwork {
            name: "hollow".to_string(),
            layers: vec![DenseLayer {
                kernel: vec![vec![]; 12],
                bias: vec![],
                activation: Activation::Sigmoid,
            }],
        });

        let err = Artifacts::from_parts(gender, geo, scaler, hollow).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Invalid { artifact: "model", .. }));
    }

    #[test]
    fn test_unvalidated_parts_are_rejected() {
        let (gender, geo, _) = parts(None);
        let scaler: StandardScaler = serde_json::from_str(
            r#"{"mean": [0.0, 0.0], "scale": [1.0, 0.0]}"#,
        )
        .unwrap();
        let err = Artifacts::from_parts(gender, geo, scaler, logistic(12)).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Invalid { artifact: "scaler", .. }));
    }

    #[test]
    fn test_model_width_must_match_encoders() {
        let (gender, geo, scaler) = parts(None);
        assert!(Artifacts::from_parts(gender, geo, scaler, logistic(9)).is_err());
    }
}
