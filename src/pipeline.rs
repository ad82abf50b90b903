//! End-to-end churn scoring over a loaded artifact set.
//!
//! Each request is one linear pass: validate, encode, assemble, scale,
//! predict, decide. Nothing is cached between requests.

use crate::artifacts::Artifacts;
use crate::decision::decide;
use crate::error::PipelineError;
use crate::features::{FeatureAssembler, FeatureVector};
use crate::metrics::PipelineMetrics;
use crate::types::customer::CustomerProfile;
use crate::types::prediction::{ChurnResponse, PredictionResult, RejectedRequest};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Choices a front end may offer for the categorical fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormOptions {
    pub geographies: Vec<String>,
    pub genders: Vec<String>,
}

/// Scores customer profiles against a shared, read-only artifact set.
#[derive(Debug, Clone)]
pub struct ChurnPredictor {
    artifacts: Arc<Artifacts>,
    assembler: FeatureAssembler,
}

impl ChurnPredictor {
    pub fn new(artifacts: Arc<Artifacts>) -> Self {
        let assembler = artifacts.assembler();
        Self {
            artifacts,
            assembler,
        }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    pub fn feature_count(&self) -> usize {
        self.assembler.feature_count()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.assembler.feature_names()
    }

    pub fn encode_gender(&self, label: &str) -> Result<usize, PipelineError> {
        self.artifacts.gender_encoder.transform(label)
    }

    pub fn encode_geography(&self, label: &str) -> Result<Vec<f64>, PipelineError> {
        self.artifacts.geography_encoder.transform(label)
    }

    /// Validate and encode a profile into its unscaled feature vector.
    pub fn features(&self, profile: &CustomerProfile) -> Result<FeatureVector, PipelineError> {
        profile.validate()?;
        let gender_code = self.encode_gender(&profile.gender)?;
        let geography = self.encode_geography(&profile.geography)?;
        Ok(self.assembler.assemble(profile, gender_code, &geography))
    }

    /// Validate, encode and scale a profile into the model's input row.
    fn model_input(&self, profile: &CustomerProfile) -> Result<Vec<f32>, PipelineError> {
        let features = self.features(profile)?;
        let scaled = self.artifacts.scaler.scale(&features)?;
        Ok(scaled.to_f32())
    }

    /// Score a single customer.
    pub fn predict(&self, profile: &CustomerProfile) -> Result<PredictionResult, PipelineError> {
        let row = self.model_input(profile)?;
        let output = self.artifacts.classifier.predict(&[row])?;

        let probability = output
            .first()
            .copied()
            .map(f64::from)
            .ok_or_else(|| PipelineError::Inference("model returned no output".to_string()))?;
        let label = decide(probability);

        debug!(
            customer_id = ?profile.customer_id,
            probability = probability,
            label = ?label,
            "Customer scored"
        );

        Ok(PredictionResult { probability, label })
    }

    /// Score many customers with a single classifier call.
    ///
    /// Results line up with `profiles`. Rows that fail validation or encoding
    /// get their own error and are left out of the batch; if the classifier
    /// itself fails, every remaining row carries that failure.
    pub fn predict_batch(
        &self,
        profiles: &[CustomerProfile],
    ) -> Vec<Result<PredictionResult, PipelineError>> {
        let inputs: Vec<Result<Vec<f32>, PipelineError>> =
            profiles.iter().map(|p| self.model_input(p)).collect();

        let rows: Vec<Vec<f32>> = inputs
            .iter()
            .filter_map(|r| r.as_ref().ok().cloned())
            .collect();

        let outputs = if rows.is_empty() {
            Ok(Vec::new())
        } else {
            self.artifacts.classifier.predict(&rows)
        };

        let probabilities: &[f32] = outputs.as_deref().unwrap_or(&[]);
        let mut scored = probabilities.iter().copied();

        let results: Vec<Result<PredictionResult, PipelineError>> = inputs
            .into_iter()
            .map(|input| {
                input?;
                outputs.as_ref().map_err(Clone::clone)?;
                let probability = scored.next().map(f64::from).ok_or_else(|| {
                    PipelineError::Inference(format!(
                        "model returned {} outputs for {} rows",
                        probabilities.len(),
                        rows.len()
                    ))
                })?;
                Ok(PredictionResult {
                    probability,
                    label: decide(probability),
                })
            })
            .collect();

        debug!(
            batch = profiles.len(),
            scored = results.iter().filter(|r| r.is_ok()).count(),
            "Batch scored"
        );

        results
    }

    /// Vocabularies of the fitted encoders, in fitted order.
    pub fn form_options(&self) -> FormOptions {
        FormOptions {
            geographies: self.artifacts.geography_encoder.categories().to_vec(),
            genders: self.artifacts.gender_encoder.classes().to_vec(),
        }
    }

    /// The input form's starting profile, with the first known geography and gender.
    pub fn default_profile(&self) -> CustomerProfile {
        let options = self.form_options();
        CustomerProfile {
            geography: options.geographies.into_iter().next().unwrap_or_default(),
            gender: options.genders.into_iter().next().unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Turn one raw request payload into the response to publish.
    ///
    /// Every outcome is recorded in `metrics`; nothing here fails the caller.
    pub fn handle(&self, payload: &[u8], metrics: &PipelineMetrics) -> ChurnResponse {
        let start_time = Instant::now();

        let profile = match serde_json::from_slice::<CustomerProfile>(payload) {
            Ok(profile) => profile,
            Err(e) => {
                metrics.record_rejection(start_time.elapsed(), "malformed_request");
                warn!(error = %e, "Failed to deserialize customer profile");
                return ChurnResponse::Rejected(RejectedRequest::malformed(&e.to_string()));
            }
        };

        let outcome = self.predict(&profile);
        let processing_time = start_time.elapsed();

        match &outcome {
            Ok(result) => metrics.record_prediction(processing_time, result),
            Err(e) => {
                metrics.record_rejection(processing_time, e.kind());
                log_rejection(profile.customer_id.as_deref(), e);
            }
        }

        ChurnResponse::from_outcome(profile.customer_id, &outcome)
    }
}

/// Validation failures are the caller's problem; anything else means the
/// artifacts or the model misbehaved.
fn log_rejection(customer_id: Option<&str>, err: &PipelineError) {
    if err.is_validation() {
        warn!(customer_id = ?customer_id, error = %err, "Request rejected");
    } else {
        error!(customer_id = ?customer_id, error = %err, kind = err.kind(), "Prediction failed");
    }
}
