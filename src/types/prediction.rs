//! Prediction results and the messages published for them

use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binary churn classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnLabel {
    Churn,
    NoChurn,
}

impl ChurnLabel {
    /// Banner shown alongside the probability.
    pub fn banner(&self) -> &'static str {
        match self {
            ChurnLabel::Churn => "This customer has high chance of churn",
            ChurnLabel::NoChurn => "This customer has low chance of churn",
        }
    }
}

/// Outcome of scoring one customer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Churn probability in [0, 1]
    pub probability: f64,
    pub label: ChurnLabel,
}

impl PredictionResult {
    /// Human-readable rendering: probability to two decimals plus the banner.
    pub fn summary(&self) -> String {
        format!(
            "Churn Probability: {:.2}. {}",
            self.probability,
            self.label.banner()
        )
    }
}

/// Successful scoring, as published
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnReport {
    /// Unique report identifier
    pub report_id: String,

    /// Echo of the request's customer id
    pub customer_id: Option<String>,

    pub probability: f64,

    pub label: ChurnLabel,

    /// Display text, see [`PredictionResult::summary`]
    pub summary: String,

    pub timestamp: DateTime<Utc>,
}

impl ChurnReport {
    pub fn new(customer_id: Option<String>, result: &PredictionResult) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            customer_id,
            probability: result.probability,
            label: result.label,
            summary: result.summary(),
            timestamp: Utc::now(),
        }
    }
}

/// A request that could not be scored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRequest {
    pub customer_id: Option<String>,

    /// Machine-readable error kind, see [`PipelineError::kind`]
    pub error: String,

    /// Message safe to show to the submitter
    pub message: String,

    pub timestamp: DateTime<Utc>,
}

impl RejectedRequest {
    pub fn new(customer_id: Option<String>, error: &PipelineError) -> Self {
        Self {
            customer_id,
            error: error.kind().to_string(),
            message: error.user_message(),
            timestamp: Utc::now(),
        }
    }

    /// Rejection for a payload that did not parse as a customer profile.
    pub fn malformed(reason: &str) -> Self {
        Self {
            customer_id: None,
            error: "malformed_request".to_string(),
            message: format!("malformed request: {}", reason),
            timestamp: Utc::now(),
        }
    }
}

/// Response published for every request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChurnResponse {
    Scored(ChurnReport),
    Rejected(RejectedRequest),
}

impl ChurnResponse {
    pub fn from_outcome(
        customer_id: Option<String>,
        outcome: &Result<PredictionResult, PipelineError>,
    ) -> Self {
        match outcome {
            Ok(result) => ChurnResponse::Scored(ChurnReport::new(customer_id, result)),
            Err(e) => ChurnResponse::Rejected(RejectedRequest::new(customer_id, e)),
        }
    }
}
