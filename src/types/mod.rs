//! Type definitions for the churn prediction pipeline

pub mod customer;
pub mod prediction;

pub use customer::CustomerProfile;
pub use prediction::{ChurnLabel, ChurnReport, ChurnResponse, PredictionResult, RejectedRequest};
