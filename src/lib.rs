//! Churn Prediction Pipeline Library
//!
//! Scores bank customers for churn risk: categorical encoding, feature
//! assembly, standardization and model inference over fitted artifacts,
//! served over NATS.

pub mod artifacts;
pub mod config;
pub mod consumer;
pub mod decision;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod types;
pub mod worker;

pub use artifacts::Artifacts;
pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{ArtifactLoadError, PipelineError};
pub use features::{FeatureAssembler, FeatureVector};
pub use pipeline::ChurnPredictor;
pub use producer::ResponseProducer;
pub use types::{customer::CustomerProfile, prediction::ChurnResponse};
pub use worker::WorkerPool;
