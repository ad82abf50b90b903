//! NATS producer for churn scoring responses

use crate::types::prediction::ChurnResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes responses, to a request's reply subject when it has one
#[derive(Clone)]
pub struct ResponseProducer {
    client: Client,
    subject: String,
}

impl ResponseProducer {
    /// Create a new response producer with a fallback result subject
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a response, preferring the request's reply subject
    pub async fn publish(&self, reply: Option<Subject>, response: &ChurnResponse) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        let subject = reply.unwrap_or_else(|| Subject::from(self.subject.as_str()));

        debug!(subject = %subject, bytes = payload.len(), "Publishing churn response");

        self.client.publish(subject, payload.into()).await?;
        Ok(())
    }

    /// Get the fallback subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
