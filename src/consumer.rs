//! NATS subscription for incoming credit applications

use crate::config::NatsConfig;
use crate::error::ScoringError;
use crate::types::ApplicantProfile;
use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Receives applicant profiles as NATS requests.
///
/// With a queue group configured, every service instance joins the same
/// group and NATS delivers each application to only one of them.
pub struct ApplicationConsumer {
    client: Client,
    subject: String,
    queue_group: Option<String>,
}

impl ApplicationConsumer {
    pub fn new(client: Client, nats: &NatsConfig) -> Self {
        Self {
            client,
            subject: nats.request_subject.clone(),
            queue_group: nats.queue_group.clone(),
        }
    }

    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = match &self.queue_group {
            Some(group) => {
                self.client
                    .queue_subscribe(self.subject.clone(), group.clone())
                    .await?
            }
            None => self.client.subscribe(self.subject.clone()).await?,
        };
        info!(
            subject = %self.subject,
            queue_group = self.queue_group.as_deref().unwrap_or("-"),
            "Subscribed to application subject"
        );
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn queue_group(&self) -> Option<&str> {
        self.queue_group.as_deref()
    }
}

/// Parse a request payload into an applicant profile.
///
/// Malformed JSON and unknown categorical values both come back as
/// `InvalidInput`; the reason carries the serde message, which names the
/// offending field.
pub fn decode_application(payload: &[u8]) -> Result<ApplicantProfile, ScoringError> {
    serde_json::from_slice(payload).map_err(|e| ScoringError::invalid("payload", e.to_string()))
}
