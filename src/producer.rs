//! NATS message producer for score responses

use crate::types::score::ScoreResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes score responses to the requester and the results subject
#[derive(Clone)]
pub struct ResultProducer {
    client: Client,
    subject: String,
}

impl ResultProducer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a response, replying directly when the request carried a reply subject
    pub async fn publish(&self, response: &ScoreResponse, reply: Option<Subject>) -> Result<()> {
        let payload = serde_json::to_vec(response)?;

        if let Some(reply) = reply {
            self.client.publish(reply, payload.clone().into()).await?;
        }

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            request_id = %response.request_id,
            subject = %self.subject,
            "Published score response"
        );

        Ok(())
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
