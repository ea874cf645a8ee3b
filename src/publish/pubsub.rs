use crate::enrich::EnrichedMessage;
use crate::error::{EnricherError, Result};
use crate::gcp::{GcpClient, PUBSUB_SCOPE};
use crate::publish::{PublishReceipt, Publisher, encode_payload};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://pubsub.googleapis.com";

#[derive(Debug, Serialize)]
struct PublishRequest {
    messages: Vec<PubsubMessage>,
}

#[derive(Debug, Serialize)]
struct PubsubMessage {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

/// Publishes to a Pub/Sub topic through the v1 REST API
pub struct PubSubPublisher {
    client: GcpClient,
    topic_path: String,
    base_url: String,
}

impl PubSubPublisher {
    pub fn new(client: GcpClient, project_id: &str, topic_name: &str) -> Self {
        Self {
            client,
            topic_path: format!("projects/{}/topics/{}", project_id, topic_name),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn topic_path(&self) -> &str {
        &self.topic_path
    }
}

#[async_trait]
impl Publisher for PubSubPublisher {
    async fn publish(&self, message: &EnrichedMessage) -> Result<PublishReceipt> {
        let request = PublishRequest {
            messages: vec![PubsubMessage {
                data: STANDARD.encode(encode_payload(message)?),
            }],
        };
        let url = format!("{}/v1/{}:publish", self.base_url, self.topic_path);

        let response: PublishResponse = self
            .client
            .post_json(&url, &[PUBSUB_SCOPE], &request)
            .await
            .map_err(|e| {
                tracing::error!(
                    topic = %self.topic_path,
                    error = %e,
                    "Error publishing the message"
                );
                EnricherError::Publish(e.to_string())
            })?;

        let message_id = response
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| EnricherError::Publish("no message ID returned".to_string()))?;

        tracing::info!(
            topic = %self.topic_path,
            message_id = %message_id,
            "Message published"
        );
        Ok(PublishReceipt { message_id })
    }
}
