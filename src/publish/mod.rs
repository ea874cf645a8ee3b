//! Outbound publishing of enriched messages

mod pubsub;

use crate::enrich::EnrichedMessage;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

pub use pubsub::PubSubPublisher;

/// Confirmation returned by the transport for an accepted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub message_id: String,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, message: &EnrichedMessage) -> Result<PublishReceipt>;
}

#[derive(Serialize)]
struct OutboundEnvelope<'a> {
    data: OutboundData<'a>,
}

#[derive(Serialize)]
struct OutboundData<'a> {
    message: &'a EnrichedMessage,
}

/// Serialize `message` as the `{"data": {"message": ...}}` document consumers expect
pub fn encode_payload(message: &EnrichedMessage) -> Result<Vec<u8>> {
    let envelope = OutboundEnvelope {
        data: OutboundData { message },
    };
    Ok(serde_json::to_vec(&envelope)?)
}
