//! Audit log message types

use crate::error::{EnricherError, Result};
use crate::resource::UNRESOLVED;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

const ORG_NAME_FIELD: &str = "orgName";
const ORG_ID_FIELD: &str = "orgId";

/// Inbound audit log entry
///
/// Only `logName` is interpreted; every other field passes through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogMessage {
    #[serde(rename = "logName")]
    pub log_name: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AuditLogMessage {
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| EnricherError::InvalidPayload(format!("audit log entry: {e}")))
    }
}

/// Organization that owns the resource an audit log was written under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgIdentity {
    pub org_id: String,
    pub org_name: String,
}

impl OrgIdentity {
    pub fn new(org_id: impl Into<String>, org_name: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            org_name: org_name.into(),
        }
    }

    pub fn unresolved() -> Self {
        Self::new(UNRESOLVED, UNRESOLVED)
    }
}

/// Audit log entry plus the owning organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMessage {
    #[serde(flatten)]
    pub message: AuditLogMessage,

    #[serde(rename = "orgName")]
    pub org_name: String,

    #[serde(rename = "orgId")]
    pub org_id: String,
}

impl EnrichedMessage {
    /// Attach `identity`, replacing any organization fields already present
    pub fn new(mut message: AuditLogMessage, identity: OrgIdentity) -> Self {
        message.fields.remove(ORG_NAME_FIELD);
        message.fields.remove(ORG_ID_FIELD);

        Self {
            message,
            org_name: identity.org_name,
            org_id: identity.org_id,
        }
    }
}

/// Body of a Pub/Sub push delivery (also the Eventarc CloudEvent data)
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,

    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    /// Base64 encoded payload
    #[serde(default)]
    pub data: Option<String>,

    #[serde(default)]
    pub message_id: Option<String>,

    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl PushEnvelope {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| EnricherError::InvalidPayload(format!("push envelope: {e}")))
    }

    /// Decoded message payload
    pub fn data(&self) -> Result<Vec<u8>> {
        let data = self
            .message
            .data
            .as_deref()
            .ok_or_else(|| EnricherError::InvalidPayload("message has no data".to_string()))?;

        STANDARD
            .decode(data)
            .map_err(|e| EnricherError::InvalidPayload(format!("message data is not base64: {e}")))
    }
}
