//! Firestore in Datastore mode, via the Datastore v1 REST API

use crate::cache::ResourceStore;
use crate::error::{EnricherError, Result};
use crate::gcp::{DATASTORE_SCOPE, GcpClient};
use crate::resource::{ResourceRecord, ResourceType};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DEFAULT_BASE_URL: &str = "https://datastore.googleapis.com";
const RESOURCE_KIND: &str = "Resource";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Key {
    partition_id: PartitionId,
    path: Vec<PathElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartitionId {
    project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PathElement {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp_value: Option<String>,
}

impl PropertyValue {
    fn string(value: &str) -> Self {
        Self {
            string_value: Some(value.to_string()),
            ..Default::default()
        }
    }

    fn timestamp(value: DateTime<Utc>) -> Self {
        Self {
            timestamp_value: Some(value.to_rfc3339_opts(SecondsFormat::Micros, true)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entity {
    key: Key,
    #[serde(default)]
    properties: HashMap<String, PropertyValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitRequest<'a> {
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_id: Option<&'a str>,
    mutations: Vec<Mutation>,
}

#[derive(Debug, Serialize)]
struct Mutation {
    upsert: Entity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    database_id: Option<&'a str>,
    keys: Vec<Key>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    found: Vec<EntityResult>,
}

#[derive(Debug, Deserialize)]
struct EntityResult {
    entity: Entity,
}

/// Resource store backed by Datastore entities of kind `Resource`
///
/// The key name is the resource ID, so a read is a point lookup.
pub struct DatastoreResourceStore {
    client: GcpClient,
    project_id: String,
    database_id: Option<String>,
    base_url: String,
}

impl DatastoreResourceStore {
    pub fn new(
        client: GcpClient,
        project_id: impl Into<String>,
        database_id: Option<String>,
    ) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            database_id,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/v1/projects/{}:{}", self.base_url, self.project_id, method)
    }

    fn key(&self, resource_id: &str) -> Key {
        Key {
            partition_id: PartitionId {
                project_id: self.project_id.clone(),
                database_id: self.database_id.clone(),
            },
            path: vec![PathElement {
                kind: RESOURCE_KIND.to_string(),
                name: Some(resource_id.to_string()),
            }],
        }
    }

    fn to_entity(&self, record: &ResourceRecord) -> Entity {
        let properties = HashMap::from([
            (
                "resourceId".to_string(),
                PropertyValue::string(&record.resource_id),
            ),
            (
                "resourceName".to_string(),
                PropertyValue::string(&record.resource_name),
            ),
            (
                "resourceType".to_string(),
                PropertyValue::string(record.resource_type.as_str()),
            ),
            (
                "resourceParent".to_string(),
                PropertyValue::string(&record.resource_parent),
            ),
            ("ttl".to_string(), PropertyValue::timestamp(record.ttl)),
        ]);

        Entity {
            key: self.key(&record.resource_id),
            properties,
        }
    }
}

fn string_property(entity: &Entity, name: &'static str) -> Result<String> {
    entity
        .properties
        .get(name)
        .and_then(|v| v.string_value.clone())
        .ok_or(EnricherError::MissingField(name))
}

fn from_entity(entity: &Entity) -> Result<ResourceRecord> {
    let ttl = entity
        .properties
        .get("ttl")
        .and_then(|v| v.timestamp_value.as_deref())
        .ok_or(EnricherError::MissingField("ttl"))?;
    let ttl = DateTime::parse_from_rfc3339(ttl)
        .map_err(|e| EnricherError::Store(format!("Invalid ttl timestamp {ttl}: {e}")))?
        .with_timezone(&Utc);

    Ok(ResourceRecord {
        resource_id: string_property(entity, "resourceId")?,
        resource_name: string_property(entity, "resourceName")?,
        resource_type: string_property(entity, "resourceType")?.parse::<ResourceType>()?,
        resource_parent: string_property(entity, "resourceParent")?,
        ttl,
    })
}

#[async_trait]
impl ResourceStore for DatastoreResourceStore {
    async fn put(&self, record: &ResourceRecord) -> Result<()> {
        let request = CommitRequest {
            mode: "NON_TRANSACTIONAL",
            database_id: self.database_id.as_deref(),
            mutations: vec![Mutation {
                upsert: self.to_entity(record),
            }],
        };

        let _: IgnoredAny = self
            .client
            .post_json(&self.url("commit"), &[DATASTORE_SCOPE], &request)
            .await?;
        Ok(())
    }

    async fn lookup(&self, resource_id: &str) -> Result<Option<ResourceRecord>> {
        let request = LookupRequest {
            database_id: self.database_id.as_deref(),
            keys: vec![self.key(resource_id)],
        };

        let response: LookupResponse = self
            .client
            .post_json(&self.url("lookup"), &[DATASTORE_SCOPE], &request)
            .await?;

        response
            .found
            .first()
            .map(|found| from_entity(&found.entity))
            .transpose()
    }
}
