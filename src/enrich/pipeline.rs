//! Enrichment orchestrator
//!
//! Parse the log name, resolve the owning organization through the cache or
//! the matching resolver, attach it to the message and publish. Resolver and
//! cache failures degrade to `N/A`; only bad input and publish failures are
//! returned to the caller.

use crate::cache::ResourceCache;
use crate::enrich::{AuditLogMessage, EnrichedMessage, OrgIdentity, PushEnvelope};
use crate::error::Result;
use crate::logging::{Timer, log_error};
use crate::publish::{PublishReceipt, Publisher};
use crate::resolver::Resolvers;
use crate::resource::{ResourcePath, ResourceRecord, ResourceType, UNRESOLVED};
use chrono::Utc;
use std::sync::Arc;

/// Folders nest at most ten levels below an organization
pub const MAX_FOLDER_DEPTH: usize = 10;

/// Resource resolved on the way up to its organization, pending a cache write
struct Discovered {
    kind: ResourceType,
    id: String,
    display_name: String,
}

pub struct Enricher {
    cache: Arc<ResourceCache>,
    resolvers: Resolvers,
    publisher: Arc<dyn Publisher>,
}

impl Enricher {
    pub fn new(
        cache: Arc<ResourceCache>,
        resolvers: Resolvers,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            cache,
            resolvers,
            publisher,
        }
    }

    /// Decode a push delivery, enrich it and publish the result
    pub async fn handle_push(&self, envelope: &PushEnvelope) -> Result<PublishReceipt> {
        let message = AuditLogMessage::from_slice(&envelope.data()?)?;
        tracing::debug!(
            message_id = ?envelope.message.message_id,
            subscription = ?envelope.subscription,
            attributes = ?envelope.message.attributes,
            "Received push delivery"
        );
        self.process(message).await
    }

    /// Enrich `message` and publish it
    pub async fn process(&self, message: AuditLogMessage) -> Result<PublishReceipt> {
        let _timer = Timer::new("enrich_and_publish");

        let enriched = self.enrich(message).await?;
        tracing::info!(
            log_name = %enriched.message.log_name,
            org_id = %enriched.org_id,
            org_name = %enriched.org_name,
            "Enriched audit log message"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(json) = serde_json::to_string(&enriched) {
                tracing::debug!(message = %json, "Enriched message body");
            }
        }

        self.publisher.publish(&enriched).await
    }

    /// Attach the owning organization to `message`
    pub async fn enrich(&self, message: AuditLogMessage) -> Result<EnrichedMessage> {
        let path: ResourcePath = message.log_name.parse()?;
        tracing::info!(
            resource_type = %path.kind,
            resource_id = %path.id,
            "Processing audit log"
        );

        let identity = self.resolve_identity(&path).await;
        Ok(EnrichedMessage::new(message, identity))
    }

    /// Organization ID and name for the resource at `path`
    pub async fn resolve_identity(&self, path: &ResourcePath) -> OrgIdentity {
        // An organization resolves in a single step: it is its own owner
        if path.kind == ResourceType::Organization {
            return self.resolve_organization(&path.id).await;
        }

        match self.resolve_owning_org(path.kind, &path.id).await {
            Some(org_id) => self.resolve_organization(&org_id).await,
            None => OrgIdentity::unresolved(),
        }
    }

    /// Organization ID owning a billing account, folder or project
    ///
    /// Parent folders are walked until an organization is reached. Every
    /// resource resolved on the way is cached with the organization as parent.
    async fn resolve_owning_org(&self, kind: ResourceType, id: &str) -> Option<String> {
        let mut current = (kind, id.to_string());
        let mut discovered: Vec<Discovered> = Vec::new();

        let org_id = loop {
            let (kind, id) = current;

            if let Some(record) = self.cache.get(&id).await {
                break record.resource_parent;
            }

            if discovered.len() > MAX_FOLDER_DEPTH {
                tracing::warn!(
                    resource_id = %id,
                    depth = discovered.len(),
                    "Folder hierarchy too deep, giving up"
                );
                return None;
            }

            let lookup = self.resolvers.parent_lookup(kind)?;
            let resolution = match lookup.resolve(&id).await {
                Ok(resolution) => resolution,
                Err(e) => {
                    log_error(&format!("resolve_{kind}"), &e);
                    return None;
                }
            };

            let parent = resolution.parent;
            discovered.push(Discovered {
                kind,
                id,
                display_name: resolution.display_name,
            });

            match parent.kind {
                ResourceType::Organization => break parent.id,
                ResourceType::Folder => current = (ResourceType::Folder, parent.id),
                other => {
                    tracing::warn!(
                        parent_type = %other,
                        parent_id = %parent.id,
                        "Unexpected parent type"
                    );
                    return None;
                }
            }
        };

        if org_id == UNRESOLVED {
            return None;
        }

        let now = Utc::now();
        for resource in discovered {
            let record = ResourceRecord::new(
                resource.id,
                resource.display_name,
                resource.kind,
                org_id.clone(),
                now,
            );
            self.cache.put(&record).await;
        }

        Some(org_id)
    }

    /// Display name of `org_id`, from the cache or Resource Manager
    async fn resolve_organization(&self, org_id: &str) -> OrgIdentity {
        if let Some(record) = self.cache.get(org_id).await {
            return OrgIdentity::new(org_id, record.resource_name);
        }

        match self.resolvers.organization.resolve(org_id).await {
            Ok(info) => {
                let record = ResourceRecord::new(
                    org_id,
                    info.display_name.clone(),
                    ResourceType::Organization,
                    info.directory_customer_id,
                    Utc::now(),
                );
                self.cache.put(&record).await;
                OrgIdentity::new(org_id, info.display_name)
            }
            Err(e) => {
                log_error("resolve_organization", &e);
                OrgIdentity::new(org_id, UNRESOLVED)
            }
        }
    }
}
