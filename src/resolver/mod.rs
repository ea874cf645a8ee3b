//! Metadata resolvers
//!
//! Each resource type has an authoritative lookup: Cloud Billing for billing
//! accounts and Resource Manager v3 for folders, projects and organizations.
//! Lookups return errors; callers decide how to degrade.

mod billing;
mod resource_manager;

use crate::error::Result;
use crate::gcp::GcpClient;
use crate::resource::{ParentRef, ResourceType};
use async_trait::async_trait;
use std::sync::Arc;

pub use billing::BillingAccountResolver;
pub use resource_manager::{FolderResolver, OrganizationResolver, ProjectResolver};

/// Parent and display name of a billing account, folder or project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub parent: ParentRef,
    pub display_name: String,
}

/// Display name and directory customer (owner) of an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationInfo {
    pub display_name: String,
    pub directory_customer_id: String,
}

/// Resolves a non-organization resource to its immediate parent
#[async_trait]
pub trait ParentLookup: Send + Sync {
    async fn resolve(&self, resource_id: &str) -> Result<Resolution>;
}

/// Resolves an organization ID to its display name and owner
#[async_trait]
pub trait OrganizationLookup: Send + Sync {
    async fn resolve(&self, organization_id: &str) -> Result<OrganizationInfo>;
}

/// One resolver per resource type
#[derive(Clone)]
pub struct Resolvers {
    pub billing_account: Arc<dyn ParentLookup>,
    pub folder: Arc<dyn ParentLookup>,
    pub project: Arc<dyn ParentLookup>,
    pub organization: Arc<dyn OrganizationLookup>,
}

impl Resolvers {
    /// Resolvers backed by the public Google APIs
    pub fn google(client: GcpClient) -> Self {
        Self {
            billing_account: Arc::new(BillingAccountResolver::new(client.clone())),
            folder: Arc::new(FolderResolver::new(client.clone())),
            project: Arc::new(ProjectResolver::new(client.clone())),
            organization: Arc::new(OrganizationResolver::new(client)),
        }
    }

    /// Parent resolver for `kind`; organizations have no parent resolver
    pub fn parent_lookup(&self, kind: ResourceType) -> Option<&dyn ParentLookup> {
        match kind {
            ResourceType::BillingAccount => Some(self.billing_account.as_ref()),
            ResourceType::Folder => Some(self.folder.as_ref()),
            ResourceType::Project => Some(self.project.as_ref()),
            ResourceType::Organization => None,
        }
    }
}
