//! Resource Manager v3 lookups for folders, projects and organizations

use crate::error::{EnricherError, Result};
use crate::gcp::{CLOUD_PLATFORM_READ_ONLY_SCOPE, GcpClient};
use crate::resolver::{OrganizationInfo, OrganizationLookup, ParentLookup, Resolution};
use crate::resource::{ParentRef, ResourceType};
use async_trait::async_trait;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://cloudresourcemanager.googleapis.com";

/// Common shape of `folders.get` and `projects.get`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Container {
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Organization {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    directory_customer_id: Option<String>,
}

async fn get_container(
    client: &GcpClient,
    base_url: &str,
    kind: ResourceType,
    resource_id: &str,
) -> Result<Resolution> {
    let url = format!("{}/v3/{}/{}", base_url, kind, resource_id);
    let container: Container = client
        .get_json(&url, &[CLOUD_PLATFORM_READ_ONLY_SCOPE])
        .await?;

    let parent: ParentRef = container
        .parent
        .ok_or(EnricherError::MissingField("parent"))?
        .parse()?;
    let display_name = container
        .display_name
        .ok_or(EnricherError::MissingField("displayName"))?;

    tracing::debug!(
        resource_type = %kind,
        resource_id = %resource_id,
        parent_type = %parent.kind,
        parent_id = %parent.id,
        "Resolved resource parent"
    );
    Ok(Resolution {
        parent,
        display_name,
    })
}

/// Needs `resourcemanager.folders.get` on the folder
pub struct FolderResolver {
    client: GcpClient,
    base_url: String,
}

impl FolderResolver {
    pub fn new(client: GcpClient) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ParentLookup for FolderResolver {
    async fn resolve(&self, resource_id: &str) -> Result<Resolution> {
        get_container(&self.client, &self.base_url, ResourceType::Folder, resource_id).await
    }
}

/// Accepts either a project number or a project ID
pub struct ProjectResolver {
    client: GcpClient,
    base_url: String,
}

impl ProjectResolver {
    pub fn new(client: GcpClient) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ParentLookup for ProjectResolver {
    async fn resolve(&self, resource_id: &str) -> Result<Resolution> {
        get_container(&self.client, &self.base_url, ResourceType::Project, resource_id).await
    }
}

/// Needs `resourcemanager.organizations.get` on the organization
pub struct OrganizationResolver {
    client: GcpClient,
    base_url: String,
}

impl OrganizationResolver {
    pub fn new(client: GcpClient) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl OrganizationLookup for OrganizationResolver {
    async fn resolve(&self, organization_id: &str) -> Result<OrganizationInfo> {
        let url = format!("{}/v3/organizations/{}", self.base_url, organization_id);
        let organization: Organization = self
            .client
            .get_json(&url, &[CLOUD_PLATFORM_READ_ONLY_SCOPE])
            .await?;

        let display_name = organization
            .display_name
            .ok_or(EnricherError::MissingField("displayName"))?;

        Ok(OrganizationInfo {
            display_name,
            // Organizations without a Workspace / Cloud Identity account have no owner
            directory_customer_id: organization.directory_customer_id.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcp::StaticTokenSource;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> GcpClient {
        GcpClient::new(
            Arc::new(StaticTokenSource::new("rm-token")),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_project_resolves_to_organization_parent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/projects/123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/123",
                "parent": "organizations/999",
                "projectId": "acme-prod",
                "state": "ACTIVE",
                "displayName": "Acme Project"
            })))
            .mount(&server)
            .await;

        let resolution = ProjectResolver::new(client())
            .with_base_url(server.uri())
            .resolve("123")
            .await
            .unwrap();
        assert_eq!(resolution.parent, ParentRef::organization("999"));
        assert_eq!(resolution.display_name, "Acme Project");
    }

    #[tokio::test]
    async fn test_folder_can_have_folder_parent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/folders/55"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "folders/55",
                "parent": "folders/44",
                "displayName": "Team A"
            })))
            .mount(&server)
            .await;

        let resolution = FolderResolver::new(client())
            .with_base_url(server.uri())
            .resolve("55")
            .await
            .unwrap();
        assert_eq!(resolution.parent, ParentRef::folder("44"));
    }

    #[tokio::test]
    async fn test_organization_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/organizations/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "organizations/42",
                "displayName": "Root Org",
                "directoryCustomerId": "owner9",
                "state": "ACTIVE"
            })))
            .mount(&server)
            .await;

        let info = OrganizationResolver::new(client())
            .with_base_url(server.uri())
            .resolve("42")
            .await
            .unwrap();
        assert_eq!(info.display_name, "Root Org");
        assert_eq!(info.directory_customer_id, "owner9");
    }

    #[tokio::test]
    async fn test_not_found_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = ProjectResolver::new(client())
            .with_base_url(server.uri())
            .resolve("missing")
            .await
            .unwrap_err();
        assert!(matches!(err, EnricherError::Api { status: 404, .. }));
    }
}
