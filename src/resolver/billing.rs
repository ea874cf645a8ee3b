use crate::error::{EnricherError, Result};
use crate::gcp::{BILLING_READ_ONLY_SCOPE, GcpClient};
use crate::resolver::{ParentLookup, Resolution};
use crate::resource::ParentRef;
use async_trait::async_trait;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://cloudbilling.googleapis.com";

/// `billingAccounts.get` response
///
/// `parent` is not part of the documented schema and may disappear at any time.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BillingAccount {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    parent: Option<String>,
}

/// Cloud Billing v1 lookup; needs `roles/billing.viewer` on the account
pub struct BillingAccountResolver {
    client: GcpClient,
    base_url: String,
}

impl BillingAccountResolver {
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
impl ParentLookup for BillingAccountResolver {
    async fn resolve(&self, resource_id: &str) -> Result<Resolution> {
        let url = format!("{}/v1/billingAccounts/{}", self.base_url, resource_id);
        let account: BillingAccount = self
            .client
            .get_json(&url, &[BILLING_READ_ONLY_SCOPE])
            .await?;

        let parent: ParentRef = account
            .parent
            .ok_or(EnricherError::MissingField("parent"))?
            .parse()?;
        let display_name = account
            .display_name
            .ok_or(EnricherError::MissingField("displayName"))?;

        tracing::debug!(
            billing_account = %resource_id,
            display_name = %display_name,
            "Resolved billing account"
        );
        Ok(Resolution {
            parent,
            display_name,
        })
    }
}
