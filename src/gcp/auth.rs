//! Access tokens for Google APIs

use crate::error::{EnricherError, Result};
use async_trait::async_trait;
use gcp_auth::TokenProvider;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const CLOUD_PLATFORM_READ_ONLY_SCOPE: &str =
    "https://www.googleapis.com/auth/cloud-platform.read-only";
pub const BILLING_READ_ONLY_SCOPE: &str = "https://www.googleapis.com/auth/cloud-billing.readonly";
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const PUBSUB_SCOPE: &str = "https://www.googleapis.com/auth/pubsub";

/// Source of OAuth2 bearer tokens for a set of scopes
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self, scopes: &[&str]) -> Result<String>;
}

/// Application Default Credentials (metadata server, service account key, gcloud)
///
/// The provider is discovered lazily on the first token request; `gcp_auth`
/// caches tokens per scope set and refreshes them before expiry.
#[derive(Default)]
pub struct AdcTokenSource {
    provider: RwLock<Option<Arc<dyn TokenProvider>>>,
}

impl AdcTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn provider(&self) -> Result<Arc<dyn TokenProvider>> {
        if let Some(provider) = self.provider.read().await.as_ref() {
            return Ok(provider.clone());
        }

        let mut guard = self.provider.write().await;
        if let Some(provider) = guard.as_ref() {
            return Ok(provider.clone());
        }

        tracing::debug!("Initializing GCP authentication provider");
        let provider = gcp_auth::provider().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize GCP auth");
            EnricherError::Auth(format!("GCP auth initialization failed: {e}"))
        })?;
        *guard = Some(provider.clone());
        Ok(provider)
    }
}

#[async_trait]
impl TokenSource for AdcTokenSource {
    async fn token(&self, scopes: &[&str]) -> Result<String> {
        let provider = self.provider().await?;
        let token = provider
            .token(scopes)
            .await
            .map_err(|e| EnricherError::Auth(format!("GCP token acquisition failed: {e}")))?;
        Ok(token.as_str().to_string())
    }
}

/// Fixed token, for emulators and tests
#[derive(Debug, Clone)]
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self, _scopes: &[&str]) -> Result<String> {
        Ok(self.0.clone())
    }
}
