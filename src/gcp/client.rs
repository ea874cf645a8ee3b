use crate::error::{EnricherError, Result};
use crate::gcp::TokenSource;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Authenticated JSON client shared by every Google REST adapter
#[derive(Clone)]
pub struct GcpClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for GcpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpClient").finish_non_exhaustive()
    }
}

impl GcpClient {
    pub fn new(tokens: Arc<dyn TokenSource>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("audit-enricher/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, tokens })
    }

    /// GET `url` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, scopes: &[&str]) -> Result<T> {
        let token = self.tokens.token(scopes).await?;
        tracing::trace!(url = %url, "GET");

        let response = self.http.get(url).bearer_auth(&token).send().await?;
        Self::decode(response).await
    }

    /// POST `body` as JSON to `url` and decode the JSON response
    pub async fn post_json<B, T>(&self, url: &str, scopes: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.tokens.token(scopes).await?;
        tracing::trace!(url = %url, "POST");

        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = %status, body = %body, "API error response");
            return Err(EnricherError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcp::StaticTokenSource;
    use serde_json::{Value, json};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> GcpClient {
        GcpClient::new(
            Arc::new(StaticTokenSource::new("secret")),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_json_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/thing"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let body: Value = client()
            .get_json(&format!("{}/v1/thing", server.uri()), &[])
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_error_status_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let err = client()
            .post_json::<_, Value>(&server.uri(), &[], &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EnricherError::Api { status: 403, ref body } if body == "permission denied"
        ));
    }
}
