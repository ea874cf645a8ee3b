//! HTTP endpoint for Pub/Sub push and Eventarc deliveries
//!
//! Any non-2xx response makes the transport redeliver, so only publish
//! failures answer 500. Undecodable input is acknowledged and dropped.

use crate::enrich::{Enricher, PushEnvelope};
use crate::error::{EnricherError, Result};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    enricher: Arc<Enricher>,
}

/// Error wrapper mapping pipeline failures to HTTP responses
///
/// Bad input is acknowledged with 200 since retrying it cannot succeed.
struct ApiError(EnricherError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_bad_input() {
            tracing::warn!(error = %self.0, "Dropping undecodable delivery");
            return (StatusCode::OK, "Message dropped.").into_response();
        }

        tracing::error!(error = %self.0, "Delivery failed, requesting redelivery");
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

pub fn router(enricher: Arc<Enricher>) -> Router {
    Router::new()
        .route("/", post(handle_push))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { enricher })
}

async fn handle_push(State(state): State<AppState>, body: Bytes) -> Response {
    let result = match PushEnvelope::from_slice(&body) {
        Ok(envelope) => state.enricher.handle_push(&envelope).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_receipt) => (StatusCode::OK, "Message published.").into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serve `router` on `port` until `shutdown` resolves
pub async fn serve(
    router: Router,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let address = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(address = %address, "Listening for push deliveries");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemoryResourceStore, ResourceCache};
    use crate::enrich::EnrichedMessage;
    use crate::publish::{PublishReceipt, Publisher};
    use crate::resolver::{
        OrganizationInfo, OrganizationLookup, ParentLookup, Resolution, Resolvers,
    };
    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    struct NoParent;

    #[async_trait]
    impl ParentLookup for NoParent {
        async fn resolve(&self, _resource_id: &str) -> Result<Resolution> {
            Err(EnricherError::Api {
                status: 403,
                body: "denied".to_string(),
            })
        }
    }

    struct StaticOrganization;

    #[async_trait]
    impl OrganizationLookup for StaticOrganization {
        async fn resolve(&self, _organization_id: &str) -> Result<OrganizationInfo> {
            Ok(OrganizationInfo {
                display_name: "Root Org".to_string(),
                directory_customer_id: "owner9".to_string(),
            })
        }
    }

    struct StubPublisher {
        fail: bool,
    }

    #[async_trait]
    impl Publisher for StubPublisher {
        async fn publish(&self, _message: &EnrichedMessage) -> Result<PublishReceipt> {
            if self.fail {
                Err(EnricherError::Publish("unavailable".to_string()))
            } else {
                Ok(PublishReceipt {
                    message_id: "1".to_string(),
                })
            }
        }
    }

    fn state(fail_publish: bool) -> State<AppState> {
        let no_parent: Arc<dyn ParentLookup> = Arc::new(NoParent);
        let resolvers = Resolvers {
            billing_account: no_parent.clone(),
            folder: no_parent.clone(),
            project: no_parent,
            organization: Arc::new(StaticOrganization),
        };
        let enricher = Enricher::new(
            Arc::new(ResourceCache::new(Arc::new(InMemoryResourceStore::new()))),
            resolvers,
            Arc::new(StubPublisher { fail: fail_publish }),
        );
        State(AppState {
            enricher: Arc::new(enricher),
        })
    }

    fn push_body(log_name: &str) -> Bytes {
        let data = STANDARD.encode(serde_json::to_vec(&json!({"logName": log_name})).unwrap());
        Bytes::from(serde_json::to_vec(&json!({"message": {"data": data}})).unwrap())
    }

    #[tokio::test]
    async fn test_successful_delivery_is_200() {
        let response = handle_push(state(false), push_body("organizations/42/logs/y")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Message published.");
    }

    #[tokio::test]
    async fn test_unresolvable_resource_still_publishes() {
        let response = handle_push(state(false), push_body("projects/1/logs/x")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_publish_failure_is_500() {
        let response = handle_push(state(true), push_body("organizations/42/logs/y")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_bad_input_is_acknowledged_without_redelivery() {
        for body in [
            Bytes::from_static(b"{}"),
            Bytes::from_static(b"not json"),
            push_body("datasets/1/logs/x"),
            push_body("projects//logs/x"),
        ] {
            let response = handle_push(state(false), body).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_text(response).await, "Message dropped.");
        }
    }

    #[tokio::test]
    async fn test_only_publish_failure_requests_redelivery() {
        let response = handle_push(state(true), push_body("datasets/1/logs/x")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = handle_push(state(true), push_body("projects/1/logs/x")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_healthz() {
        assert_eq!(healthz().await, "ok");
    }
}
