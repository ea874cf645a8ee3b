use anyhow::Context;
use audit_enricher::cache::{
    DatastoreResourceStore, InMemoryResourceStore, ResourceCache, ResourceStore,
};
use audit_enricher::config::{CacheBackend, load_settings};
use audit_enricher::enrich::Enricher;
use audit_enricher::gcp::{AdcTokenSource, GcpClient};
use audit_enricher::logging;
use audit_enricher::publish::PubSubPublisher;
use audit_enricher::resolver::Resolvers;
use audit_enricher::server;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

const STATS_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize rustls crypto provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let settings = load_settings().context("failed to load configuration")?;
    logging::init(settings.log_format);

    tracing::info!("🚀 Starting audit log enricher");
    tracing::debug!(
        project = %settings.gcp.project_id,
        topic = %settings.gcp.topic_name,
        cache_backend = ?settings.cache.backend,
        "Configuration loaded"
    );

    // One authenticated client shared by every Google API adapter
    let client = GcpClient::new(Arc::new(AdcTokenSource::new()), settings.gcp.http_timeout)
        .context("failed to build HTTP client")?;

    let store: Arc<dyn ResourceStore> = match settings.cache.backend {
        CacheBackend::Datastore => Arc::new(DatastoreResourceStore::new(
            client.clone(),
            settings.gcp.project_id.clone(),
            settings.cache.database_id.clone(),
        )),
        CacheBackend::Memory => {
            tracing::warn!("Using in-memory resource cache; resolutions are lost on restart");
            Arc::new(InMemoryResourceStore::new())
        }
    };
    let cache = Arc::new(ResourceCache::new(store));

    let publisher = Arc::new(PubSubPublisher::new(
        client.clone(),
        &settings.gcp.project_id,
        &settings.gcp.topic_name,
    ));
    tracing::info!(topic = %publisher.topic_path(), "Publisher initialized");

    let enricher = Arc::new(Enricher::new(
        cache.clone(),
        Resolvers::google(client),
        publisher,
    ));

    // Periodic cache statistics
    let stats_cache = cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATS_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            stats_cache.log_stats().await;
        }
    });

    server::serve(server::router(enricher), settings.server.port, async {
        let signal_name = setup_shutdown_handler().await;
        tracing::info!(
            signal = %signal_name,
            "Received shutdown signal, initiating graceful shutdown"
        );
    })
    .await
    .context("server error")?;

    cache.log_stats().await;
    tracing::info!("Application shutdown sequence complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM
async fn setup_shutdown_handler() -> String {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to setup SIGTERM handler, using Ctrl+C only");
                let _ = signal::ctrl_c().await;
                return "SIGINT (Ctrl+C)".to_string();
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::debug!("Caught SIGINT signal");
                "SIGINT (Ctrl+C)".to_string()
            }
            _ = sigterm.recv() => {
                tracing::debug!("Caught SIGTERM signal");
                "SIGTERM".to_string()
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        tracing::debug!("Caught Ctrl+C signal");
        "Ctrl+C".to_string()
    }
}
