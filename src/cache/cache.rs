//! Resource cache with read-time TTL expiry

use crate::cache::ResourceStore;
use crate::logging::log_error;
use crate::resource::{MAX_RESOURCE_TTL_DAYS, ResourceRecord};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub writes: u64,
    pub store_errors: u64,
}

/// Best-effort cache of resolved resources
///
/// Expired records are never deleted; they read as absent and are
/// overwritten by the next successful resolution. Store failures are logged
/// and behave like a miss (reads) or a lost write (writes).
pub struct ResourceCache {
    /// Durable record store
    store: Arc<dyn ResourceStore>,

    /// Records at least this old are treated as absent
    max_age: Duration,

    /// Cache statistics
    stats: Arc<RwLock<CacheStats>>,
}

impl ResourceCache {
    /// Create a cache with the standard two-day validity window
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self::with_max_age(store, Duration::days(MAX_RESOURCE_TTL_DAYS))
    }

    /// Create a cache with a custom validity window
    pub fn with_max_age(store: Arc<dyn ResourceStore>, max_age: Duration) -> Self {
        tracing::info!(
            max_age_hours = max_age.num_hours(),
            "Creating resource cache"
        );

        Self {
            store,
            max_age,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    /// Get a valid record for `resource_id`
    pub async fn get(&self, resource_id: &str) -> Option<ResourceRecord> {
        self.get_at(resource_id, Utc::now()).await
    }

    /// Get a record that is still valid at `now`
    pub async fn get_at(&self, resource_id: &str, now: DateTime<Utc>) -> Option<ResourceRecord> {
        let record = match self.store.lookup(resource_id).await {
            Ok(record) => record,
            Err(e) => {
                self.stats.write().await.store_errors += 1;
                log_error("resource_cache_lookup", &e);
                return None;
            }
        };

        match record {
            Some(record) if record.is_valid(now, self.max_age) => {
                self.stats.write().await.hits += 1;
                tracing::info!(
                    resource_id = %resource_id,
                    resource_name = %record.resource_name,
                    "Resource found in cache"
                );
                Some(record)
            }
            Some(record) => {
                self.stats.write().await.expired += 1;
                tracing::info!(
                    resource_id = %resource_id,
                    age_hours = record.age(now).num_hours(),
                    "Resource found in cache but expired"
                );
                None
            }
            None => {
                self.stats.write().await.misses += 1;
                tracing::info!(resource_id = %resource_id, "Resource not found in cache");
                None
            }
        }
    }

    /// Persist a record, overwriting any previous record with the same ID
    pub async fn put(&self, record: &ResourceRecord) {
        tracing::info!(
            resource_id = %record.resource_id,
            resource_type = %record.resource_type,
            "Persisting resource"
        );

        match self.store.put(record).await {
            Ok(()) => {
                self.stats.write().await.writes += 1;
                tracing::info!(resource_id = %record.resource_id, "Resource persisted");
            }
            Err(e) => {
                self.stats.write().await.store_errors += 1;
                log_error("resource_cache_put", &e);
            }
        }
    }

    /// Get cache statistics
    pub async fn get_stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    /// Log cache statistics (for periodic monitoring)
    pub async fn log_stats(&self) {
        let stats = self.get_stats().await;
        let lookups = stats.hits + stats.misses + stats.expired;

        let hit_rate = if lookups > 0 {
            (stats.hits as f32 / lookups as f32 * 100.0) as u32
        } else {
            0
        };

        tracing::info!(
            hits = stats.hits,
            misses = stats.misses,
            expired = stats.expired,
            writes = stats.writes,
            store_errors = stats.store_errors,
            hit_rate = hit_rate,
            "Resource cache statistics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryResourceStore;
    use crate::error::{EnricherError, Result};
    use crate::resource::ResourceType;
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl ResourceStore for FailingStore {
        async fn put(&self, _record: &ResourceRecord) -> Result<()> {
            Err(EnricherError::Store("unavailable".to_string()))
        }

        async fn lookup(&self, _resource_id: &str) -> Result<Option<ResourceRecord>> {
            Err(EnricherError::Store("unavailable".to_string()))
        }
    }

    fn record_at(ttl: DateTime<Utc>) -> ResourceRecord {
        ResourceRecord::new("123", "Acme Project", ResourceType::Project, "999", ttl)
    }

    #[tokio::test]
    async fn test_fresh_record_is_returned() {
        let store = Arc::new(InMemoryResourceStore::new());
        let cache = ResourceCache::new(store.clone());
        let now = Utc::now();

        cache.put(&record_at(now - Duration::hours(47))).await;

        let hit = cache.get_at("123", now).await.unwrap();
        assert_eq!(hit.resource_parent, "999");
        assert_eq!(cache.get_stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_record_at_or_past_two_days_is_absent() {
        let store = Arc::new(InMemoryResourceStore::new());
        let cache = ResourceCache::new(store.clone());
        let now = Utc::now();

        cache.put(&record_at(now - Duration::days(2))).await;
        assert!(cache.get_at("123", now).await.is_none());

        cache.put(&record_at(now - Duration::days(30))).await;
        assert!(cache.get_at("123", now).await.is_none());

        // Stale records linger in the store
        assert_eq!(store.len(), 1);
        assert_eq!(cache.get_stats().await.expired, 2);
    }

    #[tokio::test]
    async fn test_missing_record_is_miss() {
        let cache = ResourceCache::new(Arc::new(InMemoryResourceStore::new()));
        assert!(cache.get("nope").await.is_none());
        assert_eq!(cache.get_stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_store_errors_are_swallowed() {
        let cache = ResourceCache::new(Arc::new(FailingStore));

        cache.put(&record_at(Utc::now())).await;
        assert!(cache.get("123").await.is_none());

        let stats = cache.get_stats().await;
        assert_eq!(stats.store_errors, 2);
        assert_eq!(stats.writes, 0);
        cache.log_stats().await;
    }

    #[tokio::test]
    async fn test_custom_max_age() {
        let store = Arc::new(InMemoryResourceStore::new());
        let cache = ResourceCache::with_max_age(store, Duration::minutes(10));
        let now = Utc::now();

        cache.put(&record_at(now - Duration::minutes(11))).await;
        assert!(cache.get_at("123", now).await.is_none());
    }
}
