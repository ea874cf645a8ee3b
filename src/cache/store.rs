use crate::error::Result;
use crate::resource::ResourceRecord;
use async_trait::async_trait;
use dashmap::DashMap;

/// Durable key-value storage for resource records, keyed by resource ID
///
/// Writes are upserts; the store never filters by age.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn put(&self, record: &ResourceRecord) -> Result<()>;

    async fn lookup(&self, resource_id: &str) -> Result<Option<ResourceRecord>>;
}

/// Process-local store, for local runs and tests
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    records: DashMap<String, ResourceRecord>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of a stored record regardless of its age
    pub fn get(&self, resource_id: &str) -> Option<ResourceRecord> {
        self.records.get(resource_id).map(|r| r.clone())
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn put(&self, record: &ResourceRecord) -> Result<()> {
        self.records.insert(record.resource_id.clone(), record.clone());
        Ok(())
    }

    async fn lookup(&self, resource_id: &str) -> Result<Option<ResourceRecord>> {
        Ok(self.get(resource_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceType;
    use chrono::Utc;

    #[tokio::test]
    async fn test_put_overwrites_same_id() {
        let store = InMemoryResourceStore::new();
        let first = ResourceRecord::new("123", "Old", ResourceType::Project, "9", Utc::now());
        let second = ResourceRecord::new("123", "New", ResourceType::Project, "9", Utc::now());

        store.put(&first).await.unwrap();
        store.put(&second).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.lookup("123").await.unwrap().unwrap().resource_name,
            "New"
        );
        assert!(store.lookup("456").await.unwrap().is_none());
    }
}
