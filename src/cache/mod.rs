//! Resource resolution cache
//!
//! Resolved resources are persisted with the time they were resolved and
//! trusted for two days. Key features:
//! - Read-time expiry: stale records read as misses and are never deleted
//! - Best-effort: store failures degrade to misses instead of failing a request
//! - Pluggable storage: Datastore in production, in-memory for local runs

#[allow(clippy::module_inception)]
mod cache;
mod datastore;
mod store;

pub use cache::{CacheStats, ResourceCache};
pub use datastore::DatastoreResourceStore;
pub use store::{InMemoryResourceStore, ResourceStore};
