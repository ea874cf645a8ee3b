//! Resource hierarchy model
//!
//! Audit logs are written under `organizations/`, `billingAccounts/`,
//! `folders/` or `projects/`. This module parses those paths and defines the
//! record shape persisted by the resource cache.

mod types;

pub use types::{
    MAX_RESOURCE_TTL_DAYS, ParentRef, ResourcePath, ResourceRecord, ResourceType, UNRESOLVED,
    split_resource_path,
};
