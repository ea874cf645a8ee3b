//! Resource identifiers and cached resource records

use crate::error::{EnricherError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder for any value that could not be resolved
pub const UNRESOLVED: &str = "N/A";

/// Maximum age of a cached resource record before it must be resolved again
pub const MAX_RESOURCE_TTL_DAYS: i64 = 2;

/// Kinds of resource an audit log can be written under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "organizations")]
    Organization,
    #[serde(rename = "billingAccounts")]
    BillingAccount,
    #[serde(rename = "folders")]
    Folder,
    #[serde(rename = "projects")]
    Project,
}

impl ResourceType {
    /// Collection name as it appears in resource paths (e.g. `projects`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organizations",
            Self::BillingAccount => "billingAccounts",
            Self::Folder => "folders",
            Self::Project => "projects",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = EnricherError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "organizations" => Ok(Self::Organization),
            "billingAccounts" => Ok(Self::BillingAccount),
            "folders" => Ok(Self::Folder),
            "projects" => Ok(Self::Project),
            other => Err(EnricherError::UnknownResourceType(other.to_string())),
        }
    }
}

/// Split a path on its first two `/` separators into `(type, id, rest)`
///
/// Missing segments come back empty. No validation happens here.
pub fn split_resource_path(path: &str) -> (&str, &str, &str) {
    let mut parts = path.splitn(3, '/');
    let kind = parts.next().unwrap_or_default();
    let id = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default();
    (kind, id, rest)
}

/// A parsed `{type}/{id}/...` path such as `projects/123/logs/x`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    pub kind: ResourceType,
    pub id: String,
    pub rest: String,
}

impl FromStr for ResourcePath {
    type Err = EnricherError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, id, rest) = split_resource_path(s);
        if id.is_empty() {
            return Err(EnricherError::MalformedIdentifier(s.to_string()));
        }

        Ok(Self {
            kind: kind.parse()?,
            id: id.to_string(),
            rest: rest.to_string(),
        })
    }
}

/// Immediate parent of a resource, as reported by the authoritative API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub kind: ResourceType,
    pub id: String,
}

impl ParentRef {
    pub fn organization(id: impl Into<String>) -> Self {
        Self {
            kind: ResourceType::Organization,
            id: id.into(),
        }
    }

    pub fn folder(id: impl Into<String>) -> Self {
        Self {
            kind: ResourceType::Folder,
            id: id.into(),
        }
    }
}

impl FromStr for ParentRef {
    type Err = EnricherError;

    fn from_str(s: &str) -> Result<Self> {
        let path: ResourcePath = s.parse()?;
        Ok(Self {
            kind: path.kind,
            id: path.id,
        })
    }
}

/// Cached resolution of a single resource
///
/// `resource_parent` holds the owning organization ID, except for
/// organization records where it holds the directory customer ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub resource_id: String,
    pub resource_name: String,
    pub resource_type: ResourceType,
    pub resource_parent: String,
    /// When the resource was resolved
    pub ttl: DateTime<Utc>,
}

impl ResourceRecord {
    pub fn new(
        resource_id: impl Into<String>,
        resource_name: impl Into<String>,
        resource_type: ResourceType,
        resource_parent: impl Into<String>,
        ttl: DateTime<Utc>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_name: resource_name.into(),
            resource_type,
            resource_parent: resource_parent.into(),
            ttl,
        }
    }

    /// Age of the record relative to `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.ttl
    }

    /// A record is valid while it is younger than `max_age`
    pub fn is_valid(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) < max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_resource_path() {
        assert_eq!(
            split_resource_path("projects/123/logs/cloudaudit.googleapis.com%2Factivity"),
            ("projects", "123", "logs/cloudaudit.googleapis.com%2Factivity")
        );
        assert_eq!(
            split_resource_path("organizations/456"),
            ("organizations", "456", "")
        );
        assert_eq!(split_resource_path("nonsense"), ("nonsense", "", ""));
    }

    #[test]
    fn test_parse_resource_path() {
        let path: ResourcePath = "billingAccounts/0X0X0X-0X0X0X-0X0X0X/logs/y".parse().unwrap();

        assert_eq!(path.kind, ResourceType::BillingAccount);
        assert_eq!(path.id, "0X0X0X-0X0X0X-0X0X0X");
        assert_eq!(path.rest, "logs/y");
    }

    #[test]
    fn test_unknown_type_is_explicit_error() {
        let err = "datasets/1/logs/x".parse::<ResourcePath>().unwrap_err();
        assert!(matches!(err, EnricherError::UnknownResourceType(t) if t == "datasets"));
    }

    #[test]
    fn test_missing_id_is_malformed() {
        assert!(matches!(
            "projects".parse::<ResourcePath>(),
            Err(EnricherError::MalformedIdentifier(_))
        ));
        assert!(matches!(
            "projects//logs".parse::<ResourcePath>(),
            Err(EnricherError::MalformedIdentifier(_))
        ));
    }

    #[test]
    fn test_parent_ref_parse() {
        assert_eq!(
            "organizations/999".parse::<ParentRef>().unwrap(),
            ParentRef::organization("999")
        );
        assert_eq!(
            "folders/77".parse::<ParentRef>().unwrap(),
            ParentRef::folder("77")
        );
    }

    #[test]
    fn test_record_validity_window() {
        let now = Utc::now();
        let max_age = Duration::days(MAX_RESOURCE_TTL_DAYS);
        let fresh = ResourceRecord::new(
            "1",
            "a",
            ResourceType::Project,
            "9",
            now - Duration::hours(47),
        );
        let boundary = ResourceRecord::new("1", "a", ResourceType::Project, "9", now - max_age);

        assert!(fresh.is_valid(now, max_age));
        assert!(!boundary.is_valid(now, max_age));
    }

    #[test]
    fn test_resource_type_serde_names() {
        let json = serde_json::to_string(&ResourceType::BillingAccount).unwrap();
        assert_eq!(json, "\"billingAccounts\"");
        for kind in [
            ResourceType::Organization,
            ResourceType::BillingAccount,
            ResourceType::Folder,
            ResourceType::Project,
        ] {
            assert_eq!(kind.as_str().parse::<ResourceType>().unwrap(), kind);
        }
    }
}
