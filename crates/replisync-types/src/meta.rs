//! Object metadata shared by every stored kind

use crate::ObjectKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Optimistic-concurrency token assigned by the store on every write.
///
/// Opaque to clients: only equality matters. Zero means "never stored".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVersion(u64);

impl ResourceVersion {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata carried by every resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Namespace the object lives in
    pub namespace: String,

    /// Name, unique per kind within the namespace
    pub name: String,

    /// Unordered string labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Store-assigned version token
    #[serde(default)]
    pub resource_version: ResourceVersion,

    /// Created timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Last updated timestamp
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ObjectMeta {
    pub fn new(key: &ObjectKey) -> Self {
        let now = chrono::Utc::now();
        Self {
            namespace: key.namespace.clone(),
            name: key.name.clone(),
            labels: BTreeMap::new(),
            resource_version: ResourceVersion::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }

    /// Label value for `key`, if present
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}
