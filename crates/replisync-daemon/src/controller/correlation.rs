//! Correlation label contract
//!
//! A primary names its secondary through a single label whose value is the
//! secondary's name in the primary's own namespace.

use replisync_types::{ObjectKey, ObjectMeta};

/// The label key linking a primary to its secondary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationLabel {
    key: String,
}

impl CorrelationLabel {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Secondary name the metadata points at. Empty values count as absent.
    pub fn lookup<'a>(&self, meta: &'a ObjectMeta) -> Option<&'a str> {
        meta.label(&self.key).filter(|name| !name.is_empty())
    }

    /// Key of the correlated secondary, resolved in the primary's namespace
    pub fn resolve(&self, meta: &ObjectMeta) -> Option<ObjectKey> {
        self.lookup(meta).map(|name| meta.key().sibling(name))
    }
}
