//! Primary and secondary resource kinds
//!
//! The primary owns the authoritative replica count; the secondary carries the
//! size that replisync keeps in agreement with it.

use crate::{ObjectKey, ObjectMeta};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Kinds of resource the store holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Primary,
    Secondary,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Primary => write!(f, "primary"),
            ResourceKind::Secondary => write!(f, "secondary"),
        }
    }
}

/// Common access to stored objects
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn metadata(&self) -> &ObjectMeta;

    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    fn key(&self) -> ObjectKey {
        self.metadata().key()
    }
}

/// Desired state of a primary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimarySpec {
    /// Authoritative replica count
    pub replicas: u32,
}

/// The watched resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryInstance {
    pub metadata: ObjectMeta,
    pub spec: PrimarySpec,
}

impl PrimaryInstance {
    pub fn new(key: &ObjectKey, replicas: u32) -> Self {
        Self {
            metadata: ObjectMeta::new(key),
            spec: PrimarySpec { replicas },
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_label(key, value);
        self
    }
}

impl Resource for PrimaryInstance {
    const KIND: ResourceKind = ResourceKind::Primary;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

/// Desired state of a secondary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondarySpec {
    /// Size kept in sync with the correlated primary's replicas
    pub size: u32,
}

/// The synchronized resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryInstance {
    pub metadata: ObjectMeta,
    pub spec: SecondarySpec,
}

impl SecondaryInstance {
    pub fn new(key: &ObjectKey, size: u32) -> Self {
        Self {
            metadata: ObjectMeta::new(key),
            spec: SecondarySpec { size },
        }
    }
}

impl Resource for SecondaryInstance {
    const KIND: ResourceKind = ResourceKind::Secondary;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
