//! Namespaced object identity
//!
//! An `ObjectKey` names exactly one object of a given kind. Reconcile requests
//! carry nothing else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Namespace + name of a stored object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of another object living in the same namespace
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::new(self.namespace.clone(), name)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Failure to parse a `namespace/name` string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("missing '/' separator in object key: {0}")]
    MissingSeparator(String),

    #[error("empty namespace in object key: {0}")]
    EmptyNamespace(String),

    #[error("empty name in object key: {0}")]
    EmptyName(String),

    #[error("name must not contain '/' in object key: {0}")]
    NameContainsSeparator(String),
}

impl FromStr for ObjectKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, name) = s
            .split_once('/')
            .ok_or_else(|| KeyParseError::MissingSeparator(s.to_string()))?;

        if namespace.is_empty() {
            return Err(KeyParseError::EmptyNamespace(s.to_string()));
        }
        if name.is_empty() {
            return Err(KeyParseError::EmptyName(s.to_string()));
        }
        if name.contains('/') {
            return Err(KeyParseError::NameContainsSeparator(s.to_string()));
        }

        Ok(Self::new(namespace, name))
    }
}
