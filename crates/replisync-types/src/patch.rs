//! JSON merge patches (RFC 7386)
//!
//! Writers take a snapshot of an object, mutate a copy, and send only the
//! delta between the two together with the snapshot's version token. The
//! store rejects the patch if the object moved on in the meantime.

use crate::ResourceVersion;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Patch construction or application failure
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A JSON merge patch document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergePatch(Value);

impl MergePatch {
    /// Minimal patch that turns `before` into `after`
    pub fn between<T: Serialize>(before: &T, after: &T) -> Result<Self, PatchError> {
        let before = serde_json::to_value(before)?;
        let after = serde_json::to_value(after)?;
        Ok(Self::diff(&before, &after))
    }

    /// Minimal patch between two JSON documents
    pub fn diff(before: &Value, after: &Value) -> Self {
        match (before, after) {
            (Value::Object(before), Value::Object(after)) => {
                Self(Value::Object(diff_objects(before, after)))
            }
            _ => Self(after.clone()),
        }
    }

    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// True when applying the patch changes nothing
    pub fn is_empty(&self) -> bool {
        matches!(&self.0, Value::Object(map) if map.is_empty())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Apply in place following RFC 7386
    pub fn apply_to(&self, target: &mut Value) {
        merge(target, &self.0);
    }

    /// Apply to a typed object through its JSON form
    pub fn apply<T: Serialize + DeserializeOwned>(&self, target: &T) -> Result<T, PatchError> {
        let mut value = serde_json::to_value(target)?;
        self.apply_to(&mut value);
        Ok(serde_json::from_value(value)?)
    }
}

fn diff_objects(before: &Map<String, Value>, after: &Map<String, Value>) -> Map<String, Value> {
    let mut patch = Map::new();

    for key in before.keys() {
        if !after.contains_key(key) {
            patch.insert(key.clone(), Value::Null);
        }
    }

    for (key, new) in after {
        match before.get(key) {
            Some(old) if old == new => {}
            Some(Value::Object(old)) => match new {
                Value::Object(new) => {
                    let nested = diff_objects(old, new);
                    if !nested.is_empty() {
                        patch.insert(key.clone(), Value::Object(nested));
                    }
                }
                _ => {
                    patch.insert(key.clone(), new.clone());
                }
            },
            None if new.is_null() => {}
            _ => {
                patch.insert(key.clone(), new.clone());
            }
        }
    }

    patch
}

fn merge(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }

    if let Value::Object(target) = target {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                merge(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

/// A merge patch guarded by the version it was computed against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalPatch {
    pub patch: MergePatch,
    pub based_on: ResourceVersion,
}

impl ConditionalPatch {
    pub fn new(patch: MergePatch, based_on: ResourceVersion) -> Self {
        Self { patch, based_on }
    }
}
