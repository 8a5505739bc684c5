//! Replisync Types - Resource object model for replica synchronization
//!
//! Replisync keeps a *secondary* resource's `spec.size` in agreement with the
//! `spec.replicas` of the *primary* resource that names it through a
//! correlation label.
//!
//! ## Key Concepts
//!
//! - **ObjectKey**: namespace + name, the identity of a stored object and the
//!   payload of every reconcile request
//! - **ObjectMeta**: labels plus the store-assigned `ResourceVersion` used for
//!   optimistic concurrency
//! - **PrimaryInstance**: the authoritative replica count
//! - **SecondaryInstance**: the synchronized size
//! - **MergePatch**: minimal JSON delta between a snapshot and its mutation
//! - **Events**: watch notifications and sync observability

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod events;
pub mod key;
pub mod meta;
pub mod patch;
pub mod resource;

// Re-export main types
pub use events::{EventSeverity, SyncEvent, SyncEventEnvelope, WatchEvent, WatchEventType};
pub use key::{KeyParseError, ObjectKey};
pub use meta::{ObjectMeta, ResourceVersion};
pub use patch::{ConditionalPatch, MergePatch, PatchError};
pub use resource::{
    PrimaryInstance, PrimarySpec, Resource, ResourceKind, SecondaryInstance, SecondarySpec,
};
