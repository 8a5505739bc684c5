//! Event types
//!
//! `WatchEvent`s flow from the store to the controller. `SyncEvent`s flow
//! from the controller to observers.

use crate::{ObjectKey, ResourceKind, ResourceVersion};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of change a watch event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchEventType {
    Added,
    Modified,
    Deleted,
}

/// Change notification emitted by the store for every write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEvent {
    pub event_type: WatchEventType,
    pub kind: ResourceKind,
    pub key: ObjectKey,

    /// Version after the write (the last version for deletes)
    pub resource_version: ResourceVersion,
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Envelope wrapping all sync events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Event severity
    pub severity: EventSeverity,

    /// The actual event
    pub event: SyncEvent,
}

impl SyncEventEnvelope {
    pub fn new(event: SyncEvent, severity: EventSeverity) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            severity,
            event,
        }
    }
}

/// Controller observability events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A secondary's size was patched to match its primary
    SecondaryResized {
        primary: ObjectKey,
        secondary: ObjectKey,
        from: u32,
        to: u32,
    },

    /// A reconciliation failed and was scheduled for retry
    ReconcileFailed {
        primary: ObjectKey,
        reason: String,
        retry_in_ms: u64,
    },
}

impl SyncEvent {
    /// Primary the event concerns
    pub fn primary(&self) -> &ObjectKey {
        match self {
            SyncEvent::SecondaryResized { primary, .. } => primary,
            SyncEvent::ReconcileFailed { primary, .. } => primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_event_tagged_serialization() {
        let event = SyncEvent::SecondaryResized {
            primary: ObjectKey::new("ns", "web"),
            secondary: ObjectKey::new("ns", "cache-1"),
            from: 3,
            to: 5,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "secondary_resized");
        assert_eq!(json["to"], 5);
        assert_eq!(event.primary(), &ObjectKey::new("ns", "web"));
    }
}
