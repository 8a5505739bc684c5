//! Sync event fan-out with a bounded history

use replisync_types::{EventSeverity, SyncEvent, SyncEventEnvelope};
use std::collections::VecDeque;
use tokio::sync::{broadcast, RwLock};

/// Events kept for the REST surface
pub const EVENT_HISTORY: usize = 1000;

/// Broadcasts sync events and remembers the most recent ones
#[derive(Debug)]
pub struct EventLog {
    tx: broadcast::Sender<SyncEventEnvelope>,
    recent: RwLock<VecDeque<SyncEventEnvelope>>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(EVENT_HISTORY)
    }
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            recent: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn publish(&self, event: SyncEvent, severity: EventSeverity) {
        let envelope = SyncEventEnvelope::new(event, severity);

        {
            let mut recent = self.recent.write().await;
            if recent.len() == self.capacity {
                recent.pop_front();
            }
            if self.capacity > 0 {
                recent.push_back(envelope.clone());
            }
        }

        let _ = self.tx.send(envelope);
    }

    /// Up to `limit` most recent events, oldest first
    pub async fn recent(&self, limit: usize) -> Vec<SyncEventEnvelope> {
        let recent = self.recent.read().await;
        let start = recent.len().saturating_sub(limit);
        recent.iter().skip(start).cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEventEnvelope> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replisync_types::ObjectKey;

    fn failed(name: &str) -> SyncEvent {
        SyncEvent::ReconcileFailed {
            primary: ObjectKey::new("ns", name),
            reason: "boom".to_string(),
            retry_in_ms: 100,
        }
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let log = EventLog::new(2);
        log.publish(failed("a"), EventSeverity::Warning).await;
        log.publish(failed("b"), EventSeverity::Warning).await;
        log.publish(failed("c"), EventSeverity::Warning).await;

        let names: Vec<_> = log
            .recent(10)
            .await
            .into_iter()
            .map(|e| e.event.primary().name.clone())
            .collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(log.recent(1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let log = EventLog::default();
        let mut rx = log.subscribe();
        log.publish(failed("a"), EventSeverity::Warning).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event, failed("a"));
        assert_eq!(received.severity, EventSeverity::Warning);
    }
}
