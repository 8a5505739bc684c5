//! Work queue with per-key serialization
//!
//! A key is in at most one of three places: queued, processing, or neither.
//! Adding a queued key is a no-op. Adding a key that is being processed marks
//! it dirty, and `done` puts it back in line, so a key is never handed to two
//! workers at once and no change observed mid-reconcile is lost.

use replisync_types::ObjectKey;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    queue: VecDeque<ObjectKey>,
    dirty: HashSet<ObjectKey>,
    processing: HashSet<ObjectKey>,
    shutting_down: bool,
}

/// Coalescing FIFO of reconcile requests
#[derive(Debug, Default)]
pub struct WorkQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request a reconcile of `key`
    pub fn add(&self, key: ObjectKey) {
        let mut inner = self.lock();
        if inner.shutting_down || inner.dirty.contains(&key) {
            return;
        }

        inner.dirty.insert(key.clone());
        if inner.processing.contains(&key) {
            return;
        }

        inner.queue.push_back(key);
        drop(inner);
        self.notify.notify_one();
    }

    /// Request a reconcile of `key` once `delay` has passed
    pub fn add_after(self: &Arc<Self>, key: ObjectKey, delay: Duration) {
        if delay.is_zero() {
            self.add(key);
            return;
        }

        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(key);
        });
    }

    /// Wait for the next key and mark it as processing.
    ///
    /// Returns `None` once the queue has been shut down.
    pub async fn get(&self) -> Option<ObjectKey> {
        loop {
            let notified = self.notify.notified();

            {
                let mut inner = self.lock();
                if inner.shutting_down {
                    return None;
                }
                if let Some(key) = inner.queue.pop_front() {
                    inner.dirty.remove(&key);
                    inner.processing.insert(key.clone());
                    return Some(key);
                }
            }

            notified.await;
        }
    }

    /// Finish processing `key`, re-queueing it if it was added meanwhile
    pub fn done(&self, key: &ObjectKey) {
        let mut inner = self.lock();
        inner.processing.remove(key);

        if inner.dirty.contains(key) && !inner.shutting_down {
            inner.queue.push_back(key.clone());
            drop(inner);
            self.notify.notify_one();
        }
    }

    /// Stop handing out keys and wake every waiter
    pub fn shut_down(&self) {
        self.lock().shutting_down = true;
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lock().shutting_down
    }

    /// Number of keys waiting to be processed
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_processing(&self, key: &ObjectKey) -> bool {
        self.lock().processing.contains(key)
    }
}
