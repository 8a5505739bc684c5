//! Controller: event source, resync loop, and bounded worker pool

use super::backoff::Backoff;
use super::correlation::CorrelationLabel;
use super::events::EventLog;
use super::metrics::ControllerMetrics;
use super::queue::WorkQueue;
use super::reconciler::{ReconcileResult, SyncOutcome, SyncReconciler};
use crate::config::ControllerConfig;
use crate::error::ReconcileError;
use crate::store::{PrimaryStore, ResourceStore, WatchSource};
use replisync_types::{
    EventSeverity, ObjectKey, ResourceKind, SyncEvent, WatchEvent, WatchEventType,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, OwnedSemaphorePermit, Semaphore};
use tokio::time::{interval, MissedTickBehavior};

type TaskResult = (ObjectKey, Result<ReconcileResult, ReconcileError>);

/// Drives the sync reconciler from store watch events and periodic resyncs
pub struct Controller {
    config: ControllerConfig,
    store: Arc<dyn ResourceStore>,
    reconciler: Arc<SyncReconciler>,
    queue: Arc<WorkQueue>,
    backoff: Backoff,
    metrics: Arc<ControllerMetrics>,
    events: Arc<EventLog>,
    shutdown_tx: watch::Sender<bool>,
}

impl Controller {
    /// Create a new controller
    pub fn new(config: ControllerConfig, store: Arc<dyn ResourceStore>) -> Arc<Self> {
        let correlation = CorrelationLabel::new(config.correlation_label_key.clone());
        let reconciler = Arc::new(SyncReconciler::new(store.clone(), correlation));
        let backoff = Backoff::new(config.retry_base_delay(), config.retry_max_delay());
        let (shutdown_tx, _) = watch::channel(false);

        Arc::new(Self {
            config,
            store,
            reconciler,
            queue: Arc::new(WorkQueue::new()),
            backoff,
            metrics: Arc::new(ControllerMetrics::new()),
            events: Arc::new(EventLog::default()),
            shutdown_tx,
        })
    }

    /// Request a reconcile of one primary
    pub fn enqueue(&self, key: ObjectKey) {
        self.queue.add(key);
    }

    pub fn metrics(&self) -> &Arc<ControllerMetrics> {
        &self.metrics
    }

    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    pub fn queue(&self) -> &Arc<WorkQueue> {
        &self.queue
    }

    pub fn reconciler(&self) -> &Arc<SyncReconciler> {
        &self.reconciler
    }

    /// Stop intake; `run` returns once in-flight reconciles finish.
    ///
    /// Safe to call before `run` or before its loops have subscribed: the
    /// flag is stored even while nobody is listening.
    pub fn stop(&self) {
        self.queue.shut_down();
        self.shutdown_tx.send_replace(true);
    }

    /// Run until `stop` is called
    pub async fn run(self: Arc<Self>) {
        let workers = self.config.workers.max(1);
        tracing::info!(
            workers,
            resync_interval_secs = self.config.resync_interval_secs,
            label = %self.config.correlation_label_key,
            "Controller started"
        );

        // Subscribe before the initial list so no write slips between them
        let watch_rx = self.store.watch();
        self.resync().await;

        let watch_handle = tokio::spawn(self.clone().watch_primaries(watch_rx));
        let resync_handle = tokio::spawn(self.clone().resync_loop());

        let semaphore = Arc::new(Semaphore::new(workers));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<TaskResult>();

        loop {
            tokio::select! {
                biased;
                Some((key, result)) = result_rx.recv() => {
                    self.handle_result(key, result).await;
                }
                next = next_work(&semaphore, &self.queue) => {
                    let Some((permit, key)) = next else { break };
                    let reconciler = self.reconciler.clone();
                    let result_tx = result_tx.clone();
                    tokio::spawn(async move {
                        let result = reconciler.reconcile(&key).await;
                        let _ = result_tx.send((key, result));
                        drop(permit);
                    });
                }
            }
        }

        tracing::info!("Waiting for in-flight reconciliations to complete");
        let _ = semaphore.acquire_many(workers as u32).await;
        drop(result_tx);
        while let Some((key, result)) = result_rx.recv().await {
            self.handle_result(key, result).await;
        }

        let _ = watch_handle.await;
        let _ = resync_handle.await;
        tracing::info!("Controller stopped");
    }

    /// Enqueue every primary
    async fn resync(&self) {
        match self.store.list_primaries().await {
            Ok(primaries) => {
                tracing::debug!(count = primaries.len(), "Resyncing primaries");
                for primary in primaries {
                    self.queue.add(primary.metadata.key());
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to list primaries for resync"),
        }
    }

    async fn resync_loop(self: Arc<Self>) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut ticker = interval(self.config.resync_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately and `run` already listed once
        ticker.tick().await;

        while !*shutdown_rx.borrow() {
            tokio::select! {
                _ = ticker.tick() => self.resync().await,
                _ = shutdown_rx.changed() => {}
            }
        }
    }

    /// Only primary changes trigger reconciles; secondaries are picked up on resync
    async fn watch_primaries(
        self: Arc<Self>,
        mut watch_rx: broadcast::Receiver<WatchEvent>,
    ) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        while !*shutdown_rx.borrow() {
            tokio::select! {
                received = watch_rx.recv() => match received {
                    Ok(event) => {
                        if event.kind == ResourceKind::Primary
                            && event.event_type != WatchEventType::Deleted
                        {
                            self.queue.add(event.key);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Watch stream lagged, resyncing");
                        self.resync().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown_rx.changed() => {}
            }
        }
    }

    async fn handle_result(&self, key: ObjectKey, result: Result<ReconcileResult, ReconcileError>) {
        self.queue.done(&key);

        match result {
            Ok(result) => {
                self.backoff.forget(&key);
                self.metrics.record_outcome(&result.outcome);

                if let SyncOutcome::Resized {
                    secondary,
                    from,
                    to,
                } = &result.outcome
                {
                    self.events
                        .publish(
                            SyncEvent::SecondaryResized {
                                primary: key.clone(),
                                secondary: secondary.clone(),
                                from: *from,
                                to: *to,
                            },
                            EventSeverity::Info,
                        )
                        .await;
                }

                if result.requeue {
                    self.queue.add(key);
                }
            }
            Err(e) => {
                self.metrics.record_error(e.is_conflict());
                let delay = self.backoff.next_delay(&key);

                if e.is_conflict() {
                    tracing::warn!(primary = %key, error = %e, retry_in_ms = delay.as_millis() as u64, "Reconcile conflicted, retrying");
                } else {
                    tracing::error!(primary = %key, error = %e, retry_in_ms = delay.as_millis() as u64, "Reconcile failed, retrying");
                }

                self.events
                    .publish(
                        SyncEvent::ReconcileFailed {
                            primary: key.clone(),
                            reason: e.to_string(),
                            retry_in_ms: delay.as_millis() as u64,
                        },
                        EventSeverity::Warning,
                    )
                    .await;

                self.queue.add_after(key, delay);
            }
        }
    }
}

async fn next_work(
    semaphore: &Arc<Semaphore>,
    queue: &WorkQueue,
) -> Option<(OwnedSemaphorePermit, ObjectKey)> {
    let permit = semaphore.clone().acquire_owned().await.ok()?;
    let key = queue.get().await?;
    Some((permit, key))
}
