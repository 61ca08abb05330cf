// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Ingestion executor.
//!
//! A worker pool draining a bounded task channel. Async submissions are
//! scheduled here so producers return immediately under normal load; when
//! the pending queue saturates, the submitting producer runs the task itself
//! (caller-runs), throttling intake without silently dropping work. Burst
//! workers beyond the core pool are spawned under saturation and exit after
//! an idle keep-alive.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ExecutorConfig;

/// A unit of ingestion work.
type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

// =============================================================================
// Ingestion Executor
// =============================================================================

/// Bounded worker pool for asynchronous ingestion.
///
/// Submissions from one producer are executed in submission order as long as
/// they flow through the queue; a caller-run task executes immediately on
/// the producer, which is the intended back-pressure.
pub struct IngestionExecutor {
    config: ExecutorConfig,
    /// Task sender; taken on shutdown so the channel closes once drained.
    sender: parking_lot::Mutex<Option<mpsc::Sender<Task>>>,
    /// Shared receiver; workers take turns pulling from it.
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>,
    /// Worker join handles.
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    /// Live burst (non-core) worker count.
    burst_workers: Arc<AtomicUsize>,
    /// Set once shutdown begins; later submissions run on the caller.
    shutdown: Arc<AtomicBool>,
    /// Total submissions.
    submitted: AtomicU64,
    /// Submissions executed inline on the caller.
    caller_runs: AtomicU64,
    /// Burst workers spawned over the executor's lifetime.
    bursts_spawned: AtomicU64,
}

impl IngestionExecutor {
    /// Creates the executor and spawns its core workers.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(config: ExecutorConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let executor = Self {
            config,
            sender: parking_lot::Mutex::new(Some(sender)),
            receiver: receiver.clone(),
            workers: parking_lot::Mutex::new(Vec::new()),
            burst_workers: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
            submitted: AtomicU64::new(0),
            caller_runs: AtomicU64::new(0),
            bursts_spawned: AtomicU64::new(0),
        };

        let mut workers = executor.workers.lock();
        for id in 0..executor.config.core_pool_size.max(1) {
            workers.push(tokio::spawn(Self::core_worker(id, receiver.clone())));
        }
        drop(workers);

        executor
    }

    /// Core worker: drains the queue until the channel closes.
    async fn core_worker(id: usize, receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>) {
        debug!(worker = id, "Ingestion worker started");
        loop {
            let task = { receiver.lock().await.recv().await };
            match task {
                Some(task) => task.await,
                None => break,
            }
        }
        debug!(worker = id, "Ingestion worker stopped");
    }

    /// Burst worker: like a core worker, but exits after sitting idle for
    /// the keep-alive period.
    async fn burst_worker(
        receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>,
        keep_alive: std::time::Duration,
        burst_workers: Arc<AtomicUsize>,
    ) {
        debug!("Burst ingestion worker started");
        loop {
            let task = {
                let mut rx = receiver.lock().await;
                match tokio::time::timeout(keep_alive, rx.recv()).await {
                    Ok(task) => task,
                    Err(_) => {
                        // Idle past keep-alive.
                        break;
                    }
                }
            };
            match task {
                Some(task) => task.await,
                None => break,
            }
        }
        burst_workers.fetch_sub(1, Ordering::SeqCst);
        debug!("Burst ingestion worker stopped");
    }

    /// Submits a task.
    ///
    /// Returns once the task is queued — or, when the queue is saturated or
    /// the executor is shutting down, once the task has run inline on the
    /// caller.
    pub async fn submit<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        let task: Task = Box::pin(future);

        if self.shutdown.load(Ordering::SeqCst) {
            return self.run_inline(task).await;
        }

        let sender = self.sender.lock().clone();
        let Some(sender) = sender else {
            return self.run_inline(task).await;
        };

        match sender.try_send(task) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(task)) => {
                self.maybe_spawn_burst_worker();
                match sender.try_send(task) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(task))
                    | Err(mpsc::error::TrySendError::Closed(task)) => {
                        self.run_inline(task).await;
                    }
                }
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                self.run_inline(task).await;
            }
        }
    }

    /// Executes a task on the submitting caller (the saturation policy).
    async fn run_inline(&self, task: Task) {
        self.caller_runs.fetch_add(1, Ordering::Relaxed);
        debug!("Ingestion queue saturated, running task on caller");
        task.await;
    }

    /// Spawns a burst worker if the pool has not reached its ceiling.
    fn maybe_spawn_burst_worker(&self) {
        let limit = self
            .config
            .max_pool_size
            .saturating_sub(self.config.core_pool_size);

        let mut current = self.burst_workers.load(Ordering::SeqCst);
        loop {
            if current >= limit {
                return;
            }
            match self.burst_workers.compare_exchange(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        self.bursts_spawned.fetch_add(1, Ordering::Relaxed);
        let handle = tokio::spawn(Self::burst_worker(
            self.receiver.clone(),
            self.config.keep_alive,
            self.burst_workers.clone(),
        ));
        self.workers.lock().push(handle);
    }

    /// Stops intake and drains in-flight work.
    ///
    /// Queued tasks are completed; the wait is bounded by the configured
    /// termination grace, after which remaining workers are abandoned (their
    /// tasks keep running on the runtime).
    pub async fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);

        // Dropping the sender closes the channel once workers drain it.
        drop(self.sender.lock().take());

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        let drain = async {
            for handle in handles {
                let _ = handle.await;
            }
        };

        if tokio::time::timeout(self.config.await_termination, drain)
            .await
            .is_err()
        {
            warn!(
                grace_secs = self.config.await_termination.as_secs(),
                "Ingestion executor did not terminate within the grace period"
            );
        }
    }

    /// Returns `true` if shutdown has begun.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Total submissions.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Submissions executed inline on the caller.
    pub fn caller_runs(&self) -> u64 {
        self.caller_runs.load(Ordering::Relaxed)
    }

    /// Burst workers spawned over the executor's lifetime.
    pub fn bursts_spawned(&self) -> u64 {
        self.bursts_spawned.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for IngestionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionExecutor")
            .field("core_pool_size", &self.config.core_pool_size)
            .field("max_pool_size", &self.config.max_pool_size)
            .field("submitted", &self.submitted())
            .field("caller_runs", &self.caller_runs())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn config(core: usize, max: usize, queue: usize) -> ExecutorConfig {
        ExecutorConfig {
            core_pool_size: core,
            max_pool_size: max,
            queue_capacity: queue,
            keep_alive: Duration::from_millis(100),
            await_termination: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_tasks_execute() {
        let executor = IngestionExecutor::new(config(2, 4, 16));
        let counter = Arc::new(AtomicU64::new(0));

        for _ in 0..10 {
            let counter = counter.clone();
            executor
                .submit(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }

        executor.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(executor.submitted(), 10);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_tasks() {
        let executor = IngestionExecutor::new(config(1, 1, 64));
        let counter = Arc::new(AtomicU64::new(0));

        for _ in 0..50 {
            let counter = counter.clone();
            executor
                .submit(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }

        executor.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn test_caller_runs_when_saturated() {
        let executor = IngestionExecutor::new(config(1, 1, 1));

        // Park the only worker.
        let gate = Arc::new(Notify::new());
        let parked = gate.clone();
        executor
            .submit(async move {
                parked.notified().await;
            })
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Fill the single queue slot.
        executor.submit(async {}).await;

        // The next submission cannot queue; it must run on the caller
        // before submit returns.
        let ran = Arc::new(AtomicU64::new(0));
        let ran_clone = ran.clone();
        executor
            .submit(async move {
                ran_clone.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(executor.caller_runs() >= 1);

        gate.notify_one();
        executor.shutdown().await;
    }

    #[tokio::test]
    async fn test_burst_worker_spawned_under_saturation() {
        let executor = IngestionExecutor::new(config(1, 2, 1));

        // Park the core worker.
        let gate = Arc::new(Notify::new());
        let parked = gate.clone();
        executor
            .submit(async move {
                parked.notified().await;
            })
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Saturate the queue so a burst worker is considered.
        let counter = Arc::new(AtomicU64::new(0));
        for _ in 0..4 {
            let counter = counter.clone();
            executor
                .submit(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }

        // The burst worker drains the queue even with the core worker stuck.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(executor.bursts_spawned() >= 1);
        assert_eq!(counter.load(Ordering::SeqCst), 4);

        gate.notify_one();
        executor.shutdown().await;
    }

    #[tokio::test]
    async fn test_submissions_after_shutdown_run_inline() {
        let executor = IngestionExecutor::new(config(1, 2, 8));
        executor.shutdown().await;

        let ran = Arc::new(AtomicU64::new(0));
        let ran_clone = ran.clone();
        executor
            .submit(async move {
                ran_clone.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(executor.is_shutdown());
    }

    #[tokio::test]
    async fn test_shutdown_grace_bounds_stuck_workers() {
        let mut cfg = config(1, 1, 4);
        cfg.await_termination = Duration::from_millis(100);
        let executor = IngestionExecutor::new(cfg);

        // A task that never finishes.
        executor
            .submit(async {
                std::future::pending::<()>().await;
            })
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let t0 = std::time::Instant::now();
        executor.shutdown().await;
        assert!(t0.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_single_producer_order_preserved() {
        let executor = IngestionExecutor::new(config(1, 1, 64));
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for i in 0..20u64 {
            let order = order.clone();
            executor
                .submit(async move {
                    order.lock().push(i);
                })
                .await;
        }

        executor.shutdown().await;
        let seen = order.lock().clone();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }
}
