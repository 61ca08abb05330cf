// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Batched drain of the buffer into the store.
//!
//! A flush snapshots the buffer, hands the whole snapshot to
//! [`AuditStore::add_audits`](vigil_core::AuditStore::add_audits), and on
//! success removes the drained records and truncates the WAL. On failure
//! everything is left in place — there is no retry timer; the next scheduled
//! tick or capacity trigger re-attempts with whatever the buffer then holds,
//! which is a superset of the failed batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Notify, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use vigil_core::record::AuditRecord;
use vigil_core::store::AuditStore;

use crate::buffer::AuditBuffer;
use crate::metrics::MetricsRegistry;
use crate::wal::WalWriter;

// =============================================================================
// Flush Outcome
// =============================================================================

/// Result of a single flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The buffer was empty; nothing to do.
    Empty,
    /// Another flush was in progress; this attempt was skipped.
    Skipped,
    /// The snapshot was persisted and the WAL truncated.
    Flushed(usize),
    /// The store rejected or failed the batch; buffer and WAL untouched.
    Failed,
}

// =============================================================================
// Flusher
// =============================================================================

/// Drains the buffer into the store in batches.
///
/// Two flushes never run concurrently: the critical section is guarded by a
/// `try_lock`, and a contended caller skips rather than queueing, so a slow
/// store round-trip absorbs scheduled ticks instead of stacking them.
pub struct Flusher {
    buffer: Arc<AuditBuffer>,
    wal: Arc<WalWriter>,
    store: Arc<dyn AuditStore>,
    metrics: Arc<MetricsRegistry>,
    /// Guards the flush critical section across the store await.
    flush_lock: Arc<tokio::sync::Mutex<()>>,
    /// Signals the scheduled loop to stop.
    shutdown: Notify,
    /// Whether the scheduled loop is running.
    running: AtomicBool,
}

impl Flusher {
    /// Creates a flusher over the given collaborators.
    pub fn new(
        buffer: Arc<AuditBuffer>,
        wal: Arc<WalWriter>,
        store: Arc<dyn AuditStore>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            buffer,
            wal,
            store,
            metrics,
            flush_lock: Arc::new(tokio::sync::Mutex::new(())),
            shutdown: Notify::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Performs one flush attempt and waits for its outcome.
    ///
    /// Returns [`FlushOutcome::Skipped`] without touching anything if a
    /// flush is already in progress.
    pub async fn flush(&self) -> FlushOutcome {
        if self.buffer.is_empty() {
            return FlushOutcome::Empty;
        }

        let Ok(guard) = self.flush_lock.clone().try_lock_owned() else {
            debug!("Flush already in progress, skipping");
            self.metrics.record_flush_skipped();
            return FlushOutcome::Skipped;
        };

        // Re-check under the lock: the previous holder may have drained.
        let snapshot = self.buffer.snapshot();
        if snapshot.is_empty() {
            return FlushOutcome::Empty;
        }

        self.flush_snapshot(snapshot, guard).await
    }

    /// Capacity-induced flush: snapshots immediately, completes in the
    /// background.
    ///
    /// The snapshot is taken before this call returns, so records the
    /// caller enqueues afterwards stay out of this batch and the caller is
    /// never blocked on the store round-trip. Returns `false` when a flush
    /// was already in progress (the one in flight covers the pressure) or
    /// the buffer was empty.
    pub fn trigger(self: Arc<Self>) -> bool {
        let Ok(guard) = self.flush_lock.clone().try_lock_owned() else {
            debug!("Flush already in progress, skipping capacity trigger");
            self.metrics.record_flush_skipped();
            return false;
        };

        let snapshot = self.buffer.snapshot();
        if snapshot.is_empty() {
            return false;
        }

        tokio::spawn(async move {
            self.flush_snapshot(snapshot, guard).await;
        });
        true
    }

    /// The flush critical section; `_guard` holds the try-lock for its
    /// duration.
    async fn flush_snapshot(
        &self,
        snapshot: Vec<AuditRecord>,
        _guard: OwnedMutexGuard<()>,
    ) -> FlushOutcome {
        self.metrics.record_flush_attempt();
        let t0 = Instant::now();

        let success = match self.store.add_audits(&snapshot).await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, count = snapshot.len(), "Failed to flush audit buffer");
                false
            }
        };

        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if success {
            self.buffer.remove_drained(&snapshot);
            if let Err(e) = self.wal.truncate() {
                // Records are persisted; stale WAL lines are re-inserted on
                // the next replay and deduplicated by the store.
                warn!(error = %e, "Failed to truncate WAL after flush");
            }
            self.metrics.record_flush_success(snapshot.len() as u64);
            info!(
                count = snapshot.len(),
                elapsed_ms = elapsed_ms,
                success = true,
                "Flushed audits"
            );
            FlushOutcome::Flushed(snapshot.len())
        } else {
            self.metrics.record_flush_failure();
            info!(
                count = snapshot.len(),
                elapsed_ms = elapsed_ms,
                success = false,
                "Flushed audits"
            );
            FlushOutcome::Failed
        }
    }

    /// Starts the scheduled flush loop at a fixed cadence.
    ///
    /// The loop runs until [`Flusher::stop`] is called, at which point it
    /// makes one final best-effort flush before exiting.
    pub fn start(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        let flusher = self;

        tokio::spawn(async move {
            info!(
                interval_ms = interval.as_millis() as u64,
                "Audit flush loop started"
            );

            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; consume it so the cadence
            // starts one interval after startup.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !flusher.running.load(Ordering::SeqCst) {
                            break;
                        }
                        flusher.flush().await;
                    }
                    _ = flusher.shutdown.notified() => {
                        debug!("Audit flush loop shutting down");
                        flusher.flush().await;
                        break;
                    }
                }
            }

            flusher.running.store(false, Ordering::SeqCst);
            info!("Audit flush loop stopped");
        })
    }

    /// Signals the scheduled loop to perform a final flush and stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    /// Returns `true` if the scheduled loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Flusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flusher")
            .field("pending", &self.buffer.len())
            .field("running", &self.is_running())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vigil_core::store::MemoryAuditStore;

    fn record(event_id: &str) -> AuditRecord {
        AuditRecord::builder(event_id, "Test Event", "TEST")
            .host("test-host", "127.0.0.1")
            .application("TST", "Test App")
            .session_user("tester")
            .created_by("unit-test")
            .build()
    }

    struct Fixture {
        buffer: Arc<AuditBuffer>,
        wal: Arc<WalWriter>,
        store: MemoryAuditStore,
        flusher: Arc<Flusher>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let buffer = Arc::new(AuditBuffer::new());
        let wal = Arc::new(WalWriter::open(dir.path().join("wal.log"), false).unwrap());
        let store = MemoryAuditStore::new();
        let flusher = Arc::new(Flusher::new(
            buffer.clone(),
            wal.clone(),
            Arc::new(store.clone()),
            Arc::new(MetricsRegistry::new()),
        ));
        Fixture {
            buffer,
            wal,
            store,
            flusher,
            _dir: dir,
        }
    }

    fn stage(fx: &Fixture, event_ids: &[&str]) {
        let records: Vec<AuditRecord> = event_ids.iter().map(|id| record(id)).collect();
        fx.wal.append_many(&records).unwrap();
        fx.buffer.add_all(records);
    }

    #[tokio::test]
    async fn test_flush_empty_buffer() {
        let fx = fixture();

        assert_eq!(fx.flusher.flush().await, FlushOutcome::Empty);
        assert_eq!(fx.store.add_batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_flush_drains_buffer_and_truncates_wal() {
        let fx = fixture();
        stage(&fx, &["E1", "E2", "E3"]);

        assert_eq!(fx.flusher.flush().await, FlushOutcome::Flushed(3));

        assert!(fx.buffer.is_empty());
        assert_eq!(fx.store.event_ids(), vec!["E1", "E2", "E3"]);
        assert_eq!(fx.store.add_batch_calls(), 1);
        assert_eq!(
            std::fs::metadata(fx.wal.path()).unwrap().len(),
            0,
            "WAL must be zero bytes after a successful flush"
        );
    }

    #[tokio::test]
    async fn test_failed_flush_retains_buffer_and_wal() {
        let fx = fixture();
        stage(&fx, &["E1", "E2"]);
        fx.store.set_should_reject(true);

        assert_eq!(fx.flusher.flush().await, FlushOutcome::Failed);

        assert_eq!(fx.buffer.len(), 2);
        assert!(std::fs::metadata(fx.wal.path()).unwrap().len() > 0);
        assert!(fx.store.is_empty());

        // Recovery: the next flush succeeds with the retained superset.
        fx.store.set_should_reject(false);
        stage(&fx, &["E3"]);
        assert_eq!(fx.flusher.flush().await, FlushOutcome::Flushed(3));
        assert!(fx.buffer.is_empty());
        assert_eq!(fx.store.event_ids(), vec!["E1", "E2", "E3"]);
    }

    #[tokio::test]
    async fn test_store_error_is_a_failed_flush() {
        let fx = fixture();
        stage(&fx, &["E1"]);
        fx.store.set_should_error(true);

        assert_eq!(fx.flusher.flush().await, FlushOutcome::Failed);
        assert_eq!(fx.buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_trigger_excludes_later_arrivals() {
        let fx = fixture();
        stage(&fx, &["E1", "E2"]);

        // The snapshot is taken inside trigger(), before E3 arrives.
        assert!(fx.flusher.clone().trigger());
        stage(&fx, &["E3"]);

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(fx.store.event_ids(), vec!["E1", "E2"]);
        assert_eq!(fx.buffer.len(), 1);
        assert_eq!(fx.buffer.snapshot()[0].event_id, "E3");
    }

    #[tokio::test]
    async fn test_trigger_on_empty_buffer() {
        let fx = fixture();
        assert!(!fx.flusher.clone().trigger());
    }

    #[tokio::test]
    async fn test_concurrent_flushes_do_not_overlap() {
        let fx = fixture();
        stage(&fx, &["E1", "E2", "E3"]);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let flusher = fx.flusher.clone();
            handles.push(tokio::spawn(async move { flusher.flush().await }));
        }

        let mut flushed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                FlushOutcome::Flushed(_) => flushed += 1,
                FlushOutcome::Skipped | FlushOutcome::Empty | FlushOutcome::Failed => {}
            }
        }

        assert_eq!(flushed, 1, "exactly one snapshot may be in flight");
        assert_eq!(fx.store.add_batch_calls(), 1);
        assert_eq!(fx.store.len(), 3);
    }

    #[tokio::test]
    async fn test_scheduled_loop_flushes_periodically() {
        let fx = fixture();
        stage(&fx, &["E1"]);

        let handle = fx.flusher.clone().start(Duration::from_millis(50));
        assert!(fx.flusher.is_running());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(fx.buffer.is_empty());
        assert!(fx.store.contains_event("E1"));

        fx.flusher.stop();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("flush loop should stop")
            .unwrap();
        assert!(!fx.flusher.is_running());
    }

    #[tokio::test]
    async fn test_stop_runs_final_flush() {
        let fx = fixture();

        let handle = fx.flusher.clone().start(Duration::from_secs(3600));
        // Give the loop a moment to pass its first (immediate) tick.
        tokio::time::sleep(Duration::from_millis(20)).await;

        stage(&fx, &["E1", "E2"]);
        fx.flusher.stop();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("flush loop should stop")
            .unwrap();

        assert!(fx.buffer.is_empty());
        assert_eq!(fx.store.len(), 2);
    }
}
