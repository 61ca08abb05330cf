// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Engine assembly and lifecycle.
//!
//! [`AuditEngine::start`] wires the components together in dependency order:
//! WAL (with crash recovery into the buffer), flusher loop, retention loop,
//! and the ingestion executor. [`AuditEngine::shutdown`] unwinds in reverse:
//! intake stops, in-flight work drains, one final flush runs, and the WAL is
//! closed.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use vigil_core::error::StoreResult;
use vigil_core::store::AuditStore;

use crate::buffer::AuditBuffer;
use crate::config::EngineConfig;
use crate::executor::IngestionExecutor;
use crate::flusher::{FlushOutcome, Flusher};
use crate::metrics::{EngineMetrics, MetricsRegistry};
use crate::retention::RetentionSweeper;
use crate::service::AuditService;
use crate::wal::WalWriter;

// =============================================================================
// Audit Engine
// =============================================================================

/// The assembled ingestion engine.
///
/// Owns the background loops and exposes the [`AuditService`] entry points.
/// Dropping the engine without [`AuditEngine::shutdown`] abandons buffered
/// records to the WAL, which the next startup recovers.
pub struct AuditEngine {
    config: EngineConfig,
    service: AuditService,
    buffer: Arc<AuditBuffer>,
    wal: Arc<WalWriter>,
    flusher: Arc<Flusher>,
    sweeper: Arc<RetentionSweeper>,
    executor: Arc<IngestionExecutor>,
    metrics: Arc<MetricsRegistry>,
    flusher_handle: Mutex<Option<JoinHandle<()>>>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
}

impl AuditEngine {
    /// Starts the engine: opens the WAL, replays it into the buffer, and
    /// launches the flush loop, the retention loop, and the ingestion
    /// executor.
    ///
    /// Must be called within a Tokio runtime. A WAL that cannot be opened
    /// degrades the engine to in-memory-only buffering (logged at error and
    /// flagged in metrics) rather than failing startup.
    pub fn start(config: EngineConfig, store: Arc<dyn AuditStore>) -> Self {
        info!(
            wal_path = %config.wal_file_path.display(),
            buffer_size = config.buffer_size,
            flush_interval_ms = config.flush_interval.as_millis() as u64,
            store = store.name(),
            "Starting audit engine"
        );

        let metrics = Arc::new(MetricsRegistry::new());

        // 1. WAL, degrading to a no-op when the path is unwritable.
        let wal = match WalWriter::open(&config.wal_file_path, config.sync_on_append) {
            Ok(wal) => Arc::new(wal),
            Err(e) => {
                error!(
                    path = %config.wal_file_path.display(),
                    error = %e,
                    "Failed to initialize WAL, running without crash durability"
                );
                metrics.set_wal_disabled();
                Arc::new(WalWriter::disabled(&config.wal_file_path))
            }
        };

        // 2. Crash recovery: replay the WAL into the buffer so recovered
        //    records ride the next flush.
        let buffer = Arc::new(AuditBuffer::new());
        match wal.replay() {
            Ok((records, skipped)) => {
                metrics.record_recovery(records.len() as u64, skipped as u64);
                if !records.is_empty() {
                    info!(count = records.len(), "Recovered records from WAL file");
                }
                buffer.add_all(records);
            }
            Err(e) => {
                error!(error = %e, "Failed to recover from WAL file");
            }
        }

        // 3. Background loops.
        let flusher = Arc::new(Flusher::new(
            buffer.clone(),
            wal.clone(),
            store.clone(),
            metrics.clone(),
        ));
        let flusher_handle = flusher.clone().start(config.flush_interval);

        let sweeper = Arc::new(RetentionSweeper::new(
            store.clone(),
            metrics.clone(),
            config.retention_period_millis,
            &config.clear_cron,
        ));
        let sweeper_handle = sweeper.clone().start();

        // 4. Ingestion executor and the public service.
        let executor = Arc::new(IngestionExecutor::new(config.executor.clone()));
        let service = AuditService::new(
            buffer.clone(),
            wal.clone(),
            store,
            flusher.clone(),
            executor.clone(),
            config.buffer_size,
            metrics.clone(),
        );

        Self {
            config,
            service,
            buffer,
            wal,
            flusher,
            sweeper,
            executor,
            metrics,
            flusher_handle: Mutex::new(Some(flusher_handle)),
            sweeper_handle: Mutex::new(Some(sweeper_handle)),
        }
    }

    /// Returns the ingestion entry points.
    pub fn service(&self) -> &AuditService {
        &self.service
    }

    /// Returns a snapshot of the engine counters.
    pub fn metrics(&self) -> EngineMetrics {
        self.metrics.snapshot()
    }

    /// Returns `true` if the WAL is active (crash durability available).
    pub fn wal_enabled(&self) -> bool {
        self.wal.is_enabled()
    }

    /// Returns the number of records awaiting flush.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Triggers an immediate flush attempt.
    pub async fn flush(&self) -> FlushOutcome {
        self.flusher.flush().await
    }

    /// Runs a retention sweep immediately, outside the cron schedule.
    pub async fn sweep(&self) -> StoreResult<u64> {
        self.sweeper.sweep().await
    }

    /// Shuts the engine down.
    ///
    /// Stops accepting new async submissions, waits for in-flight executor
    /// tasks (bounded by the configured termination grace), performs a final
    /// best-effort flush, and closes the WAL.
    pub async fn shutdown(&self) {
        info!("Shutting down audit engine");

        // 1. Stop intake and drain the executor.
        self.executor.shutdown().await;

        // 2. Final flush via the loop's shutdown path.
        self.flusher.stop();
        let flusher_handle = self.flusher_handle.lock().take();
        if let Some(handle) = flusher_handle {
            if tokio::time::timeout(self.config.executor.await_termination, handle)
                .await
                .is_err()
            {
                warn!("Flush loop did not stop within the grace period");
            }
        }

        // 3. Retention loop.
        self.sweeper.stop();
        let sweeper_handle = self.sweeper_handle.lock().take();
        if let Some(handle) = sweeper_handle {
            if tokio::time::timeout(std::time::Duration::from_secs(5), handle)
                .await
                .is_err()
            {
                warn!("Retention loop did not stop within the grace period");
            }
        }

        // 4. Close the WAL.
        self.wal.close();

        info!(
            pending = self.buffer.len(),
            "Audit engine shutdown complete"
        );
    }
}

impl std::fmt::Debug for AuditEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditEngine")
            .field("pending", &self.buffer.len())
            .field("wal_enabled", &self.wal.is_enabled())
            .field("flusher_running", &self.flusher.is_running())
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
    use tempfile::tempdir;
    use vigil_core::record::AuditRecord;
    use vigil_core::store::MemoryAuditStore;

    fn record(event_id: &str) -> AuditRecord {
        AuditRecord::builder(event_id, "Test Event", "TEST")
            .host("test-host", "127.0.0.1")
            .application("TST", "Test App")
            .session_user("tester")
            .created_by("unit-test")
            .build()
    }

    #[tokio::test]
    async fn test_engine_round_trip() {
        let dir = tempdir().unwrap();
        let store = MemoryAuditStore::new();
        let engine = AuditEngine::start(
            EngineConfig::for_testing(dir.path()),
            Arc::new(store.clone()),
        );

        engine.service().add_audit_async(record("E1")).await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(store.contains_event("E1"));
        assert_eq!(engine.pending(), 0);

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_startup_recovers_wal_left_by_previous_run() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::for_testing(dir.path());

        // A previous process appended records and died before flushing.
        {
            let wal = WalWriter::open(&config.wal_file_path, false).unwrap();
            wal.append_many(&[record("E1"), record("E2"), record("E3")])
                .unwrap();
        }

        let store = MemoryAuditStore::new();
        let engine = AuditEngine::start(config.clone(), Arc::new(store.clone()));

        assert_eq!(engine.metrics().recovered_records, 3);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.event_ids(), vec!["E1", "E2", "E3"]);
        assert_eq!(
            std::fs::metadata(&config.wal_file_path).unwrap().len(),
            0,
            "WAL must be truncated after the recovered batch is flushed"
        );

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_runs_final_flush() {
        let dir = tempdir().unwrap();
        let mut config = EngineConfig::for_testing(dir.path());
        config.flush_interval = Duration::from_secs(3600);
        let store = MemoryAuditStore::new();
        let engine = AuditEngine::start(config, Arc::new(store.clone()));

        engine.service().add_audit_async(record("E1")).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.is_empty());

        engine.shutdown().await;

        assert!(store.contains_event("E1"));
        assert_eq!(engine.pending(), 0);
    }

    #[tokio::test]
    async fn test_engine_degrades_when_wal_path_unwritable() {
        let dir = tempdir().unwrap();
        // A file where a directory is needed makes the path unwritable.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut config = EngineConfig::for_testing(dir.path());
        config.wal_file_path = blocker.join("audit-wal.log");

        let store = MemoryAuditStore::new();
        let engine = AuditEngine::start(config, Arc::new(store.clone()));

        assert!(!engine.wal_enabled());
        assert!(engine.metrics().wal_disabled);

        // Ingestion still works, in-memory only.
        engine.service().add_audit_async(record("E1")).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(store.contains_event("E1"));

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_manual_flush_and_sweep() {
        let dir = tempdir().unwrap();
        let mut config = EngineConfig::for_testing(dir.path());
        config.flush_interval = Duration::from_secs(3600);
        let store = MemoryAuditStore::new();
        let engine = AuditEngine::start(config, Arc::new(store.clone()));

        engine.service().add_audit_async(record("E1")).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(engine.flush().await, FlushOutcome::Flushed(1));
        assert!(store.contains_event("E1"));

        assert_eq!(engine.sweep().await.unwrap(), 0);

        engine.shutdown().await;
    }
}
