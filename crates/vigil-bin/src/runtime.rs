// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service runtime orchestration.
//!
//! Wires configuration to a store backend and the audit engine, then runs
//! until a shutdown signal arrives.

use std::sync::Arc;

use tracing::info;

use vigil_config::{StoreBackend, VigilConfig};
use vigil_core::{AuditStore, MemoryAuditStore};
use vigil_engine::AuditEngine;

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// ServiceRuntime
// =============================================================================

/// The main runtime orchestrating the audit service.
pub struct ServiceRuntime {
    config: VigilConfig,
    shutdown: ShutdownCoordinator,
}

impl ServiceRuntime {
    /// Creates a runtime over a validated configuration.
    pub fn new(config: VigilConfig) -> Self {
        Self {
            config,
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the shutdown coordinator, e.g. for tests to trigger shutdown
    /// programmatically.
    pub fn shutdown_coordinator(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Runs the service until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting vigil v{}", vigil_engine::VERSION);

        let store = self.create_store();
        let engine = AuditEngine::start(self.config.engine.clone(), store);

        // If signal handlers cannot be registered, still unwind the engine
        // (final flush, WAL close) before reporting the failure.
        let wait_result = self.shutdown.wait_for_shutdown().await;

        engine.shutdown().await;

        let metrics = engine.metrics();
        info!(
            records_received = metrics.records_received,
            records_flushed = metrics.records_flushed,
            flush_failures = metrics.flush_failures,
            "vigil shutdown complete"
        );

        wait_result.map_err(BinError::Signal)?;
        Ok(())
    }

    /// Creates the configured store backend.
    ///
    /// Production deployments embed the engine as a library with a real
    /// relational `AuditStore`; the standalone binary runs on the in-memory
    /// backend.
    fn create_store(&self) -> Arc<dyn AuditStore> {
        match self.config.store.backend {
            StoreBackend::Memory => {
                info!("Using in-memory audit store (records are not durable across restarts)");
                Arc::new(MemoryAuditStore::new())
            }
        }
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

    #[tokio::test]
    async fn test_runtime_starts_and_stops() {
        let dir = tempdir().unwrap();
        let mut config = VigilConfig::default();
        config.engine.wal_file_path = dir.path().join("audit-wal.log");

        let runtime = ServiceRuntime::new(config);
        let coordinator = runtime.shutdown_coordinator();

        let task = tokio::spawn(runtime.run());

        tokio::time::sleep(Duration::from_millis(100)).await;
        coordinator.initiate_shutdown();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("runtime should stop")
            .unwrap()
            .unwrap();
    }
}
