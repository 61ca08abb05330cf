// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Ingestion entry points.
//!
//! The synchronous operations bypass the buffer and WAL and talk straight to
//! the store, reporting the outcome in an [`AuditResponse`]. The
//! asynchronous operations are fire-and-forget: records are validated,
//! appended to the WAL, and enqueued for the next flush, with all work
//! scheduled on the ingestion executor. Failures on the async path are
//! observable only through logs and metrics.

use std::sync::Arc;

use tracing::{error, warn};

use vigil_core::record::{AuditRecord, AuditResponse};
use vigil_core::store::AuditStore;

use crate::buffer::AuditBuffer;
use crate::executor::IngestionExecutor;
use crate::flusher::Flusher;
use crate::metrics::MetricsRegistry;
use crate::wal::WalWriter;

// =============================================================================
// Audit Service
// =============================================================================

/// The ingestion API combining validator, WAL, buffer, and flusher.
///
/// Cheap to clone; clones share the underlying engine components.
#[derive(Clone)]
pub struct AuditService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    buffer: Arc<AuditBuffer>,
    wal: Arc<WalWriter>,
    store: Arc<dyn AuditStore>,
    flusher: Arc<Flusher>,
    executor: Arc<IngestionExecutor>,
    buffer_size: usize,
    metrics: Arc<MetricsRegistry>,
}

impl AuditService {
    /// Creates a service over the given components.
    ///
    /// Normally assembled by [`AuditEngine::start`](crate::AuditEngine::start);
    /// public for embedding and tests.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buffer: Arc<AuditBuffer>,
        wal: Arc<WalWriter>,
        store: Arc<dyn AuditStore>,
        flusher: Arc<Flusher>,
        executor: Arc<IngestionExecutor>,
        buffer_size: usize,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                buffer,
                wal,
                store,
                flusher,
                executor,
                buffer_size,
                metrics,
            }),
        }
    }

    /// Returns the number of records awaiting flush.
    pub fn pending(&self) -> usize {
        self.inner.buffer.len()
    }

    // =========================================================================
    // Synchronous operations
    // =========================================================================

    /// Validates and immediately persists a single record.
    pub async fn add_audit(&self, record: &AuditRecord) -> AuditResponse {
        if let Err(e) = record.validate() {
            warn!(event_id = %record.event_id, error = %e, "Rejected invalid audit record");
            return AuditResponse::failed();
        }

        match self.inner.store.add_audit(record).await {
            Ok(true) => AuditResponse::ok(),
            Ok(false) => AuditResponse::failed(),
            Err(e) => {
                error!(event_id = %record.event_id, error = %e, "Failed to add audit");
                AuditResponse::failed()
            }
        }
    }

    /// Validates and immediately persists a batch of records.
    pub async fn add_audits(&self, records: &[AuditRecord]) -> AuditResponse {
        if !self.validate_batch(records) {
            return AuditResponse::failed();
        }

        match self.inner.store.add_audits(records).await {
            Ok(true) => AuditResponse::ok(),
            Ok(false) => AuditResponse::failed(),
            Err(e) => {
                error!(count = records.len(), error = %e, "Failed to add audit batch");
                AuditResponse::failed()
            }
        }
    }

    /// Validates and immediately updates a batch of existing records.
    pub async fn update_audits(&self, records: &[AuditRecord]) -> AuditResponse {
        if !self.validate_batch(records) {
            return AuditResponse::failed();
        }

        match self.inner.store.update_audits(records).await {
            Ok(true) => AuditResponse::ok(),
            Ok(false) => AuditResponse::failed(),
            Err(e) => {
                error!(count = records.len(), error = %e, "Failed to update audit batch");
                AuditResponse::failed()
            }
        }
    }

    fn validate_batch(&self, records: &[AuditRecord]) -> bool {
        let mut ok = true;
        for record in records {
            if let Err(e) = record.validate() {
                warn!(event_id = %record.event_id, error = %e, "Rejected invalid audit record");
                ok = false;
            }
        }
        ok
    }

    // =========================================================================
    // Asynchronous operations
    // =========================================================================

    /// Enqueues a single record for durable, batched persistence.
    ///
    /// Returns once the work is scheduled (or, under saturation, once it has
    /// run on the caller). Invalid records are logged and dropped before
    /// they can pollute the WAL.
    pub async fn add_audit_async(&self, record: AuditRecord) {
        if let Err(e) = record.validate() {
            error!(event_id = %record.event_id, error = %e, "Dropped invalid audit record");
            self.inner.metrics.record_invalid_dropped(1);
            return;
        }

        let inner = self.inner.clone();
        self.inner
            .executor
            .submit(async move {
                ServiceInner::ingest(inner, vec![record]).await;
            })
            .await;
    }

    /// Enqueues a batch of records for durable, batched persistence.
    ///
    /// Each invalid record is logged and dropped; the valid remainder is
    /// ingested.
    pub async fn add_audits_async(&self, records: Vec<AuditRecord>) {
        let valid = self.drop_invalid(records);
        if valid.is_empty() {
            return;
        }

        let inner = self.inner.clone();
        self.inner
            .executor
            .submit(async move {
                ServiceInner::ingest(inner, valid).await;
            })
            .await;
    }

    /// Enqueues a batch of record updates.
    ///
    /// The WAL does not distinguish inserts from updates; the store
    /// interprets the records when the batch is flushed.
    pub async fn update_audits_async(&self, records: Vec<AuditRecord>) {
        self.add_audits_async(records).await;
    }

    fn drop_invalid(&self, records: Vec<AuditRecord>) -> Vec<AuditRecord> {
        let mut valid = Vec::with_capacity(records.len());
        let mut dropped = 0u64;
        for record in records {
            match record.validate() {
                Ok(()) => valid.push(record),
                Err(e) => {
                    error!(event_id = %record.event_id, error = %e, "Dropped invalid audit record");
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            self.inner.metrics.record_invalid_dropped(dropped);
        }
        valid
    }
}

impl ServiceInner {
    /// The buffered ingestion step, run on the executor.
    async fn ingest(inner: Arc<ServiceInner>, records: Vec<AuditRecord>) {
        let pending = inner.buffer.len();
        let at_capacity = match records.len() {
            1 => pending >= inner.buffer_size,
            n => pending + n >= inner.buffer_size,
        };
        if at_capacity {
            warn!(
                capacity = inner.buffer_size,
                "Audit buffer reached capacity, triggering immediate flush"
            );
            // The trigger snapshots now and completes in the background, so
            // this batch stays out of the triggered flush and a stalled
            // store never wedges ingestion. The flusher's try_lock
            // collapses concurrent triggers into one.
            inner.flusher.clone().trigger();
        }

        let appended = match records.as_slice() {
            [record] => inner.wal.append_one(record),
            batch => inner.wal.append_many(batch),
        };
        if let Err(e) = appended {
            // The in-memory copy still reaches the buffer; the record is
            // lost only if the process dies before the next flush.
            error!(
                error = %e,
                count = records.len(),
                "Failed to append to WAL, records held in memory only"
            );
            inner.metrics.record_wal_append_failure();
        }

        inner.metrics.record_received(records.len() as u64);
        inner.buffer.add_all(records);
    }
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService")
            .field("pending", &self.pending())
            .field("buffer_size", &self.inner.buffer_size)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
