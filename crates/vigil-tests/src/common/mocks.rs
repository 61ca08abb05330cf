// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Mock store implementations.
//!
//! The workspace's `MemoryAuditStore` covers recording and failure
//! injection; the mocks here cover the scenarios it cannot, such as a store
//! call that never completes.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vigil_core::{AuditRecord, AuditStore, StoreResult};

// =============================================================================
// Blocking Audit Store
// =============================================================================

/// A store whose write calls never complete.
///
/// Models a database that has stopped responding without erroring. Call
/// counters still advance when a call starts, so tests can assert how many
/// attempts were made while nothing ever succeeds.
#[derive(Debug, Default)]
pub struct BlockingAuditStore {
    add_calls: AtomicU64,
    add_batch_calls: AtomicU64,
    update_calls: AtomicU64,
}

impl BlockingAuditStore {
    /// Creates a new blocking store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `add_audit` calls started.
    pub fn add_calls(&self) -> u64 {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// Number of `add_audits` calls started.
    pub fn add_batch_calls(&self) -> u64 {
        self.add_batch_calls.load(Ordering::SeqCst)
    }

    /// Number of `update_audits` calls started.
    pub fn update_calls(&self) -> u64 {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditStore for BlockingAuditStore {
    async fn add_audit(&self, _record: &AuditRecord) -> StoreResult<bool> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn add_audits(&self, _records: &[AuditRecord]) -> StoreResult<bool> {
        self.add_batch_calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn update_audits(&self, _records: &[AuditRecord]) -> StoreResult<bool> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn delete_older_than(&self, _cutoff: DateTime<Utc>) -> StoreResult<u64> {
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "blocking"
    }

    async fn health_check(&self) -> bool {
        false
    }
}
