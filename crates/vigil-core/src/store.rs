// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The persistence boundary.
//!
//! [`AuditStore`] is the interface the engine flushes into; the backing
//! implementation (typically a relational database) lives outside this
//! workspace. [`MemoryAuditStore`] is an in-memory implementation used by
//! tests, development, and the `memory` backend of the binary.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::record::AuditRecord;

// =============================================================================
// Core Trait
// =============================================================================

/// Durable persistence for audit records.
///
/// The engine delivers records **at least once**: a batch that fails midway
/// is retried in full on the next flush. Implementations must therefore be
/// idempotent on the primary key `event_id` (unique constraint or upsert).
///
/// Write methods return `Ok(false)` when the store processed the call but
/// rejected it (e.g. constraint trouble the caller should retry), and `Err`
/// when the call itself failed; the engine treats both as a failed flush.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persists a single record.
    async fn add_audit(&self, record: &AuditRecord) -> StoreResult<bool>;

    /// Persists a batch of records.
    ///
    /// The default implementation inserts one at a time; implementations
    /// should override this with a real batch write.
    async fn add_audits(&self, records: &[AuditRecord]) -> StoreResult<bool> {
        for record in records {
            if !self.add_audit(record).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Updates a batch of existing records.
    ///
    /// Implementations MUST match rows on the primary key `event_id` — never
    /// on the business-subject `id` field, which may be shared by many
    /// records.
    async fn update_audits(&self, records: &[AuditRecord]) -> StoreResult<bool>;

    /// Deletes records whose `created_at` is strictly before `cutoff`.
    ///
    /// Returns the number of deleted records (zero is a valid outcome).
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;

    /// Returns the store name for logging/metrics.
    fn name(&self) -> &str {
        "audit_store"
    }

    /// Returns `true` if the store is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

// =============================================================================
// In-Memory Audit Store
// =============================================================================

/// In-memory [`AuditStore`] for tests and development.
///
/// Stores records in insertion order, stamps `created_at` on insert, and is
/// idempotent on `event_id`. Failure injection toggles let tests drive the
/// engine through outage and rejection paths.
///
/// # Thread Safety
///
/// Cloning shares the underlying storage; all mutation goes through a
/// `parking_lot::RwLock`.
#[derive(Debug, Clone)]
pub struct MemoryAuditStore {
    /// Stored records, in insertion order.
    records: Arc<RwLock<Vec<AuditRecord>>>,
    /// When set, write calls report `Ok(false)`.
    should_reject: Arc<AtomicBool>,
    /// When set, all calls return `Err(StoreError::Unavailable)`.
    should_error: Arc<AtomicBool>,
    /// Number of `add_audit` calls.
    add_calls: Arc<AtomicU64>,
    /// Number of `add_audits` calls.
    add_batch_calls: Arc<AtomicU64>,
    /// Number of `update_audits` calls.
    update_calls: Arc<AtomicU64>,
    /// Number of `delete_older_than` calls.
    delete_calls: Arc<AtomicU64>,
}

impl Default for MemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuditStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            should_reject: Arc::new(AtomicBool::new(false)),
            should_error: Arc::new(AtomicBool::new(false)),
            add_calls: Arc::new(AtomicU64::new(0)),
            add_batch_calls: Arc::new(AtomicU64::new(0)),
            update_calls: Arc::new(AtomicU64::new(0)),
            delete_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Makes write calls report `Ok(false)` (store-side rejection).
    pub fn set_should_reject(&self, reject: bool) {
        self.should_reject.store(reject, Ordering::SeqCst);
    }

    /// Makes all calls fail with [`StoreError::Unavailable`].
    pub fn set_should_error(&self, error: bool) {
        self.should_error.store(error, Ordering::SeqCst);
    }

    /// Returns all stored records.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().clone()
    }

    /// Returns stored records matching a predicate.
    pub fn records_where<F>(&self, predicate: F) -> Vec<AuditRecord>
    where
        F: Fn(&AuditRecord) -> bool,
    {
        self.records
            .read()
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// Returns the stored `event_id`s in insertion order.
    pub fn event_ids(&self) -> Vec<String> {
        self.records.read().iter().map(|r| r.event_id.clone()).collect()
    }

    /// Returns `true` if a record with the given `event_id` is stored.
    pub fn contains_event(&self, event_id: &str) -> bool {
        self.records.read().iter().any(|r| r.event_id == event_id)
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Removes all stored records.
    pub fn clear(&self) {
        self.records.write().clear();
    }

    /// Returns the number of `add_audit` calls.
    pub fn add_calls(&self) -> u64 {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of `add_audits` calls.
    pub fn add_batch_calls(&self) -> u64 {
        self.add_batch_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of `update_audits` calls.
    pub fn update_calls(&self) -> u64 {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of `delete_older_than` calls.
    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check_failures(&self) -> StoreResult<bool> {
        if self.should_error.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("memory store failure injected"));
        }
        Ok(!self.should_reject.load(Ordering::SeqCst))
    }

    /// Inserts a record, stamping `created_at` unless already set.
    ///
    /// Re-inserting an existing `event_id` is a no-op, which gives the
    /// at-least-once delivery its idempotency.
    fn insert(&self, record: &AuditRecord) {
        let mut records = self.records.write();
        if records.iter().any(|r| r.event_id == record.event_id) {
            return;
        }
        let mut stored = record.clone();
        if stored.created_at.is_none() {
            stored.created_at = Some(Utc::now());
        }
        records.push(stored);
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn add_audit(&self, record: &AuditRecord) -> StoreResult<bool> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if !self.check_failures()? {
            return Ok(false);
        }

        self.insert(record);
        Ok(true)
    }

    async fn add_audits(&self, records: &[AuditRecord]) -> StoreResult<bool> {
        self.add_batch_calls.fetch_add(1, Ordering::SeqCst);
        if !self.check_failures()? {
            return Ok(false);
        }

        for record in records {
            self.insert(record);
        }
        Ok(true)
    }

    async fn update_audits(&self, records: &[AuditRecord]) -> StoreResult<bool> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if !self.check_failures()? {
            return Ok(false);
        }

        let mut stored = self.records.write();
        for update in records {
            if let Some(existing) = stored.iter_mut().find(|r| r.event_id == update.event_id) {
                let created_at = existing.created_at;
                *existing = update.clone();
                existing.created_at = created_at;
            }
        }
        Ok(true)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_error.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("memory store failure injected"));
        }

        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| match r.created_at {
            Some(created_at) => created_at >= cutoff,
            None => true,
        });
        Ok((before - records.len()) as u64)
    }

    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> bool {
        !self.should_error.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Tests
// =============================================================================
