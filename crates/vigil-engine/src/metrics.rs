// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Engine counters.
//!
//! One shared [`MetricsRegistry`] is threaded through the engine components;
//! [`EngineMetrics`] is the serializable point-in-time snapshot exposed to
//! callers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Metrics Snapshot
// =============================================================================

/// A point-in-time snapshot of engine counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineMetrics {
    /// Records accepted onto the buffered ingestion path.
    pub records_received: u64,
    /// Records persisted by successful flushes.
    pub records_flushed: u64,
    /// Flush attempts (scheduled, capacity-induced, and final).
    pub flush_attempts: u64,
    /// Successful flushes.
    pub flush_successes: u64,
    /// Failed flushes (store error or store-reported rejection).
    pub flush_failures: u64,
    /// Flushes skipped because another flush was in progress.
    pub flush_skipped: u64,
    /// WAL appends that failed; the records stayed in-memory only.
    pub wal_append_failures: u64,
    /// Invalid records dropped on the async path.
    pub invalid_dropped: u64,
    /// Records recovered from the WAL at startup.
    pub recovered_records: u64,
    /// Malformed WAL lines skipped during recovery.
    pub recovery_skipped_lines: u64,
    /// Retention sweep runs.
    pub sweep_runs: u64,
    /// Records deleted by retention sweeps.
    pub records_swept: u64,
    /// Set when the WAL could not be initialized and the engine is running
    /// without crash durability. An operational red flag.
    pub wal_disabled: bool,
    /// Completion time of the most recent successful flush.
    pub last_flush_time: Option<DateTime<Utc>>,
}

// =============================================================================
// Metrics Registry
// =============================================================================

/// Shared atomic counters updated by the engine components.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    records_received: AtomicU64,
    records_flushed: AtomicU64,
    flush_attempts: AtomicU64,
    flush_successes: AtomicU64,
    flush_failures: AtomicU64,
    flush_skipped: AtomicU64,
    wal_append_failures: AtomicU64,
    invalid_dropped: AtomicU64,
    recovered_records: AtomicU64,
    recovery_skipped_lines: AtomicU64,
    sweep_runs: AtomicU64,
    records_swept: AtomicU64,
    wal_disabled: AtomicBool,
    last_flush_time: RwLock<Option<DateTime<Utc>>>,
}

impl MetricsRegistry {
    /// Creates a zeroed registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `count` records accepted onto the buffered path.
    pub fn record_received(&self, count: u64) {
        self.records_received.fetch_add(count, Ordering::Relaxed);
    }

    /// Records a flush attempt.
    pub fn record_flush_attempt(&self) {
        self.flush_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful flush of `count` records.
    pub fn record_flush_success(&self, count: u64) {
        self.flush_successes.fetch_add(1, Ordering::Relaxed);
        self.records_flushed.fetch_add(count, Ordering::Relaxed);
        if let Ok(mut last) = self.last_flush_time.write() {
            *last = Some(Utc::now());
        }
    }

    /// Records a failed flush.
    pub fn record_flush_failure(&self) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a flush skipped due to contention.
    pub fn record_flush_skipped(&self) {
        self.flush_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed WAL append.
    pub fn record_wal_append_failure(&self) {
        self.wal_append_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records `count` invalid records dropped on the async path.
    pub fn record_invalid_dropped(&self, count: u64) {
        self.invalid_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Records startup recovery results.
    pub fn record_recovery(&self, recovered: u64, skipped_lines: u64) {
        self.recovered_records.fetch_add(recovered, Ordering::Relaxed);
        self.recovery_skipped_lines
            .fetch_add(skipped_lines, Ordering::Relaxed);
    }

    /// Records a retention sweep that deleted `count` records.
    pub fn record_sweep(&self, count: u64) {
        self.sweep_runs.fetch_add(1, Ordering::Relaxed);
        self.records_swept.fetch_add(count, Ordering::Relaxed);
    }

    /// Marks the WAL as disabled for the lifetime of this process.
    pub fn set_wal_disabled(&self) {
        self.wal_disabled.store(true, Ordering::Relaxed);
    }

    /// Returns `true` if the WAL is disabled.
    pub fn wal_disabled(&self) -> bool {
        self.wal_disabled.load(Ordering::Relaxed)
    }

    /// Takes a snapshot of all counters.
    pub fn snapshot(&self) -> EngineMetrics {
        EngineMetrics {
            records_received: self.records_received.load(Ordering::Relaxed),
            records_flushed: self.records_flushed.load(Ordering::Relaxed),
            flush_attempts: self.flush_attempts.load(Ordering::Relaxed),
            flush_successes: self.flush_successes.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            flush_skipped: self.flush_skipped.load(Ordering::Relaxed),
            wal_append_failures: self.wal_append_failures.load(Ordering::Relaxed),
            invalid_dropped: self.invalid_dropped.load(Ordering::Relaxed),
            recovered_records: self.recovered_records.load(Ordering::Relaxed),
            recovery_skipped_lines: self.recovery_skipped_lines.load(Ordering::Relaxed),
            sweep_runs: self.sweep_runs.load(Ordering::Relaxed),
            records_swept: self.records_swept.load(Ordering::Relaxed),
            wal_disabled: self.wal_disabled.load(Ordering::Relaxed),
            last_flush_time: self.last_flush_time.read().ok().and_then(|g| *g),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
