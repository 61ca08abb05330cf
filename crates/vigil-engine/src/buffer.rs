// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory buffer of pending records.
//!
//! Producers append; the flusher takes a point-in-time snapshot, hands it to
//! the store, and removes exactly the drained records afterwards. The buffer
//! has no hard bound — capacity pressure is handled upstream as a flush
//! trigger, and back-pressure comes from the ingestion executor's
//! caller-runs policy.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use vigil_core::record::AuditRecord;

// =============================================================================
// Audit Buffer
// =============================================================================

/// Bounded-by-convention FIFO of records awaiting flush.
///
/// A single mutex guards all mutation; `len()` is an O(1) atomic load.
/// Snapshots are stable copies — concurrent producers keep appending while
/// the flusher holds one.
#[derive(Debug, Default)]
pub struct AuditBuffer {
    /// Pending records in arrival order.
    records: Mutex<Vec<AuditRecord>>,
    /// O(1) length counter.
    len: AtomicUsize,
}

impl AuditBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one record.
    pub fn add(&self, record: AuditRecord) {
        let mut records = self.records.lock();
        records.push(record);
        self.len.store(records.len(), Ordering::SeqCst);
    }

    /// Appends a batch atomically: no other append or removal interleaves
    /// within the batch.
    pub fn add_all(&self, batch: Vec<AuditRecord>) {
        if batch.is_empty() {
            return;
        }
        let mut records = self.records.lock();
        records.extend(batch);
        self.len.store(records.len(), Ordering::SeqCst);
    }

    /// Returns the number of pending records in O(1) time.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    /// Returns `true` if no records are pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a consistent point-in-time copy of the pending records.
    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    /// Removes exactly the records of a prior snapshot, preserving any
    /// records that arrived after the snapshot was taken.
    ///
    /// Matching is by value; each drained record removes at most one
    /// buffered occurrence.
    pub fn remove_drained(&self, drained: &[AuditRecord]) {
        if drained.is_empty() {
            return;
        }
        let mut pending: Vec<&AuditRecord> = drained.iter().collect();
        let mut records = self.records.lock();
        records.retain(|record| {
            if let Some(pos) = pending.iter().position(|d| *d == record) {
                pending.swap_remove(pos);
                false
            } else {
                true
            }
        });
        self.len.store(records.len(), Ordering::SeqCst);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(event_id: &str) -> AuditRecord {
        AuditRecord::builder(event_id, "Test Event", "TEST")
            .host("test-host", "127.0.0.1")
            .application("TST", "Test App")
            .session_user("tester")
            .created_by("unit-test")
            .build()
    }

    #[test]
    fn test_add_and_len() {
        let buffer = AuditBuffer::new();
        assert!(buffer.is_empty());

        buffer.add(record("E1"));
        buffer.add(record("E2"));

        assert_eq!(buffer.len(), 2);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_add_all_preserves_order() {
        let buffer = AuditBuffer::new();
        buffer.add(record("E0"));
        buffer.add_all(vec![record("E1"), record("E2"), record("E3")]);

        let ids: Vec<String> = buffer
            .snapshot()
            .into_iter()
            .map(|r| r.event_id)
            .collect();
        assert_eq!(ids, vec!["E0", "E1", "E2", "E3"]);
    }

    #[test]
    fn test_snapshot_is_stable_copy() {
        let buffer = AuditBuffer::new();
        buffer.add(record("E1"));

        let snapshot = buffer.snapshot();
        buffer.add(record("E2"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_remove_drained_preserves_later_arrivals() {
        let buffer = AuditBuffer::new();
        buffer.add_all(vec![record("E1"), record("E2")]);

        let snapshot = buffer.snapshot();
        buffer.add(record("E3"));

        buffer.remove_drained(&snapshot);

        let remaining: Vec<String> = buffer
            .snapshot()
            .into_iter()
            .map(|r| r.event_id)
            .collect();
        assert_eq!(remaining, vec!["E3"]);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_remove_drained_removes_one_occurrence_per_record() {
        let buffer = AuditBuffer::new();
        // Duplicate submissions are legal; the engine does not deduplicate.
        buffer.add(record("E1"));
        let snapshot = buffer.snapshot();
        buffer.add(record("E1"));

        buffer.remove_drained(&snapshot);

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.snapshot()[0].event_id, "E1");
    }

    #[test]
    fn test_remove_drained_with_empty_snapshot() {
        let buffer = AuditBuffer::new();
        buffer.add(record("E1"));

        buffer.remove_drained(&[]);

        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_concurrent_appends() {
        use std::sync::Arc;

        let buffer = Arc::new(AuditBuffer::new());
        let mut handles = Vec::new();

        for t in 0..8 {
            let buffer = buffer.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    buffer.add(record(&format!("E{}-{}", t, i)));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(buffer.len(), 800);
        assert_eq!(buffer.snapshot().len(), 800);
    }
}
