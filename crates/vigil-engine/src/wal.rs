// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Write-ahead log.
//!
//! A plain text file holding one compact JSON-encoded record per `\n`-
//! terminated line. Records land here before they enter the in-memory
//! buffer, so buffered-but-unflushed records survive a process crash; the
//! file is truncated after each successful flush.
//!
//! Appends flush to OS buffers before returning. That is the default
//! durability bar: an OS crash can still lose the tail. The opt-in
//! `sync_on_append` mode fsyncs every append for callers that need more.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use vigil_core::error::{WalError, WalResult};
use vigil_core::record::AuditRecord;

// =============================================================================
// WAL Writer
// =============================================================================

/// Append-only, line-delimited JSON log of not-yet-persisted records.
///
/// All operations serialize against a single mutex: one append, truncation,
/// or replay proceeds at a time. A writer constructed with
/// [`WalWriter::disabled`] turns every operation into a no-op; the engine
/// uses this to degrade to in-memory-only buffering when the log path is
/// unwritable.
pub struct WalWriter {
    /// Log file path.
    path: PathBuf,
    /// Whether to fsync after every append.
    sync_on_append: bool,
    /// The writer; `None` when the log is disabled or closed.
    writer: Mutex<Option<BufWriter<File>>>,
    /// Lines appended since startup.
    lines_appended: AtomicU64,
    /// Bytes appended since startup.
    bytes_appended: AtomicU64,
}

impl WalWriter {
    /// Opens the log at `path`, creating the file (and parent directories)
    /// if absent. Existing content is preserved for replay.
    pub fn open(path: impl AsRef<Path>, sync_on_append: bool) -> WalResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = Self::open_append(&path)
            .map_err(|e| WalError::open_failed(path.display().to_string(), e))?;

        Ok(Self {
            path,
            sync_on_append,
            writer: Mutex::new(Some(BufWriter::new(file))),
            lines_appended: AtomicU64::new(0),
            bytes_appended: AtomicU64::new(0),
        })
    }

    /// Creates a disabled writer whose operations are all no-ops.
    pub fn disabled(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync_on_append: false,
            writer: Mutex::new(None),
            lines_appended: AtomicU64::new(0),
            bytes_appended: AtomicU64::new(0),
        }
    }

    fn open_append(path: &Path) -> std::io::Result<File> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the log is active (not disabled or closed).
    pub fn is_enabled(&self) -> bool {
        self.writer.lock().is_some()
    }

    /// Returns the number of lines appended since startup.
    pub fn lines_appended(&self) -> u64 {
        self.lines_appended.load(Ordering::Relaxed)
    }

    /// Returns the number of bytes appended since startup.
    pub fn bytes_appended(&self) -> u64 {
        self.bytes_appended.load(Ordering::Relaxed)
    }

    /// Appends a single record and flushes.
    pub fn append_one(&self, record: &AuditRecord) -> WalResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| WalError::serialization(e.to_string()))?;

        let mut guard = self.writer.lock();
        let Some(writer) = guard.as_mut() else {
            return Ok(());
        };

        writeln!(writer, "{}", line)?;
        writer.flush()?;
        if self.sync_on_append {
            writer.get_ref().sync_data()?;
        }

        self.lines_appended.fetch_add(1, Ordering::Relaxed);
        self.bytes_appended
            .fetch_add(line.len() as u64 + 1, Ordering::Relaxed);
        Ok(())
    }

    /// Appends a batch of records under one lock acquisition, flushing once.
    pub fn append_many(&self, records: &[AuditRecord]) -> WalResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        // Serialize before taking the lock so a bad record never leaves a
        // partial batch in the file.
        let mut lines = Vec::with_capacity(records.len());
        for record in records {
            lines.push(
                serde_json::to_string(record)
                    .map_err(|e| WalError::serialization(e.to_string()))?,
            );
        }

        let mut guard = self.writer.lock();
        let Some(writer) = guard.as_mut() else {
            return Ok(());
        };

        let mut total_bytes = 0u64;
        for line in &lines {
            writeln!(writer, "{}", line)?;
            total_bytes += line.len() as u64 + 1;
        }
        writer.flush()?;
        if self.sync_on_append {
            writer.get_ref().sync_data()?;
        }

        self.lines_appended
            .fetch_add(lines.len() as u64, Ordering::Relaxed);
        self.bytes_appended.fetch_add(total_bytes, Ordering::Relaxed);
        Ok(())
    }

    /// Atomically replaces the file contents with zero bytes.
    pub fn truncate(&self) -> WalResult<()> {
        let mut guard = self.writer.lock();
        if guard.is_none() {
            return Ok(());
        }

        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        *guard = Some(BufWriter::new(Self::open_append(&self.path)?));

        debug!(path = %self.path.display(), "Truncated WAL");
        Ok(())
    }

    /// Reads the entire log, decoding each line.
    ///
    /// Returns the decoded records in file order plus the number of
    /// malformed lines skipped. A malformed line is logged and skipped; it
    /// never invalidates subsequent well-formed lines.
    pub fn replay(&self) -> WalResult<(Vec<AuditRecord>, usize)> {
        let mut guard = self.writer.lock();
        let Some(writer) = guard.as_mut() else {
            return Ok((Vec::new(), 0));
        };
        writer.flush()?;

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    error!(
                        error = %e,
                        line = %truncate_for_log(&line),
                        "Failed to parse WAL record, skipping line"
                    );
                }
            }
        }

        if skipped > 0 {
            warn!(skipped = skipped, "Skipped malformed WAL lines during replay");
        }
        Ok((records, skipped))
    }

    /// Flushes and releases the file handle. Subsequent operations are
    /// no-ops.
    pub fn close(&self) {
        let mut guard = self.writer.lock();
        if let Some(writer) = guard.as_mut() {
            if let Err(e) = writer.flush() {
                warn!(error = %e, "Failed to flush WAL on close");
            }
        }
        *guard = None;
    }
}

impl std::fmt::Debug for WalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalWriter")
            .field("path", &self.path)
            .field("enabled", &self.is_enabled())
            .field("sync_on_append", &self.sync_on_append)
            .field("lines_appended", &self.lines_appended())
            .finish()
    }
}

/// Caps a WAL line for inclusion in a log message.
fn truncate_for_log(line: &str) -> String {
    const MAX: usize = 256;
    if line.chars().count() <= MAX {
        line.to_string()
    } else {
        let capped: String = line.chars().take(MAX).collect();
        format!("{}...", capped)
    }
}

// =============================================================================
// Tests
// =============================================================================
