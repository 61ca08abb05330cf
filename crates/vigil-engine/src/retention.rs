// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Retention-based deletion of persisted records.
//!
//! The sweeper periodically deletes records older than the configured
//! retention window, delegating the actual delete to the store. It runs on a
//! cron schedule (daily at 03:00 by default) and can also be invoked
//! directly, e.g. from an admin command or a test.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Local, Utc};
use cron::Schedule;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use vigil_core::error::StoreResult;
use vigil_core::store::AuditStore;

use crate::metrics::MetricsRegistry;

// =============================================================================
// Retention Sweeper
// =============================================================================

/// Deletes persisted records older than the retention window.
pub struct RetentionSweeper {
    store: Arc<dyn AuditStore>,
    metrics: Arc<MetricsRegistry>,
    /// Retention window in milliseconds; zero or negative disables sweeping.
    retention_period_millis: i64,
    /// Parsed sweep schedule; `None` when the cron expression was invalid.
    schedule: Option<Schedule>,
    /// Signals the scheduled loop to stop.
    shutdown: Notify,
    /// Whether the scheduled loop is running.
    running: AtomicBool,
}

impl RetentionSweeper {
    /// Creates a sweeper.
    ///
    /// An unparseable cron expression disables the *scheduled* sweep (logged
    /// at error); direct [`RetentionSweeper::sweep`] calls still work.
    pub fn new(
        store: Arc<dyn AuditStore>,
        metrics: Arc<MetricsRegistry>,
        retention_period_millis: i64,
        clear_cron: &str,
    ) -> Self {
        let schedule = match Schedule::from_str(clear_cron) {
            Ok(schedule) => Some(schedule),
            Err(e) => {
                error!(
                    cron = clear_cron,
                    error = %e,
                    "Invalid retention cron expression, scheduled sweep disabled"
                );
                None
            }
        };

        Self {
            store,
            metrics,
            retention_period_millis,
            schedule,
            shutdown: Notify::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Returns `true` if the retention window is positive.
    pub fn is_enabled(&self) -> bool {
        self.retention_period_millis > 0
    }

    /// Deletes records older than `now - retention`.
    ///
    /// The cutoff is computed from this host's clock (UTC, truncated to
    /// whole seconds); stores whose database clock may drift can substitute
    /// a server-side `NOW()` in their delete statement instead. A delete
    /// count of zero is a normal outcome.
    pub async fn sweep(&self) -> StoreResult<u64> {
        if !self.is_enabled() {
            debug!("Retention sweep disabled, skipping");
            return Ok(0);
        }

        let cutoff = Utc::now() - ChronoDuration::seconds(self.retention_period_millis / 1000);

        match self.store.delete_older_than(cutoff).await {
            Ok(deleted) => {
                self.metrics.record_sweep(deleted);
                info!(
                    cutoff = %cutoff,
                    deleted = deleted,
                    "Cleared old audits"
                );
                Ok(deleted)
            }
            Err(e) => {
                error!(cutoff = %cutoff, error = %e, "Retention sweep failed");
                Err(e)
            }
        }
    }

    /// Starts the cron-scheduled sweep loop.
    ///
    /// The loop exits immediately when retention is disabled or the
    /// schedule failed to parse.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let sweeper = self;

        tokio::spawn(async move {
            if !sweeper.is_enabled() {
                info!("Retention sweep disabled (non-positive retention period)");
                return;
            }
            let Some(schedule) = sweeper.schedule.clone() else {
                return;
            };

            sweeper.running.store(true, Ordering::SeqCst);
            info!("Retention sweep loop started");

            loop {
                let Some(next) = schedule.upcoming(Local).next() else {
                    warn!("Retention schedule has no upcoming fire times");
                    break;
                };
                let wait = (next - Local::now())
                    .to_std()
                    .unwrap_or(std::time::Duration::ZERO);

                debug!(next = %next, "Next retention sweep scheduled");

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        // Outcome already logged; the loop keeps its cadence
                        // regardless of store failures.
                        let _ = sweeper.sweep().await;
                    }
                    _ = sweeper.shutdown.notified() => {
                        break;
                    }
                }
            }

            sweeper.running.store(false, Ordering::SeqCst);
            info!("Retention sweep loop stopped");
        })
    }

    /// Signals the scheduled loop to stop.
    pub fn stop(&self) {
        self.shutdown.notify_one();
    }

    /// Returns `true` if the scheduled loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for RetentionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionSweeper")
            .field("retention_period_millis", &self.retention_period_millis)
            .field("scheduled", &self.schedule.is_some())
            .field("running", &self.is_running())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
