// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vigil-engine
//!
//! Durable asynchronous audit ingestion engine.
//!
//! Producers hand records to the [`AuditService`]; each record is validated,
//! appended to a write-ahead log on local disk, and enqueued in an in-memory
//! buffer. A background flusher periodically drains the buffer into the
//! backing [`AuditStore`](vigil_core::AuditStore) in batches and truncates
//! the WAL on success, so a crash between enqueue and flush loses nothing:
//! the next startup replays the WAL back into the buffer.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                           AuditEngine                              │
//! │                                                                    │
//! │  producers ──▶ AuditService ──▶ IngestionExecutor (worker pool)    │
//! │                    │                     │                         │
//! │                validate            WAL append + enqueue            │
//! │                    │                     │                         │
//! │              ┌─────▼─────┐        ┌──────▼──────┐                  │
//! │              │ WalWriter │        │ AuditBuffer │                  │
//! │              └─────▲─────┘        └──────┬──────┘                  │
//! │                    │ truncate            │ snapshot/remove         │
//! │                    │              ┌──────▼──────┐    ┌──────────┐  │
//! │                    └──────────────│   Flusher   │───▶│AuditStore│  │
//! │                     on success    │ (interval)  │    └──────────┘  │
//! │                                   └─────────────┘          ▲       │
//! │                                   ┌─────────────────┐      │       │
//! │                                   │RetentionSweeper │──────┘       │
//! │                                   │ (cron schedule) │ delete older │
//! │                                   └─────────────────┘              │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - A record is durable (crash-safe) once its WAL append returns; it is
//!   persisted after the next successful flush.
//! - Delivery to the store is at-least-once; the store deduplicates on the
//!   `event_id` primary key.
//! - Per-producer submission order is preserved in both the WAL and the
//!   buffer; no ordering is guaranteed across producers.
//! - A malformed WAL line never invalidates subsequent well-formed lines.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vigil_core::{AuditRecord, MemoryAuditStore};
//! use vigil_engine::{AuditEngine, EngineConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryAuditStore::new());
//!     let engine = AuditEngine::start(EngineConfig::default(), store);
//!
//!     let record = AuditRecord::builder("EV-001", "User Login", "SECURITY")
//!         .host("app-host-01", "10.0.4.17")
//!         .application("IDP", "Identity Provider")
//!         .session_user("user-4411")
//!         .created_by("idp-frontend")
//!         .build();
//!
//!     engine.service().add_audit_async(record).await;
//!
//!     engine.shutdown().await;
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod executor;
pub mod flusher;
pub mod lifecycle;
pub mod metrics;
pub mod retention;
pub mod service;
pub mod wal;

pub use buffer::AuditBuffer;
pub use config::{EngineConfig, EngineConfigBuilder, ExecutorConfig};
pub use executor::IngestionExecutor;
pub use flusher::{FlushOutcome, Flusher};
pub use lifecycle::AuditEngine;
pub use metrics::{EngineMetrics, MetricsRegistry};
pub use retention::RetentionSweeper;
pub use service::AuditService;
pub use wal::WalWriter;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
