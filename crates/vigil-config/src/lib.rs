// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vigil-config
//!
//! Configuration schema and loading for the vigil audit service.
//!
//! Configuration files are YAML or TOML, dispatched by extension, and
//! deserialize into [`VigilConfig`]. Every key has a default, so an empty
//! file is a valid configuration.
//!
//! ```yaml
//! engine:
//!   buffer-size: 1000
//!   flush-interval-millis: 60000
//!   wal-file-path: ./audit-wal.log
//!   retention-period-millis: 2592000000
//!   clear-cron: "0 0 3 * * *"
//!   executor:
//!     core-pool-size: 8
//!     max-pool-size: 12
//!     queue-capacity: 500
//! store:
//!   backend: memory
//! logging:
//!   level: info
//!   format: text
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_config;
pub use schema::{LoggingConfig, StoreBackend, StoreConfig, VigilConfig};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
