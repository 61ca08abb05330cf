// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema.
//!
//! # Schema Structure
//!
//! ```text
//! VigilConfig
//! ├── engine: EngineConfig     (buffer, WAL, flush, retention, executor)
//! ├── store: StoreConfig       (backend selection)
//! └── logging: LoggingConfig   (level, format)
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vigil_engine::EngineConfig;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration for a vigil instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct VigilConfig {
    /// Ingestion engine configuration.
    pub engine: EngineConfig,

    /// Store backend configuration.
    pub store: StoreConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl VigilConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.engine.buffer_size == 0 {
            return Err(ConfigError::validation(
                "engine.buffer-size",
                "must be positive",
            ));
        }
        if self.engine.flush_interval.is_zero() {
            return Err(ConfigError::validation(
                "engine.flush-interval-millis",
                "must be positive",
            ));
        }
        if self.engine.wal_file_path.as_os_str().is_empty() {
            return Err(ConfigError::validation(
                "engine.wal-file-path",
                "must not be empty",
            ));
        }
        if cron::Schedule::from_str(&self.engine.clear_cron).is_err() {
            return Err(ConfigError::validation(
                "engine.clear-cron",
                format!("'{}' is not a valid cron expression", self.engine.clear_cron),
            ));
        }

        let executor = &self.engine.executor;
        if executor.core_pool_size == 0 {
            return Err(ConfigError::validation(
                "engine.executor.core-pool-size",
                "must be positive",
            ));
        }
        if executor.max_pool_size < executor.core_pool_size {
            return Err(ConfigError::validation(
                "engine.executor.max-pool-size",
                "must be >= core-pool-size",
            ));
        }
        if executor.queue_capacity == 0 {
            return Err(ConfigError::validation(
                "engine.executor.queue-capacity",
                "must be positive",
            ));
        }

        self.logging.validate()?;
        Ok(())
    }
}

// =============================================================================
// Store Configuration
// =============================================================================

/// Which `AuditStore` implementation the binary wires in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct StoreConfig {
    /// The backend to use.
    pub backend: StoreBackend,
}

/// Available store backends.
///
/// The engine is store-agnostic; production deployments embed it as a
/// library with their own `AuditStore` implementation over the relational
/// database. The `memory` backend backs the standalone binary for
/// development and testing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-memory store (non-durable).
    #[default]
    Memory,
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log output format (text, json, compact).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logging.level",
                format!("'{}' is not one of {:?}", self.level, LEVELS),
            ));
        }

        const FORMATS: [&str; 3] = ["text", "json", "compact"];
        if !FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logging.format",
                format!("'{}' is not one of {:?}", self.format, FORMATS),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
