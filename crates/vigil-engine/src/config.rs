// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Engine runtime configuration.
//!
//! These structs are the knobs the engine runs on. Serialized keys use the
//! kebab-case names of the documented configuration surface
//! (`buffer-size`, `flush-interval-millis`, ...), so a config file section
//! deserializes directly into [`EngineConfig`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// =============================================================================
// Engine Configuration
// =============================================================================

/// Configuration for the ingestion engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Buffer occupancy at which an immediate flush is triggered before
    /// enqueue. This is a flush trigger, not a rejection threshold: the
    /// buffer itself never blocks or drops.
    pub buffer_size: usize,

    /// Cadence of the scheduled flush.
    #[serde(rename = "flush-interval-millis", with = "duration_millis")]
    pub flush_interval: Duration,

    /// Filesystem path of the write-ahead log.
    pub wal_file_path: PathBuf,

    /// Age threshold for the retention sweep, in milliseconds. Zero or
    /// negative disables the sweep.
    pub retention_period_millis: i64,

    /// Cron schedule driving the retention sweep
    /// (seconds minutes hours day-of-month month day-of-week).
    pub clear_cron: String,

    /// When enabled, every WAL append is fsync'd before returning. Stronger
    /// durability at a throughput cost; off by default, where appends only
    /// reach OS buffers.
    pub sync_on_append: bool,

    /// Ingestion executor configuration.
    pub executor: ExecutorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            flush_interval: Duration::from_millis(60_000),
            wal_file_path: PathBuf::from("./audit-wal.log"),
            retention_period_millis: 2_592_000_000, // 30 days
            clear_cron: "0 0 3 * * *".to_string(),
            sync_on_append: false,
            executor: ExecutorConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Creates a configuration suitable for tests: small buffer, fast
    /// flushes, WAL in the given directory.
    pub fn for_testing(wal_dir: impl Into<PathBuf>) -> Self {
        Self {
            buffer_size: 10,
            flush_interval: Duration::from_millis(100),
            wal_file_path: wal_dir.into().join("audit-wal.log"),
            retention_period_millis: 2_592_000_000,
            clear_cron: "0 0 3 * * *".to_string(),
            sync_on_append: false,
            executor: ExecutorConfig {
                core_pool_size: 2,
                max_pool_size: 4,
                queue_capacity: 32,
                keep_alive: Duration::from_secs(1),
                await_termination: Duration::from_secs(5),
            },
        }
    }

    /// Returns `true` if the retention sweep is enabled.
    pub fn retention_enabled(&self) -> bool {
        self.retention_period_millis > 0
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Sets the capacity-flush trigger threshold.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// Sets the scheduled flush cadence.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// Sets the WAL file path.
    pub fn wal_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wal_file_path = path.into();
        self
    }

    /// Sets the retention period in milliseconds.
    pub fn retention_period_millis(mut self, millis: i64) -> Self {
        self.config.retention_period_millis = millis;
        self
    }

    /// Sets the retention sweep cron schedule.
    pub fn clear_cron(mut self, cron: impl Into<String>) -> Self {
        self.config.clear_cron = cron.into();
        self
    }

    /// Enables fsync on every WAL append.
    pub fn sync_on_append(mut self, sync: bool) -> Self {
        self.config.sync_on_append = sync;
        self
    }

    /// Sets the executor configuration.
    pub fn executor(mut self, executor: ExecutorConfig) -> Self {
        self.config.executor = executor;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

// =============================================================================
// Executor Configuration
// =============================================================================

/// Configuration for the ingestion executor (the worker pool running async
/// submissions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExecutorConfig {
    /// Steady-state worker count.
    pub core_pool_size: usize,

    /// Burst worker ceiling; extra workers are spawned while the pending
    /// queue is saturated.
    pub max_pool_size: usize,

    /// Pending-task queue capacity. When the queue is full, the submitting
    /// producer runs the task itself (caller-runs), which throttles intake
    /// without silently dropping work.
    pub queue_capacity: usize,

    /// Idle time after which a burst (non-core) worker exits.
    #[serde(rename = "keep-alive-seconds", with = "duration_secs")]
    pub keep_alive: Duration,

    /// Shutdown grace period for in-flight tasks.
    #[serde(rename = "await-termination-seconds", with = "duration_secs")]
    pub await_termination: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            core_pool_size: 8,
            max_pool_size: 12,
            queue_capacity: 500,
            keep_alive: Duration::from_secs(60),
            await_termination: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Serde helpers
// =============================================================================

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();

        assert_eq!(config.buffer_size, 1000);
        assert_eq!(config.flush_interval, Duration::from_millis(60_000));
        assert_eq!(config.wal_file_path, PathBuf::from("./audit-wal.log"));
        assert_eq!(config.retention_period_millis, 2_592_000_000);
        assert_eq!(config.clear_cron, "0 0 3 * * *");
        assert!(!config.sync_on_append);

        assert_eq!(config.executor.core_pool_size, 8);
        assert_eq!(config.executor.max_pool_size, 12);
        assert_eq!(config.executor.queue_capacity, 500);
        assert_eq!(config.executor.keep_alive, Duration::from_secs(60));
        assert_eq!(config.executor.await_termination, Duration::from_secs(30));
    }

    #[test]
    fn test_retention_enabled() {
        let mut config = EngineConfig::default();
        assert!(config.retention_enabled());

        config.retention_period_millis = 0;
        assert!(!config.retention_enabled());

        config.retention_period_millis = -1;
        assert!(!config.retention_enabled());
    }

    #[test]
    fn test_kebab_case_keys_round_trip() {
        let json = serde_json::to_value(EngineConfig::default()).unwrap();

        assert!(json.get("buffer-size").is_some());
        assert!(json.get("flush-interval-millis").is_some());
        assert!(json.get("wal-file-path").is_some());
        assert!(json.get("retention-period-millis").is_some());
        assert!(json.get("clear-cron").is_some());

        let executor = json.get("executor").unwrap();
        assert!(executor.get("core-pool-size").is_some());
        assert!(executor.get("keep-alive-seconds").is_some());
        assert!(executor.get("await-termination-seconds").is_some());

        let decoded: EngineConfig = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.buffer_size, 1000);
        assert_eq!(decoded.flush_interval, Duration::from_millis(60_000));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let decoded: EngineConfig =
            serde_json::from_str(r#"{"buffer-size": 50, "flush-interval-millis": 250}"#).unwrap();

        assert_eq!(decoded.buffer_size, 50);
        assert_eq!(decoded.flush_interval, Duration::from_millis(250));
        assert_eq!(decoded.clear_cron, "0 0 3 * * *");
        assert_eq!(decoded.executor.queue_capacity, 500);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::builder()
            .buffer_size(25)
            .flush_interval(Duration::from_millis(500))
            .wal_file_path("/tmp/wal.log")
            .retention_period_millis(1000)
            .clear_cron("0 30 4 * * *")
            .sync_on_append(true)
            .build();

        assert_eq!(config.buffer_size, 25);
        assert_eq!(config.flush_interval, Duration::from_millis(500));
        assert_eq!(config.wal_file_path, PathBuf::from("/tmp/wal.log"));
        assert_eq!(config.clear_cron, "0 30 4 * * *");
        assert!(config.sync_on_append);
    }
}
