// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading.
//!
//! # Loading Pipeline
//!
//! 1. Read the file
//! 2. Parse by extension (`.yaml`/`.yml` or `.toml`)
//! 3. Validate
//! 4. Return the final [`VigilConfig`]

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::VigilConfig;

/// Loads and validates a configuration file.
///
/// # Examples
///
/// ```no_run
/// use vigil_config::load_config;
///
/// let config = load_config("vigil.yaml").unwrap();
/// ```
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<VigilConfig> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).map_err(|e| ConfigError::read_failed(path, e))?;

    let config = parse(path, &content)?;
    config.validate()?;

    debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

fn parse(path: &Path, content: &str) -> ConfigResult<VigilConfig> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(content)
            .map_err(|e| ConfigError::parse_failed(path, e.to_string())),
        Some("toml") => {
            toml::from_str(content).map_err(|e| ConfigError::parse_failed(path, e.to_string()))
        }
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "vigil.yaml",
            r#"
engine:
  buffer-size: 250
  flush-interval-millis: 5000
logging:
  level: debug
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.engine.buffer_size, 250);
        assert_eq!(config.engine.flush_interval, Duration::from_millis(5000));
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep their defaults.
        assert_eq!(config.engine.executor.core_pool_size, 8);
    }

    #[test]
    fn test_load_toml() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "vigil.toml",
            r#"
[engine]
buffer-size = 42
clear-cron = "0 15 2 * * *"

[engine.executor]
queue-capacity = 64
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.engine.buffer_size, 42);
        assert_eq!(config.engine.clear_cron, "0 15 2 * * *");
        assert_eq!(config.engine.executor.queue_capacity, 64);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "vigil.yaml", "{}");

        let config = load_config(&path).unwrap();
        assert_eq!(config.engine.buffer_size, 1000);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/vigil.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "vigil.ini", "[engine]");

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "vigil.yaml",
            "engine:\n  buffer-size: 0\n",
        );

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "vigil.yaml", "engine: [not: a map");

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }
}
