// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    ReadFailed {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be parsed.
    #[error("Failed to parse config file '{path}': {message}")]
    ParseFailed {
        /// File path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The file extension is not a supported format.
    #[error("Unsupported config format '{path}': expected .yaml, .yml, or .toml")]
    UnsupportedFormat {
        /// File path.
        path: PathBuf,
    },

    /// A value failed validation.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// Offending field, dotted path.
        field: String,
        /// What went wrong.
        message: String,
    },
}

impl ConfigError {
    /// Creates a read-failed error.
    pub fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse-failed error.
    pub fn parse_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::validation("engine.buffer-size", "must be positive");
        assert!(err.to_string().contains("engine.buffer-size"));
        assert!(err.to_string().contains("must be positive"));
    }
}
