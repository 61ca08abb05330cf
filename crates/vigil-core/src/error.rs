// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for vigil.
//!
//! Errors are grouped by the subsystem that raises them:
//!
//! ```text
//! VigilError (root)
//! ├── ValidationError  - record field violations
//! ├── WalError         - write-ahead log I/O and serialization
//! └── StoreError       - backing store failures
//! ```
//!
//! Each leaf type carries constructor helpers and accessors used for
//! structured logging and metrics.

use thiserror::Error;

// =============================================================================
// VigilError - Root Error Type
// =============================================================================

/// The root error type for vigil.
///
/// All errors raised by the engine can be converted into this type, providing
/// a single error surface at crate boundaries.
#[derive(Debug, Error)]
pub enum VigilError {
    /// A record violated one or more validation rules.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Write-ahead log error.
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    /// Backing store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl VigilError {
    /// Returns `true` if this error is retryable.
    ///
    /// Retryable errors are transient conditions that may succeed on a
    /// subsequent attempt (I/O hiccups, store outages). Validation failures
    /// are never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            VigilError::Validation(_) => false,
            VigilError::Wal(e) => e.is_retryable(),
            VigilError::Store(e) => e.is_retryable(),
        }
    }

    /// Returns the error type as a string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            VigilError::Validation(_) => "validation",
            VigilError::Wal(_) => "wal",
            VigilError::Store(_) => "store",
        }
    }
}

/// Result type using the root error.
pub type VigilResult<T> = Result<T, VigilError>;

// =============================================================================
// ValidationError
// =============================================================================

/// A record violated one or more validation rules.
///
/// Carries every violated rule, not just the first, so callers see the full
/// picture in a single round-trip.
#[derive(Debug, Clone, Error)]
#[error("{}", messages.join("; "))]
pub struct ValidationError {
    /// All violated rules, in field order.
    messages: Vec<String>,
}

impl ValidationError {
    /// Creates a validation error from the collected rule violations.
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    /// Returns the individual violation messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Returns the number of violated rules.
    pub fn violation_count(&self) -> usize {
        self.messages.len()
    }
}

/// Result type for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// WalError
// =============================================================================

/// Errors raised by the write-ahead log.
#[derive(Debug, Error)]
pub enum WalError {
    /// Failed to open or create the log file.
    #[error("Failed to open WAL at '{path}': {source}")]
    OpenFailed {
        /// Log file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// IO error during append, flush, or truncation.
    #[error("WAL I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized to a log line.
    #[error("Failed to serialize WAL record: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// The log is disabled because initialization failed.
    #[error("WAL is disabled")]
    Disabled,
}

impl WalError {
    /// Creates an open-failed error.
    pub fn open_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::OpenFailed {
            path: path.into(),
            source,
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WalError::Io(_))
    }

    /// Returns the error type for metrics/logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            WalError::OpenFailed { .. } => "open_failed",
            WalError::Io(_) => "io_error",
            WalError::Serialization { .. } => "serialization_error",
            WalError::Disabled => "disabled",
        }
    }
}

/// Result type for WAL operations.
pub type WalResult<T> = Result<T, WalError>;

// =============================================================================
// StoreError
// =============================================================================

/// Errors raised by an [`AuditStore`](crate::store::AuditStore)
/// implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write (insert or update) failed.
    #[error("Store write failed: {message}")]
    WriteFailed {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A delete failed.
    #[error("Store delete failed: {message}")]
    DeleteFailed {
        /// Error message.
        message: String,
    },

    /// The store is unavailable (connection refused, pool exhausted).
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Creates a write-failed error.
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a write-failed error with a source.
    pub fn write_failed_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WriteFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a delete-failed error.
    pub fn delete_failed(message: impl Into<String>) -> Self {
        Self::DeleteFailed {
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::WriteFailed { .. } | StoreError::Unavailable { .. }
        )
    }

    /// Returns the error type for metrics/logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            StoreError::WriteFailed { .. } => "write_failed",
            StoreError::DeleteFailed { .. } => "delete_failed",
            StoreError::Unavailable { .. } => "unavailable",
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_joins_messages() {
        let err = ValidationError::new(vec![
            "eventId must be between 1 and 64 characters".to_string(),
            "hostName must be between 1 and 128 characters".to_string(),
        ]);

        assert_eq!(err.violation_count(), 2);
        let rendered = err.to_string();
        assert!(rendered.contains("eventId"));
        assert!(rendered.contains("hostName"));
    }

    #[test]
    fn test_retryability() {
        let err = StoreError::unavailable("connection refused");
        assert!(err.is_retryable());

        let err: VigilError = ValidationError::new(vec!["bad".into()]).into();
        assert!(!err.is_retryable());

        let err = WalError::serialization("oops");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_type() {
        assert_eq!(StoreError::write_failed("x").error_type(), "write_failed");
        assert_eq!(WalError::Disabled.error_type(), "disabled");

        let root: VigilError = StoreError::unavailable("down").into();
        assert_eq!(root.error_type(), "store");
    }
}
