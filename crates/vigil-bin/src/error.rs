// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Binary error handling.

use thiserror::Error;

use vigil_config::ConfigError;

/// Errors surfaced by the binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration loading or validation failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An OS signal handler could not be registered; the service cannot
    /// run unsupervised without one.
    #[error("failed to register signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

impl BinError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BinError::Config(_) => 2,
            BinError::Signal(_) => 1,
        }
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            BinError::Config(_) => "config",
            BinError::Signal(_) => "signal",
        }
    }
}

/// Result type for binary operations.
pub type BinResult<T> = Result<T, BinError>;

/// Reports an error to stderr and exits with the error's exit code.
pub fn report_error_and_exit(error: BinError) -> ! {
    tracing::error!(error = %error, error_type = error.error_type(), "Fatal error");
    eprintln!("error: {}", error);
    std::process::exit(error.exit_code());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: BinError =
            ConfigError::validation("engine.buffer-size", "must be positive").into();
        assert!(err.to_string().contains("buffer-size"));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.error_type(), "config");
    }

    #[test]
    fn test_signal_error() {
        let err = BinError::Signal(std::io::Error::new(
            std::io::ErrorKind::Other,
            "no signal support",
        ));
        assert!(err.to_string().contains("signal handler"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.error_type(), "signal");
    }
}
