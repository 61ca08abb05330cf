// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! Subcommands:
//!
//! - `run`: start the service (default)
//! - `validate`: validate a configuration file
//! - `version`: show version information

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// vigil - durable audit event ingestion service.
#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    author = "Sylvex <contact@sylvex.io>",
    version = vigil_engine::VERSION,
    about = "Durable audit event ingestion and persistence service",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "vigil.yaml",
        env = "VIGIL_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "VIGIL_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "VIGIL_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Returns the log level after applying `--quiet`/`--verbose`.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the audit service (default when no subcommand is given).
    Run,

    /// Validate the configuration file and exit.
    Validate,

    /// Show version information.
    Version,
}

// =============================================================================
// Log Format
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for log aggregation.
    Json,
    /// Minimal compact output.
    Compact,
}

// =============================================================================
// Tests
// =============================================================================
