// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `validate` command: check a configuration file.

use vigil_config::load_config;

use crate::cli::Cli;
use crate::error::BinResult;

/// Loads and validates the configuration file, reporting the outcome.
pub fn execute(cli: &Cli) -> BinResult<()> {
    let config = load_config(&cli.config)?;

    println!("Configuration OK: {}", cli.config.display());
    println!(
        "  buffer-size: {}, flush-interval: {} ms, wal: {}",
        config.engine.buffer_size,
        config.engine.flush_interval.as_millis(),
        config.engine.wal_file_path.display()
    );
    println!(
        "  retention: {} ms, sweep schedule: {}",
        config.engine.retention_period_millis, config.engine.clear_cron
    );
    Ok(())
}
