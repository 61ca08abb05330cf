// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! vigil - durable audit event ingestion service.
//!
//! Main binary entry point.

use clap::Parser;

use vigil_bin::cli::Cli;
use vigil_bin::commands;
use vigil_bin::error::report_error_and_exit;
use vigil_bin::logging::init_logging;

/// Application entry point.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.effective_log_level(), cli.log_format);

    if let Err(error) = commands::execute(cli).await {
        report_error_and_exit(error);
    }
}
