// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `run` command: start the service.

use tracing::info;

use vigil_config::{load_config, VigilConfig};

use crate::cli::Cli;
use crate::error::BinResult;
use crate::runtime::ServiceRuntime;

/// Starts the service with the configured (or default) settings.
pub async fn execute(cli: &Cli) -> BinResult<()> {
    let config = if cli.config.exists() {
        load_config(&cli.config)?
    } else {
        info!(
            path = %cli.config.display(),
            "Config file not found, using defaults"
        );
        VigilConfig::default()
    };

    ServiceRuntime::new(config).run().await
}
