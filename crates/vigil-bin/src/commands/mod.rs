// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command dispatch.

mod run;
mod validate;
mod version;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;

/// Executes the selected command. `run` is the default.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.command.clone() {
        Some(Commands::Run) | None => run::execute(&cli).await,
        Some(Commands::Validate) => validate::execute(&cli),
        Some(Commands::Version) => {
            version::execute();
            Ok(())
        }
    }
}
