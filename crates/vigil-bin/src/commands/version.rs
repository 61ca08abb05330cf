// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `version` command.

/// Prints version information.
pub fn execute() {
    println!("vigil {}", vigil_engine::VERSION);
    println!("  vigil-core   {}", vigil_core::VERSION);
    println!("  vigil-engine {}", vigil_engine::VERSION);
    println!("  vigil-config {}", vigil_config::VERSION);
}
