// Tofu E2E - ephemeral S3 backend test harness
// Copyright (C) 2025 Tofu E2E Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Opt-in gate. Runs before anything touches AWS.

use crate::config::{HarnessConfig, ENABLE_VAR};

/// Whether a run may proceed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The suite is enabled
    Run,
    /// The suite is disabled; the message names the switch
    Skip(String),
}

/// Decide from an already loaded configuration
pub fn check(config: &HarnessConfig) -> GateDecision {
    if config.enabled {
        GateDecision::Run
    } else {
        GateDecision::Skip(skip_message())
    }
}

fn skip_message() -> String {
    format!(
        "Skipping test, required environment variables missing. Use `{}`=1 to run",
        ENABLE_VAR
    )
}
