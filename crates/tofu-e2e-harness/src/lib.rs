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

//! End-to-end harness for the `tofu` S3 backend
//!
//! Runs `tofu init` against a real, freshly created S3 bucket and checks
//! what the binary printed. Each run:
//!
//! 1. checks the opt-in switch ([`gate`]) and skips if it is not set
//! 2. creates a uniquely named bucket ([`naming`], [`provision`])
//! 3. writes a `main.tf` with a `backend "s3"` block ([`fixture`])
//! 4. runs the binary in that directory ([`runner`])
//! 5. checks exit status, stderr and stdout ([`outcome`])
//! 6. empties and deletes the bucket on every exit path ([`scope`], [`reaper`])
//!
//! [`InitBackendScenario`] strings these together.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tofu_e2e_harness::{HarnessConfig, InitBackendScenario};
//! use tofu_e2e_storage::MockBucketAdmin;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::from_env()?;
//! let report = InitBackendScenario::new(config, Arc::new(MockBucketAdmin::new()), "doc")
//!     .run()
//!     .await;
//! report.outcome.conclude();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fixture;
pub mod gate;
pub mod naming;
pub mod outcome;
pub mod provision;
pub mod reaper;
pub mod runner;
pub mod scenario;
pub mod scope;
pub mod setup;

pub use config::{ConfigError, HarnessConfig};
pub use error::{HarnessError, HarnessResult};
pub use fixture::BackendFixture;
pub use gate::GateDecision;
pub use outcome::{check_init_output, check_streams, CheckFailure, TestOutcome, SUCCESS_MARKER};
pub use provision::EphemeralBucket;
pub use reaper::{ReapOutcome, LEAK_WARNING};
pub use runner::{ProcessResult, TofuBinary};
pub use scenario::{InitBackendScenario, TestRunReport};
pub use scope::with_ephemeral_bucket;
pub use setup::{s3_admin, setup_from_env, setup_from_lookup};
