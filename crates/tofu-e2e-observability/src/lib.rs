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

//! Structured logging for the e2e harness
//!
//! - **Output formats**: pretty, compact and JSON
//! - **Environment-based filtering**: `RUST_LOG` when no level is configured
//! - **Per-test context**: [`TestLogContext`] tags every remote call (and the
//!   AWS SDK events under it) with the test and bucket name
//!
//! # Example
//!
//! ```ignore
//! use tofu_e2e_observability::{init_tracing_with_config, LogConfig, TestLogContext};
//!
//! init_tracing_with_config(&LogConfig::for_tests("info"))?;
//! let ctx = TestLogContext::new("init_backend_s3");
//! ctx.attach(async { tracing::info!("inside the test span") }).await;
//! ```

pub mod config;
pub mod context;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use context::TestLogContext;
pub use initialization::init_tracing_with_config;
