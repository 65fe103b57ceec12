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

//! `tofu init` against a real S3 bucket.
//!
//! # Prerequisites
//!
//! - AWS credentials in the default chain, allowed to create and delete
//!   buckets in `eu-north-1`
//! - a `tofu` binary on `PATH`, or `TF_E2E_TOFU_BIN`
//!
//! ```bash
//! TF_E2E_S3=1 cargo test -p tofu-e2e-harness --test init_backend_s3
//! ```
//!
//! Without `TF_E2E_S3=1` the test prints why it skipped and passes without
//! touching AWS.

use tofu_e2e_harness::gate::{self, GateDecision};
use tofu_e2e_harness::{s3_admin, setup_from_env, InitBackendScenario};

#[tokio::test]
async fn test_init_backend_s3() {
    let config = setup_from_env().expect("invalid harness configuration");
    if let GateDecision::Skip(reason) = gate::check(&config) {
        eprintln!("{}", reason);
        return;
    }

    let admin = s3_admin(&config).await;
    InitBackendScenario::new(config, admin, "test_init_backend_s3")
        .expect_state_object(true)
        .run()
        .await
        .outcome
        .conclude();
}
