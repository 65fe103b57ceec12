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

//! Test bucket provisioning

use crate::error::{HarnessError, HarnessResult};
use tofu_e2e_storage::{BucketAdmin, CreateBucketRequest};
use tracing::info;

/// A bucket created for one test run. It is billable until reaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralBucket {
    /// Globally unique bucket name
    pub name: String,
    /// Region the bucket was created in
    pub region: String,
}

/// Create `name` in `region`.
///
/// Any failure is fatal for the run: without the bucket there is nothing to
/// test, and nothing to clean up.
pub async fn provision_bucket(
    admin: &dyn BucketAdmin,
    name: &str,
    region: &str,
) -> HarnessResult<EphemeralBucket> {
    let request = CreateBucketRequest::for_region(name, region);

    // Logged at info so a leaked bucket can be found and removed by hand.
    info!("creating S3 bucket {} in {}", name, region);

    admin
        .create_bucket(&request)
        .await
        .map_err(|source| HarnessError::Provision {
            bucket: name.to_string(),
            source,
        })?;

    Ok(EphemeralBucket {
        name: request.bucket,
        region: request.region,
    })
}
