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

//! Best-effort bucket teardown
//!
//! Order is fixed: list, delete each object, delete the bucket. The first
//! failure stops everything after it, because a bucket that cannot be
//! emptied needs manual cleanup anyway and further calls only bury the
//! root cause. Failures are logged as warnings and returned as data; the
//! reaper never fails a test.

use tofu_e2e_storage::BucketAdmin;
use tracing::{info, warn};

/// Logged with every teardown failure
pub const LEAK_WARNING: &str = "WARNING: Failed to delete the test S3 bucket. \
It may have been left in your AWS account and may incur storage charges.";

/// What teardown achieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReapOutcome {
    /// Bucket and all its objects are gone
    Removed {
        /// Objects deleted before the bucket
        objects_deleted: usize,
    },
    /// Listing failed; nothing was deleted
    ListFailed {
        /// Provider error
        error: String,
    },
    /// An object could not be deleted; the rest and the bucket were left
    DeleteObjectFailed {
        /// Key that failed
        key: String,
        /// Objects deleted before the failure
        objects_deleted: usize,
        /// Provider error
        error: String,
    },
    /// The bucket itself could not be deleted
    DeleteBucketFailed {
        /// Objects deleted before the attempt
        objects_deleted: usize,
        /// Provider error
        error: String,
    },
}

impl ReapOutcome {
    /// True if nothing was left behind
    pub fn is_removed(&self) -> bool {
        matches!(self, ReapOutcome::Removed { .. })
    }
}

/// Empty and delete `bucket`, logging instead of failing
pub async fn reap_bucket(admin: &dyn BucketAdmin, bucket: &str) -> ReapOutcome {
    let keys = match admin.list_objects(bucket).await {
        Ok(keys) => keys,
        Err(err) => {
            warn!(bucket, "{} (error was {})", LEAK_WARNING, err);
            return ReapOutcome::ListFailed {
                error: err.to_string(),
            };
        }
    };

    let mut objects_deleted = 0;
    for key in keys {
        if let Err(err) = admin.delete_object(bucket, &key).await {
            warn!(bucket, key = %key, "{} (error was {})", LEAK_WARNING, err);
            return ReapOutcome::DeleteObjectFailed {
                key,
                objects_deleted,
                error: err.to_string(),
            };
        }
        objects_deleted += 1;
    }

    if let Err(err) = admin.delete_bucket(bucket).await {
        warn!(bucket, "{} (error was {})", LEAK_WARNING, err);
        return ReapOutcome::DeleteBucketFailed {
            objects_deleted,
            error: err.to_string(),
        };
    }

    info!("deleted S3 bucket {} ({} objects)", bucket, objects_deleted);
    ReapOutcome::Removed { objects_deleted }
}
