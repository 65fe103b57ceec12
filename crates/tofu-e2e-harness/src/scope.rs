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

//! Scoped bucket ownership.
//!
//! Teardown needs async calls, which `Drop` cannot make. Instead the body
//! runs inside [`with_ephemeral_bucket`], which reaps the bucket on every exit
//! path: normal return, early return through `?` inside the body, and panic.
//! A panic is re-raised after teardown so the test still fails with it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tofu_e2e_harness::scope::with_ephemeral_bucket;
//! use tofu_e2e_harness::provision::provision_bucket;
//! use tofu_e2e_storage::MockBucketAdmin;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let admin = MockBucketAdmin::new();
//! let bucket = provision_bucket(&admin, "b", "eu-north-1").await?;
//!
//! let (name, reaped) = with_ephemeral_bucket(&admin, bucket, |bucket| async move {
//!     bucket.name
//! })
//! .await;
//! assert_eq!(name, "b");
//! assert!(reaped.is_removed());
//! # Ok(())
//! # }
//! ```

use crate::provision::EphemeralBucket;
use crate::reaper::{reap_bucket, ReapOutcome};
use futures::FutureExt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use tofu_e2e_storage::BucketAdmin;

/// Run `body` with `bucket`, then reap the bucket no matter how `body` ended.
///
/// Returns the body's value together with what teardown achieved.
pub async fn with_ephemeral_bucket<F, Fut, T>(
    admin: &dyn BucketAdmin,
    bucket: EphemeralBucket,
    body: F,
) -> (T, ReapOutcome)
where
    F: FnOnce(EphemeralBucket) -> Fut,
    Fut: Future<Output = T>,
{
    let name = bucket.name.clone();
    let result = AssertUnwindSafe(async move { body(bucket).await })
        .catch_unwind()
        .await;

    let reaped = reap_bucket(admin, &name).await;

    match result {
        Ok(value) => (value, reaped),
        Err(payload) => panic::resume_unwind(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tofu_e2e_storage::{AdminCall, MockBucketAdmin};

    async fn provisioned(admin: &MockBucketAdmin) -> EphemeralBucket {
        admin.insert_bucket("scoped", "eu-north-1").await;
        EphemeralBucket {
            name: "scoped".to_string(),
            region: "eu-north-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_reaps_after_normal_return() {
        let admin = MockBucketAdmin::new();
        let bucket = provisioned(&admin).await;

        let writer = admin.clone();
        let (value, reaped) = with_ephemeral_bucket(&admin, bucket, |b| async move {
            writer.put_object(&b.name, "terraform.tfstate", b"{}").await;
            42
        })
        .await;

        assert_eq!(value, 42);
        assert_eq!(reaped, ReapOutcome::Removed { objects_deleted: 1 });
        assert_eq!(admin.bucket_count().await, 0);
    }

    #[tokio::test]
    async fn test_reaps_after_error_in_body() {
        let admin = MockBucketAdmin::new();
        let bucket = provisioned(&admin).await;

        let (value, reaped) = with_ephemeral_bucket(&admin, bucket, |_| async {
            Err::<(), _>("fixture write failed")
        })
        .await;

        assert!(value.is_err());
        assert!(reaped.is_removed());
    }

    #[tokio::test]
    async fn test_reaps_then_repanics() {
        let admin = MockBucketAdmin::new();
        let bucket = provisioned(&admin).await;

        let inner = admin.clone();
        let handle = tokio::spawn(async move {
            with_ephemeral_bucket(&inner, bucket, |_| async {
                panic!("body blew up");
            })
            .await
        });

        let err = handle.await.unwrap_err();
        assert!(err.is_panic());
        assert!(matches!(
            admin.calls().await.last(),
            Some(AdminCall::DeleteBucket { .. })
        ));
        assert_eq!(admin.bucket_count().await, 0);
    }
}
