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

//! Bucket administration for ephemeral test buckets
//!
//! The harness only needs a handful of provider primitives: create a bucket,
//! list what is inside it, delete objects, delete the bucket. This crate puts
//! them behind the [`BucketAdmin`] trait so the lifecycle logic can run
//! against real S3 ([`S3BucketAdmin`]) or an in-memory recorder
//! ([`MockBucketAdmin`]).
//!
//! # Examples
//!
//! ```rust,no_run
//! use tofu_e2e_storage::{BucketAdmin, CreateBucketRequest, MockBucketAdmin};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let admin = MockBucketAdmin::new();
//! admin
//!     .create_bucket(&CreateBucketRequest::for_region("my-bucket", "eu-north-1"))
//!     .await?;
//! assert!(admin.list_objects("my-bucket").await?.is_empty());
//! admin.delete_bucket("my-bucket").await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod mock;
pub mod s3;

use async_trait::async_trait;
use std::fmt::Debug;

pub use error::{StorageError, StorageResult};
pub use mock::{AdminCall, MockBucketAdmin};
pub use s3::{S3AdminConfig, S3BucketAdmin};

/// The region S3 treats as implicit when creating a bucket.
///
/// Every other region needs an explicit `LocationConstraint`, see
/// <https://docs.aws.amazon.com/cli/latest/reference/s3api/create-bucket.html>.
pub const DEFAULT_REGION: &str = "us-east-1";

/// A create-bucket call, with the location constraint already decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBucketRequest {
    /// Globally unique bucket name
    pub bucket: String,

    /// Region the bucket should live in
    pub region: String,

    /// Explicit location constraint; `None` only for [`DEFAULT_REGION`]
    pub location_constraint: Option<String>,
}

impl CreateBucketRequest {
    /// Build the request for `bucket` in `region`.
    ///
    /// Omitting the constraint outside `us-east-1` either fails or silently
    /// creates the bucket in the wrong region, so it is set for every other
    /// region.
    pub fn for_region(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        let region = region.into();
        let location_constraint = if region == DEFAULT_REGION {
            None
        } else {
            Some(region.clone())
        };
        CreateBucketRequest {
            bucket: bucket.into(),
            region,
            location_constraint,
        }
    }
}

/// Provider operations the harness relies on.
///
/// Implementations must be `Send + Sync` so one admin can be shared between
/// the provisioner and the reaper behind an `Arc`.
#[async_trait]
pub trait BucketAdmin: Send + Sync + Debug {
    /// Create a bucket.
    ///
    /// # Errors
    ///
    /// - [`StorageError::AlreadyExists`] if the name is taken
    /// - any other variant for transport or permission failures
    async fn create_bucket(&self, request: &CreateBucketRequest) -> StorageResult<()>;

    /// List every object key in the bucket, sorted.
    ///
    /// An empty bucket returns an empty vec, not an error.
    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<String>>;

    /// Delete a single object.
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Delete an (empty) bucket.
    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()>;

    /// Check whether an object exists.
    ///
    /// Only used to verify results; the bucket lifecycle never calls it.
    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;

    /// Check whether a bucket exists.
    ///
    /// Only used to verify results; the bucket lifecycle never calls it.
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_object_safe() {
        fn _check_object_safe(_: &dyn BucketAdmin) {}
    }

    #[test]
    fn default_region_omits_constraint() {
        let request = CreateBucketRequest::for_region("b", "us-east-1");
        assert_eq!(request.location_constraint, None);
    }

    #[test]
    fn other_region_sets_constraint() {
        let request = CreateBucketRequest::for_region("b", "eu-north-1");
        assert_eq!(request.location_constraint.as_deref(), Some("eu-north-1"));
        assert_eq!(request.region, "eu-north-1");
    }
}
