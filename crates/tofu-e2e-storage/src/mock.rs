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

//! In-memory bucket admin for testing
//!
//! [`MockBucketAdmin`] keeps buckets in an `Arc<RwLock<HashMap>>`, records
//! every primitive call in order, and can be told to fail specific calls.
//! It follows the provider rules the harness cares about: a taken name
//! cannot be created again and a bucket with objects cannot be deleted.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tofu_e2e_storage::{AdminCall, BucketAdmin, CreateBucketRequest, MockBucketAdmin};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let admin = MockBucketAdmin::new();
//! admin.create_bucket(&CreateBucketRequest::for_region("b", "us-east-1")).await?;
//! admin.put_object("b", "terraform.tfstate", b"{}").await;
//! admin.fail_delete_object("terraform.tfstate").await;
//!
//! assert!(admin.delete_object("b", "terraform.tfstate").await.is_err());
//! assert_eq!(admin.calls().await.len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::{BucketAdmin, CreateBucketRequest, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One recorded primitive call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    /// `create_bucket`
    CreateBucket {
        /// Bucket name
        bucket: String,
        /// Location constraint as sent
        location_constraint: Option<String>,
    },
    /// `list_objects`
    ListObjects {
        /// Bucket name
        bucket: String,
    },
    /// `delete_object`
    DeleteObject {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },
    /// `delete_bucket`
    DeleteBucket {
        /// Bucket name
        bucket: String,
    },
}

#[derive(Debug, Default)]
struct MockBucket {
    region: String,
    objects: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct Failures {
    create: Option<String>,
    list: Option<String>,
    delete_object_keys: HashSet<String>,
    delete_bucket: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    buckets: HashMap<String, MockBucket>,
    calls: Vec<AdminCall>,
    failures: Failures,
}

/// Recording in-memory [`BucketAdmin`]
///
/// Cloning shares the underlying state, so a clone handed to the harness can
/// be inspected from the test afterwards.
#[derive(Clone, Default)]
pub struct MockBucketAdmin {
    state: Arc<RwLock<MockState>>,
}

impl MockBucketAdmin {
    /// Create an admin with no buckets
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `create_bucket` fail with a backend error
    pub async fn fail_create(&self, message: impl Into<String>) {
        self.state.write().await.failures.create = Some(message.into());
    }

    /// Make every `list_objects` fail with a backend error
    pub async fn fail_list(&self, message: impl Into<String>) {
        self.state.write().await.failures.list = Some(message.into());
    }

    /// Make `delete_object` fail for this key
    pub async fn fail_delete_object(&self, key: impl Into<String>) {
        self.state
            .write()
            .await
            .failures
            .delete_object_keys
            .insert(key.into());
    }

    /// Make every `delete_bucket` fail with a backend error
    pub async fn fail_delete_bucket(&self, message: impl Into<String>) {
        self.state.write().await.failures.delete_bucket = Some(message.into());
    }

    /// Seed a bucket directly, without recording a call
    pub async fn insert_bucket(&self, bucket: impl Into<String>, region: impl Into<String>) {
        self.state.write().await.buckets.insert(
            bucket.into(),
            MockBucket {
                region: region.into(),
                objects: BTreeMap::new(),
            },
        );
    }

    /// Write an object as the program under test would.
    ///
    /// Returns false if the bucket does not exist.
    pub async fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> bool {
        match self.state.write().await.buckets.get_mut(bucket) {
            Some(b) => {
                b.objects.insert(key.to_string(), data.to_vec());
                true
            }
            None => false,
        }
    }

    /// Every primitive call so far, in order
    pub async fn calls(&self) -> Vec<AdminCall> {
        self.state.read().await.calls.clone()
    }

    /// Region a bucket was created in
    pub async fn bucket_region(&self, bucket: &str) -> Option<String> {
        self.state
            .read()
            .await
            .buckets
            .get(bucket)
            .map(|b| b.region.clone())
    }

    /// Number of buckets currently held
    pub async fn bucket_count(&self) -> usize {
        self.state.read().await.buckets.len()
    }
}

impl fmt::Debug for MockBucketAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBucketAdmin").finish_non_exhaustive()
    }
}

#[async_trait]
impl BucketAdmin for MockBucketAdmin {
    async fn create_bucket(&self, request: &CreateBucketRequest) -> StorageResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(AdminCall::CreateBucket {
            bucket: request.bucket.clone(),
            location_constraint: request.location_constraint.clone(),
        });

        if let Some(message) = &state.failures.create {
            return Err(StorageError::backend(message.clone()));
        }
        if state.buckets.contains_key(&request.bucket) {
            return Err(StorageError::already_exists(&request.bucket));
        }

        let region = request
            .location_constraint
            .clone()
            .unwrap_or_else(|| crate::DEFAULT_REGION.to_string());
        state.buckets.insert(
            request.bucket.clone(),
            MockBucket {
                region,
                objects: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let mut state = self.state.write().await;
        state.calls.push(AdminCall::ListObjects {
            bucket: bucket.to_string(),
        });

        if let Some(message) = &state.failures.list {
            return Err(StorageError::backend(message.clone()));
        }
        state
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .ok_or_else(|| StorageError::bucket_not_found(bucket))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(AdminCall::DeleteObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });

        if state.failures.delete_object_keys.contains(key) {
            return Err(StorageError::permission_denied(format!(
                "delete {} in {}",
                key, bucket
            )));
        }
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::bucket_not_found(bucket))?;
        // S3 deletes are idempotent
        b.objects.remove(key);
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(AdminCall::DeleteBucket {
            bucket: bucket.to_string(),
        });

        if let Some(message) = &state.failures.delete_bucket {
            return Err(StorageError::backend(message.clone()));
        }
        let remaining = match state.buckets.get(bucket) {
            Some(b) => b.objects.len(),
            None => return Err(StorageError::bucket_not_found(bucket)),
        };
        if remaining > 0 {
            return Err(StorageError::backend(format!(
                "BucketNotEmpty: {} still holds {} objects",
                bucket, remaining
            )));
        }
        state.buckets.remove(bucket);
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let state = self.state.read().await;
        state
            .buckets
            .get(bucket)
            .map(|b| b.objects.contains_key(key))
            .ok_or_else(|| StorageError::bucket_not_found(bucket))
    }

    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        Ok(self.state.read().await.buckets.contains_key(bucket))
    }
}
