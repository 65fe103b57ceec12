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

//! Storage error types and utilities

use thiserror::Error;

/// Result type alias for bucket administration calls
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors returned by a [`BucketAdmin`](crate::BucketAdmin)
#[derive(Error, Debug)]
pub enum StorageError {
    /// The bucket name is already taken (by us or by another account)
    #[error("bucket already exists: {0}")]
    AlreadyExists(String),

    /// The bucket does not exist
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// Permission denied for the requested operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Provider rejected the call or could not be reached
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Create an AlreadyExists error for the given bucket
    pub fn already_exists<S: Into<String>>(bucket: S) -> Self {
        StorageError::AlreadyExists(bucket.into())
    }

    /// Create a BucketNotFound error for the given bucket
    pub fn bucket_not_found<S: Into<String>>(bucket: S) -> Self {
        StorageError::BucketNotFound(bucket.into())
    }

    /// Create a PermissionDenied error with context
    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        StorageError::PermissionDenied(msg.into())
    }

    /// Create a Backend error with context
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        StorageError::Backend(msg.into())
    }

    /// Check if this is an AlreadyExists error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StorageError::AlreadyExists(_))
    }

    /// Check if this error means the bucket is gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::BucketNotFound(_))
    }
}
