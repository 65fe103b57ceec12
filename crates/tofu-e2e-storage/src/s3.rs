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

//! AWS S3 bucket administration
//!
//! Implements [`BucketAdmin`] on top of `aws-sdk-s3`.
//!
//! # Configuration
//!
//! Credentials come from the SDK's default chain:
//! 1. Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, etc.)
//! 2. AWS profiles (~/.aws/credentials and ~/.aws/config)
//! 3. IAM role credentials (EC2, ECS, Lambda)
//!
//! The region is always set explicitly from [`S3AdminConfig`] so the client
//! talks to the same region the bucket is created in.
//!
//! # Logging
//!
//! The SDK emits its own diagnostics through `tracing`. Callers that wrap
//! these futures in a span get those events attributed to their span.

use crate::{BucketAdmin, CreateBucketRequest, StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use std::fmt;
use tracing::debug;

/// Configuration for [`S3BucketAdmin`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct S3AdminConfig {
    /// Region the client is bound to
    pub region: String,

    /// Optional custom endpoint (for S3-compatible services like MinIO)
    pub endpoint: Option<String>,
}

impl S3AdminConfig {
    /// Configuration for plain AWS in `region`
    pub fn new(region: impl Into<String>) -> Self {
        S3AdminConfig {
            region: region.into(),
            endpoint: None,
        }
    }

    /// Point the client at a custom endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// S3 implementation of [`BucketAdmin`]
#[derive(Clone)]
pub struct S3BucketAdmin {
    client: Client,
    config: S3AdminConfig,
}

impl S3BucketAdmin {
    /// Build a client from the default credential chain.
    ///
    /// No request is sent here; credential problems surface on the first call.
    pub async fn new(config: S3AdminConfig) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint);
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        S3BucketAdmin {
            client: Client::from_conf(builder.build()),
            config,
        }
    }

    /// Wrap an existing client
    pub fn from_client(client: Client, config: S3AdminConfig) -> Self {
        S3BucketAdmin { client, config }
    }
}

impl fmt::Debug for S3BucketAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3BucketAdmin")
            .field("region", &self.config.region)
            .field("endpoint", &self.config.endpoint)
            .finish()
    }
}

/// Map an SDK failure onto [`StorageError`], keeping the full error chain
fn classify<E, R>(err: &SdkError<E, R>, action: &str, bucket: &str) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug + 'static,
{
    match err.code() {
        Some("AccessDenied") => StorageError::permission_denied(format!(
            "{} {}: {}",
            action,
            bucket,
            DisplayErrorContext(err)
        )),
        Some("NoSuchBucket") => StorageError::bucket_not_found(bucket),
        _ => StorageError::backend(format!(
            "failed to {} {}: {}",
            action,
            bucket,
            DisplayErrorContext(err)
        )),
    }
}

#[async_trait]
impl BucketAdmin for S3BucketAdmin {
    async fn create_bucket(&self, request: &CreateBucketRequest) -> StorageResult<()> {
        debug!(
            bucket = %request.bucket,
            constraint = ?request.location_constraint,
            "Creating S3 bucket"
        );

        let mut call = self.client.create_bucket().bucket(&request.bucket);
        if let Some(constraint) = &request.location_constraint {
            call = call.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(constraint.as_str()))
                    .build(),
            );
        }

        match call.send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let taken = err.as_service_error().is_some_and(|e| {
                    e.is_bucket_already_exists() || e.is_bucket_already_owned_by_you()
                });
                if taken {
                    Err(StorageError::already_exists(&request.bucket))
                } else {
                    Err(classify(&err, "create bucket", &request.bucket))
                }
            }
        }
    }

    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<String>> {
        debug!("Listing objects in S3 bucket: {}", bucket);

        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| classify(&e, "list objects in", bucket))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(str::to_string)),
            );

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        keys.sort();
        debug!("Found {} objects in {}", keys.len(), bucket);
        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        debug!("Deleting object {} from {}", key, bucket);

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(&e, &format!("delete object {} in", key), bucket))?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        debug!("Deleting S3 bucket: {}", bucket);

        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(&e, "delete bucket", bucket))?;
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(classify(&err, &format!("head object {} in", key), bucket)),
        }
    }

    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(classify(&err, "head bucket", bucket)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_sets_endpoint() {
        let config = S3AdminConfig::new("eu-north-1").with_endpoint("http://127.0.0.1:9000");
        assert_eq!(config.region, "eu-north-1");
        assert_eq!(config.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
    }

    #[tokio::test]
    async fn debug_output_hides_client() {
        let config = S3AdminConfig::new("eu-north-1");
        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::new()
                .region(Region::new("eu-north-1"))
                .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                .build(),
        );
        let admin = S3BucketAdmin::from_client(client, config);
        let rendered = format!("{:?}", admin);
        assert!(rendered.contains("eu-north-1"));
        assert!(!rendered.contains("Client"));
    }
}
