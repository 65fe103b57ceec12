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

//! Test binary setup: configuration, logging, and the S3 admin.

use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use std::sync::Arc;
use tofu_e2e_observability::init_tracing_with_config;
use tofu_e2e_storage::{BucketAdmin, S3BucketAdmin};
use tracing::debug;

/// Load configuration from the process environment and install the log
/// subscriber it describes
pub fn setup_from_env() -> HarnessResult<HarnessConfig> {
    setup_from_lookup(|name| std::env::var(name).ok())
}

/// [`setup_from_env`] with an injected variable lookup
pub fn setup_from_lookup<F>(lookup: F) -> HarnessResult<HarnessConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config = HarnessConfig::from_lookup(lookup)?;
    let installed = init_tracing_with_config(&config.log_config())?;
    debug!(installed, "log subscriber ready");
    Ok(config)
}

/// Real S3 admin for the configured region and endpoint.
///
/// Builds the client only; no request is sent until the first call.
pub async fn s3_admin(config: &HarnessConfig) -> Arc<dyn BucketAdmin> {
    Arc::new(S3BucketAdmin::new(config.s3_admin_config()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;

    #[test]
    fn test_bad_variable_is_config_error() {
        let err = setup_from_lookup(|name| {
            (name == crate::config::TIMEOUT_VAR).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_bad_filter_is_logging_error() {
        let err = setup_from_lookup(|name| {
            (name == crate::config::LOG_VAR).then(|| "tofu=[[[".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, HarnessError::Logging(_)));
    }

    #[test]
    fn test_defaults_install_once() {
        let config = setup_from_lookup(|_| None).unwrap();
        assert!(!config.enabled);
        assert!(setup_from_lookup(|_| None).is_ok());
    }

    #[tokio::test]
    async fn test_s3_admin_builds_without_network() {
        let config = HarnessConfig::default().with_region("eu-north-1");
        let admin = s3_admin(&config).await;
        assert!(format!("{:?}", admin).contains("eu-north-1"));
    }
}
