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

//! Harness configuration
//!
//! Read once when a test starts and passed down explicitly; nothing below
//! this module looks at the process environment.
//!
//! Precedence, lowest first: built-in defaults, an optional TOML file,
//! environment variables. The file is read only when [`CONFIG_VAR`] names
//! it. The opt-in switch ([`ENABLE_VAR`]) is only ever taken from the
//! environment.
//!
//! ```toml
//! tofu_bin = "/usr/local/bin/tofu"
//! region = "eu-north-1"
//! bucket_prefix = "org.opentofu.state.e2etest"
//! state_key = "terraform.tfstate"
//! timeout_secs = 600
//! log_level = "info,aws_sdk_s3=warn"
//! log_format = "json"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tofu_e2e_observability::{LogConfig, LogError, LogFormat};
use tofu_e2e_storage::S3AdminConfig;
use tracing::debug;

/// Opt-in switch; exactly `"1"` enables the suite
pub const ENABLE_VAR: &str = "TF_E2E_S3";
/// Path of the `tofu` executable
pub const TOFU_BIN_VAR: &str = "TF_E2E_TOFU_BIN";
/// Region the test bucket is created in
pub const REGION_VAR: &str = "TF_E2E_S3_REGION";
/// Bucket name prefix
pub const BUCKET_PREFIX_VAR: &str = "TF_E2E_S3_BUCKET_PREFIX";
/// State object key written into the fixture
pub const STATE_KEY_VAR: &str = "TF_E2E_S3_KEY";
/// Optional S3 endpoint override
pub const ENDPOINT_VAR: &str = "TF_E2E_S3_ENDPOINT";
/// Process timeout in seconds; `0` disables it
pub const TIMEOUT_VAR: &str = "TF_E2E_TIMEOUT_SECS";
/// Log filter
pub const LOG_VAR: &str = "TF_E2E_LOG";
/// Log format: `pretty`, `compact` or `json`
pub const LOG_FORMAT_VAR: &str = "TF_E2E_LOG_FORMAT";
/// Path of an optional TOML configuration file
pub const CONFIG_VAR: &str = "TF_E2E_CONFIG";

/// Default region for the test bucket
pub const DEFAULT_TEST_REGION: &str = "eu-north-1";
/// Default bucket name prefix
pub const DEFAULT_BUCKET_PREFIX: &str = "org.opentofu.state.e2etest";
/// Default state object key
pub const DEFAULT_STATE_KEY: &str = "terraform.tfstate";
/// Default bound on a single `tofu` invocation
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(600);

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the configuration file failed
    #[error("IO error reading configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema
    #[error("Failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),

    /// The configuration file does not exist
    #[error("Configuration file not found at path: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An environment variable has a value of the wrong shape
    #[error("Environment variable parsing error: {variable_name}={value}. {reason}")]
    EnvVarParsingError {
        /// Variable name
        variable_name: String,
        /// Rejected value
        value: String,
        /// What was expected
        reason: String,
    },

    /// A field failed validation
    #[error("Invalid configuration value for field '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    fn env_var_parsing_error(
        variable_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::EnvVarParsingError {
            variable_name: variable_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// On-disk form; every field optional so files only carry overrides
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    tofu_bin: Option<PathBuf>,
    region: Option<String>,
    bucket_prefix: Option<String>,
    state_key: Option<String>,
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
    log_level: Option<String>,
    log_format: Option<String>,
}

/// Everything a test run needs to know about its environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Whether the opt-in switch was set
    pub enabled: bool,
    /// Executable under test
    pub tofu_bin: PathBuf,
    /// Region for the test bucket
    pub region: String,
    /// Bucket names are `<bucket_prefix><nanos>`
    pub bucket_prefix: String,
    /// State object key used in the fixture
    pub state_key: String,
    /// Optional S3 endpoint override
    pub endpoint: Option<String>,
    /// Bound on one `tofu` invocation
    pub process_timeout: Option<Duration>,
    /// Log filter for the test subscriber
    pub log_level: String,
    /// Output format for the test subscriber
    pub log_format: LogFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            enabled: false,
            tofu_bin: PathBuf::from("tofu"),
            region: DEFAULT_TEST_REGION.to_string(),
            bucket_prefix: DEFAULT_BUCKET_PREFIX.to_string(),
            state_key: DEFAULT_STATE_KEY.to_string(),
            endpoint: None,
            process_timeout: Some(DEFAULT_PROCESS_TIMEOUT),
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

impl HarnessConfig {
    /// Defaults plus the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults, the file named by [`CONFIG_VAR`] if any, then whatever
    /// `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(CONFIG_VAR).filter(|p| !p.is_empty()) {
            return Self::load_file(Path::new(&path), lookup);
        }
        let mut config = Self::default();
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides from `lookup`
    pub fn load_file<F>(path: &Path, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!("Loading harness configuration from: {}", path.display());
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(tofu_bin) = file.tofu_bin {
            config.tofu_bin = tofu_bin;
        }
        if let Some(region) = file.region {
            config.region = region;
        }
        if let Some(prefix) = file.bucket_prefix {
            config.bucket_prefix = prefix;
        }
        if let Some(key) = file.state_key {
            config.state_key = key;
        }
        if file.endpoint.is_some() {
            config.endpoint = file.endpoint;
        }
        if let Some(secs) = file.timeout_secs {
            config.process_timeout = timeout_from_secs(secs);
        }
        if let Some(level) = file.log_level {
            config.log_level = level;
        }
        if let Some(format) = file.log_format {
            config.log_format = format
                .parse()
                .map_err(|e: LogError| ConfigError::invalid_value("log_format", e.to_string()))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.enabled = lookup(ENABLE_VAR).as_deref() == Some("1");

        if let Some(value) = lookup(TOFU_BIN_VAR) {
            self.tofu_bin = PathBuf::from(value);
        }
        if let Some(value) = lookup(REGION_VAR) {
            self.region = value;
        }
        if let Some(value) = lookup(BUCKET_PREFIX_VAR) {
            self.bucket_prefix = value;
        }
        if let Some(value) = lookup(STATE_KEY_VAR) {
            self.state_key = value;
        }
        if let Some(value) = lookup(ENDPOINT_VAR) {
            self.endpoint = if value.is_empty() { None } else { Some(value) };
        }
        if let Some(value) = lookup(TIMEOUT_VAR) {
            let secs = value.trim().parse::<u64>().map_err(|_| {
                ConfigError::env_var_parsing_error(
                    TIMEOUT_VAR,
                    &value,
                    "expected a whole number of seconds (0 disables the timeout)",
                )
            })?;
            self.process_timeout = timeout_from_secs(secs);
        }
        if let Some(value) = lookup(LOG_VAR) {
            self.log_level = value;
        }
        if let Some(value) = lookup(LOG_FORMAT_VAR) {
            self.log_format = value.parse().map_err(|e: LogError| {
                ConfigError::env_var_parsing_error(LOG_FORMAT_VAR, &value, e.to_string())
            })?;
        }
        Ok(())
    }

    /// Check field invariants
    pub fn validate(&self) -> ConfigResult<()> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::invalid_value("region", "must not be empty"));
        }
        if self.bucket_prefix.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "bucket_prefix",
                "must not be empty",
            ));
        }
        if self.state_key.is_empty() {
            return Err(ConfigError::invalid_value("state_key", "must not be empty"));
        }
        if self.state_key.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "state_key",
                "must not start with '/'",
            ));
        }
        if self.tofu_bin.as_os_str().is_empty() {
            return Err(ConfigError::invalid_value("tofu_bin", "must not be empty"));
        }
        Ok(())
    }

    /// Turn the opt-in switch on or off
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Use a different executable
    pub fn with_tofu_bin(mut self, tofu_bin: impl Into<PathBuf>) -> Self {
        self.tofu_bin = tofu_bin.into();
        self
    }

    /// Use a different region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Use a different process timeout
    pub fn with_process_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.process_timeout = timeout;
        self
    }

    /// Subscriber settings for a test binary
    pub fn log_config(&self) -> LogConfig {
        LogConfig::for_tests(self.log_level.clone()).with_format(self.log_format)
    }

    /// Client settings for the bucket admin
    pub fn s3_admin_config(&self) -> S3AdminConfig {
        let config = S3AdminConfig::new(self.region.clone());
        match &self.endpoint {
            Some(endpoint) => config.with_endpoint(endpoint.clone()),
            None => config,
        }
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_disabled() {
        let config = HarnessConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.region, "eu-north-1");
        assert_eq!(config.bucket_prefix, "org.opentofu.state.e2etest");
        assert_eq!(config.state_key, "terraform.tfstate");
        assert_eq!(config.process_timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_only_exact_one_enables() {
        let config = HarnessConfig::from_lookup(lookup_from(&[(ENABLE_VAR, "1")])).unwrap();
        assert!(config.enabled);

        for value in ["0", "true", "yes", " 1", ""] {
            let config = HarnessConfig::from_lookup(lookup_from(&[(ENABLE_VAR, value)])).unwrap();
            assert!(!config.enabled, "{:?} must not enable the suite", value);
        }
    }

    #[test]
    fn test_env_overrides() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            (TOFU_BIN_VAR, "/opt/tofu/bin/tofu"),
            (REGION_VAR, "us-east-1"),
            (ENDPOINT_VAR, "http://127.0.0.1:9000"),
            (TIMEOUT_VAR, "0"),
            (LOG_VAR, "debug"),
        ]))
        .unwrap();

        assert_eq!(config.tofu_bin, PathBuf::from("/opt/tofu/bin/tofu"));
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(config.process_timeout, None);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_bad_timeout_names_variable() {
        let err = HarnessConfig::from_lookup(lookup_from(&[(TIMEOUT_VAR, "ten")])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(TIMEOUT_VAR));
        assert!(message.contains("ten"));
    }

    #[test]
    fn test_absolute_state_key_rejected() {
        let err =
            HarnessConfig::from_lookup(lookup_from(&[(STATE_KEY_VAR, "/terraform.tfstate")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "state_key"));
    }

    #[test]
    fn test_toml_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e2e.toml");
        std::fs::write(
            &path,
            "region = \"eu-west-1\"\ntimeout_secs = 30\nstate_key = \"ci/terraform.tfstate\"\n",
        )
        .unwrap();

        let config =
            HarnessConfig::load_file(&path, lookup_from(&[(REGION_VAR, "eu-central-1")])).unwrap();
        assert_eq!(config.region, "eu-central-1");
        assert_eq!(config.state_key, "ci/terraform.tfstate");
        assert_eq!(config.process_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_unknown_toml_field_rejected() {
        assert!(matches!(
            HarnessConfig::from_toml_str("bucket = \"x\""),
            Err(ConfigError::TomlParseError(_))
        ));
    }

    #[test]
    fn test_config_var_loads_file_under_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e2e.toml");
        std::fs::write(&path, "bucket_prefix = \"ci.e2etest\"\nlog_format = \"json\"\n").unwrap();
        let path = path.display().to_string();

        let config = HarnessConfig::from_lookup(lookup_from(&[
            (CONFIG_VAR, path.as_str()),
            (ENABLE_VAR, "1"),
            (LOG_FORMAT_VAR, "pretty"),
        ]))
        .unwrap();
        assert!(config.enabled);
        assert_eq!(config.bucket_prefix, "ci.e2etest");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_var_pointing_nowhere_fails() {
        let err = HarnessConfig::from_lookup(lookup_from(&[(CONFIG_VAR, "/nonexistent/e2e.toml")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_log_format_from_file_and_env() {
        let config = HarnessConfig::from_toml_str("log_format = \"json\"").unwrap();
        assert_eq!(config.log_config().format, LogFormat::Json);

        let err = HarnessConfig::from_toml_str("log_format = \"xml\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "log_format"));

        let err = HarnessConfig::from_lookup(lookup_from(&[(LOG_FORMAT_VAR, "xml")])).unwrap_err();
        assert!(err.to_string().contains(LOG_FORMAT_VAR));
    }

    #[test]
    fn test_s3_admin_config_carries_endpoint() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            (REGION_VAR, "us-east-1"),
            (ENDPOINT_VAR, "http://127.0.0.1:9000"),
        ]))
        .unwrap();
        let admin = config.s3_admin_config();
        assert_eq!(admin.region, "us-east-1");
        assert_eq!(admin.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(HarnessConfig::default().s3_admin_config().endpoint, None);
    }

    #[test]
    fn test_missing_file() {
        let err = HarnessConfig::load_file(Path::new("/nonexistent/e2e.toml"), lookup_from(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
