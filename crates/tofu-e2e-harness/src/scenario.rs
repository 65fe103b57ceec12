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

//! One `tofu init` run against a freshly provisioned S3 bucket.
//!
//! The steps are strictly ordered: gate, provision, write fixture, run the
//! binary, check output. The bucket is reaped on every path once it exists.
//! Setup failures stop the run; check failures are collected and reported
//! together; teardown problems only show up in the log and the report.

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::fixture::BackendFixture;
use crate::gate::{self, GateDecision};
use crate::naming;
use crate::outcome::{check_init_output, check_streams, CheckFailure, TestOutcome, SUCCESS_MARKER};
use crate::provision::{provision_bucket, EphemeralBucket};
use crate::reaper::ReapOutcome;
use crate::runner::{ProcessResult, TofuBinary};
use crate::scope::with_ephemeral_bucket;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tofu_e2e_observability::TestLogContext;
use tofu_e2e_storage::BucketAdmin;
use tracing::{info, warn};

/// Everything observed during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRunReport {
    /// Name the run logged under
    pub test_name: String,
    /// Bucket name, once one was generated
    pub bucket: Option<String>,
    /// Region the bucket was requested in
    pub region: String,
    /// State key written into the fixture
    pub key: String,
    /// Whether the fixture reached disk
    pub fixture_written: bool,
    /// Captured output, if the binary was launched
    pub process: Option<ProcessResult>,
    /// Teardown result, if a bucket was provisioned
    pub reaped: Option<ReapOutcome>,
    /// Final verdict
    pub outcome: TestOutcome,
}

#[derive(Debug, Default)]
struct Exercise {
    fixture_written: bool,
    process: Option<ProcessResult>,
    failures: Vec<String>,
}

/// Builder for an init-against-S3 run
///
/// # Examples
///
/// ```rust,no_run
/// use tofu_e2e_harness::{s3_admin, setup_from_env, InitBackendScenario};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = setup_from_env()?;
/// let admin = s3_admin(&config).await;
///
/// InitBackendScenario::new(config, admin, "init_backend_s3")
///     .expect_state_object(true)
///     .run()
///     .await
///     .outcome
///     .conclude();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InitBackendScenario {
    config: HarnessConfig,
    admin: Arc<dyn BucketAdmin>,
    test_name: String,
    args: Vec<String>,
    marker: String,
    env: Vec<(String, String)>,
    unique_key: bool,
    expect_state_object: bool,
    workdir: Option<PathBuf>,
}

impl InitBackendScenario {
    /// A plain `init` run with the configured key and the stock success marker
    pub fn new(
        config: HarnessConfig,
        admin: Arc<dyn BucketAdmin>,
        test_name: impl Into<String>,
    ) -> Self {
        InitBackendScenario {
            config,
            admin,
            test_name: test_name.into(),
            args: vec!["init".to_string()],
            marker: SUCCESS_MARKER.to_string(),
            env: Vec::new(),
            unique_key: false,
            expect_state_object: false,
            workdir: None,
        }
    }

    /// Replace the arguments passed to the binary
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Expect a different substring in stdout
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Set an environment variable for the binary
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Prefix the state key with a fresh suffix, for runs sharing a bucket
    pub fn unique_key(mut self, enabled: bool) -> Self {
        self.unique_key = enabled;
        self
    }

    /// Also require the state object to exist in the bucket before teardown
    pub fn expect_state_object(mut self, enabled: bool) -> Self {
        self.expect_state_object = enabled;
        self
    }

    /// Write the fixture into `dir` instead of a fresh temporary directory.
    /// The directory is left in place afterwards.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Execute the run. Never panics; call
    /// [`TestOutcome::conclude`] on the result to fail the test.
    pub async fn run(self) -> TestRunReport {
        let key = if self.unique_key {
            naming::unique_state_key(&self.config.state_key)
        } else {
            self.config.state_key.clone()
        };
        let report = TestRunReport {
            test_name: self.test_name.clone(),
            bucket: None,
            region: self.config.region.clone(),
            key,
            fixture_written: false,
            process: None,
            reaped: None,
            outcome: TestOutcome::Passed,
        };

        if let GateDecision::Skip(reason) = gate::check(&self.config) {
            return TestRunReport {
                outcome: TestOutcome::Skipped(reason),
                ..report
            };
        }

        let ctx = TestLogContext::new(&self.test_name);
        let report = ctx.attach(self.execute(&ctx, report)).await;

        if report.outcome.is_failed() {
            let problems = report.outcome.messages().len();
            warn!(test = %report.test_name, "run failed with {} problem(s)", problems);
        } else {
            info!(test = %report.test_name, "run passed");
        }
        report
    }

    async fn execute(&self, ctx: &TestLogContext, mut report: TestRunReport) -> TestRunReport {
        let name = naming::bucket_name(&self.config.bucket_prefix);
        ctx.record_bucket(&name);
        report.bucket = Some(name.clone());

        let bucket = match provision_bucket(self.admin.as_ref(), &name, &self.config.region).await
        {
            Ok(bucket) => bucket,
            Err(err) => {
                report.outcome = TestOutcome::Failed(vec![err.to_string()]);
                return report;
            }
        };

        let key = report.key.clone();
        let (exercise, reaped) =
            with_ephemeral_bucket(self.admin.as_ref(), bucket, |bucket| {
                self.exercise(bucket, key)
            })
            .await;

        report.fixture_written = exercise.fixture_written;
        report.process = exercise.process;
        report.reaped = Some(reaped);
        report.outcome = if exercise.failures.is_empty() {
            TestOutcome::Passed
        } else {
            TestOutcome::Failed(exercise.failures)
        };
        report
    }

    async fn exercise(&self, bucket: EphemeralBucket, key: String) -> Exercise {
        let mut exercise = Exercise::default();

        let scratch;
        let dir: &Path = match &self.workdir {
            Some(dir) => dir,
            None => match tempfile::Builder::new().prefix("tofu-e2e-").tempdir() {
                Ok(tmp) => {
                    scratch = tmp;
                    scratch.path()
                }
                Err(err) => {
                    exercise.failures.push(HarnessError::TempDir(err).to_string());
                    return exercise;
                }
            },
        };

        let mut fixture = BackendFixture::new(&bucket.name, &key, &bucket.region);
        if let Some(endpoint) = &self.config.endpoint {
            fixture = fixture.with_endpoint(endpoint);
        }
        if let Err(err) = fixture.write_to(dir) {
            exercise.failures.push(err.to_string());
            return exercise;
        }
        exercise.fixture_written = true;

        let mut binary = TofuBinary::new(&self.config.tofu_bin, dir)
            .with_timeout(self.config.process_timeout);
        for (name, value) in &self.env {
            binary = binary.with_env(name, value);
        }

        let result = match binary.run_blocking(self.args.clone()).await {
            Ok(result) => result,
            Err(err) => {
                let mut failures = vec![CheckFailure::ExecutionError(err.to_string())];
                failures.extend(check_streams("", "", &self.marker));
                exercise.failures = failures.iter().map(ToString::to_string).collect();
                return exercise;
            }
        };

        let mut failures = check_init_output(&result, &self.marker);
        if self.expect_state_object {
            failures.extend(self.check_state_object(&bucket.name, &key).await);
        }

        exercise.failures = failures.iter().map(ToString::to_string).collect();
        exercise.process = Some(result);
        exercise
    }

    async fn check_state_object(&self, bucket: &str, key: &str) -> Option<CheckFailure> {
        match self.admin.object_exists(bucket, key).await {
            Ok(true) => None,
            Ok(false) => Some(CheckFailure::MissingStateObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(err) => Some(CheckFailure::StateCheckError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                error: err.to_string(),
            }),
        }
    }
}
