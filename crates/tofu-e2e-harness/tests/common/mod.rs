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

//! Shared helpers for harness flow tests.
//!
//! The binary under test is replaced by a shell script interpreted by
//! `/bin/sh`, so no `tofu` install is needed. The script path goes in front
//! of the real arguments.

#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tofu_e2e_harness::{HarnessConfig, InitBackendScenario, SUCCESS_MARKER};
use tofu_e2e_storage::{BucketAdmin, CreateBucketRequest, MockBucketAdmin, StorageResult};
use tracing_subscriber::fmt::MakeWriter;

/// Stdout of a clean `tofu init`
pub fn init_stdout() -> String {
    format!(
        "Initializing the backend...\n\nSuccessfully configured the backend \"s3\"!\n\n{}\n",
        SUCCESS_MARKER
    )
}

/// A stand-in for the `tofu` executable
pub struct FakeTofu {
    dir: TempDir,
    script: PathBuf,
}

impl FakeTofu {
    /// Print `stdout` and `stderr` verbatim, then exit with `code`
    pub fn printing(stdout: &str, stderr: &str, code: i32) -> Self {
        Self::from_body(&format!(
            "cat <<'__STDOUT__'\n{}__STDOUT__\ncat 1>&2 <<'__STDERR__'\n{}__STDERR__\nexit {}\n",
            with_newline(stdout),
            with_newline(stderr),
            code
        ))
    }

    /// Succeed like `tofu init`, after copying the fixture, the working
    /// directory and the arguments into [`record_dir`](Self::record_dir)
    pub fn recording() -> Self {
        let fake = Self::from_body("");
        let record = fake.record_dir();
        let body = format!(
            "cp main.tf '{rec}/main.tf'\npwd > '{rec}/cwd'\necho \"$@\" > '{rec}/args'\n\
             printf '%s\\n' \"$TF_IN_AUTOMATION\" > '{rec}/env'\n\
             cat <<'__STDOUT__'\n{out}__STDOUT__\n",
            rec = record.display(),
            out = init_stdout(),
        );
        fake.write_script(&body);
        fake
    }

    /// Hang for `secs` seconds
    pub fn hanging(secs: u64) -> Self {
        Self::from_body(&format!("exec sleep {}\n", secs))
    }

    fn from_body(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create script dir");
        let script = dir.path().join("tofu.sh");
        fs::create_dir(dir.path().join("record")).expect("Failed to create record dir");
        let fake = FakeTofu { dir, script };
        fake.write_script(body);
        fake
    }

    fn write_script(&self, body: &str) {
        fs::write(&self.script, format!("#!/bin/sh\n{}", body)).expect("Failed to write script");
    }

    /// Where [`recording`](Self::recording) leaves its copies
    pub fn record_dir(&self) -> PathBuf {
        self.dir.path().join("record")
    }

    /// Read one recorded file
    pub fn recorded(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.record_dir().join(name))
    }

    /// An enabled scenario that runs this script with `init`
    pub fn scenario(&self, admin: Arc<dyn BucketAdmin>, test_name: &str) -> InitBackendScenario {
        InitBackendScenario::new(enabled_config(), admin, test_name)
            .with_args([self.script.display().to_string(), "init".to_string()])
    }

    /// Same as [`scenario`](Self::scenario) with a custom configuration
    pub fn scenario_with(
        &self,
        config: HarnessConfig,
        admin: Arc<dyn BucketAdmin>,
        test_name: &str,
    ) -> InitBackendScenario {
        InitBackendScenario::new(config.with_tofu_bin("/bin/sh"), admin, test_name)
            .with_args([self.script.display().to_string(), "init".to_string()])
    }

    /// Path of the script
    pub fn script(&self) -> &Path {
        &self.script
    }
}

fn with_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}

/// Enabled defaults with `/bin/sh` as the binary and a short timeout
pub fn enabled_config() -> HarnessConfig {
    HarnessConfig::default()
        .with_enabled(true)
        .with_tofu_bin("/bin/sh")
        .with_process_timeout(Some(Duration::from_secs(30)))
}

/// Mock admin that writes a state object into every bucket it creates,
/// the way a real `tofu init` would leave one behind
#[derive(Debug, Clone)]
pub struct StateWritingAdmin {
    pub inner: MockBucketAdmin,
    pub key: String,
}

impl StateWritingAdmin {
    pub fn new(inner: MockBucketAdmin, key: &str) -> Self {
        StateWritingAdmin {
            inner,
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl BucketAdmin for StateWritingAdmin {
    async fn create_bucket(&self, request: &CreateBucketRequest) -> StorageResult<()> {
        self.inner.create_bucket(request).await?;
        self.inner
            .put_object(&request.bucket, &self.key, b"{\"version\": 4}")
            .await;
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<String>> {
        self.inner.list_objects(bucket).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.inner.delete_object(bucket, key).await
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.inner.delete_bucket(bucket).await
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        self.inner.object_exists(bucket, key).await
    }

    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        self.inner.bucket_exists(bucket).await
    }
}

/// In-memory log sink for asserting on emitted events
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("capture lock")).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("capture lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Capture every event emitted on this thread until the guard drops
pub fn capture_logs() -> (Capture, tracing::subscriber::DefaultGuard) {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}
