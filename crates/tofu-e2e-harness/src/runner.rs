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

//! Runs the binary under test against a fixture directory.
//!
//! The call blocks until the child exits and captures stdout and stderr in
//! full. An optional timeout kills a hung child instead of hanging the test.

use crate::error::{HarnessError, HarnessResult};
use assert_cmd::Command;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Captured result of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Everything written to stdout
    pub stdout: String,
    /// Everything written to stderr
    pub stderr: String,
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Whether the process exited with status 0
    pub success: bool,
    /// Whether the timeout fired and the process was killed
    pub timed_out: bool,
    /// Wall-clock duration
    pub elapsed: Duration,
}

impl ProcessResult {
    /// Describe why the invocation counts as failed, if it does
    pub fn execution_error(&self) -> Option<String> {
        if self.timed_out {
            return Some(format!(
                "process killed after {:.1?} without exiting",
                self.elapsed
            ));
        }
        if self.success {
            return None;
        }
        Some(match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "process terminated by signal".to_string(),
        })
    }
}

/// A configured invocation of the binary under test
#[derive(Debug, Clone)]
pub struct TofuBinary {
    program: PathBuf,
    workdir: PathBuf,
    env: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl TofuBinary {
    /// Run `program` with `workdir` as the working directory
    pub fn new(program: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        TofuBinary {
            program: program.into(),
            workdir: workdir.into(),
            env: Vec::new(),
            timeout: None,
        }
    }

    /// Add an environment variable for the child
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Kill the child if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run with `args` and wait for the child to exit.
    ///
    /// Only a failure to start the process is an error; a non-zero exit is
    /// reported in the returned [`ProcessResult`].
    pub fn run(&self, args: &[String]) -> HarnessResult<ProcessResult> {
        info!(
            "running {} {} in {}",
            self.program.display(),
            args.join(" "),
            self.workdir.display()
        );

        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.workdir).args(args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(timeout) = self.timeout {
            cmd.timeout(timeout);
        }

        let started = Instant::now();
        let output = cmd.output().map_err(|source| HarnessError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let elapsed = started.elapsed();

        let success = output.status.success();
        let timed_out = killed_by_timeout(output.status.code(), elapsed, self.timeout);
        let result = ProcessResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            success,
            timed_out,
            elapsed,
        };

        debug!(
            exit_code = ?result.exit_code,
            timed_out = result.timed_out,
            "process finished in {:.1?}",
            elapsed
        );
        Ok(result)
    }

    /// [`run`](Self::run) on the blocking pool, for async callers
    pub async fn run_blocking(&self, args: Vec<String>) -> HarnessResult<ProcessResult> {
        let binary = self.clone();
        let program = self.program.clone();
        tokio::task::spawn_blocking(move || binary.run(&args))
            .await
            .map_err(|join| HarnessError::Spawn {
                program,
                source: std::io::Error::other(join.to_string()),
            })?
    }
}

/// A child killed at the deadline has no exit code on unix. One that exits
/// with a code of its own after the deadline was not killed.
#[cfg(unix)]
fn killed_by_timeout(code: Option<i32>, elapsed: Duration, limit: Option<Duration>) -> bool {
    code.is_none() && limit.is_some_and(|limit| elapsed >= limit)
}

#[cfg(not(unix))]
fn killed_by_timeout(code: Option<i32>, elapsed: Duration, limit: Option<Duration>) -> bool {
    code != Some(0) && limit.is_some_and(|limit| elapsed >= limit)
}
