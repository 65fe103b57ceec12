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

//! Output checks and the overall verdict of a run.
//!
//! Checks never short-circuit: every applicable check runs and every failure
//! is kept, so one run shows all of what went wrong, with the actual output
//! attached.

use crate::runner::ProcessResult;
use predicates::prelude::*;
use std::fmt;

/// Line `tofu init` prints when it finishes cleanly
pub const SUCCESS_MARKER: &str = "OpenTofu has been successfully initialized!";

/// One failed check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    /// The process failed to run to a clean exit
    ExecutionError(String),
    /// Something was written to stderr
    UnexpectedStderr(String),
    /// The success marker is not in stdout
    MissingMarker {
        /// Expected substring
        marker: String,
        /// Full stdout
        stdout: String,
    },
    /// The state object was not found in the bucket
    MissingStateObject {
        /// Bucket that was checked
        bucket: String,
        /// Key that was expected
        key: String,
    },
    /// The state object could not be checked
    StateCheckError {
        /// Bucket that was checked
        bucket: String,
        /// Key that was expected
        key: String,
        /// Provider error
        error: String,
    },
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailure::ExecutionError(error) => write!(f, "unexpected error: {}", error),
            CheckFailure::UnexpectedStderr(stderr) => {
                write!(f, "unexpected stderr output:\n{}", stderr)
            }
            CheckFailure::MissingMarker { stdout, .. } => {
                write!(f, "success message is missing from output:\n{}", stdout)
            }
            CheckFailure::MissingStateObject { bucket, key } => {
                write!(f, "state object {} not found in bucket {}", key, bucket)
            }
            CheckFailure::StateCheckError { bucket, key, error } => write!(
                f,
                "cannot check state object {} in bucket {}: {}",
                key, bucket, error
            ),
        }
    }
}

/// Check a captured `init` run: clean exit, empty stderr, marker in stdout
pub fn check_init_output(result: &ProcessResult, marker: &str) -> Vec<CheckFailure> {
    let mut failures = Vec::new();

    if let Some(error) = result.execution_error() {
        failures.push(CheckFailure::ExecutionError(error));
    }
    failures.extend(check_streams(&result.stdout, &result.stderr, marker));

    failures
}

/// The stream checks alone. A binary that never started is checked as if
/// it printed nothing.
pub fn check_streams(stdout: &str, stderr: &str, marker: &str) -> Vec<CheckFailure> {
    let mut failures = Vec::new();

    if !predicate::str::is_empty().eval(stderr) {
        failures.push(CheckFailure::UnexpectedStderr(stderr.to_string()));
    }
    if !predicate::str::contains(marker).eval(stdout) {
        failures.push(CheckFailure::MissingMarker {
            marker: marker.to_string(),
            stdout: stdout.to_string(),
        });
    }

    failures
}

/// Verdict of one test run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    /// Every check passed
    Passed,
    /// The gate said no; nothing was run
    Skipped(String),
    /// At least one check failed, or setup was fatal
    Failed(Vec<String>),
}

impl TestOutcome {
    /// `Passed` if `failures` is empty, otherwise `Failed` with each message
    pub fn from_failures(failures: &[CheckFailure]) -> Self {
        if failures.is_empty() {
            TestOutcome::Passed
        } else {
            TestOutcome::Failed(failures.iter().map(ToString::to_string).collect())
        }
    }

    /// True for [`TestOutcome::Passed`]
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    /// True for [`TestOutcome::Skipped`]
    pub fn is_skipped(&self) -> bool {
        matches!(self, TestOutcome::Skipped(_))
    }

    /// True for [`TestOutcome::Failed`]
    pub fn is_failed(&self) -> bool {
        matches!(self, TestOutcome::Failed(_))
    }

    /// Failure messages; empty unless failed
    pub fn messages(&self) -> &[String] {
        match self {
            TestOutcome::Failed(messages) => messages,
            _ => &[],
        }
    }

    /// Hand the verdict to the Rust test runner.
    ///
    /// Skips print their reason and return. Failures panic once, listing
    /// every message.
    pub fn conclude(&self) {
        match self {
            TestOutcome::Passed => {}
            TestOutcome::Skipped(reason) => eprintln!("{}", reason),
            TestOutcome::Failed(messages) => panic!(
                "{} check(s) failed:\n\n{}",
                messages.len(),
                messages.join("\n\n")
            ),
        }
    }
}
