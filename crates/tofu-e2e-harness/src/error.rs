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

//! Harness error types
//!
//! Every variant here is fatal to the run it occurs in. Check failures are
//! not errors, see [`CheckFailure`](crate::outcome::CheckFailure), and
//! cleanup problems never leave the reaper.

use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tofu_e2e_observability::LogError;
use tofu_e2e_storage::StorageError;

/// Result type alias for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Fatal setup failures
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The test bucket could not be created
    #[error("failed to create test S3 bucket {bucket}: {source}")]
    Provision {
        /// Bucket that was requested
        bucket: String,
        /// Provider error
        #[source]
        source: StorageError,
    },

    /// The scratch directory for the fixture could not be created
    #[error("cannot create fixture directory: {0}")]
    TempDir(#[source] io::Error),

    /// The fixture file could not be written
    #[error("cannot write {}, err: {source}", path.display())]
    FixtureWrite {
        /// Path of the file being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The binary under test could not be started at all
    #[error("cannot run {}: {source}", program.display())]
    Spawn {
        /// Program that was launched
        program: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Harness configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The log subscriber could not be built
    #[error("cannot set up logging: {0}")]
    Logging(#[from] LogError),
}
