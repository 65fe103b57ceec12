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

//! Minimal `main.tf` pointing the S3 backend at the test bucket.

use crate::error::{HarnessError, HarnessResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name the fixture is written under
pub const FIXTURE_FILE: &str = "main.tf";

/// Parameters of the `backend "s3"` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFixture {
    /// Bucket holding the state
    pub bucket: String,
    /// State object key
    pub key: String,
    /// Bucket region
    pub region: String,
    /// Optional endpoint override
    pub endpoint: Option<String>,
}

impl BackendFixture {
    /// Fixture for `bucket`/`key` in `region`
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        BackendFixture {
            bucket: bucket.into(),
            key: key.into(),
            region: region.into(),
            endpoint: None,
        }
    }

    /// Add an endpoint override
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Render the configuration text
    pub fn render(&self) -> String {
        let mut out = String::from("terraform {\n  backend \"s3\" {\n");
        push_attr(&mut out, "bucket", &self.bucket);
        push_attr(&mut out, "key", &self.key);
        push_attr(&mut out, "region", &self.region);
        if let Some(endpoint) = &self.endpoint {
            push_attr(&mut out, "endpoint", endpoint);
        }
        out.push_str("  }\n}\n");
        out
    }

    /// Write [`FIXTURE_FILE`] into `dir` and return its path
    pub fn write_to(&self, dir: &Path) -> HarnessResult<PathBuf> {
        let path = dir.join(FIXTURE_FILE);
        fs::write(&path, self.render()).map_err(|source| HarnessError::FixtureWrite {
            path: path.clone(),
            source,
        })?;
        debug!("wrote fixture {}", path.display());
        Ok(path)
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push_str(&format!("    {:<8} = \"{}\"\n", name, escape_hcl(value)));
}

/// Escape a value for an HCL quoted string.
///
/// `${` and `%{` start template sequences, so they are doubled too.
fn escape_hcl(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                escaped.push(c);
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_backend_block() {
        let fixture = BackendFixture::new(
            "org.opentofu.state.e2etest1",
            "terraform.tfstate",
            "eu-north-1",
        );
        let expected = "terraform {\n  backend \"s3\" {\n    \
            bucket   = \"org.opentofu.state.e2etest1\"\n    \
            key      = \"terraform.tfstate\"\n    \
            region   = \"eu-north-1\"\n  }\n}\n";
        assert_eq!(fixture.render(), expected);
    }

    #[test]
    fn test_render_with_endpoint() {
        let rendered = BackendFixture::new("b", "k", "us-east-1")
            .with_endpoint("http://127.0.0.1:9000")
            .render();
        assert!(rendered.contains("endpoint = \"http://127.0.0.1:9000\""));
    }

    #[test]
    fn test_values_are_escaped() {
        assert_eq!(escape_hcl(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_hcl("${var}"), "$${var}");
        assert_eq!(escape_hcl("100%"), "100%");
    }

    #[test]
    fn test_write_creates_main_tf() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = BackendFixture::new("b", "k", "eu-north-1");
        let path = fixture.write_to(dir.path()).unwrap();

        assert_eq!(path, dir.path().join("main.tf"));
        assert_eq!(fs::read_to_string(&path).unwrap(), fixture.render());
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = BackendFixture::new("b", "k", "eu-north-1")
            .write_to(&missing)
            .unwrap_err();
        assert!(matches!(err, HarnessError::FixtureWrite { .. }));
    }
}
