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

//! Per-test log context.
//!
//! The AWS SDK logs through `tracing`, so binding a span around every remote
//! call is enough to tag SDK diagnostics with the test that caused them.

use std::future::Future;
use tracing::instrument::Instrumented;
use tracing::{field, Instrument, Span};

/// A span scoped to one test run
#[derive(Debug, Clone)]
pub struct TestLogContext {
    span: Span,
}

impl TestLogContext {
    /// Open the context for `test_name`. The bucket field is filled in later
    /// with [`record_bucket`](Self::record_bucket).
    pub fn new(test_name: &str) -> Self {
        let span = tracing::info_span!(
            "e2e-s3-test",
            test = %test_name,
            bucket = field::Empty,
        );
        TestLogContext { span }
    }

    /// Record the bucket this run owns
    pub fn record_bucket(&self, bucket: &str) {
        self.span.record("bucket", bucket);
    }

    /// Run `fut` inside this context
    pub fn attach<F: Future>(&self, fut: F) -> Instrumented<F> {
        fut.instrument(self.span.clone())
    }

    /// Run a synchronous closure inside this context
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }
}
