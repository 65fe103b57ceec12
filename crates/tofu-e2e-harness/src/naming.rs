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

//! Collision-resistant names for buckets and state keys
//!
//! Bucket names are global across all AWS accounts, so repeated CI runs must
//! never reuse one. Suffixes are wall-clock nanoseconds. Some platforms only
//! tick in microseconds, so each value is bumped past the previous one handed
//! out in this process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static LAST_SUFFIX: AtomicU64 = AtomicU64::new(0);

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Current time in nanoseconds, strictly increasing within this process
pub fn unique_nanos() -> u64 {
    let now = now_nanos();
    let mut last = LAST_SUFFIX.load(Ordering::Relaxed);
    loop {
        let next = now.max(last.saturating_add(1));
        match LAST_SUFFIX.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// [`unique_nanos`] rendered as a decimal string
pub fn unique_suffix() -> String {
    unique_nanos().to_string()
}

/// `<prefix><nanos>`, e.g. `org.opentofu.state.e2etest1718000000000000000`
pub fn bucket_name(prefix: &str) -> String {
    format!("{}{}", prefix, unique_suffix())
}

/// `<nanos>/<key>`, for sub-tests that share one bucket
pub fn unique_state_key(key: &str) -> String {
    format!("{}/{}", unique_suffix(), key)
}
