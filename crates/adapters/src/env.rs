// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use crate::subprocess::JOB_COMMAND_TIMEOUT;
use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Job command timeout (default: 1h).
pub fn job_timeout() -> Duration {
    parse_duration_ms("INFRAD_JOB_TIMEOUT_MS").unwrap_or(JOB_COMMAND_TIMEOUT)
}
