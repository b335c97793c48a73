// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::process::Command;

#[tokio::test]
async fn run_with_timeout_success() {
    let mut cmd = Command::new("echo");
    cmd.arg("hello");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "echo")
        .await
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
}

#[tokio::test]
async fn run_with_timeout_nonzero_exit_is_not_an_error() {
    let cmd = Command::new("false");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "false")
        .await
        .unwrap();
    assert!(!output.status.success());
}

#[tokio::test]
async fn run_with_timeout_io_error() {
    let cmd = Command::new("/nonexistent/binary");
    let err = run_with_timeout(cmd, Duration::from_secs(5), "nonexistent")
        .await
        .unwrap_err();
    assert!(err.starts_with("nonexistent failed:"), "got: {}", err);
}

#[tokio::test]
async fn run_with_timeout_timeout_elapsed() {
    let mut cmd = Command::new("sleep");
    cmd.arg("10");
    let err = run_with_timeout(cmd, Duration::from_millis(100), "test sleep")
        .await
        .unwrap_err();
    assert!(err.contains("timed out after 100ms"), "got: {}", err);
    assert!(err.contains("test sleep"), "got: {}", err);
}

#[yare::parameterized(
    fewer_lines = { b"a\nb\n" as &[u8], 5, "a\nb" },
    exact       = { b"a\nb\nc", 3, "a\nb\nc" },
    truncated   = { b"a\nb\nc\nd\n", 2, "c\nd" },
    empty       = { b"", 3, "" },
)]
fn tail_keeps_last_lines(bytes: &[u8], max: usize, expected: &str) {
    assert_eq!(tail(bytes, max), expected);
}
