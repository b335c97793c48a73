// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn startup_marker_is_appended() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::in_dir(dir.path().join("state"));
    std::fs::create_dir_all(&config.state_dir).unwrap();
    std::fs::write(&config.log_path, "previous run\n").unwrap();

    write_startup_marker(&config).unwrap();

    let log = std::fs::read_to_string(&config.log_path).unwrap();
    let mut lines = log.lines();
    assert_eq!(lines.next(), Some("previous run"));
    let marker = lines.next().unwrap();
    assert!(marker.starts_with(STARTUP_MARKER_PREFIX));
    assert!(marker.contains(&std::process::id().to_string()));
}

#[test]
fn startup_marker_creates_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::in_dir(dir.path().join("nested/state"));
    write_startup_marker(&config).unwrap();
    assert!(config.log_path.exists());
}

#[test]
fn startup_error_is_written_to_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::in_dir(dir.path().to_path_buf());
    write_startup_error(&config, &LifecycleError::Invalid("workers must be at least 1".into()));
    let log = std::fs::read_to_string(&config.log_path).unwrap();
    assert!(log.contains("ERROR Failed to start daemon: Invalid settings: workers must be at least 1"));
}
