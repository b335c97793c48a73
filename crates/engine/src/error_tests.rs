// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use infra_core::test_support::key;

#[yare::parameterized(
    malformed_key = { SyncError::Key(KeyError::Malformed("a/b/c".into())), false },
    missing_owner = { SyncError::OwnerNotFound(key("ns/foo")), false },
    structural    = { SyncError::Structural("tombstone".into()), false },
    conflict      = { SyncError::Store(StoreError::Conflict { key: "ns/foo".into(), expected: 1, actual: 2 }), true },
    unavailable   = { SyncError::Store(StoreError::Unavailable("down".into())), true },
    build         = { SyncError::Build("no master".into()), true },
)]
fn retry_classification(err: SyncError, retryable: bool) {
    assert_eq!(err.is_retryable(), retryable);
}

#[yare::parameterized(
    malformed_key = { SyncError::Key(KeyError::Malformed("a/b/c".into())), false },
    missing_owner = { SyncError::OwnerNotFound(key("ns/foo")), false },
    structural    = { SyncError::Structural("tombstone".into()), true },
    build         = { SyncError::Build("no master".into()), false },
)]
fn structural_classification(err: SyncError, structural: bool) {
    assert_eq!(err.is_structural(), structural);
}

#[test]
fn generate_errors_become_build_failures() {
    let err: SyncError = GenerateError::MissingVersion.into();
    assert_eq!(err, SyncError::Build("cluster version is not set".into()));
    assert!(err.is_retryable());
}

#[test]
fn already_exists_is_detected_through_store_errors() {
    let err = SyncError::Store(StoreError::AlreadyExists {
        kind: "Job",
        key: "ns/j".into(),
    });
    assert!(err.is_already_exists());
    assert!(!err.is_not_found());
}
