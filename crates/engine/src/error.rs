// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the reconcile engine

use infra_adapters::{GenerateError, StoreError};
use infra_core::{KeyError, OwnerKey};
use thiserror::Error;

/// Errors that can occur while syncing an owner
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("owner {0} not found")]
    OwnerNotFound(OwnerKey),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to build job: {0}")]
    Build(String),
    /// Malformed notification or object that no retry can fix
    #[error("{0}")]
    Structural(String),
}

impl From<GenerateError> for SyncError {
    fn from(err: GenerateError) -> Self {
        SyncError::Build(err.to_string())
    }
}

impl SyncError {
    /// False for errors that will recur identically on every attempt for
    /// the key; those are dropped without consuming retries.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            SyncError::Key(_) | SyncError::OwnerNotFound(_) | SyncError::Structural(_)
        )
    }

    /// Malformed input the error reporter must hear about, unlike a
    /// missing owner or key that is dropped quietly
    pub fn is_structural(&self) -> bool {
        matches!(self, SyncError::Structural(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::OwnerNotFound(_))
            || matches!(self, SyncError::Store(e) if e.is_not_found())
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, SyncError::Store(e) if e.is_already_exists())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
