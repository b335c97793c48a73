// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource store adapters

mod memory;

pub use memory::{MemoryStore, StoreOp};

use async_trait::async_trait;
use infra_core::{Cluster, JobRecord, OwnerKey, WatchEvent};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from resource store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },
    #[error("conflict writing {key}: resource version {expected} is stale (current {actual})")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: &'static str, key: String },
    #[error("invalid object: {0}")]
    Invalid(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}

/// Stream of change notifications. The initial listing is replayed as
/// `Added` events followed by `Synced`.
pub type WatchStream<T> = mpsc::UnboundedReceiver<WatchEvent<T>>;

/// Access to the owner (cluster) resources
#[async_trait]
pub trait OwnerStore: Clone + Send + Sync + 'static {
    async fn get(&self, key: &OwnerKey) -> Result<Cluster, StoreError>;

    /// Write the status subresource. Fails with `Conflict` when the owner's
    /// resource version is stale.
    async fn update_status(&self, owner: &Cluster) -> Result<Cluster, StoreError>;

    /// Write finalizers and labels. Fails with `Conflict` when stale.
    async fn update_metadata(&self, owner: &Cluster) -> Result<Cluster, StoreError>;

    fn watch(&self) -> WatchStream<Cluster>;
}

/// Access to background jobs
#[async_trait]
pub trait JobStore: Clone + Send + Sync + 'static {
    /// Jobs in `namespace` carrying every label in `selector`
    async fn list(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<JobRecord>, StoreError>;

    async fn create(&self, job: JobRecord) -> Result<JobRecord, StoreError>;

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    fn watch(&self) -> WatchStream<JobRecord>;
}
