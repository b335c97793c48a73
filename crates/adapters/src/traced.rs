// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrappers for consistent observability

use crate::store::{JobStore, OwnerStore, StoreError, WatchStream};
use async_trait::async_trait;
use infra_core::{Cluster, JobRecord, OwnerKey};
use std::collections::BTreeMap;
use tracing::Instrument;

/// Wrapper that adds tracing to any OwnerStore
#[derive(Clone)]
pub struct TracedOwnerStore<S> {
    inner: S,
}

impl<S> TracedOwnerStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: OwnerStore> OwnerStore for TracedOwnerStore<S> {
    async fn get(&self, key: &OwnerKey) -> Result<Cluster, StoreError> {
        let result = self.inner.get(key).await;
        match &result {
            Ok(owner) => tracing::trace!(
                owner = %key,
                generation = owner.metadata.generation,
                "fetched"
            ),
            Err(e) if e.is_not_found() => tracing::debug!(owner = %key, "not found"),
            Err(e) => tracing::error!(owner = %key, error = %e, "get failed"),
        }
        result
    }

    async fn update_status(&self, owner: &Cluster) -> Result<Cluster, StoreError> {
        let span = tracing::info_span!(
            "owner.update_status",
            namespace = %owner.metadata.namespace,
            name = %owner.metadata.name,
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.update_status(owner).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(written) => tracing::info!(
                    elapsed_ms,
                    resource_version = written.metadata.resource_version,
                    provisioned_generation = written.status.provisioned_generation,
                    "status written"
                ),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "status write failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn update_metadata(&self, owner: &Cluster) -> Result<Cluster, StoreError> {
        let span = tracing::info_span!(
            "owner.update_metadata",
            namespace = %owner.metadata.namespace,
            name = %owner.metadata.name,
        );
        async {
            let result = self.inner.update_metadata(owner).await;
            match &result {
                Ok(written) => {
                    tracing::info!(finalizers = ?written.metadata.finalizers, "metadata written")
                }
                Err(e) => tracing::warn!(error = %e, "metadata write failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn watch(&self) -> WatchStream<Cluster> {
        tracing::debug!("watching owners");
        self.inner.watch()
    }
}

/// Wrapper that adds tracing to any JobStore
#[derive(Clone)]
pub struct TracedJobStore<S> {
    inner: S,
}

impl<S> TracedJobStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: JobStore> JobStore for TracedJobStore<S> {
    async fn list(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<JobRecord>, StoreError> {
        let result = self.inner.list(namespace, selector).await;
        match &result {
            Ok(jobs) => tracing::trace!(namespace, count = jobs.len(), "listed jobs"),
            Err(e) => tracing::error!(namespace, error = %e, "list failed"),
        }
        result
    }

    async fn create(&self, job: JobRecord) -> Result<JobRecord, StoreError> {
        let span = tracing::info_span!(
            "job.create",
            namespace = %job.metadata.namespace,
            job = %job.metadata.name,
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create(job).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(created) => tracing::info!(uid = %created.metadata.uid, elapsed_ms, "job created"),
                Err(e) if e.is_already_exists() => tracing::debug!(error = %e, "job already exists"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "create failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let result = self.inner.delete(namespace, name).await;
        tracing::info_span!("job.delete", namespace, job = name).in_scope(|| match &result {
            Ok(()) => tracing::info!("deleted"),
            Err(e) => tracing::warn!(error = %e, "delete failed (may be expected)"),
        });
        result
    }

    fn watch(&self) -> WatchStream<JobRecord> {
        tracing::debug!("watching jobs");
        self.inner.watch()
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
