// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process resource store.
//!
//! Holds clusters and jobs behind one lock, assigns uids and resource
//! versions, enforces optimistic concurrency on writes and fans change
//! notifications out to every open watch.

use super::{JobStore, OwnerStore, StoreError, WatchStream};
use async_trait::async_trait;
use infra_core::job::matches_selector;
use infra_core::{
    Clock, Cluster, ClusterSpec, Deleted, IdGen, JobRecord, JobState, ObjectKey, OwnerKey,
    Resource, SystemClock, UuidIdGen, WatchEvent,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Store operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    UpdateStatus,
    UpdateMetadata,
    List,
    Create,
    Delete,
}

#[derive(Default)]
struct MemoryState {
    owners: BTreeMap<ObjectKey, Cluster>,
    jobs: BTreeMap<ObjectKey, JobRecord>,
    resource_version: u64,
    owner_watchers: Vec<mpsc::UnboundedSender<WatchEvent<Cluster>>>,
    job_watchers: Vec<mpsc::UnboundedSender<WatchEvent<JobRecord>>>,
    faults: VecDeque<(StoreOp, StoreError)>,
    writes: Vec<StoreOp>,
}

impl MemoryState {
    fn next_version(&mut self) -> u64 {
        self.resource_version += 1;
        self.resource_version
    }

    fn take_fault(&mut self, op: StoreOp) -> Result<(), StoreError> {
        match self.faults.iter().position(|(o, _)| *o == op) {
            Some(idx) => match self.faults.remove(idx) {
                Some((_, err)) => Err(err),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }

    fn emit_owner(&mut self, event: WatchEvent<Cluster>) {
        self.owner_watchers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn emit_job(&mut self, event: WatchEvent<JobRecord>) {
        self.job_watchers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Fetch the stored owner for a write, rejecting stale versions
    fn owner_for_write(&mut self, owner: &Cluster) -> Result<(ObjectKey, Cluster), StoreError> {
        let key = owner
            .key()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        let current = self
            .owners
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: Cluster::KIND,
                key: key.to_string(),
            })?;
        if current.metadata.resource_version != owner.metadata.resource_version {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                expected: owner.metadata.resource_version,
                actual: current.metadata.resource_version,
            });
        }
        Ok((key, current))
    }
}

/// In-memory implementation of both [`OwnerStore`] and [`JobStore`].
///
/// Clones share state.
#[derive(Clone)]
pub struct MemoryStore<C: Clock = SystemClock, G: IdGen = UuidIdGen> {
    inner: Arc<Mutex<MemoryState>>,
    clock: C,
    ids: G,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_parts(SystemClock, UuidIdGen)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, G: IdGen> MemoryStore<C, G> {
    pub fn with_parts(clock: C, ids: G) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryState::default())),
            clock,
            ids,
        }
    }

    /// Create an owner, or replace its spec.
    ///
    /// Creation assigns a uid and generation 1; a changed spec bumps the
    /// generation. Reapplying an identical spec is a no-op.
    pub fn apply_owner(
        &self,
        namespace: &str,
        name: &str,
        spec: ClusterSpec,
    ) -> Result<Cluster, StoreError> {
        let key = ObjectKey::new(namespace, name).map_err(|e| StoreError::Invalid(e.to_string()))?;
        let mut state = self.inner.lock();
        match state.owners.get(&key).cloned() {
            None => {
                let mut metadata = infra_core::ObjectMeta::new(namespace, name);
                metadata.uid = self.ids.next();
                metadata.generation = 1;
                metadata.resource_version = state.next_version();
                let owner = Cluster::new(metadata, spec);
                state.owners.insert(key, owner.clone());
                state.emit_owner(WatchEvent::Added(owner.clone()));
                Ok(owner)
            }
            Some(old) => {
                if old.is_deleting() {
                    return Err(StoreError::Invalid(format!("{} is being deleted", key)));
                }
                if old.spec == spec {
                    return Ok(old);
                }
                let mut new = old.clone();
                new.spec = spec;
                new.metadata.generation += 1;
                new.metadata.resource_version = state.next_version();
                state.owners.insert(key, new.clone());
                state.emit_owner(WatchEvent::Updated {
                    old,
                    new: new.clone(),
                });
                Ok(new)
            }
        }
    }

    /// Request deletion of an owner.
    ///
    /// Without finalizers the owner is removed at once. Otherwise it gets a
    /// deletion timestamp and a generation bump, and stays until the last
    /// finalizer is removed.
    pub fn delete_owner(&self, key: &OwnerKey) -> Result<(), StoreError> {
        let mut state = self.inner.lock();
        let old = state
            .owners
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: Cluster::KIND,
                key: key.to_string(),
            })?;
        if old.is_deleting() {
            return Ok(());
        }
        if old.metadata.finalizers.is_empty() {
            state.owners.remove(key);
            state.emit_owner(WatchEvent::Deleted(Deleted::Live(old)));
            return Ok(());
        }
        let mut new = old.clone();
        new.metadata.deletion_timestamp_ms = Some(self.clock.epoch_ms());
        new.metadata.generation += 1;
        new.metadata.resource_version = state.next_version();
        state.owners.insert(key.clone(), new.clone());
        state.emit_owner(WatchEvent::Updated { old, new });
        Ok(())
    }

    /// Record a job's terminal (or running) state, as the job runner would
    pub fn set_job_outcome(
        &self,
        namespace: &str,
        name: &str,
        outcome: JobState,
        message: Option<String>,
    ) -> Result<JobRecord, StoreError> {
        let key = ObjectKey::new(namespace, name).map_err(|e| StoreError::Invalid(e.to_string()))?;
        let mut state = self.inner.lock();
        let old = state
            .jobs
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: JobRecord::KIND,
                key: key.to_string(),
            })?;
        let mut new = old.clone();
        new.state = outcome;
        new.message = message;
        new.metadata.resource_version = state.next_version();
        state.jobs.insert(key, new.clone());
        state.emit_job(WatchEvent::Updated {
            old,
            new: new.clone(),
        });
        Ok(new)
    }

    /// Queue an error for the next call of `op`
    pub fn fail_next(&self, op: StoreOp, err: StoreError) {
        self.inner.lock().faults.push_back((op, err));
    }

    pub fn owner(&self, key: &OwnerKey) -> Option<Cluster> {
        self.inner.lock().owners.get(key).cloned()
    }

    pub fn job(&self, namespace: &str, name: &str) -> Option<JobRecord> {
        let key = ObjectKey::new(namespace, name).ok()?;
        self.inner.lock().jobs.get(&key).cloned()
    }

    /// Snapshot of every stored job, ordered by key
    pub fn jobs(&self) -> Vec<JobRecord> {
        self.inner.lock().jobs.values().cloned().collect()
    }

    /// Successful writes performed through the store traits, in order
    pub fn writes(&self) -> Vec<StoreOp> {
        self.inner.lock().writes.clone()
    }
}

#[async_trait]
impl<C: Clock, G: IdGen> OwnerStore for MemoryStore<C, G> {
    async fn get(&self, key: &OwnerKey) -> Result<Cluster, StoreError> {
        let mut state = self.inner.lock();
        state.take_fault(StoreOp::Get)?;
        state
            .owners
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: Cluster::KIND,
                key: key.to_string(),
            })
    }

    async fn update_status(&self, owner: &Cluster) -> Result<Cluster, StoreError> {
        let mut state = self.inner.lock();
        state.take_fault(StoreOp::UpdateStatus)?;
        let (key, old) = state.owner_for_write(owner)?;
        let mut new = old.clone();
        new.status = owner.status.clone();
        new.metadata.resource_version = state.next_version();
        state.owners.insert(key, new.clone());
        state.writes.push(StoreOp::UpdateStatus);
        state.emit_owner(WatchEvent::Updated {
            old,
            new: new.clone(),
        });
        Ok(new)
    }

    async fn update_metadata(&self, owner: &Cluster) -> Result<Cluster, StoreError> {
        let mut state = self.inner.lock();
        state.take_fault(StoreOp::UpdateMetadata)?;
        let (key, old) = state.owner_for_write(owner)?;
        let mut new = old.clone();
        new.metadata.finalizers = owner.metadata.finalizers.clone();
        new.metadata.labels = owner.metadata.labels.clone();
        new.metadata.resource_version = state.next_version();
        state.writes.push(StoreOp::UpdateMetadata);
        if new.is_deleting() && new.metadata.finalizers.is_empty() {
            state.owners.remove(&key);
            state.emit_owner(WatchEvent::Deleted(Deleted::Live(new.clone())));
        } else {
            state.owners.insert(key, new.clone());
            state.emit_owner(WatchEvent::Updated {
                old,
                new: new.clone(),
            });
        }
        Ok(new)
    }

    fn watch(&self) -> WatchStream<Cluster> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.inner.lock();
        for owner in state.owners.values() {
            let _ = tx.send(WatchEvent::Added(owner.clone()));
        }
        let _ = tx.send(WatchEvent::Synced);
        state.owner_watchers.push(tx);
        rx
    }
}

#[async_trait]
impl<C: Clock, G: IdGen> JobStore for MemoryStore<C, G> {
    async fn list(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<JobRecord>, StoreError> {
        let mut state = self.inner.lock();
        state.take_fault(StoreOp::List)?;
        Ok(state
            .jobs
            .values()
            .filter(|job| job.metadata.namespace == namespace)
            .filter(|job| matches_selector(&job.metadata.labels, selector))
            .cloned()
            .collect())
    }

    async fn create(&self, mut job: JobRecord) -> Result<JobRecord, StoreError> {
        let mut state = self.inner.lock();
        state.take_fault(StoreOp::Create)?;
        let key = job.key().map_err(|e| StoreError::Invalid(e.to_string()))?;
        if state.jobs.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: JobRecord::KIND,
                key: key.to_string(),
            });
        }
        // At most one running job per controlling owner
        if let Some(owner_ref) = job.metadata.controller_ref() {
            let clash = state.jobs.values().find(|other| {
                other.is_active()
                    && other
                        .metadata
                        .controller_ref()
                        .is_some_and(|r| r.uid == owner_ref.uid)
            });
            if let Some(other) = clash {
                return Err(StoreError::AlreadyExists {
                    kind: JobRecord::KIND,
                    key: format!("{} (active job {})", key, other.metadata.name),
                });
            }
        }
        if job.metadata.uid.is_empty() {
            job.metadata.uid = self.ids.next();
        }
        job.metadata.resource_version = state.next_version();
        state.jobs.insert(key, job.clone());
        state.writes.push(StoreOp::Create);
        state.emit_job(WatchEvent::Added(job.clone()));
        Ok(job)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let mut state = self.inner.lock();
        state.take_fault(StoreOp::Delete)?;
        let key = ObjectKey::new(namespace, name).map_err(|e| StoreError::Invalid(e.to_string()))?;
        let job = state.jobs.remove(&key).ok_or_else(|| StoreError::NotFound {
            kind: JobRecord::KIND,
            key: key.to_string(),
        })?;
        state.writes.push(StoreOp::Delete);
        state.emit_job(WatchEvent::Deleted(Deleted::Live(job)));
        Ok(())
    }

    fn watch(&self) -> WatchStream<JobRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.inner.lock();
        for job in state.jobs.values() {
            let _ = tx.send(WatchEvent::Added(job.clone()));
        }
        let _ = tx.send(WatchEvent::Synced);
        state.job_watchers.push(tx);
        rx
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
