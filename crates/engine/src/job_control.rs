// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job control: keeps exactly one job per owner generation and direction.
//!
//! Job watch events only update the ownership index and enqueue the owner;
//! every store call happens on a worker, inside `control_jobs`.

use crate::error::SyncError;
use crate::ownership::OwnershipIndex;
use crate::queue::ReconcileQueue;
use crate::report::ErrorReporter;
use crate::strategy::JobFactory;
use infra_adapters::{JobStore, StoreError};
use infra_core::job;
use infra_core::{
    Clock, Cluster, Deleted, Direction, JobRecord, ObjectMeta, OwnerKey, Resource, WatchEvent,
};
use std::sync::Arc;

/// Receives owners whose jobs changed
pub trait OwnerEvents: Send + Sync + 'static {
    fn owner_needs_attention(&self, key: &OwnerKey);
}

impl OwnerEvents for ReconcileQueue<OwnerKey> {
    fn owner_needs_attention(&self, key: &OwnerKey) {
        self.add(key.clone());
    }
}

/// Outcome of one `control_jobs` pass
#[derive(Debug, Clone, PartialEq)]
pub enum JobControlResult {
    /// Nothing to do for this owner
    NoWork,
    /// A created job has not been observed yet
    PendingExpectations,
    /// Jobs from older generations or the other direction are being removed
    DeletingJobs,
    /// The current job is still running
    JobWorking,
    /// A job was created (or already existed) for the current generation
    CreatingJob,
    /// The current job has finished
    JobFinished(JobRecord),
}

pub struct JobControl<J: JobStore, C: Clock> {
    jobs: J,
    index: OwnershipIndex<C>,
    events: Arc<dyn OwnerEvents>,
    reporter: Arc<dyn ErrorReporter>,
    controller_name: String,
}

impl<J: JobStore, C: Clock> JobControl<J, C> {
    pub fn new(
        jobs: J,
        index: OwnershipIndex<C>,
        events: Arc<dyn OwnerEvents>,
        reporter: Arc<dyn ErrorReporter>,
        controller_name: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            index,
            events,
            reporter,
            controller_name: controller_name.into(),
        }
    }

    pub fn index(&self) -> &OwnershipIndex<C> {
        &self.index
    }

    pub fn controller_name(&self) -> &str {
        &self.controller_name
    }

    // ── Watch handlers ──────────────────────────────────────────────────────

    /// Apply a job watch event to the index and enqueue the affected owners
    pub fn handle_event(&self, event: WatchEvent<JobRecord>) {
        match event {
            WatchEvent::Added(job) => self.on_added(&job),
            WatchEvent::Updated { old, new } => self.on_updated(&old, &new),
            WatchEvent::Deleted(deleted) => self.on_deleted(deleted),
            WatchEvent::Synced => {}
        }
    }

    fn on_added(&self, job: &JobRecord) {
        let Some(owner) = self.owner_of(job) else {
            return;
        };
        self.index.creation_observed(&owner);
        self.track(&owner, job);
        self.events.owner_needs_attention(&owner);
    }

    fn on_updated(&self, old: &JobRecord, new: &JobRecord) {
        // Periodic resyncs deliver unchanged objects
        if old.metadata.resource_version == new.metadata.resource_version {
            return;
        }
        let old_owner = self.owner_of(old);
        let new_owner = self.owner_of(new);
        if old_owner.is_some() && old_owner != new_owner {
            if let Some(previous) = old_owner {
                if let Ok(job_key) = old.key() {
                    self.index.untrack(&job_key);
                }
                self.events.owner_needs_attention(&previous);
            }
        }
        if let Some(owner) = new_owner {
            self.track(&owner, new);
            self.events.owner_needs_attention(&owner);
        }
    }

    fn on_deleted(&self, deleted: Deleted<JobRecord>) {
        let job = match deleted.into_object() {
            Ok(job) => job,
            Err(key) => {
                self.reporter.report(
                    "job watch",
                    &SyncError::Structural(format!(
                        "tombstone for job {} carries no object",
                        key
                    )),
                );
                return;
            }
        };
        let Some(owner) = self.owner_of(&job) else {
            return;
        };
        if let Ok(job_key) = job.key() {
            self.index.untrack(&job_key);
        }
        self.events.owner_needs_attention(&owner);
    }

    fn owner_of(&self, job: &JobRecord) -> Option<OwnerKey> {
        match self.index.resolve(job) {
            Ok(owner) => Some(owner),
            Err(e) => {
                tracing::debug!(job = %job.metadata.name, error = %e, "ignoring job");
                None
            }
        }
    }

    fn track(&self, owner: &OwnerKey, job: &JobRecord) {
        if let Err(e) = self.index.track(owner, job) {
            tracing::warn!(owner = %owner, job = %job.metadata.name, error = %e, "failed to index job");
        }
    }

    // ── Worker operations ───────────────────────────────────────────────────

    /// Create `job` for `owner` unless a running job is already tracked.
    ///
    /// The creation is recorded as an expectation first, so a sync that runs
    /// before the watch reports the new job does not create it again.
    pub async fn create_job(
        &self,
        owner: &OwnerKey,
        job: JobRecord,
    ) -> Result<JobRecord, SyncError> {
        if let Some(active) = self.index.active_job(owner) {
            return Err(SyncError::Store(StoreError::AlreadyExists {
                kind: JobRecord::KIND,
                key: active.to_string(),
            }));
        }
        self.index.expect_creation(owner);
        match self.jobs.create(job).await {
            Ok(created) => {
                self.track(owner, &created);
                Ok(created)
            }
            Err(e) => {
                // The watch will never report this creation
                self.index.creation_observed(owner);
                Err(e.into())
            }
        }
    }

    /// Bring the owner's jobs in line with its current generation.
    ///
    /// With a factory, a job for `(generation, direction)` is created when
    /// missing. Without one the owner needs no job, and finished jobs are
    /// cleaned up.
    pub async fn control_jobs(
        &self,
        owner: &Cluster,
        direction: Direction,
        factory: Option<&dyn JobFactory>,
    ) -> Result<JobControlResult, SyncError> {
        let owner_key = owner.key()?;
        if !self.index.expectations_satisfied(&owner_key) {
            return Ok(JobControlResult::PendingExpectations);
        }

        let selector = job::owner_selector(owner, &self.controller_name);
        let jobs = self
            .jobs
            .list(&owner.metadata.namespace, &selector)
            .await?;
        for job in &jobs {
            self.track(&owner_key, job);
        }

        let generation = owner.metadata.generation;
        let (current, stale): (Vec<_>, Vec<_>) = jobs
            .into_iter()
            .partition(|job| job.is_for(generation, direction));

        let stale_active: Vec<_> = stale.iter().filter(|job| job.is_active()).collect();
        if !stale_active.is_empty() {
            for job in stale_active {
                tracing::info!(owner = %owner_key, job = %job.metadata.name, "deleting superseded job");
                self.delete_job(job).await?;
            }
            return Ok(JobControlResult::DeletingJobs);
        }

        let current = current.into_iter().next();
        let Some(factory) = factory else {
            for job in current.iter().chain(stale.iter()) {
                if job.is_finished() {
                    tracing::debug!(owner = %owner_key, job = %job.metadata.name, "removing finished job");
                    self.delete_job(job).await?;
                }
            }
            return Ok(match current {
                Some(job) if job.is_active() => JobControlResult::JobWorking,
                _ => JobControlResult::NoWork,
            });
        };

        match current {
            Some(job) if job.is_active() => Ok(JobControlResult::JobWorking),
            Some(job) => Ok(JobControlResult::JobFinished(job)),
            None => {
                let record = self.build_job(owner, direction, factory)?;
                tracing::info!(owner = %owner_key, job = %record.metadata.name, %direction, "creating job");
                match self.create_job(&owner_key, record).await {
                    Ok(_) => Ok(JobControlResult::CreatingJob),
                    Err(e) if e.is_already_exists() => Ok(JobControlResult::CreatingJob),
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Forget everything tracked for a removed owner
    pub fn forget_owner(&self, owner: &OwnerKey) {
        self.index.forget_owner(owner);
    }

    fn build_job(
        &self,
        owner: &Cluster,
        direction: Direction,
        factory: &dyn JobFactory,
    ) -> Result<JobRecord, SyncError> {
        let name = job::job_name(owner, &self.controller_name, direction);
        let (spec, config) = factory.build_job(&name)?;
        let mut metadata = ObjectMeta::new(owner.metadata.namespace.clone(), name);
        metadata.labels = job::job_labels(owner, &self.controller_name, direction);
        metadata.owner_references = vec![job::controller_ref(owner)];
        Ok(JobRecord {
            metadata,
            spec,
            config,
            state: Default::default(),
            message: None,
        })
    }

    async fn delete_job(&self, job: &JobRecord) -> Result<(), SyncError> {
        match self
            .jobs
            .delete(&job.metadata.namespace, &job.metadata.name)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        if let Ok(job_key) = job.key() {
            self.index.untrack(&job_key);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_control_tests.rs"]
mod tests;
