// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ownership index: which owner each job belongs to.
//!
//! The index only holds back-references; it never decides a job's
//! lifetime. It also records creation expectations so a job created moments
//! ago is not created again before the store's watch reports it.

use infra_core::job::labels;
use infra_core::{Clock, JobKey, JobRecord, JobState, KeyError, ObjectKey, OwnerKey};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Reasons a job cannot be attributed to an owner of this controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("job {0} has no controller reference")]
    NoController(String),
    #[error("job {job} is controlled by a {kind}, not a {expected}")]
    WrongKind {
        job: String,
        kind: String,
        expected: String,
    },
    #[error("job {job} belongs to controller {found:?}")]
    ForeignController { job: String, found: Option<String> },
    #[error(transparent)]
    Key(#[from] KeyError),
}

#[derive(Debug, Clone, Copy)]
struct Expectation {
    pending: u32,
    recorded_at: Instant,
}

#[derive(Default)]
struct IndexState {
    owner_jobs: HashMap<OwnerKey, BTreeMap<JobKey, JobState>>,
    job_owner: HashMap<JobKey, OwnerKey>,
    expectations: HashMap<OwnerKey, Expectation>,
}

pub struct OwnershipIndex<C: Clock> {
    controller_name: String,
    owner_kind: String,
    expectations_ttl: Duration,
    clock: C,
    state: Mutex<IndexState>,
}

impl<C: Clock> OwnershipIndex<C> {
    pub fn new(
        controller_name: impl Into<String>,
        owner_kind: impl Into<String>,
        expectations_ttl: Duration,
        clock: C,
    ) -> Self {
        Self {
            controller_name: controller_name.into(),
            owner_kind: owner_kind.into(),
            expectations_ttl,
            clock,
            state: Mutex::new(IndexState::default()),
        }
    }

    /// Owner of `job`, from its controller reference.
    ///
    /// The reference must name this controller's owner kind and the job must
    /// carry this controller's label; anything else belongs to someone else.
    pub fn resolve(&self, job: &JobRecord) -> Result<OwnerKey, IndexError> {
        let owner_ref = job
            .metadata
            .controller_ref()
            .ok_or_else(|| IndexError::NoController(job.metadata.name.clone()))?;
        if owner_ref.kind != self.owner_kind {
            return Err(IndexError::WrongKind {
                job: job.metadata.name.clone(),
                kind: owner_ref.kind.clone(),
                expected: self.owner_kind.clone(),
            });
        }
        let controller = job.metadata.labels.get(labels::CONTROLLER);
        if controller.map(String::as_str) != Some(self.controller_name.as_str()) {
            return Err(IndexError::ForeignController {
                job: job.metadata.name.clone(),
                found: controller.cloned(),
            });
        }
        Ok(ObjectKey::new(&job.metadata.namespace, &owner_ref.name)?)
    }

    /// Record `job` under `owner`, refreshing its last seen state
    pub fn track(&self, owner: &OwnerKey, job: &JobRecord) -> Result<(), IndexError> {
        let job_key = job.metadata.key()?;
        let mut state = self.state.lock();
        if let Some(previous) = state.job_owner.insert(job_key.clone(), owner.clone()) {
            if &previous != owner {
                if let Some(jobs) = state.owner_jobs.get_mut(&previous) {
                    jobs.remove(&job_key);
                }
            }
        }
        state
            .owner_jobs
            .entry(owner.clone())
            .or_default()
            .insert(job_key, job.state);
        Ok(())
    }

    /// Drop `job` from the index, returning the owner it was tracked under
    pub fn untrack(&self, job: &JobKey) -> Option<OwnerKey> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let owner = state.job_owner.remove(job)?;
        let now_empty = match state.owner_jobs.get_mut(&owner) {
            Some(jobs) => {
                jobs.remove(job);
                jobs.is_empty()
            }
            None => false,
        };
        if now_empty {
            state.owner_jobs.remove(&owner);
        }
        Some(owner)
    }

    /// Owner a job is currently tracked under
    pub fn owner_of(&self, job: &JobKey) -> Option<OwnerKey> {
        self.state.lock().job_owner.get(job).cloned()
    }

    pub fn jobs_for(&self, owner: &OwnerKey) -> Vec<JobKey> {
        self.state
            .lock()
            .owner_jobs
            .get(owner)
            .map(|jobs| jobs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// A tracked job of `owner` last seen running
    pub fn active_job(&self, owner: &OwnerKey) -> Option<JobKey> {
        self.state.lock().owner_jobs.get(owner).and_then(|jobs| {
            jobs.iter()
                .find(|(_, state)| !state.is_finished())
                .map(|(key, _)| key.clone())
        })
    }

    /// Remove every trace of `owner`
    pub fn forget_owner(&self, owner: &OwnerKey) {
        let mut state = self.state.lock();
        if let Some(jobs) = state.owner_jobs.remove(owner) {
            for job in jobs.keys() {
                state.job_owner.remove(job);
            }
        }
        state.expectations.remove(owner);
    }

    // ── Expectations ────────────────────────────────────────────────────────

    /// Record that a job is about to be created for `owner`
    pub fn expect_creation(&self, owner: &OwnerKey) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let entry = state.expectations.entry(owner.clone()).or_insert(Expectation {
            pending: 0,
            recorded_at: now,
        });
        entry.pending += 1;
        entry.recorded_at = now;
    }

    /// A job creation for `owner` was observed, or will never be
    pub fn creation_observed(&self, owner: &OwnerKey) {
        let mut state = self.state.lock();
        let remaining = match state.expectations.get_mut(owner) {
            Some(entry) => {
                entry.pending = entry.pending.saturating_sub(1);
                entry.pending
            }
            None => return,
        };
        if remaining == 0 {
            state.expectations.remove(owner);
        }
    }

    /// True when no creation is outstanding, or the outstanding one expired
    pub fn expectations_satisfied(&self, owner: &OwnerKey) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();
        match state.expectations.get(owner).copied() {
            None => true,
            Some(entry) if entry.pending == 0 => true,
            Some(entry) => {
                if now.saturating_duration_since(entry.recorded_at) >= self.expectations_ttl {
                    tracing::warn!(owner = %owner, pending = entry.pending, "job creation expectation expired");
                    state.expectations.remove(owner);
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "ownership_tests.rs"]
mod tests;
