// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job sync: the per-owner state machine run by every worker.
//!
//! Each pass re-derives everything from the store, so a pass that fails
//! halfway is simply run again.

use crate::error::SyncError;
use crate::job_control::{JobControl, JobControlResult};
use crate::strategy::SyncStrategy;
use async_trait::async_trait;
use infra_adapters::JobStore;
use infra_core::{
    Clock, Cluster, ClusterConditionType, ConditionStatus, Direction, JobRecord, JobSyncCondition,
    OwnerKey, UpdateCheck,
};
use std::sync::Arc;

/// Condition reasons written by job sync
pub mod reasons {
    pub const JOB_RUNNING: &str = "JobRunning";
    pub const JOB_COMPLETED: &str = "JobCompleted";
    pub const JOB_FAILED: &str = "JobFailed";
}

/// Processes one owner key
#[async_trait]
pub trait SyncHandler: Send + Sync + 'static {
    async fn sync(&self, key: &OwnerKey) -> Result<(), SyncError>;
}

pub struct JobSync<J: JobStore, C: Clock> {
    control: Arc<JobControl<J, C>>,
    strategy: Arc<dyn SyncStrategy>,
    deprovision_on_delete: bool,
}

impl<J: JobStore, C: Clock> JobSync<J, C> {
    pub fn new(
        control: Arc<JobControl<J, C>>,
        strategy: Arc<dyn SyncStrategy>,
        deprovision_on_delete: bool,
    ) -> Self {
        Self {
            control,
            strategy,
            deprovision_on_delete,
        }
    }

    /// Owner whose current generation already has a completed run
    async fn sync_satisfied(&self, owner: &Cluster) -> Result<(), SyncError> {
        self.control.control_jobs(owner, owner.direction(), None).await?;
        if owner.is_deleting()
            && self.strategy.has_finalizer(owner)
            && owner
                .status
                .conditions
                .is_true(ClusterConditionType::Deprovisioned)
        {
            tracing::info!(owner = %owner.metadata.name, "deprovisioned, releasing owner");
            self.strategy.remove_finalizer(owner).await?;
        }
        Ok(())
    }

    async fn job_started(&self, owner: &Cluster, direction: Direction) -> Result<(), SyncError> {
        let mut updated = owner.clone();
        let changed = self.strategy.set_condition(
            &mut updated,
            JobSyncCondition::Processing,
            direction,
            ConditionStatus::True,
            reasons::JOB_RUNNING,
            &format!("{} job started", direction),
            UpdateCheck::Never,
        );
        if changed {
            self.strategy.persist_status(owner, &updated).await?;
        }
        Ok(())
    }

    async fn job_finished(
        &self,
        owner: &Cluster,
        direction: Direction,
        job: &JobRecord,
    ) -> Result<(), SyncError> {
        let succeeded = job.succeeded();
        tracing::info!(
            owner = %owner.metadata.name,
            job = %job.metadata.name,
            %direction,
            succeeded,
            "job finished"
        );

        let mut updated = owner.clone();
        if succeeded {
            let message = format!("{} job {} completed", direction, job.metadata.name);
            self.strategy.set_condition(
                &mut updated,
                JobSyncCondition::Processed,
                direction,
                ConditionStatus::True,
                reasons::JOB_COMPLETED,
                &message,
                UpdateCheck::IfReasonOrMessageChange,
            );
            self.strategy.set_condition(
                &mut updated,
                JobSyncCondition::ProcessingFailed,
                direction,
                ConditionStatus::False,
                reasons::JOB_COMPLETED,
                &message,
                UpdateCheck::IfReasonOrMessageChange,
            );
        } else {
            let message = job
                .message
                .clone()
                .unwrap_or_else(|| format!("{} job {} failed", direction, job.metadata.name));
            self.strategy.set_condition(
                &mut updated,
                JobSyncCondition::ProcessingFailed,
                direction,
                ConditionStatus::True,
                reasons::JOB_FAILED,
                &message,
                UpdateCheck::IfReasonOrMessageChange,
            );
        }
        self.strategy.on_job_completion(&mut updated, job, succeeded);
        let written = self.strategy.persist_status(owner, &updated).await?;

        if direction == Direction::Deprovision && succeeded {
            // Jobs are not left behind once the owner is released
            self.control.control_jobs(&written, direction, None).await?;
            self.strategy.remove_finalizer(&written).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<J: JobStore, C: Clock> SyncHandler for JobSync<J, C> {
    async fn sync(&self, key: &OwnerKey) -> Result<(), SyncError> {
        let owner = match self.strategy.get_owner(key).await {
            Ok(owner) => owner,
            Err(SyncError::OwnerNotFound(_)) => {
                tracing::debug!(owner = %key, "owner gone, forgetting its jobs");
                self.control.forget_owner(key);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if !self.strategy.needs_processing(&owner) {
            return self.sync_satisfied(&owner).await;
        }

        let direction = owner.direction();
        if owner.is_deleting() && !self.deprovision_on_delete {
            if self.strategy.has_finalizer(&owner) {
                self.strategy.remove_finalizer(&owner).await?;
            }
            return Ok(());
        }
        let owner = if !owner.is_deleting()
            && self.deprovision_on_delete
            && !self.strategy.has_finalizer(&owner)
        {
            self.strategy.add_finalizer(&owner).await?
        } else {
            owner
        };

        let factory = self.strategy.job_factory(&owner, direction)?;
        match self
            .control
            .control_jobs(&owner, direction, Some(factory.as_ref()))
            .await?
        {
            JobControlResult::CreatingJob => self.job_started(&owner, direction).await,
            JobControlResult::JobFinished(job) => self.job_finished(&owner, direction, &job).await,
            other => {
                tracing::debug!(owner = %key, result = ?other, "waiting on jobs");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "job_sync_tests.rs"]
mod tests;
