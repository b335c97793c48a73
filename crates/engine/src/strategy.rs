// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owner-specific hooks used by the job sync state machine

use crate::error::SyncError;
use async_trait::async_trait;
use infra_core::{
    AuxConfig, Cluster, ConditionStatus, Direction, JobRecord, JobSpec, JobSyncCondition, OwnerKey,
    UpdateCheck,
};

/// Builds the job for one owner generation and direction.
///
/// Must be deterministic: the same name yields the same payload.
pub trait JobFactory: Send + Sync {
    fn build_job(&self, name: &str) -> Result<(JobSpec, AuxConfig), SyncError>;
}

/// Everything job sync needs to know about the owner type
#[async_trait]
pub trait SyncStrategy: Send + Sync + 'static {
    /// Current owner from the store. A missing owner is `OwnerNotFound`.
    async fn get_owner(&self, key: &OwnerKey) -> Result<Cluster, SyncError>;

    /// True while the owner's generation has no completed job run
    fn needs_processing(&self, owner: &Cluster) -> bool;

    fn job_factory(
        &self,
        owner: &Cluster,
        direction: Direction,
    ) -> Result<Box<dyn JobFactory>, SyncError>;

    /// Apply a generic job condition to the owner's status.
    /// Returns true when the status changed.
    #[allow(clippy::too_many_arguments)]
    fn set_condition(
        &self,
        owner: &mut Cluster,
        condition: JobSyncCondition,
        direction: Direction,
        status: ConditionStatus,
        reason: &str,
        message: &str,
        check: UpdateCheck,
    ) -> bool;

    /// Record a job's terminal outcome in the owner's status
    fn on_job_completion(&self, owner: &mut Cluster, job: &JobRecord, succeeded: bool);

    /// Write `updated`'s status if it differs from `original`'s.
    async fn persist_status(
        &self,
        original: &Cluster,
        updated: &Cluster,
    ) -> Result<Cluster, SyncError>;

    async fn add_finalizer(&self, owner: &Cluster) -> Result<Cluster, SyncError>;

    async fn remove_finalizer(&self, owner: &Cluster) -> Result<Cluster, SyncError>;

    fn has_finalizer(&self, owner: &Cluster) -> bool;
}
