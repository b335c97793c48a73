// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync strategy for cluster infrastructure

use crate::error::SyncError;
use crate::strategy::{JobFactory, SyncStrategy};
use async_trait::async_trait;
use infra_adapters::{OwnerStore, PayloadGenerator, PlaybookParams};
use infra_core::{
    AuxConfig, Clock, Cluster, ClusterSpec, ConditionStatus, Direction, JobRecord, JobSpec,
    JobSyncCondition, OwnerKey, UpdateCheck,
};
use std::sync::Arc;

pub const INFRA_PLAYBOOK: &str = "playbooks/cluster-operator/aws/infrastructure.yml";
pub const DEPROVISION_INFRA_PLAYBOOK: &str =
    "playbooks/cluster-operator/aws/uninstall_infrastructure.yml";

/// Number of nodes the infrastructure is sized for.
///
/// The network, security groups and load balancers serve every node of the
/// cluster, so this counts the replicas of all machine sets, whatever their
/// role (master, infra or compute). A cluster without a master machine set
/// cannot be sized.
pub fn infra_size(spec: &ClusterSpec) -> Result<u32, SyncError> {
    if spec.master_machine_set().is_none() {
        return Err(SyncError::Build("cluster has no master machine set".into()));
    }
    Ok(spec
        .machine_sets
        .iter()
        .fold(0u32, |total, ms| total.saturating_add(ms.replicas)))
}

pub fn playbook(direction: Direction) -> &'static str {
    match direction {
        Direction::Provision => INFRA_PLAYBOOK,
        Direction::Deprovision => DEPROVISION_INFRA_PLAYBOOK,
    }
}

pub struct InfraStrategy<O: OwnerStore, C: Clock> {
    owners: O,
    generator: Arc<dyn PayloadGenerator>,
    clock: C,
    finalizer: String,
}

impl<O: OwnerStore, C: Clock> InfraStrategy<O, C> {
    pub fn new(
        owners: O,
        generator: Arc<dyn PayloadGenerator>,
        clock: C,
        finalizer: impl Into<String>,
    ) -> Self {
        Self {
            owners,
            generator,
            clock,
            finalizer: finalizer.into(),
        }
    }
}

#[async_trait]
impl<O: OwnerStore, C: Clock> SyncStrategy for InfraStrategy<O, C> {
    async fn get_owner(&self, key: &OwnerKey) -> Result<Cluster, SyncError> {
        match self.owners.get(key).await {
            Ok(owner) => Ok(owner),
            Err(e) if e.is_not_found() => Err(SyncError::OwnerNotFound(key.clone())),
            Err(e) => Err(e.into()),
        }
    }

    fn needs_processing(&self, owner: &Cluster) -> bool {
        !owner.is_satisfied()
    }

    fn job_factory(
        &self,
        owner: &Cluster,
        direction: Direction,
    ) -> Result<Box<dyn JobFactory>, SyncError> {
        let params = PlaybookParams {
            cluster_name: owner.metadata.name.clone(),
            playbooks: vec![playbook(direction).to_string()],
            version: owner.spec.version.clone(),
            infra_size: infra_size(&owner.spec)?,
        };
        Ok(Box::new(InfraJobFactory {
            generator: Arc::clone(&self.generator),
            spec: owner.spec.clone(),
            direction,
            params,
        }))
    }

    fn set_condition(
        &self,
        owner: &mut Cluster,
        condition: JobSyncCondition,
        direction: Direction,
        status: ConditionStatus,
        reason: &str,
        message: &str,
        check: UpdateCheck,
    ) -> bool {
        owner.status.conditions.set(
            condition.for_direction(direction),
            status,
            reason,
            message,
            check,
            self.clock.epoch_ms(),
        )
    }

    fn on_job_completion(&self, owner: &mut Cluster, job: &JobRecord, succeeded: bool) {
        match job.direction().unwrap_or_else(|| owner.direction()) {
            Direction::Provision => owner.status.provisioned = succeeded,
            // A failed teardown leaves the infrastructure in place
            Direction::Deprovision if succeeded => owner.status.provisioned = false,
            Direction::Deprovision => {}
        }
        owner.status.provisioned_generation = owner.metadata.generation;
    }

    async fn persist_status(
        &self,
        original: &Cluster,
        updated: &Cluster,
    ) -> Result<Cluster, SyncError> {
        if original.status == updated.status {
            return Ok(original.clone());
        }
        Ok(self.owners.update_status(updated).await?)
    }

    async fn add_finalizer(&self, owner: &Cluster) -> Result<Cluster, SyncError> {
        let mut updated = owner.clone();
        if !updated.metadata.add_finalizer(&self.finalizer) {
            return Ok(updated);
        }
        Ok(self.owners.update_metadata(&updated).await?)
    }

    async fn remove_finalizer(&self, owner: &Cluster) -> Result<Cluster, SyncError> {
        let mut updated = owner.clone();
        if !updated.metadata.remove_finalizer(&self.finalizer) {
            return Ok(updated);
        }
        Ok(self.owners.update_metadata(&updated).await?)
    }

    fn has_finalizer(&self, owner: &Cluster) -> bool {
        owner.metadata.has_finalizer(&self.finalizer)
    }
}

struct InfraJobFactory {
    generator: Arc<dyn PayloadGenerator>,
    spec: ClusterSpec,
    direction: Direction,
    params: PlaybookParams,
}

impl JobFactory for InfraJobFactory {
    fn build_job(&self, name: &str) -> Result<(JobSpec, AuxConfig), SyncError> {
        tracing::debug!(job = name, direction = %self.direction, "generating payload");
        Ok(self
            .generator
            .generate(&self.spec, self.direction, &self.params)?)
    }
}

#[cfg(test)]
#[path = "infra_tests.rs"]
mod tests;
