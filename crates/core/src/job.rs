// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background provisioning jobs and their labels.

use crate::cluster::{Cluster, Direction};
use crate::meta::{ObjectMeta, OwnerReference, Resource};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Label keys stamped on every job so unrelated jobs are never mis-attributed
pub mod labels {
    pub const CONTROLLER: &str = "infra.jobs/controller";
    pub const OWNER_NAMESPACE: &str = "infra.jobs/owner-namespace";
    pub const OWNER_NAME: &str = "infra.jobs/owner-name";
    pub const OWNER_UID: &str = "infra.jobs/owner-uid";
    pub const GENERATION: &str = "infra.jobs/generation";
    pub const DIRECTION: &str = "infra.jobs/direction";
}

/// Auxiliary configuration data mounted into a job (inventory, vars)
pub type AuxConfig = BTreeMap<String, String>;

/// What the job runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub image: String,
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Completion state of a job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobState::Running)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "running"),
            JobState::Succeeded => write!(f, "succeeded"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub metadata: ObjectMeta,
    pub spec: JobSpec,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: AuxConfig,
    #[serde(default)]
    pub state: JobState,
    /// Failure detail reported by the job runner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobRecord {
    pub fn is_active(&self) -> bool {
        !self.state.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn succeeded(&self) -> bool {
        self.state == JobState::Succeeded
    }

    /// Owner generation this job was built for
    pub fn generation(&self) -> Option<u64> {
        self.metadata
            .labels
            .get(labels::GENERATION)
            .and_then(|g| g.parse().ok())
    }

    pub fn direction(&self) -> Option<Direction> {
        self.metadata
            .labels
            .get(labels::DIRECTION)
            .and_then(|d| d.parse().ok())
    }

    /// Whether this job was built for the given owner generation and direction
    pub fn is_for(&self, generation: u64, direction: Direction) -> bool {
        self.generation() == Some(generation) && self.direction() == Some(direction)
    }
}

impl Resource for JobRecord {
    const KIND: &'static str = "Job";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

/// Deterministic job name for an owner generation and direction.
///
/// `{owner}-{controller}-{hash8}`, where the hash covers the owner uid so a
/// recreated owner with the same name never collides with old jobs.
pub fn job_name(owner: &Cluster, controller: &str, direction: Direction) -> String {
    let mut hasher = Sha256::new();
    hasher.update(owner.metadata.uid.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(owner.metadata.generation.to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(direction.as_str().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}-{}-{}", owner.metadata.name, controller, &digest[..8])
}

/// Labels identifying a job as belonging to `owner` under `controller`
pub fn owner_selector(owner: &Cluster, controller: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::CONTROLLER.to_string(), controller.to_string()),
        (
            labels::OWNER_NAMESPACE.to_string(),
            owner.metadata.namespace.clone(),
        ),
        (labels::OWNER_NAME.to_string(), owner.metadata.name.clone()),
        (
            labels::OWNER_UID.to_string(),
            owner.metadata.uid.to_string(),
        ),
    ])
}

/// Full label set for a job built for the owner's current generation
pub fn job_labels(
    owner: &Cluster,
    controller: &str,
    direction: Direction,
) -> BTreeMap<String, String> {
    let mut labels = owner_selector(owner, controller);
    labels.insert(
        labels::GENERATION.to_string(),
        owner.metadata.generation.to_string(),
    );
    labels.insert(labels::DIRECTION.to_string(), direction.to_string());
    labels
}

/// Controller owner reference pointing at `owner`
pub fn controller_ref(owner: &Cluster) -> OwnerReference {
    OwnerReference {
        kind: Cluster::KIND.to_string(),
        name: owner.metadata.name.clone(),
        uid: owner.metadata.uid.clone(),
        controller: true,
    }
}

/// True when every selector label is present with the same value
pub fn matches_selector(
    labels: &BTreeMap<String, String>,
    selector: &BTreeMap<String, String>,
) -> bool {
    selector.iter().all(|(k, v)| labels.get(k) == Some(v))
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
