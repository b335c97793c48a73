// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::cluster::{Cluster, ClusterSpec, Direction, MachineSet, MachineSetRole};
use crate::id::Uid;
use crate::job::{self, AuxConfig, JobRecord, JobSpec, JobState};
use crate::key::ObjectKey;
use crate::meta::ObjectMeta;

/// Parse an `ns/name` key, panicking on malformed input
#[allow(clippy::panic)]
pub fn key(s: &str) -> ObjectKey {
    match ObjectKey::parse(s) {
        Ok(key) => key,
        Err(e) => panic!("bad test key {s:?}: {e}"),
    }
}

/// Spec with a single-replica master set and two compute nodes
pub fn cluster_spec() -> ClusterSpec {
    ClusterSpec {
        version: "3.10".to_string(),
        region: "us-east-1".to_string(),
        machine_sets: vec![
            MachineSet {
                name: "master".to_string(),
                role: MachineSetRole::Master,
                replicas: 1,
            },
            MachineSet {
                name: "compute".to_string(),
                role: MachineSetRole::Compute,
                replicas: 2,
            },
        ],
        vars: Default::default(),
    }
}

/// Generation-1 cluster with uid `uid-{name}`
pub fn cluster(namespace: &str, name: &str) -> Cluster {
    let mut metadata = ObjectMeta::new(namespace, name);
    metadata.uid = Uid::new(format!("uid-{name}"));
    metadata.generation = 1;
    metadata.resource_version = 1;
    Cluster::new(metadata, cluster_spec())
}

// ── Job builder ─────────────────────────────────────────────────────────────

/// Builder for job records attributed to an owner
pub struct JobBuilder {
    record: JobRecord,
}

impl JobBuilder {
    /// Job owned by `owner` for its current generation and direction
    pub fn for_owner(owner: &Cluster, controller: &str) -> Self {
        let direction = owner.direction();
        let mut metadata = ObjectMeta::new(
            owner.metadata.namespace.clone(),
            job::job_name(owner, controller, direction),
        );
        metadata.uid = Uid::new(format!("job-uid-{}", metadata.name));
        metadata.labels = job::job_labels(owner, controller, direction);
        metadata.owner_references = vec![job::controller_ref(owner)];
        Self {
            record: JobRecord {
                metadata,
                spec: JobSpec {
                    image: "test-image".to_string(),
                    command: vec!["true".to_string()],
                    args: Vec::new(),
                    env: Default::default(),
                },
                config: AuxConfig::new(),
                state: JobState::Running,
                message: None,
            },
        }
    }

    /// Job with no owner references or labels
    pub fn orphan(namespace: &str, name: &str) -> Self {
        let mut metadata = ObjectMeta::new(namespace, name);
        metadata.uid = Uid::new(format!("job-uid-{name}"));
        Self {
            record: JobRecord {
                metadata,
                spec: JobSpec::default(),
                config: AuxConfig::new(),
                state: JobState::Running,
                message: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.record.metadata.name = name.to_string();
        self
    }

    pub fn generation(mut self, generation: u64) -> Self {
        self.record
            .metadata
            .labels
            .insert(job::labels::GENERATION.to_string(), generation.to_string());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.record
            .metadata
            .labels
            .insert(job::labels::DIRECTION.to_string(), direction.to_string());
        self
    }

    pub fn state(mut self, state: JobState) -> Self {
        self.record.state = state;
        self
    }

    pub fn message(mut self, message: &str) -> Self {
        self.record.message = Some(message.to_string());
        self
    }

    pub fn deleting(mut self) -> Self {
        self.record.metadata.deletion_timestamp_ms = Some(1);
        self
    }

    pub fn build(self) -> JobRecord {
        self.record
    }
}
