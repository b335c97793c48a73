// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cluster resource: the owner whose infrastructure is reconciled.

use crate::condition::Conditions;
use crate::meta::{ObjectMeta, Resource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Whether a job brings infrastructure up or tears it down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Provision,
    Deprovision,
}

impl Direction {
    pub fn for_deleting(deleting: bool) -> Self {
        if deleting {
            Direction::Deprovision
        } else {
            Direction::Provision
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Provision => "provision",
            Direction::Deprovision => "deprovision",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provision" => Ok(Direction::Provision),
            "deprovision" => Ok(Direction::Deprovision),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// Role a machine set plays in the cluster topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineSetRole {
    Master,
    Infra,
    Compute,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSet {
    pub name: String,
    pub role: MachineSetRole,
    pub replicas: u32,
}

/// Desired cluster configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Platform version installed by the provisioning playbooks
    pub version: String,
    pub region: String,
    #[serde(default)]
    pub machine_sets: Vec<MachineSet>,
    /// Extra variables handed to the playbooks verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
}

impl ClusterSpec {
    pub fn master_machine_set(&self) -> Option<&MachineSet> {
        self.machine_sets
            .iter()
            .find(|ms| ms.role == MachineSetRole::Master)
    }
}

/// Observed provisioning state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    /// Generation whose job run last completed (0 = never)
    #[serde(default)]
    pub provisioned_generation: u64,
    /// Outcome of the last completed run
    #[serde(default)]
    pub provisioned: bool,
    #[serde(default)]
    pub conditions: Conditions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub metadata: ObjectMeta,
    pub spec: ClusterSpec,
    #[serde(default)]
    pub status: ClusterStatus,
}

impl Cluster {
    pub fn new(metadata: ObjectMeta, spec: ClusterSpec) -> Self {
        Self {
            metadata,
            spec,
            status: ClusterStatus::default(),
        }
    }

    /// True once a job run has completed for the current generation.
    pub fn is_satisfied(&self) -> bool {
        self.status.provisioned_generation == self.metadata.generation
    }

    pub fn is_deleting(&self) -> bool {
        self.metadata.is_deleting()
    }

    pub fn direction(&self) -> Direction {
        Direction::for_deleting(self.is_deleting())
    }
}

impl Resource for Cluster {
    const KIND: &'static str = "Cluster";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod tests;
