// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Automation payload generation

mod ansible;

pub use ansible::{AnsibleGenerator, DEFAULT_IMAGE};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePayloadGenerator, GenerateCall};

use infra_core::{AuxConfig, ClusterSpec, Direction, JobSpec};
use thiserror::Error;

/// Errors from building a job payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("no playbooks given")]
    NoPlaybooks,
    #[error("cluster version is not set")]
    MissingVersion,
    #[error("payload generation failed: {0}")]
    Failed(String),
}

/// What to run against a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookParams {
    pub cluster_name: String,
    pub playbooks: Vec<String>,
    pub version: String,
    /// Number of nodes the infrastructure must be sized for
    pub infra_size: u32,
}

/// Builds the command and mounted configuration of a provisioning job.
///
/// Must be deterministic: identical inputs give identical output.
pub trait PayloadGenerator: Send + Sync + 'static {
    fn generate(
        &self,
        config: &ClusterSpec,
        direction: Direction,
        params: &PlaybookParams,
    ) -> Result<(JobSpec, AuxConfig), GenerateError>;
}
