// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller tuning

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controller settings. Every field has a default, so a partial table
/// deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Stamped on job names, labels and the finalizer
    pub controller_name: String,
    /// Kind a job's controller reference must name to be adopted
    pub owner_kind: String,
    /// Requeues allowed after the first failed sync before a key is dropped
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Overall requeue rate across all keys
    pub qps: f64,
    pub burst: u32,
    /// How long a recorded job creation may stay unobserved
    pub expectations_ttl_ms: u64,
    /// Run the deprovision playbook when a cluster is deleted
    pub deprovision_on_delete: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            controller_name: "infra".to_string(),
            owner_kind: "Cluster".to_string(),
            max_retries: 15,
            base_delay_ms: 5,
            max_delay_ms: 1_000_000,
            qps: 10.0,
            burst: 100,
            expectations_ttl_ms: 300_000,
            deprovision_on_delete: true,
        }
    }
}

impl ControllerConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn expectations_ttl(&self) -> Duration {
        Duration::from_millis(self.expectations_ttl_ms)
    }

    /// Finalizer guarding owners until their deprovision job succeeds
    pub fn finalizer(&self) -> String {
        format!("infra.jobs/{}", self.controller_name)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
