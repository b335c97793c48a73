// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ansible playbook invocation builder

use super::{GenerateError, PayloadGenerator, PlaybookParams};
use infra_core::{AuxConfig, ClusterSpec, Direction, JobSpec};
use std::collections::BTreeMap;

pub const DEFAULT_IMAGE: &str = "cluster-operator-ansible:latest";

/// Config entry holding the inventory file
pub const INVENTORY_KEY: &str = "hosts";

/// Config entry holding the extra-vars file
pub const VARS_KEY: &str = "vars.json";

/// Directory the job's config entries are mounted under
pub const CONFIG_MOUNT: &str = "/ansible/inventory";

const INVENTORY: &str = "[localhost]\nlocalhost ansible_connection=local\n";

/// Runs `ansible-playbook` with a local inventory and JSON extra-vars
#[derive(Debug, Clone)]
pub struct AnsibleGenerator {
    image: String,
}

impl Default for AnsibleGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE)
    }
}

impl AnsibleGenerator {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }

    fn extra_vars(
        config: &ClusterSpec,
        direction: Direction,
        params: &PlaybookParams,
    ) -> Result<String, GenerateError> {
        let mut vars = serde_json::Map::new();
        for (k, v) in &config.vars {
            vars.insert(k.clone(), serde_json::Value::String(v.clone()));
        }
        vars.insert("cluster_name".into(), params.cluster_name.clone().into());
        vars.insert("cluster_version".into(), params.version.clone().into());
        vars.insert("cluster_region".into(), config.region.clone().into());
        vars.insert("infra_size".into(), params.infra_size.into());
        vars.insert("cluster_direction".into(), direction.as_str().into());
        if let Some(master) = config.master_machine_set() {
            vars.insert("master_machine_set".into(), master.name.clone().into());
            vars.insert("master_replicas".into(), master.replicas.into());
        }
        serde_json::to_string_pretty(&serde_json::Value::Object(vars))
            .map_err(|e| GenerateError::Failed(e.to_string()))
    }
}

impl PayloadGenerator for AnsibleGenerator {
    fn generate(
        &self,
        config: &ClusterSpec,
        direction: Direction,
        params: &PlaybookParams,
    ) -> Result<(JobSpec, AuxConfig), GenerateError> {
        if params.playbooks.is_empty() {
            return Err(GenerateError::NoPlaybooks);
        }
        if params.version.is_empty() {
            return Err(GenerateError::MissingVersion);
        }

        let mut args = vec![
            "-i".to_string(),
            format!("{}/{}", CONFIG_MOUNT, INVENTORY_KEY),
            "-e".to_string(),
            format!("@{}/{}", CONFIG_MOUNT, VARS_KEY),
        ];
        args.extend(params.playbooks.iter().cloned());

        let spec = JobSpec {
            image: self.image.clone(),
            command: vec!["ansible-playbook".to_string()],
            args,
            env: BTreeMap::from([
                ("ANSIBLE_HOST_KEY_CHECKING".to_string(), "False".to_string()),
                ("INFRA_DIRECTION".to_string(), direction.to_string()),
            ]),
        };
        let aux = AuxConfig::from([
            (INVENTORY_KEY.to_string(), INVENTORY.to_string()),
            (
                VARS_KEY.to_string(),
                Self::extra_vars(config, direction, params)?,
            ),
        ]);
        Ok((spec, aux))
    }
}

#[cfg(test)]
#[path = "ansible_tests.rs"]
mod tests;
