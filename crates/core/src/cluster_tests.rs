// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::meta::ObjectMeta;

fn cluster(generation: u64, provisioned_generation: u64) -> Cluster {
    let mut metadata = ObjectMeta::new("ns", "foo");
    metadata.generation = generation;
    let mut cluster = Cluster::new(metadata, ClusterSpec::default());
    cluster.status.provisioned_generation = provisioned_generation;
    cluster
}

#[yare::parameterized(
    never_provisioned = { 1, 0, false },
    current           = { 1, 1, true },
    behind            = { 2, 1, false },
)]
fn satisfied_iff_generations_match(generation: u64, provisioned: u64, expected: bool) {
    assert_eq!(cluster(generation, provisioned).is_satisfied(), expected);
}

#[test]
fn deletion_timestamp_flips_direction() {
    let mut cluster = cluster(1, 0);
    assert_eq!(cluster.direction(), Direction::Provision);

    cluster.metadata.deletion_timestamp_ms = Some(5);
    assert!(cluster.is_deleting());
    assert_eq!(cluster.direction(), Direction::Deprovision);
}

#[yare::parameterized(
    provision   = { Direction::Provision, "provision" },
    deprovision = { Direction::Deprovision, "deprovision" },
)]
fn direction_string_form(direction: Direction, text: &str) {
    assert_eq!(direction.to_string(), text);
    assert_eq!(text.parse::<Direction>().unwrap(), direction);
}

#[test]
fn unknown_direction_fails_to_parse() {
    assert!("sideways".parse::<Direction>().is_err());
}

#[test]
fn finalizers_are_a_set() {
    let mut meta = ObjectMeta::new("ns", "foo");
    assert!(meta.add_finalizer("infra.jobs/infra"));
    assert!(!meta.add_finalizer("infra.jobs/infra"));
    assert_eq!(meta.finalizers.len(), 1);
    assert!(meta.remove_finalizer("infra.jobs/infra"));
    assert!(!meta.remove_finalizer("infra.jobs/infra"));
}

#[test]
fn master_machine_set_lookup() {
    let spec = ClusterSpec {
        machine_sets: vec![
            MachineSet {
                name: "compute".into(),
                role: MachineSetRole::Compute,
                replicas: 3,
            },
            MachineSet {
                name: "master".into(),
                role: MachineSetRole::Master,
                replicas: 1,
            },
        ],
        ..Default::default()
    };
    assert_eq!(spec.master_machine_set().map(|m| m.name.as_str()), Some("master"));
}

#[test]
fn cluster_round_trips_through_json_with_defaults() {
    let json = serde_json::json!({
        "metadata": { "namespace": "ns", "name": "foo" },
        "spec": { "version": "3.10", "region": "us-east-1" }
    });
    let cluster: Cluster = serde_json::from_value(json).unwrap();
    assert_eq!(cluster.metadata.generation, 0);
    assert_eq!(cluster.status, ClusterStatus::default());
    assert!(cluster.spec.machine_sets.is_empty());
}
