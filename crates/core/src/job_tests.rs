// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::cluster::ClusterSpec;
use crate::id::Uid;

fn owner(uid: &str, generation: u64) -> Cluster {
    let mut metadata = ObjectMeta::new("ns", "foo");
    metadata.uid = Uid::new(uid);
    metadata.generation = generation;
    Cluster::new(metadata, ClusterSpec::default())
}

fn job_with_labels(labels: BTreeMap<String, String>, state: JobState) -> JobRecord {
    let mut metadata = ObjectMeta::new("ns", "foo-infra-0000");
    metadata.labels = labels;
    JobRecord {
        metadata,
        spec: JobSpec::default(),
        config: AuxConfig::new(),
        state,
        message: None,
    }
}

#[test]
fn job_name_is_deterministic() {
    let a = job_name(&owner("u1", 1), "infra", Direction::Provision);
    let b = job_name(&owner("u1", 1), "infra", Direction::Provision);
    assert_eq!(a, b);
    assert!(a.starts_with("foo-infra-"));
    assert_eq!(a.len(), "foo-infra-".len() + 8);
}

#[yare::parameterized(
    generation = { "u1", 2, Direction::Provision },
    direction  = { "u1", 1, Direction::Deprovision },
    uid        = { "u2", 1, Direction::Provision },
)]
fn job_name_changes_with_inputs(uid: &str, generation: u64, direction: Direction) {
    let base = job_name(&owner("u1", 1), "infra", Direction::Provision);
    assert_ne!(job_name(&owner(uid, generation), "infra", direction), base);
}

#[test]
fn job_labels_carry_generation_and_direction() {
    let owner = owner("u1", 3);
    let job = job_with_labels(
        job_labels(&owner, "infra", Direction::Deprovision),
        JobState::Running,
    );
    assert_eq!(job.generation(), Some(3));
    assert_eq!(job.direction(), Some(Direction::Deprovision));
    assert!(job.is_for(3, Direction::Deprovision));
    assert!(!job.is_for(3, Direction::Provision));
    assert!(!job.is_for(2, Direction::Deprovision));
}

#[test]
fn selector_matches_only_same_owner_and_controller() {
    let owner_a = owner("u1", 1);
    let labels = job_labels(&owner_a, "infra", Direction::Provision);

    assert!(matches_selector(&labels, &owner_selector(&owner_a, "infra")));
    assert!(!matches_selector(&labels, &owner_selector(&owner_a, "other")));
    assert!(!matches_selector(&labels, &owner_selector(&owner("u9", 1), "infra")));
}

#[yare::parameterized(
    running   = { JobState::Running,   true,  false },
    succeeded = { JobState::Succeeded, false, true },
    failed    = { JobState::Failed,    false, true },
)]
fn job_state_activity(state: JobState, active: bool, finished: bool) {
    let job = job_with_labels(BTreeMap::new(), state);
    assert_eq!(job.is_active(), active);
    assert_eq!(job.is_finished(), finished);
}

#[test]
fn controller_ref_points_at_owner() {
    let owner = owner("u1", 1);
    let reference = controller_ref(&owner);
    assert_eq!(reference.kind, "Cluster");
    assert_eq!(reference.name, "foo");
    assert_eq!(reference.uid, "u1");
    assert!(reference.controller);
}
