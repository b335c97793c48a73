//! New clusters get exactly one provisioning job and record its outcome.

use crate::prelude::*;

#[tokio::test(start_paused = true)]
async fn new_cluster_gets_one_provisioning_job() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(2);

    world.eventually(|| !world.jobs().is_empty()).await;
    world
        .eventually(|| {
            world.owner("alpha").is_some_and(|c| {
                condition(&c, ClusterConditionType::Provisioning) == Some(ConditionStatus::True)
            })
        })
        .await;
    world.settle().await;

    let jobs = world.jobs();
    similar_asserts::assert_eq!(jobs.len(), 1);
    assert!(jobs[0].is_for(1, Direction::Provision));
    assert!(jobs[0].is_active());

    let owner = world.owner("alpha").unwrap();
    assert!(!owner.is_satisfied());
    similar_asserts::assert_eq!(owner.metadata.finalizers, vec![FINALIZER.to_string()]);
    similar_asserts::assert_eq!(world.generator.calls().len(), 1);

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn successful_job_marks_cluster_provisioned() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(2);

    world
        .finish_job(1, Direction::Provision, JobState::Succeeded, None)
        .await;
    world
        .eventually(|| world.owner("alpha").is_some_and(|c| c.is_satisfied()))
        .await;

    let owner = world.owner("alpha").unwrap();
    similar_asserts::assert_eq!(owner.status.provisioned_generation, 1);
    assert!(owner.status.provisioned);
    similar_asserts::assert_eq!(
        condition(&owner, ClusterConditionType::Provisioned),
        Some(ConditionStatus::True)
    );
    // No failure was ever recorded, so there is nothing to clear
    similar_asserts::assert_eq!(
        condition(&owner, ClusterConditionType::ProvisioningFailed),
        None
    );

    // The finished job is cleaned up once the outcome is recorded
    world.eventually(|| world.jobs().is_empty()).await;
    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn clusters_are_provisioned_independently() {
    let mut world = World::new();
    for name in ["alpha", "beta", "gamma"] {
        world.apply(name, cluster_spec());
    }
    world.start(3);

    world.eventually(|| world.jobs().len() == 3).await;
    world.settle().await;

    let mut owners: Vec<_> = world
        .jobs()
        .iter()
        .map(|j| j.metadata.controller_ref().unwrap().name.clone())
        .collect();
    owners.sort();
    similar_asserts::assert_eq!(owners, ["alpha", "beta", "gamma"].map(String::from).to_vec());

    world
        .finish_job(1, Direction::Provision, JobState::Succeeded, None)
        .await;
    world.eventually(|| world.jobs().len() == 2).await;

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn finished_job_is_recorded_after_restart() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(1);
    world.eventually(|| world.jobs().len() == 1).await;
    world.settle().await;
    world.stop().await;

    // The job completes while no controller is running
    world
        .finish_job(1, Direction::Provision, JobState::Succeeded, None)
        .await;
    world.restart(1).await;

    world
        .eventually(|| world.owner("alpha").is_some_and(|c| c.is_satisfied()))
        .await;
    assert!(world.owner("alpha").unwrap().status.provisioned);
    similar_asserts::assert_eq!(world.generator.calls().len(), 1);

    world.stop().await;
}
