//! Spec changes supersede in-flight jobs.

use crate::prelude::*;

fn resized(replicas: u32) -> ClusterSpec {
    let mut spec = cluster_spec();
    spec.machine_sets[1].replicas = replicas;
    spec
}

#[tokio::test(start_paused = true)]
async fn spec_change_replaces_running_job() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(2);
    world
        .eventually(|| world.jobs().iter().any(|j| j.is_for(1, Direction::Provision)))
        .await;

    let updated = world.apply("alpha", resized(5));
    similar_asserts::assert_eq!(updated.metadata.generation, 2);

    world
        .eventually(|| {
            let jobs = world.jobs();
            jobs.len() == 1 && jobs[0].is_for(2, Direction::Provision)
        })
        .await;
    world.settle().await;
    similar_asserts::assert_eq!(world.jobs().len(), 1);

    world
        .finish_job(2, Direction::Provision, JobState::Succeeded, None)
        .await;
    world
        .eventually(|| world.owner("alpha").is_some_and(|c| c.is_satisfied()))
        .await;
    similar_asserts::assert_eq!(world.owner("alpha").unwrap().status.provisioned_generation, 2);

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn spec_change_after_success_runs_again() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(2);
    world
        .finish_job(1, Direction::Provision, JobState::Succeeded, None)
        .await;
    world
        .eventually(|| world.owner("alpha").is_some_and(|c| c.is_satisfied()))
        .await;
    world.eventually(|| world.jobs().is_empty()).await;

    world.apply("alpha", resized(4));
    world
        .eventually(|| world.jobs().iter().any(|j| j.is_for(2, Direction::Provision)))
        .await;

    let calls = world.generator.calls();
    similar_asserts::assert_eq!(calls.len(), 2);
    similar_asserts::assert_eq!(calls[1].params.infra_size, 5);

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn unchanged_apply_does_not_restart_job() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(1);
    world.eventually(|| world.jobs().len() == 1).await;
    let first = world.jobs()[0].metadata.uid.clone();

    let same = world.apply("alpha", cluster_spec());
    similar_asserts::assert_eq!(same.metadata.generation, 1);
    world.settle().await;

    let jobs = world.jobs();
    similar_asserts::assert_eq!(jobs.len(), 1);
    similar_asserts::assert_eq!(jobs[0].metadata.uid, first);

    world.stop().await;
}
