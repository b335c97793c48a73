//! Failed jobs are recorded on the cluster and not rerun.

use crate::prelude::*;

#[tokio::test(start_paused = true)]
async fn failed_job_sets_provisioning_failed() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(2);

    world
        .finish_job(
            1,
            Direction::Provision,
            JobState::Failed,
            Some("playbook exited with 2"),
        )
        .await;
    world
        .eventually(|| world.owner("alpha").is_some_and(|c| c.is_satisfied()))
        .await;

    let owner = world.owner("alpha").unwrap();
    assert!(!owner.status.provisioned);
    let failed = owner
        .status
        .conditions
        .get(ClusterConditionType::ProvisioningFailed)
        .unwrap();
    similar_asserts::assert_eq!(failed.status, ConditionStatus::True);
    similar_asserts::assert_eq!(failed.reason, "JobFailed");
    similar_asserts::assert_eq!(failed.message, "playbook exited with 2");
    similar_asserts::assert_eq!(condition(&owner, ClusterConditionType::Provisioned), None);

    world.eventually(|| world.jobs().is_empty()).await;
    world.settle().await;
    // A failed generation is not retried until the spec changes
    assert!(world.jobs().is_empty());
    similar_asserts::assert_eq!(world.generator.calls().len(), 1);

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn failure_without_message_names_the_job() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(1);

    let job = world
        .finish_job(1, Direction::Provision, JobState::Failed, None)
        .await;
    world
        .eventually(|| world.owner("alpha").is_some_and(|c| c.is_satisfied()))
        .await;

    let owner = world.owner("alpha").unwrap();
    let failed = owner
        .status
        .conditions
        .get(ClusterConditionType::ProvisioningFailed)
        .unwrap();
    similar_asserts::assert_eq!(
        failed.message,
        format!("provision job {} failed", job.metadata.name)
    );

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn success_after_failure_clears_failed_condition() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(2);
    world
        .finish_job(1, Direction::Provision, JobState::Failed, Some("boom"))
        .await;
    world
        .eventually(|| world.owner("alpha").is_some_and(|c| c.is_satisfied()))
        .await;

    let mut spec = cluster_spec();
    spec.vars.insert("retry".to_string(), "1".to_string());
    world.apply("alpha", spec);
    world
        .finish_job(2, Direction::Provision, JobState::Succeeded, None)
        .await;
    world
        .eventually(|| {
            world
                .owner("alpha")
                .is_some_and(|c| c.status.provisioned_generation == 2)
        })
        .await;

    let owner = world.owner("alpha").unwrap();
    assert!(owner.status.provisioned);
    similar_asserts::assert_eq!(
        condition(&owner, ClusterConditionType::ProvisioningFailed),
        Some(ConditionStatus::False)
    );

    world.stop().await;
}
