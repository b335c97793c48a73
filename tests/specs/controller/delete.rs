//! Deleting a cluster runs the deprovision playbooks before it goes away.

use crate::prelude::*;

async fn provisioned(world: &mut World, name: &str) {
    world.apply(name, cluster_spec());
    world.start(2);
    world
        .finish_job(1, Direction::Provision, JobState::Succeeded, None)
        .await;
    world
        .eventually(|| world.owner(name).is_some_and(|c| c.is_satisfied()))
        .await;
}

#[tokio::test(start_paused = true)]
async fn delete_deprovisions_then_releases_cluster() {
    let mut world = World::new();
    provisioned(&mut world, "alpha").await;

    world.store.delete_owner(&key("ns/alpha")).unwrap();
    world
        .eventually(|| {
            world.owner("alpha").is_some_and(|c| {
                condition(&c, ClusterConditionType::Deprovisioning) == Some(ConditionStatus::True)
            })
        })
        .await;
    let owner = world.owner("alpha").unwrap();
    assert!(owner.is_deleting());
    similar_asserts::assert_eq!(owner.metadata.finalizers, vec![FINALIZER.to_string()]);

    world
        .finish_job(2, Direction::Deprovision, JobState::Succeeded, None)
        .await;
    world.eventually(|| world.owner("alpha").is_none()).await;
    world.eventually(|| world.jobs().is_empty()).await;
    assert!(world.reporter.reports().is_empty());

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn delete_during_provisioning_replaces_job() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(2);
    world
        .eventually(|| world.jobs().iter().any(|j| j.is_for(1, Direction::Provision)))
        .await;

    world.store.delete_owner(&key("ns/alpha")).unwrap();
    world
        .eventually(|| {
            let jobs = world.jobs();
            jobs.len() == 1 && jobs[0].is_for(2, Direction::Deprovision)
        })
        .await;

    world
        .finish_job(2, Direction::Deprovision, JobState::Succeeded, None)
        .await;
    world.eventually(|| world.owner("alpha").is_none()).await;

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn failed_deprovision_keeps_cluster() {
    let mut world = World::new();
    provisioned(&mut world, "alpha").await;

    world.store.delete_owner(&key("ns/alpha")).unwrap();
    world
        .finish_job(
            2,
            Direction::Deprovision,
            JobState::Failed,
            Some("teardown timed out"),
        )
        .await;
    world
        .eventually(|| world.owner("alpha").is_some_and(|c| c.is_satisfied()))
        .await;
    world.settle().await;

    let owner = world.owner("alpha").unwrap();
    similar_asserts::assert_eq!(owner.metadata.finalizers, vec![FINALIZER.to_string()]);
    let failed = owner
        .status
        .conditions
        .get(ClusterConditionType::DeprovisioningFailed)
        .unwrap();
    similar_asserts::assert_eq!(failed.status, ConditionStatus::True);
    similar_asserts::assert_eq!(failed.message, "teardown timed out");
    // Infrastructure may still exist
    assert!(owner.status.provisioned);

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn delete_without_deprovision_releases_immediately() {
    let mut world = World::with_config(ControllerConfig {
        deprovision_on_delete: false,
        ..ControllerConfig::default()
    });
    provisioned(&mut world, "alpha").await;
    let calls = world.generator.calls().len();

    world.store.delete_owner(&key("ns/alpha")).unwrap();
    world.eventually(|| world.owner("alpha").is_none()).await;
    world.settle().await;

    similar_asserts::assert_eq!(world.generator.calls().len(), calls);
    assert!(world.jobs().iter().all(|j| j.is_for(1, Direction::Provision)));

    world.stop().await;
}
