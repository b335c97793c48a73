//! Satisfied clusters cause no writes, however often they are synced.

use crate::prelude::*;

async fn provisioned(world: &mut World) {
    world.apply("alpha", cluster_spec());
    world.start(2);
    world
        .finish_job(1, Direction::Provision, JobState::Succeeded, None)
        .await;
    world
        .eventually(|| world.owner("alpha").is_some_and(|c| c.is_satisfied()))
        .await;
    world.eventually(|| world.jobs().is_empty()).await;
    world.settle().await;
}

#[tokio::test(start_paused = true)]
async fn resyncing_satisfied_cluster_writes_nothing() {
    let mut world = World::new();
    provisioned(&mut world).await;
    let writes = world.store.writes();
    let owner = world.owner("alpha").unwrap();

    for _ in 0..5 {
        world.controller.queue().add(key("ns/alpha"));
        world.settle().await;
    }

    similar_asserts::assert_eq!(world.store.writes(), writes);
    similar_asserts::assert_eq!(world.owner("alpha").unwrap(), owner);
    similar_asserts::assert_eq!(world.generator.calls().len(), 1);

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn restart_over_satisfied_cluster_writes_nothing() {
    let mut world = World::new();
    provisioned(&mut world).await;
    let writes = world.store.writes();

    world.restart(2).await;
    world.settle().await;

    similar_asserts::assert_eq!(world.store.writes(), writes);
    assert!(world.jobs().is_empty());

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn provisioning_writes_happen_once() {
    let mut world = World::new();
    world.apply("alpha", cluster_spec());
    world.start(4);
    world.eventually(|| world.jobs().len() == 1).await;
    world.settle().await;

    similar_asserts::assert_eq!(
        world.store.writes(),
        vec![StoreOp::UpdateMetadata, StoreOp::Create, StoreOp::UpdateStatus]
    );

    world.stop().await;
}
