//! Failing syncs are retried with backoff, then reported and dropped.

use crate::prelude::*;

#[tokio::test(start_paused = true)]
async fn persistent_build_failure_is_retried_then_reported() {
    let mut world = World::new();
    world
        .generator
        .set_error(Some(GenerateError::Failed("template missing".into())));
    world.apply("alpha", cluster_spec());
    world.start(2);

    world.eventually(|| !world.reporter.reports().is_empty()).await;
    world.settle().await;

    // First attempt plus max_retries requeues
    similar_asserts::assert_eq!(world.generator.calls().len(), 16);
    let reports = world.reporter.reports();
    similar_asserts::assert_eq!(reports.len(), 1);
    assert!(reports[0].0.contains("ns/alpha"));
    similar_asserts::assert_eq!(
        reports[0].1,
        SyncError::Build("payload generation failed: template missing".into())
    );
    assert!(world.jobs().is_empty());

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn dropped_cluster_is_picked_up_on_next_change() {
    let mut world = World::new();
    world
        .generator
        .set_error(Some(GenerateError::Failed("template missing".into())));
    world.apply("alpha", cluster_spec());
    world.start(1);
    world.eventually(|| !world.reporter.reports().is_empty()).await;

    world.generator.set_error(None);
    let mut spec = cluster_spec();
    spec.region = "eu-west-1".to_string();
    world.apply("alpha", spec);

    world
        .eventually(|| world.jobs().iter().any(|j| j.is_for(2, Direction::Provision)))
        .await;
    similar_asserts::assert_eq!(world.reporter.reports().len(), 1);

    world.stop().await;
}

#[tokio::test(start_paused = true)]
async fn transient_store_failure_recovers() {
    let mut world = World::new();
    world.store.fail_next(
        StoreOp::Create,
        StoreError::Unavailable("connection reset".into()),
    );
    world.apply("alpha", cluster_spec());
    world.start(1);

    world.eventually(|| world.jobs().len() == 1).await;
    world.settle().await;

    similar_asserts::assert_eq!(world.jobs().len(), 1);
    assert!(world.reporter.reports().is_empty());

    world.stop().await;
}
