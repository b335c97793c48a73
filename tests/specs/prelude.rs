//! Test helpers for the behavioral scenarios.
//!
//! Runs a full controller against the in-process store with a fake payload
//! generator. Job outcomes are set by the test, standing in for the runner.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::sync::Arc;
use std::time::Duration;

pub use infra_adapters::{FakePayloadGenerator, GenerateError, MemoryStore, StoreError, StoreOp};
pub use infra_core::test_support::{cluster_spec, key};
pub use infra_core::{
    Cluster, ClusterConditionType, ClusterSpec, ConditionStatus, Direction, FakeClock, JobRecord,
    JobState, SequentialIdGen,
};
pub use infra_engine::{
    Controller, ControllerConfig, ControllerDeps, RecordingReporter, SyncError,
};

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub type Store = MemoryStore<FakeClock, SequentialIdGen>;

// Polling, on tokio's paused clock
pub const POLL_INTERVAL_MS: u64 = 10;
pub const WAIT_MAX_MS: u64 = 600_000;

pub const FINALIZER: &str = "infra.jobs/infra";

pub struct World {
    pub store: Store,
    pub generator: FakePayloadGenerator,
    pub reporter: RecordingReporter,
    pub controller: Controller<Store, Store, FakeClock>,
    clock: FakeClock,
    config: ControllerConfig,
    stop: Option<watch::Sender<bool>>,
    run: Option<JoinHandle<()>>,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        let clock = FakeClock::new();
        let store = MemoryStore::with_parts(clock.clone(), SequentialIdGen::new("uid"));
        let generator = FakePayloadGenerator::new();
        let reporter = RecordingReporter::new();
        let controller = build(&store, &generator, &reporter, &clock, &config);
        Self {
            store,
            generator,
            reporter,
            controller,
            clock,
            config,
            stop: None,
            run: None,
        }
    }

    /// Stop the controller and replace it with a fresh one (empty queue and
    /// ownership index) over the same store, as after a process restart
    pub async fn restart(&mut self, workers: usize) {
        self.stop().await;
        self.controller = build(
            &self.store,
            &self.generator,
            &self.reporter,
            &self.clock,
            &self.config,
        );
        self.start(workers);
    }

    pub fn start(&mut self, workers: usize) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let controller = self.controller.clone();
        self.run = Some(tokio::spawn(async move {
            controller.run(workers, stop_rx).await
        }));
        self.stop = Some(stop_tx);
    }

    pub async fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.send(true).unwrap();
        }
        if let Some(run) = self.run.take() {
            run.await.unwrap();
        }
    }

    pub fn apply(&self, name: &str, spec: ClusterSpec) -> Cluster {
        self.store.apply_owner("ns", name, spec).unwrap()
    }

    pub fn owner(&self, name: &str) -> Option<Cluster> {
        self.store.owner(&key(&format!("ns/{name}")))
    }

    pub fn jobs(&self) -> Vec<JobRecord> {
        self.store.jobs()
    }

    /// Wait for exactly one job matching `generation`/`direction`, then
    /// finish it with `state`
    pub async fn finish_job(
        &self,
        generation: u64,
        direction: Direction,
        state: JobState,
        message: Option<&str>,
    ) -> JobRecord {
        self.eventually(|| {
            self.jobs()
                .iter()
                .any(|j| j.is_for(generation, direction) && j.is_active())
        })
        .await;
        let job = self
            .jobs()
            .into_iter()
            .find(|j| j.is_for(generation, direction))
            .unwrap();
        self.store
            .set_job_outcome(
                &job.metadata.namespace,
                &job.metadata.name,
                state,
                message.map(str::to_string),
            )
            .unwrap()
    }

    /// Poll `check` until it holds
    pub async fn eventually(&self, mut check: impl FnMut() -> bool) {
        let mut waited = 0;
        while waited <= WAIT_MAX_MS {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            waited += POLL_INTERVAL_MS;
        }
        panic!("condition did not hold within {WAIT_MAX_MS}ms");
    }

    /// Let every queued sync run to completion
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}

fn build(
    store: &Store,
    generator: &FakePayloadGenerator,
    reporter: &RecordingReporter,
    clock: &FakeClock,
    config: &ControllerConfig,
) -> Controller<Store, Store, FakeClock> {
    Controller::new(
        ControllerDeps {
            owners: store.clone(),
            jobs: store.clone(),
            generator: Arc::new(generator.clone()),
            clock: clock.clone(),
            reporter: Arc::new(reporter.clone()),
        },
        config,
    )
}

pub fn condition(owner: &Cluster, ty: ClusterConditionType) -> Option<ConditionStatus> {
    owner.status.conditions.get(ty).map(|c| c.status)
}
