// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller: watch dispatch plus a fixed pool of sync workers.
//!
//! Watch events only enqueue owner keys. Workers pop keys, run job sync and
//! apply the retry policy; a key is never synced by two workers at once.

use crate::config::ControllerConfig;
use crate::error::SyncError;
use crate::infra::InfraStrategy;
use crate::job_control::JobControl;
use crate::job_sync::{JobSync, SyncHandler};
use crate::ownership::OwnershipIndex;
use crate::queue::ReconcileQueue;
use crate::rate_limiter::default_controller_rate_limiter;
use crate::report::ErrorReporter;
use infra_adapters::{JobStore, OwnerStore, PayloadGenerator};
use infra_core::{Clock, Cluster, OwnerKey, Resource, WatchEvent};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// External collaborators of a controller
pub struct ControllerDeps<O, J, C> {
    pub owners: O,
    pub jobs: J,
    pub generator: Arc<dyn PayloadGenerator>,
    pub clock: C,
    pub reporter: Arc<dyn ErrorReporter>,
}

#[derive(Clone)]
pub struct Controller<O: OwnerStore, J: JobStore, C: Clock> {
    owners: O,
    jobs: J,
    queue: ReconcileQueue<OwnerKey>,
    control: Arc<JobControl<J, C>>,
    handler: Arc<dyn SyncHandler>,
    reporter: Arc<dyn ErrorReporter>,
    max_retries: u32,
}

impl<O: OwnerStore, J: JobStore, C: Clock> Controller<O, J, C> {
    pub fn new(deps: ControllerDeps<O, J, C>, config: &ControllerConfig) -> Self {
        let queue = ReconcileQueue::new(default_controller_rate_limiter(
            config,
            deps.clock.clone(),
        ));
        let index = OwnershipIndex::new(
            &config.controller_name,
            &config.owner_kind,
            config.expectations_ttl(),
            deps.clock.clone(),
        );
        let control = Arc::new(JobControl::new(
            deps.jobs.clone(),
            index,
            Arc::new(queue.clone()),
            Arc::clone(&deps.reporter),
            &config.controller_name,
        ));
        let strategy = InfraStrategy::new(
            deps.owners.clone(),
            deps.generator,
            deps.clock,
            config.finalizer(),
        );
        let handler = Arc::new(JobSync::new(
            Arc::clone(&control),
            Arc::new(strategy),
            config.deprovision_on_delete,
        ));
        Self {
            owners: deps.owners,
            jobs: deps.jobs,
            queue,
            control,
            handler,
            reporter: deps.reporter,
            max_retries: config.max_retries,
        }
    }

    /// Replace the sync handler (the job sync state machine by default)
    pub fn with_sync_handler(mut self, handler: Arc<dyn SyncHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn queue(&self) -> &ReconcileQueue<OwnerKey> {
        &self.queue
    }

    pub fn job_control(&self) -> &JobControl<J, C> {
        &self.control
    }

    /// Run until `stop` turns true (or its sender is dropped).
    ///
    /// Workers start only once both watches delivered their initial listing.
    /// On stop the queue is shut down and every worker finishes the key it
    /// holds and drains what is already queued before this returns.
    pub async fn run(&self, workers: usize, mut stop: watch::Receiver<bool>) {
        tracing::info!(workers, "starting infra controller");
        let mut owner_events = self.owners.watch();
        let mut job_events = self.jobs.watch();

        let mut owners_synced = false;
        let mut jobs_synced = false;
        while !(owners_synced && jobs_synced) {
            if *stop.borrow() {
                self.queue.shut_down();
                tracing::info!("stopped before caches synced");
                return;
            }
            tokio::select! {
                event = owner_events.recv(), if !owners_synced => match event {
                    Some(WatchEvent::Synced) => owners_synced = true,
                    Some(event) => self.dispatch_owner_event(event),
                    None => {
                        tracing::warn!("owner watch closed before sync");
                        owners_synced = true;
                    }
                },
                event = job_events.recv(), if !jobs_synced => match event {
                    Some(WatchEvent::Synced) => jobs_synced = true,
                    Some(event) => self.control.handle_event(event),
                    None => {
                        tracing::warn!("job watch closed before sync");
                        jobs_synced = true;
                    }
                },
                changed = stop.changed() => {
                    if changed.is_err() {
                        self.queue.shut_down();
                        return;
                    }
                }
            }
        }
        tracing::info!("caches synced");

        let dispatch = {
            let controller = self.clone();
            tokio::spawn(async move {
                controller.dispatch(owner_events, job_events).await;
            })
        };

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let controller = self.clone();
            handles.push(tokio::spawn(
                async move { while controller.process_next_work_item().await {} }
                    .instrument(tracing::info_span!("worker", id = worker)),
            ));
        }

        while !*stop.borrow() {
            if stop.changed().await.is_err() {
                break;
            }
        }

        tracing::info!("shutting down infra controller");
        self.queue.shut_down();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "worker task failed");
            }
        }
        dispatch.abort();
    }

    async fn dispatch(
        &self,
        mut owner_events: infra_adapters::WatchStream<Cluster>,
        mut job_events: infra_adapters::WatchStream<infra_core::JobRecord>,
    ) {
        let mut owners_open = true;
        let mut jobs_open = true;
        while owners_open || jobs_open {
            tokio::select! {
                event = owner_events.recv(), if owners_open => match event {
                    Some(event) => self.dispatch_owner_event(event),
                    None => owners_open = false,
                },
                event = job_events.recv(), if jobs_open => match event {
                    Some(event) => self.control.handle_event(event),
                    None => jobs_open = false,
                },
            }
        }
        tracing::debug!("watch streams closed");
    }

    /// Enqueue the owner an event is about
    pub fn dispatch_owner_event(&self, event: WatchEvent<Cluster>) {
        let owner = match event {
            WatchEvent::Added(owner) => owner,
            WatchEvent::Updated { old, new } => {
                if old.metadata.resource_version == new.metadata.resource_version {
                    return;
                }
                new
            }
            WatchEvent::Deleted(deleted) => match deleted.into_object() {
                Ok(owner) => owner,
                Err(key) => {
                    self.reporter.report(
                        "owner watch",
                        &SyncError::Structural(format!(
                            "tombstone for owner {} carries no object",
                            key
                        )),
                    );
                    return;
                }
            },
            WatchEvent::Synced => return,
        };
        match owner.key() {
            Ok(key) => self.queue.add(key),
            Err(e) => self.reporter.report("owner watch", &e.into()),
        }
    }

    /// Pop one key and sync it. Returns false once the queue is shut down
    /// and drained.
    pub async fn process_next_work_item(&self) -> bool {
        let Some(key) = self.queue.get().await else {
            return false;
        };
        let span = tracing::info_span!("sync", owner = %key);
        let result = self.handler.sync(&key).instrument(span).await;
        self.handle_err(&key, result);
        self.queue.done(&key);
        true
    }

    fn handle_err(&self, key: &OwnerKey, result: Result<(), SyncError>) {
        let err = match result {
            Ok(()) => {
                self.queue.forget(key);
                return;
            }
            Err(err) => err,
        };
        if !err.is_retryable() {
            if err.is_structural() {
                self.reporter
                    .report(&format!("dropping owner {} out of the queue", key), &err);
            } else {
                tracing::debug!(owner = %key, error = %err, "dropping owner, error is not retryable");
            }
            self.queue.forget(key);
            return;
        }
        let requeues = self.queue.num_requeues(key);
        if requeues < self.max_retries {
            tracing::warn!(owner = %key, error = %err, requeues, "error syncing owner, requeueing");
            self.queue.add_rate_limited(key.clone());
            return;
        }
        self.reporter
            .report(&format!("dropping owner {} out of the queue", key), &err);
        self.queue.forget(key);
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
