// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local job runner.
//!
//! Watches the in-memory store for newly created jobs, runs each one as a
//! subprocess and records the terminal state back into the store. Deleting a
//! job from the store kills its subprocess. Config
//! entries are written as files into a per-job directory exposed through
//! `INFRA_CONFIG_DIR`.

use crate::store::{JobStore, MemoryStore, StoreError};
use crate::subprocess::{run_with_timeout, tail};
use infra_core::{Clock, Deleted, IdGen, JobRecord, JobState, ObjectKey, Resource, WatchEvent};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::Instrument;

/// Lines of stderr kept in a failed job's message
const FAILURE_TAIL_LINES: usize = 20;

pub struct ProcessRunner<C: Clock, G: IdGen> {
    store: MemoryStore<C, G>,
    work_dir: PathBuf,
    timeout: Duration,
}

impl<C: Clock, G: IdGen> ProcessRunner<C, G> {
    pub fn new(store: MemoryStore<C, G>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            work_dir: work_dir.into(),
            timeout: crate::env::job_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run jobs until `stop` flips to true. Jobs already running are left to
    /// finish on their own tasks.
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        let mut events = JobStore::watch(&self.store);
        let mut running: HashMap<ObjectKey, AbortHandle> = HashMap::new();
        tracing::info!(work_dir = %self.work_dir.display(), "job runner started");
        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                event = events.recv() => match event {
                    Some(WatchEvent::Added(job)) if job.is_active() => {
                        running.retain(|_, handle| !handle.is_finished());
                        let Ok(key) = job.key() else {
                            tracing::warn!(job = %job.metadata.name, "skipping job with malformed key");
                            continue;
                        };
                        let span = tracing::info_span!(
                            "job.run",
                            namespace = %job.metadata.namespace,
                            job = %job.metadata.name,
                        );
                        let work = execute(self.store.clone(), self.work_dir.clone(), self.timeout, job);
                        let handle = tokio::spawn(work.instrument(span));
                        running.insert(key, handle.abort_handle());
                    }
                    Some(WatchEvent::Deleted(deleted)) => {
                        if let Some(key) = deleted_key(deleted) {
                            if let Some(handle) = running.remove(&key) {
                                if !handle.is_finished() {
                                    tracing::info!(job = %key, "job deleted, killing its command");
                                }
                                handle.abort();
                            }
                        }
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }
        tracing::info!("job runner stopped");
    }
}

fn deleted_key(deleted: Deleted<JobRecord>) -> Option<ObjectKey> {
    match deleted.into_object() {
        Ok(job) => job.key().ok(),
        Err(key) => ObjectKey::parse(&key).ok(),
    }
}

async fn execute<C: Clock, G: IdGen>(
    store: MemoryStore<C, G>,
    work_dir: PathBuf,
    timeout: Duration,
    job: JobRecord,
) {
    let namespace = job.metadata.namespace.clone();
    let name = job.metadata.name.clone();

    let (state, message) = match run_job(&work_dir, timeout, &job).await {
        Ok(()) => (JobState::Succeeded, None),
        Err(message) => (JobState::Failed, Some(message)),
    };
    tracing::info!(job = %name, %state, "job finished");

    match store.set_job_outcome(&namespace, &name, state, message) {
        Ok(_) => {}
        Err(StoreError::NotFound { .. }) => {
            tracing::debug!(job = %name, "job removed before completion was recorded")
        }
        Err(e) => tracing::error!(job = %name, error = %e, "failed to record job outcome"),
    }
}

async fn run_job(work_dir: &Path, timeout: Duration, job: &JobRecord) -> Result<(), String> {
    let (program, rest) = job
        .spec
        .command
        .split_first()
        .ok_or_else(|| "job has no command".to_string())?;

    let config_dir = work_dir
        .join(&job.metadata.namespace)
        .join(&job.metadata.name);
    tokio::fs::create_dir_all(&config_dir)
        .await
        .map_err(|e| format!("create {}: {}", config_dir.display(), e))?;
    for (file, contents) in &job.config {
        if file.contains('/') || file.starts_with('.') {
            return Err(format!("invalid config entry name {:?}", file));
        }
        let path = config_dir.join(file);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| format!("write {}: {}", path.display(), e))?;
    }

    tracing::debug!(image = %job.spec.image, %program, "running job command locally");
    let mut cmd = Command::new(program);
    cmd.args(rest)
        .args(&job.spec.args)
        .envs(&job.spec.env)
        .env("INFRA_CONFIG_DIR", &config_dir)
        .current_dir(&config_dir);

    let output = run_with_timeout(cmd, timeout, &format!("job {}", job.metadata.name)).await?;
    if output.status.success() {
        return Ok(());
    }
    let code = output
        .status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let stderr = tail(&output.stderr, FAILURE_TAIL_LINES);
    if stderr.is_empty() {
        Err(format!("exit {}", code))
    } else {
        Err(format!("exit {}: {}", code, stderr))
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
