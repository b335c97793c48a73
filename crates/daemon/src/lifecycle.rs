// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, run, shutdown.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use infra_adapters::{
    AnsibleGenerator, MemoryStore, ProcessRunner, StoreError, TracedJobStore, TracedOwnerStore,
};
use infra_core::{ClusterSpec, SystemClock};
use infra_engine::{Controller, ControllerConfig, ControllerDeps, LogReporter};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::env;

/// Default number of sync workers
pub const DEFAULT_WORKERS: usize = 5;

/// Controller as run by the daemon: in-process store behind tracing wrappers
pub type DaemonController =
    Controller<TracedOwnerStore<MemoryStore>, TracedJobStore<MemoryStore>, SystemClock>;

/// Daemon paths
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/infrad)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Settings file (may not exist)
    pub config_path: PathBuf,
    /// Per-job working directories
    pub jobs_path: PathBuf,
}

impl Config {
    /// Load paths for the user-level daemon.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        let mut config = Self::in_dir(state_dir);
        if let Some(path) = env::config_path() {
            config.config_path = path;
        }
        Ok(config)
    }

    /// Paths rooted at `state_dir`
    pub fn in_dir(state_dir: PathBuf) -> Self {
        Self {
            lock_path: state_dir.join("infrad.pid"),
            log_path: state_dir.join("infrad.log"),
            config_path: state_dir.join("config.toml"),
            jobs_path: state_dir.join("jobs"),
            state_dir,
        }
    }
}

/// Cluster created in the store at startup
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClusterSeed {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub name: String,
    pub spec: ClusterSpec,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

/// Contents of the settings file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Image stamped on generated jobs
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default, rename = "cluster")]
    pub clusters: Vec<ClusterSeed>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            image: None,
            controller: ControllerConfig::default(),
            clusters: Vec::new(),
        }
    }
}

impl Settings {
    pub fn parse(text: &str) -> Result<Self, LifecycleError> {
        let settings: Settings = toml::from_str(text)?;
        if settings.workers == 0 {
            return Err(LifecycleError::Invalid("workers must be at least 1".into()));
        }
        Ok(settings)
    }

    /// Read settings from `path`; a missing file gives the defaults.
    /// `INFRAD_WORKERS` overrides the worker count.
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let mut settings = match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(workers) = env::workers() {
            settings.workers = workers;
        }
        Ok(settings)
    }
}

/// Running daemon state
pub struct Daemon {
    pub config: Config,
    pub settings: Settings,
    pub store: MemoryStore,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Invalid settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("Failed to seed cluster: {0}")]
    Seed(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon: take the lock, load settings and seed the store.
pub fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Open without truncating so a running daemon's PID survives a failed attempt
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    std::fs::create_dir_all(&config.jobs_path)?;
    let settings = Settings::load(&config.config_path)?;

    let store = MemoryStore::new();
    for seed in &settings.clusters {
        let cluster = store.apply_owner(&seed.namespace, &seed.name, seed.spec.clone())?;
        info!(cluster = %format!("{}/{}", seed.namespace, seed.name), uid = %cluster.metadata.uid, "seeded cluster");
    }

    Ok(Daemon {
        config: config.clone(),
        settings,
        store,
        lock_file,
    })
}

impl Daemon {
    pub fn controller(&self) -> DaemonController {
        let generator = match &self.settings.image {
            Some(image) => AnsibleGenerator::new(image.clone()),
            None => AnsibleGenerator::default(),
        };
        let deps = ControllerDeps {
            owners: TracedOwnerStore::new(self.store.clone()),
            jobs: TracedJobStore::new(self.store.clone()),
            generator: Arc::new(generator),
            clock: SystemClock,
            reporter: Arc::new(LogReporter),
        };
        Controller::new(deps, &self.settings.controller)
    }

    /// Run the controller and the job runner until `stop` turns true
    pub async fn run(&self, stop: watch::Receiver<bool>) {
        let runner = ProcessRunner::new(self.store.clone(), self.config.jobs_path.clone());
        let runner = tokio::spawn(runner.run(stop.clone()));

        let controller = self.controller();
        controller.run(self.settings.workers, stop).await;

        if let Err(e) = runner.await {
            warn!(error = %e, "job runner task failed");
        }
    }

    /// Remove the PID file; the lock itself is released when the daemon drops
    pub fn shutdown(&self) {
        info!("Shutting down daemon...");
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }
        info!("Daemon shutdown complete");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
