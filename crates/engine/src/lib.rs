// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! infra-engine: reconcile queue, job control and the job sync state machine

pub mod config;
pub mod controller;
mod error;
pub mod infra;
pub mod job_control;
pub mod job_sync;
pub mod ownership;
pub mod queue;
pub mod rate_limiter;
pub mod report;
pub mod strategy;

pub use config::ControllerConfig;
pub use controller::{Controller, ControllerDeps};
pub use error::SyncError;
pub use infra::InfraStrategy;
pub use job_control::{JobControl, JobControlResult, OwnerEvents};
pub use job_sync::{JobSync, SyncHandler};
pub use ownership::{IndexError, OwnershipIndex};
pub use queue::ReconcileQueue;
pub use rate_limiter::{
    default_controller_rate_limiter, BucketRateLimiter, ExponentialFailureRateLimiter,
    MaxOfRateLimiter, RateLimiter,
};
pub use report::{ErrorReporter, LogReporter};
pub use strategy::{JobFactory, SyncStrategy};

#[cfg(any(test, feature = "test-support"))]
pub use report::RecordingReporter;
