// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Infrastructure controller daemon library
//!
//! Settings, startup and the run loop used by the `infrad` binary.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;

pub use lifecycle::{
    startup, ClusterSeed, Config, Daemon, DaemonController, LifecycleError, Settings,
    DEFAULT_WORKERS,
};
