// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! infra-core: Resource model shared by the infrastructure controller

pub mod clock;
pub mod cluster;
pub mod condition;
pub mod event;
pub mod id;
pub mod job;
pub mod key;
pub mod meta;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use cluster::{Cluster, ClusterSpec, ClusterStatus, Direction, MachineSet, MachineSetRole};
pub use condition::{
    ClusterConditionType, Condition, ConditionStatus, Conditions, JobSyncCondition, UpdateCheck,
};
pub use event::{Deleted, WatchEvent};
pub use id::{IdGen, SequentialIdGen, Uid, UuidIdGen};
pub use job::{AuxConfig, JobRecord, JobSpec, JobState};
pub use key::{JobKey, KeyError, ObjectKey, OwnerKey};
pub use meta::{ObjectMeta, OwnerReference, Resource};
