// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the resource store, payload generation and job execution

mod env;
pub mod payload;
pub mod runner;
pub mod store;
pub mod subprocess;
pub mod traced;

pub use payload::{AnsibleGenerator, GenerateError, PayloadGenerator, PlaybookParams};
pub use runner::ProcessRunner;
pub use store::{JobStore, MemoryStore, OwnerStore, StoreError, StoreOp, WatchStream};
pub use traced::{TracedJobStore, TracedOwnerStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use payload::{FakePayloadGenerator, GenerateCall};
