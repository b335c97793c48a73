// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake payload generator for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{GenerateError, PayloadGenerator, PlaybookParams};
use infra_core::{AuxConfig, ClusterSpec, Direction, JobSpec};
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded generate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateCall {
    pub direction: Direction,
    pub params: PlaybookParams,
}

#[derive(Default)]
struct FakeGeneratorState {
    calls: Vec<GenerateCall>,
    fail_with: Option<GenerateError>,
}

/// Fake generator: records calls and returns a trivial payload
#[derive(Clone, Default)]
pub struct FakePayloadGenerator {
    inner: Arc<Mutex<FakeGeneratorState>>,
}

impl FakePayloadGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<GenerateCall> {
        self.inner.lock().calls.clone()
    }

    /// Make every following call fail with `err` (None to recover)
    pub fn set_error(&self, err: Option<GenerateError>) {
        self.inner.lock().fail_with = err;
    }
}

impl PayloadGenerator for FakePayloadGenerator {
    fn generate(
        &self,
        _config: &ClusterSpec,
        direction: Direction,
        params: &PlaybookParams,
    ) -> Result<(JobSpec, AuxConfig), GenerateError> {
        let mut inner = self.inner.lock();
        inner.calls.push(GenerateCall {
            direction,
            params: params.clone(),
        });
        if let Some(err) = &inner.fail_with {
            return Err(err.clone());
        }
        let spec = JobSpec {
            image: "fake".to_string(),
            command: vec!["true".to_string()],
            args: params.playbooks.clone(),
            env: Default::default(),
        };
        let aux = AuxConfig::from([("direction".to_string(), direction.to_string())]);
        Ok((spec, aux))
    }
}
