// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sink for errors nothing else will handle

use crate::error::SyncError;

/// Receives errors that were dropped: retries exhausted, or malformed
/// notifications that no retry can fix.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, context: &str, err: &SyncError);
}

/// Reports to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, context: &str, err: &SyncError) {
        tracing::error!(context, error = %err, "unhandled error");
    }
}

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use super::ErrorReporter;
    use crate::error::SyncError;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Reporter that keeps every report for assertions
    #[derive(Clone, Default)]
    pub struct RecordingReporter {
        reports: Arc<Mutex<Vec<(String, SyncError)>>>,
    }

    impl RecordingReporter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reports(&self) -> Vec<(String, SyncError)> {
            self.reports.lock().clone()
        }
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&self, context: &str, err: &SyncError) {
            self.reports.lock().push((context.to_string(), err.clone()));
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingReporter;
