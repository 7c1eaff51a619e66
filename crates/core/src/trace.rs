// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trace sink contract.
//!
//! The log/status transport is external; the engine only ever talks to a
//! [`JobTrace`]. The engine calls `set_masked` with the effective variable
//! set's secrets before the first stage, and exactly one of `success`/`fail`
//! at run completion. The sink invokes the registered cancel function when
//! the coordinator signals upstream cancellation.

use crate::error::{BuildError, FailureReason};
use parking_lot::Mutex;
use std::io::Write as _;

/// Replacement token for masked values in trace output.
pub const MASK_TOKEN: &str = "[MASKED]";

/// Cancel callback registered by the engine on its trace sink.
pub type CancelFn = Box<dyn Fn() + Send + Sync>;

/// Sink for one job's log output and terminal status.
pub trait JobTrace: Send + Sync {
    fn write(&self, data: &[u8]);
    fn set_masked(&self, values: Vec<String>);
    fn success(&self);
    fn fail(&self, error: &BuildError, reason: FailureReason);
    fn set_cancel_fn(&self, cancel: CancelFn);
    fn is_stdout(&self) -> bool;
}

/// Replace every occurrence of each secret with [`MASK_TOKEN`].
///
/// Longer secrets are replaced first so a secret that contains another
/// secret as a substring masks as one token.
pub fn mask(input: &str, secrets: &[String]) -> String {
    let mut ordered: Vec<&str> = secrets
        .iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect();
    ordered.sort_by_key(|s| std::cmp::Reverse(s.len()));

    let mut out = input.to_string();
    for secret in ordered {
        out = out.replace(secret, MASK_TOKEN);
    }
    out
}

/// Trace sink writing masked output to the agent's stdout.
///
/// Used when the agent runs in the foreground; the coordinator-backed
/// transport implements the same trait outside this crate.
#[derive(Default)]
pub struct StdoutTrace {
    masked: Mutex<Vec<String>>,
}

impl StdoutTrace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobTrace for StdoutTrace {
    fn write(&self, data: &[u8]) {
        let text = String::from_utf8_lossy(data);
        let masked = mask(&text, &self.masked.lock());
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(masked.as_bytes());
        let _ = stdout.flush();
    }

    fn set_masked(&self, values: Vec<String>) {
        *self.masked.lock() = values;
    }

    fn success(&self) {
        self.write(b"Job succeeded\n");
    }

    fn fail(&self, error: &BuildError, reason: FailureReason) {
        self.write(format!("ERROR: Job failed ({reason}): {error}\n").as_bytes());
    }

    fn set_cancel_fn(&self, _cancel: CancelFn) {
        // Stdout has no upstream cancellation source
    }

    fn is_stdout(&self) -> bool {
        true
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTrace, TraceResult};

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{mask, BuildError, CancelFn, FailureReason, JobTrace, Mutex};
    use std::sync::Arc;

    /// Terminal state recorded by [`FakeTrace`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum TraceResult {
        Success,
        Failed(FailureReason),
    }

    #[derive(Default)]
    struct FakeTraceState {
        output: String,
        masked: Vec<String>,
        result: Option<TraceResult>,
        last_error: Option<String>,
        cancel: Option<CancelFn>,
    }

    /// Recording trace sink for tests.
    ///
    /// Applies the same masking as the production sink so masking can be
    /// asserted at the engine's output edge.
    #[derive(Clone, Default)]
    pub struct FakeTrace {
        inner: Arc<Mutex<FakeTraceState>>,
    }

    impl FakeTrace {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn output(&self) -> String {
            self.inner.lock().output.clone()
        }

        pub fn result(&self) -> Option<TraceResult> {
            self.inner.lock().result.clone()
        }

        /// Message of the error passed to `fail`, if any.
        pub fn last_error(&self) -> Option<String> {
            self.inner.lock().last_error.clone()
        }

        pub fn masked(&self) -> Vec<String> {
            self.inner.lock().masked.clone()
        }

        /// Simulate the coordinator cancelling the job upstream.
        ///
        /// Returns false if the engine has not registered a cancel function.
        pub fn trigger_cancel(&self) -> bool {
            let cancel = self.inner.lock().cancel.take();
            match cancel {
                Some(cancel) => {
                    cancel();
                    true
                }
                None => false,
            }
        }
    }

    impl JobTrace for FakeTrace {
        fn write(&self, data: &[u8]) {
            let mut state = self.inner.lock();
            let text = String::from_utf8_lossy(data).to_string();
            let masked = mask(&text, &state.masked);
            state.output.push_str(&masked);
        }

        fn set_masked(&self, values: Vec<String>) {
            self.inner.lock().masked = values;
        }

        fn success(&self) {
            self.inner.lock().result = Some(TraceResult::Success);
        }

        fn fail(&self, error: &BuildError, reason: FailureReason) {
            let mut state = self.inner.lock();
            state.result = Some(TraceResult::Failed(reason));
            state.last_error = Some(error.to_string());
        }

        fn set_cancel_fn(&self, cancel: CancelFn) {
            self.inner.lock().cancel = Some(cancel);
        }

        fn is_stdout(&self) -> bool {
            false
        }
    }
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
