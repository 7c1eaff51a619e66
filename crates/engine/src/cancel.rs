// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation fan-in for one job run.
//!
//! The interrupt signal handler, the job timeout watchdog, and the trace
//! sink's cancel callback all fire the same [`CancelHandle`]; stage
//! invocations observe one token. The first cause to fire decides whether
//! the run ends as aborted or canceled.

use gantry_core::BuildError;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Why a run was stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelKind {
    /// Operator interrupt (signal)
    Abort,
    /// Upstream cancellation or expired job timeout
    Cancel,
}

/// Shared cancellation state of one run.
#[derive(Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
    kind: Arc<Mutex<Option<CancelKind>>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.fire(CancelKind::Abort);
    }

    pub fn cancel(&self) {
        self.fire(CancelKind::Cancel);
    }

    // First cause wins; later fires only re-cancel the token.
    fn fire(&self, kind: CancelKind) {
        let mut current = self.kind.lock();
        if current.is_none() {
            *current = Some(kind);
        }
        drop(current);
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn kind(&self) -> Option<CancelKind> {
        *self.kind.lock()
    }

    /// Terminal error for the recorded cause.
    ///
    /// Defaults to `Canceled` when the token was cancelled without a recorded
    /// cause (e.g. an executor classified its own interruption).
    pub fn terminal_error(&self) -> BuildError {
        match self.kind() {
            Some(CancelKind::Abort) => BuildError::Aborted,
            _ => BuildError::Canceled,
        }
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
