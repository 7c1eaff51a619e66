// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gantry-executors: backend capability contract and drivers
//!
//! An [`Executor`] performs the actual work of each build stage; an
//! [`ExecutorProvider`] is the per-backend factory the engine resolves
//! through an explicitly-constructed [`ExecutorRegistry`]. The only backend
//! in scope is the local shell; container/cluster/ssh drivers implement the
//! same contract out of tree.

mod contract;
pub mod registry;
pub mod shell;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecutorCall, FakeExecutorControl, FakeExecutorProvider};

pub use contract::{
    Executor, ExecutorCommand, ExecutorError, ExecutorProvider, FeaturesInfo, PrepareOptions,
    ShellInfo,
};
pub use registry::ExecutorRegistry;
pub use shell::ShellExecutorProvider;
