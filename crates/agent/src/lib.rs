// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gantry-agent: the long-running agent process
//!
//! Polls the coordinator for jobs on behalf of each configured runner,
//! admits them through the [`gantry_engine::AdmissionGate`], and drives one
//! [`gantry_engine::Build`] task per admitted job.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod coordinator;
pub mod debug_server;
pub mod poll;

pub use config::{AgentConfig, ConfigError};
pub use coordinator::{Coordinator, CoordinatorError, HttpCoordinator, JobState};
pub use poll::Agent;

#[cfg(any(test, feature = "test-support"))]
pub use coordinator::FakeCoordinator;
