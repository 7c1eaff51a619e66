// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gantry-core: domain types for the gantry CI agent
//!
//! Jobs, runner identities, the stage taxonomy, the failure taxonomy, job
//! variables, and the trace-sink contract. Everything here is passive data
//! or a seam trait; the control flow lives in `gantry-engine`.

pub mod error;
pub mod job;
pub mod runner;
pub mod stage;
pub mod trace;
pub mod variables;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{BuildError, Disposition, FailureReason, RunResult};
pub use job::{GitInfo, Job, Step, StepName};
pub use runner::{RunnerIdentity, RunnerSettings};
pub use stage::Stage;
pub use trace::{mask, JobTrace, StdoutTrace, MASK_TOKEN};
pub use variables::{JobVariable, VariableSet};

#[cfg(any(test, feature = "test-support"))]
pub use test_support::JobBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use trace::{FakeTrace, TraceResult};
