// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gantry-engine: job execution engine
//!
//! [`Build`] drives one job from executor creation to terminal status through
//! the fixed stage sequence; [`AdmissionGate`] bounds how many job requests
//! and concurrent executions each runner identity may have in flight.

pub mod admission;
pub mod attempts;
pub mod build;
pub mod cancel;
pub mod script;

pub use admission::{ActiveJob, AdmissionGate, BuildRegistration};
pub use attempts::{stage_attempts, MAX_ATTEMPTS, MIN_ATTEMPTS};
pub use build::{Build, BuildState, BuildStateHandle, PREPARATION_RETRIES, PREPARATION_RETRY_INTERVAL};
pub use cancel::{CancelHandle, CancelKind};
