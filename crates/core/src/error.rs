// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure taxonomy for job runs.
//!
//! Every terminal error of a run is exactly one [`BuildError`], and every
//! `BuildError` maps to exactly one [`Disposition`]. The disposition picks
//! the failure-path branch in the stage state machine and decides whether a
//! failure may be retried.

use crate::stage::Stage;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure reason reported to the coordinator alongside a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    ScriptFailure,
    RunnerSystemFailure,
    JobCanceled,
    ConfigurationError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ScriptFailure => write!(f, "script_failure"),
            FailureReason::RunnerSystemFailure => write!(f, "runner_system_failure"),
            FailureReason::JobCanceled => write!(f, "job_canceled"),
            FailureReason::ConfigurationError => write!(f, "configuration_error"),
        }
    }
}

/// What a failure means for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Script/config fault attributable to the job; never retried at the
    /// executor-creation level.
    JobFailure,
    /// Infrastructure fault; retried where policy allows.
    SystemFailure,
    /// Operator interrupt; terminates promptly, no further retries.
    Abort,
    /// Upstream cancellation or expired timeout; reported as a job failure.
    Cancel,
}

/// Terminal error of one job run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The job's own script or declared configuration failed.
    #[error("{message}")]
    JobFailure {
        message: String,
        exit_code: Option<i32>,
    },
    /// A runner/backend fault, distinguishable from a script failure.
    #[error("job failed (system failure): {0}")]
    SystemFailure(String),
    /// Operator-initiated interrupt delivered while the run was in flight.
    #[error("aborted: interrupt")]
    Aborted,
    /// Upstream cancellation (trace sink callback or job timeout).
    #[error("canceled")]
    Canceled,
    /// Invalid job/runner configuration, e.g. an attempt count out of range.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BuildError {
    /// Job failure for a script that exited non-zero.
    pub fn script_failure(exit_code: i32) -> Self {
        BuildError::JobFailure {
            message: format!("script exited with code {exit_code}"),
            exit_code: Some(exit_code),
        }
    }

    pub fn system<S: Into<String>>(message: S) -> Self {
        BuildError::SystemFailure(message.into())
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            BuildError::JobFailure { .. } | BuildError::Configuration(_) => Disposition::JobFailure,
            BuildError::SystemFailure(_) => Disposition::SystemFailure,
            BuildError::Aborted => Disposition::Abort,
            BuildError::Canceled => Disposition::Cancel,
        }
    }

    pub fn failure_reason(&self) -> FailureReason {
        match self {
            BuildError::JobFailure { .. } => FailureReason::ScriptFailure,
            BuildError::SystemFailure(_) | BuildError::Aborted => {
                FailureReason::RunnerSystemFailure
            }
            BuildError::Canceled => FailureReason::JobCanceled,
            BuildError::Configuration(_) => FailureReason::ConfigurationError,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::JobFailure { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Whether the preparation retry loop may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self.disposition(), Disposition::SystemFailure)
    }
}

/// Outcome of one job run: the stage at which it was determined, and the
/// terminal error if any.
#[derive(Debug)]
pub struct RunResult {
    pub stage: Stage,
    pub error: Option<BuildError>,
}

impl RunResult {
    pub fn success(stage: Stage) -> Self {
        RunResult { stage, error: None }
    }

    pub fn failed(stage: Stage, error: BuildError) -> Self {
        RunResult {
            stage,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.error.as_ref().map(BuildError::failure_reason)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
