// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor and provider traits.

use async_trait::async_trait;
use gantry_core::{BuildError, Job, JobTrace, RunnerSettings, Stage, VariableSet};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors from executor operations.
///
/// Implementations classify their own failures: a non-zero script exit or a
/// job configuration fault is a job-level error, everything else is a
/// system-level error the engine may retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("script exited with code {code}")]
    ScriptFailed { code: i32 },
    #[error("configuration: {0}")]
    Configuration(String),
    #[error("{0}")]
    System(String),
    #[error("canceled")]
    Canceled,
}

impl ExecutorError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        ExecutorError::System(message.into())
    }

    /// Job-level errors are attributable to the job/runner configuration and
    /// are never retried at the executor-creation level.
    pub fn is_job_error(&self) -> bool {
        matches!(
            self,
            ExecutorError::ScriptFailed { .. } | ExecutorError::Configuration(_)
        )
    }

    /// Default mapping into the run-level taxonomy.
    ///
    /// `Canceled` maps to the cancel disposition here; the engine substitutes
    /// the abort disposition when the interrupt path fired.
    pub fn into_build_error(self) -> BuildError {
        match self {
            ExecutorError::ScriptFailed { code } => BuildError::script_failure(code),
            ExecutorError::Configuration(message) => BuildError::Configuration(message),
            ExecutorError::System(message) => BuildError::SystemFailure(message),
            ExecutorError::Canceled => BuildError::Canceled,
        }
    }
}

impl From<std::io::Error> for ExecutorError {
    fn from(err: std::io::Error) -> Self {
        ExecutorError::System(err.to_string())
    }
}

/// Everything an executor needs to prepare for one job run.
pub struct PrepareOptions<'a> {
    pub job: &'a Job,
    pub runner: &'a RunnerSettings,
    pub variables: &'a VariableSet,
    pub trace: Arc<dyn JobTrace>,
    pub token: CancellationToken,
}

/// One stage submitted to an executor: the stage name, the generated script,
/// and the run's cancellation token.
#[derive(Debug, Clone)]
pub struct ExecutorCommand {
    pub stage: Stage,
    pub script: String,
    pub token: CancellationToken,
}

/// Shell used by an executor for script generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInfo {
    pub shell: String,
    pub args: Vec<String>,
}

/// Capability flags a backend reports to the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeaturesInfo {
    pub variables: bool,
    pub masking: bool,
    pub artifacts: bool,
    pub cache: bool,
    pub session: bool,
}

/// Backend driver for one job run.
///
/// An instance is owned exclusively by one run: `prepare` once, `run` per
/// stage, then `finish` with the terminal error and exactly one `cleanup`
/// on every exit path.
#[async_trait]
pub trait Executor: Send {
    async fn prepare(&mut self, options: PrepareOptions<'_>) -> Result<(), ExecutorError>;

    async fn run(&mut self, command: ExecutorCommand) -> Result<(), ExecutorError>;

    /// Called exactly once with the run's terminal error (or None on success).
    async fn finish(&mut self, error: Option<&BuildError>);

    /// Release backend resources; must be safe to call after a failed prepare.
    async fn cleanup(&mut self);

    fn shell(&self) -> Option<ShellInfo>;
}

/// Per-backend factory, registered under the backend's name.
pub trait ExecutorProvider: Send + Sync {
    /// Whether this provider can currently create executors (e.g. the
    /// backend's daemon is reachable).
    fn can_create(&self) -> bool;

    fn create(&self) -> Box<dyn Executor>;

    fn default_shell(&self) -> &str;

    fn features(&self, features: &mut FeaturesInfo);
}

#[cfg(test)]
#[path = "contract_tests.rs"]
mod tests;
