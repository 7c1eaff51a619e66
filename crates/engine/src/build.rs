// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage state machine: runs exactly one job to completion.
//!
//! Owns the executor lifecycle (creation and preparation with bounded
//! retry), the fixed stage sequence with per-stage attempt retry, and the
//! failure-path selection:
//!
//! - a setup stage exhausting its attempts jumps straight to the
//!   upload-on-failure stage;
//! - a failed user script still gets its after_script (best effort) before
//!   upload-on-failure;
//! - the success path runs after_script, archive_cache and
//!   upload-on-success unconditionally.

use crate::attempts::stage_attempts;
use crate::cancel::CancelHandle;
use crate::script::stage_script;
use gantry_core::{
    BuildError, Disposition, Job, JobTrace, RunResult, RunnerSettings, Stage, VariableSet,
};
use gantry_executors::{
    Executor, ExecutorCommand, ExecutorError, ExecutorProvider, ExecutorRegistry, PrepareOptions,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How many times executor creation + preparation is attempted before the
/// last infrastructure error is surfaced.
pub const PREPARATION_RETRIES: u32 = 3;

/// Fixed backoff between preparation attempts.
pub const PREPARATION_RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Observable state of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Preparing,
    Running(Stage),
    Retrying(Stage),
    Finishing,
    Done,
}

/// Shared read handle on a run's state, usable while the run is in flight.
#[derive(Clone, Default)]
pub struct BuildStateHandle {
    inner: Arc<Mutex<Option<BuildState>>>,
}

impl BuildStateHandle {
    pub fn get(&self) -> BuildState {
        self.inner.lock().unwrap_or(BuildState::Idle)
    }

    fn set(&self, state: BuildState) {
        *self.inner.lock() = Some(state);
    }
}

/// One job bound to a runner, an executor registry and a trace sink.
pub struct Build {
    job: Job,
    runner: RunnerSettings,
    registry: Arc<ExecutorRegistry>,
    trace: Arc<dyn JobTrace>,
    variables: VariableSet,
    cancel: CancelHandle,
    state: BuildStateHandle,
    preparation_retries: u32,
    preparation_retry_interval: Duration,
}

impl Build {
    pub fn new(
        job: Job,
        runner: RunnerSettings,
        registry: Arc<ExecutorRegistry>,
        trace: Arc<dyn JobTrace>,
    ) -> Self {
        let variables = VariableSet::new(&runner.environment, &job.variables);
        let state = BuildStateHandle::default();
        state.set(BuildState::Idle);
        Build {
            job,
            runner,
            registry,
            trace,
            variables,
            cancel: CancelHandle::new(),
            state,
            preparation_retries: PREPARATION_RETRIES,
            preparation_retry_interval: PREPARATION_RETRY_INTERVAL,
        }
    }

    /// Override the preparation retry bound and backoff.
    pub fn with_preparation_retry(mut self, retries: u32, interval: Duration) -> Self {
        self.preparation_retries = retries.max(1);
        self.preparation_retry_interval = interval;
        self
    }

    /// Handle for the interrupt signal path and the timeout watchdog.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state_handle(&self) -> BuildStateHandle {
        self.state.clone()
    }

    /// Run the job to completion.
    ///
    /// The terminal error is passed exactly once to the executor's `finish`
    /// and exactly once to the trace sink, and the executor that ran stages
    /// gets exactly one `cleanup` on every exit path.
    pub async fn run(mut self) -> RunResult {
        info!(job = self.job.id, project = %self.job.project, "running job");

        self.trace.set_masked(self.variables.masked_values());
        let cancel = self.cancel.clone();
        self.trace.set_cancel_fn(Box::new(move || cancel.cancel()));

        // Expired job timeout cancels the same token as every other source.
        let watchdog = {
            let cancel = self.cancel.clone();
            let timeout = self.job.timeout();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                cancel.cancel();
            })
        };

        let result = self.execute().await;
        watchdog.abort();
        self.state.set(BuildState::Done);

        match &result.error {
            None => {
                info!(job = self.job.id, "job succeeded");
                self.trace.success();
            }
            Some(err) => {
                warn!(job = self.job.id, stage = %result.stage, error = %err, "job failed");
                self.trace.fail(err, err.failure_reason());
            }
        }
        result
    }

    async fn execute(&mut self) -> RunResult {
        let Some(provider) = self.registry.resolve(&self.runner.executor) else {
            return RunResult::failed(
                Stage::Prepare,
                BuildError::Configuration(format!("unknown executor: {}", self.runner.executor)),
            );
        };
        if !provider.can_create() {
            return RunResult::failed(
                Stage::Prepare,
                BuildError::system(format!(
                    "executor {} cannot create instances",
                    self.runner.executor
                )),
            );
        }

        self.state.set(BuildState::Preparing);
        let mut executor = match self.prepare_executor(provider.as_ref()).await {
            Ok(executor) => executor,
            Err(err) => return RunResult::failed(Stage::Prepare, err),
        };

        let result = self.run_stages(executor.as_mut()).await;

        self.state.set(BuildState::Finishing);
        executor.finish(result.error.as_ref()).await;
        executor.cleanup().await;
        result
    }

    /// Create and prepare an executor, retrying infrastructure failures.
    ///
    /// Each discarded instance gets its own `cleanup`. A job-level prepare
    /// error stops immediately; only the last infrastructure error is
    /// surfaced once attempts are exhausted.
    async fn prepare_executor(
        &mut self,
        provider: &dyn ExecutorProvider,
    ) -> Result<Box<dyn Executor>, BuildError> {
        let mut last: Option<BuildError> = None;
        for attempt in 1..=self.preparation_retries {
            if self.cancel.is_cancelled() {
                return Err(self.cancel.terminal_error());
            }
            let mut executor = provider.create();
            let options = PrepareOptions {
                job: &self.job,
                runner: &self.runner,
                variables: &self.variables,
                trace: self.trace.clone(),
                token: self.cancel.token(),
            };
            match executor.prepare(options).await {
                Ok(()) => return Ok(executor),
                Err(err) => {
                    executor.cleanup().await;
                    let err = self.map_error(err);
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    warn!(
                        attempt,
                        retries = self.preparation_retries,
                        error = %err,
                        "executor preparation failed"
                    );
                    last = Some(err);
                    if attempt < self.preparation_retries {
                        let token = self.cancel.token();
                        tokio::select! {
                            _ = tokio::time::sleep(self.preparation_retry_interval) => {}
                            _ = token.cancelled() => {
                                return Err(self.cancel.terminal_error());
                            }
                        }
                    }
                }
            }
        }
        Err(last.unwrap_or_else(|| BuildError::system("executor preparation failed")))
    }

    async fn run_stages(&mut self, executor: &mut dyn Executor) -> RunResult {
        let mut failure: Option<(Stage, BuildError)> = None;
        for stage in [
            Stage::GetSources,
            Stage::RestoreCache,
            Stage::DownloadArtifacts,
            Stage::UserScript,
        ] {
            if let Err(err) = self.run_stage_with_attempts(executor, stage).await {
                failure = Some((stage, err));
                break;
            }
        }

        let Some((failed_stage, err)) = failure else {
            for stage in [
                Stage::AfterScript,
                Stage::ArchiveCache,
                Stage::UploadOnSuccess,
            ] {
                if let Err(err) = self.run_stage_once(executor, stage).await {
                    return RunResult::failed(stage, err);
                }
            }
            return RunResult::success(Stage::UploadOnSuccess);
        };

        // Abort/cancel terminates promptly: no failure-path stages run.
        if matches!(
            err.disposition(),
            Disposition::Abort | Disposition::Cancel
        ) {
            return RunResult::failed(failed_stage, err);
        }

        // after_script runs (best effort) only when the script itself failed;
        // a setup failure skips straight to the failure upload.
        if failed_stage == Stage::UserScript {
            if let Err(after_err) = self.run_stage_once(executor, Stage::AfterScript).await {
                warn!(error = %after_err, "after_script failed");
            }
        }
        if let Err(upload_err) = self.run_stage_once(executor, Stage::UploadOnFailure).await {
            warn!(error = %upload_err, "failure artifact upload failed");
        }
        RunResult::failed(failed_stage, err)
    }

    /// Run one stage up to its resolved attempt count; the first success
    /// wins and the last error is surfaced.
    async fn run_stage_with_attempts(
        &mut self,
        executor: &mut dyn Executor,
        stage: Stage,
    ) -> Result<(), BuildError> {
        // Lazy validation: a bad attempt variable fails the stage before
        // any attempt runs.
        let attempts = stage_attempts(stage, &self.variables)?;
        let mut last: Option<BuildError> = None;
        for attempt in 1..=attempts {
            self.state.set(if attempt > 1 {
                BuildState::Retrying(stage)
            } else {
                BuildState::Running(stage)
            });
            if attempt > 1 {
                self.trace.write(
                    format!("Retrying {stage} (attempt {attempt} of {attempts})\n").as_bytes(),
                );
            }
            match self.invoke(executor, stage).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if matches!(
                        err.disposition(),
                        Disposition::Abort | Disposition::Cancel
                    ) {
                        return Err(err);
                    }
                    debug!(stage = %stage, attempt, error = %err, "stage attempt failed");
                    last = Some(err);
                }
            }
        }
        Err(last.unwrap_or_else(|| BuildError::system(format!("stage {stage} failed"))))
    }

    async fn run_stage_once(
        &mut self,
        executor: &mut dyn Executor,
        stage: Stage,
    ) -> Result<(), BuildError> {
        self.state.set(BuildState::Running(stage));
        self.invoke(executor, stage).await
    }

    async fn invoke(
        &mut self,
        executor: &mut dyn Executor,
        stage: Stage,
    ) -> Result<(), BuildError> {
        if self.cancel.is_cancelled() {
            return Err(self.cancel.terminal_error());
        }
        debug!(job = self.job.id, stage = %stage, "running stage");
        let command = ExecutorCommand {
            stage,
            script: stage_script(&self.job, stage),
            token: self.cancel.token(),
        };
        executor.run(command).await.map_err(|err| self.map_error(err))
    }

    /// Map an executor error into the run-level taxonomy, substituting the
    /// recorded cancellation cause for generic cancellation.
    fn map_error(&self, err: ExecutorError) -> BuildError {
        match err {
            ExecutorError::Canceled => self.cancel.terminal_error(),
            other => other.into_build_error(),
        }
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
