// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake executor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::contract::{
    Executor, ExecutorCommand, ExecutorError, ExecutorProvider, FeaturesInfo, PrepareOptions,
    ShellInfo,
};
use async_trait::async_trait;
use gantry_core::{BuildError, JobTrace, Stage};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Recorded executor call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorCall {
    Create,
    Prepare,
    Run(Stage),
    Finish { failed: bool },
    Cleanup,
}

#[derive(Default)]
struct ControlState {
    calls: Vec<ExecutorCall>,
    prepare_failures: VecDeque<ExecutorError>,
    stage_failures: HashMap<Stage, VecDeque<ExecutorError>>,
    stage_output: HashMap<Stage, String>,
    hang_stages: Vec<Stage>,
    created: usize,
    cleanups: usize,
    finish_errors: Vec<Option<String>>,
    can_create: bool,
}

/// Shared handle scripting and observing every executor a
/// [`FakeExecutorProvider`] creates.
#[derive(Clone)]
pub struct FakeExecutorControl {
    inner: Arc<Mutex<ControlState>>,
}

impl Default for FakeExecutorControl {
    fn default() -> Self {
        FakeExecutorControl {
            inner: Arc::new(Mutex::new(ControlState {
                can_create: true,
                ..ControlState::default()
            })),
        }
    }
}

impl FakeExecutorControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a prepare failure; each queued error fails one prepare call.
    pub fn fail_prepare(&self, err: ExecutorError) {
        self.inner.lock().prepare_failures.push_back(err);
    }

    pub fn fail_prepare_times(&self, err: ExecutorError, times: usize) {
        let mut state = self.inner.lock();
        for _ in 0..times {
            state.prepare_failures.push_back(err.clone());
        }
    }

    /// Queue a failure for one invocation of the given stage.
    pub fn fail_stage(&self, stage: Stage, err: ExecutorError) {
        self.inner
            .lock()
            .stage_failures
            .entry(stage)
            .or_default()
            .push_back(err);
    }

    pub fn fail_stage_times(&self, stage: Stage, err: ExecutorError, times: usize) {
        for _ in 0..times {
            self.fail_stage(stage, err.clone());
        }
    }

    /// Bytes written to the trace whenever the given stage runs.
    pub fn set_stage_output(&self, stage: Stage, output: &str) {
        self.inner
            .lock()
            .stage_output
            .insert(stage, output.to_string());
    }

    /// Make the given stage block until the run's token is cancelled, then
    /// return a canceled error.
    pub fn hang_on(&self, stage: Stage) {
        self.inner.lock().hang_stages.push(stage);
    }

    pub fn set_can_create(&self, can_create: bool) {
        self.inner.lock().can_create = can_create;
    }

    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.inner.lock().calls.clone()
    }

    /// Stages submitted via `run`, in order, across all instances.
    pub fn stages_run(&self) -> Vec<Stage> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ExecutorCall::Run(stage) => Some(*stage),
                _ => None,
            })
            .collect()
    }

    pub fn run_count(&self, stage: Stage) -> usize {
        self.stages_run().iter().filter(|s| **s == stage).count()
    }

    pub fn created(&self) -> usize {
        self.inner.lock().created
    }

    pub fn cleanups(&self) -> usize {
        self.inner.lock().cleanups
    }

    /// Error messages passed to `finish`, one entry per call, None on success.
    pub fn finish_errors(&self) -> Vec<Option<String>> {
        self.inner.lock().finish_errors.clone()
    }
}

/// Fake executor provider for testing
#[derive(Clone, Default)]
pub struct FakeExecutorProvider {
    control: FakeExecutorControl,
}

impl FakeExecutorProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(control: FakeExecutorControl) -> Self {
        FakeExecutorProvider { control }
    }

    pub fn control(&self) -> FakeExecutorControl {
        self.control.clone()
    }
}

impl ExecutorProvider for FakeExecutorProvider {
    fn can_create(&self) -> bool {
        self.control.inner.lock().can_create
    }

    fn create(&self) -> Box<dyn Executor> {
        let mut state = self.control.inner.lock();
        state.calls.push(ExecutorCall::Create);
        state.created += 1;
        drop(state);
        Box::new(FakeExecutor {
            control: self.control.clone(),
            trace: None,
        })
    }

    fn default_shell(&self) -> &str {
        "fake"
    }

    fn features(&self, features: &mut FeaturesInfo) {
        features.variables = true;
        features.masking = true;
    }
}

struct FakeExecutor {
    control: FakeExecutorControl,
    trace: Option<Arc<dyn JobTrace>>,
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn prepare(&mut self, options: PrepareOptions<'_>) -> Result<(), ExecutorError> {
        self.trace = Some(options.trace);
        let mut state = self.control.inner.lock();
        state.calls.push(ExecutorCall::Prepare);
        match state.prepare_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn run(&mut self, command: ExecutorCommand) -> Result<(), ExecutorError> {
        let (output, hang, failure) = {
            let mut state = self.control.inner.lock();
            state.calls.push(ExecutorCall::Run(command.stage));
            (
                state.stage_output.get(&command.stage).cloned(),
                state.hang_stages.contains(&command.stage),
                state
                    .stage_failures
                    .get_mut(&command.stage)
                    .and_then(VecDeque::pop_front),
            )
        };

        if let (Some(output), Some(trace)) = (output, &self.trace) {
            trace.write(output.as_bytes());
        }
        if hang {
            command.token.cancelled().await;
            return Err(ExecutorError::Canceled);
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn finish(&mut self, error: Option<&BuildError>) {
        let mut state = self.control.inner.lock();
        state.calls.push(ExecutorCall::Finish {
            failed: error.is_some(),
        });
        state.finish_errors.push(error.map(|e| e.to_string()));
    }

    async fn cleanup(&mut self) {
        let mut state = self.control.inner.lock();
        state.calls.push(ExecutorCall::Cleanup);
        state.cleanups += 1;
    }

    fn shell(&self) -> Option<ShellInfo> {
        None
    }
}
