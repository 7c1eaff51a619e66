// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll loop: request, admit, run, release.
//!
//! One tick asks the coordinator for work on behalf of every configured
//! runner. A request slot is held for the duration of the request only; a
//! build slot and the active-job registration are held until the spawned
//! build task finishes. Shutdown aborts in-flight builds through their
//! cancel handles and then drains the tasks.

use crate::coordinator::{Coordinator, JobState};
use gantry_core::{FailureReason, Job, JobTrace, RunnerSettings, StdoutTrace};
use gantry_engine::{AdmissionGate, Build, CancelHandle};
use gantry_executors::ExecutorRegistry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Produces the trace sink for one job run.
pub type TraceFactory = Arc<dyn Fn(&Job) -> Arc<dyn JobTrace> + Send + Sync>;

pub struct Agent<C: Coordinator> {
    coordinator: Arc<C>,
    gate: Arc<AdmissionGate>,
    registry: Arc<ExecutorRegistry>,
    trace_factory: TraceFactory,
    check_interval: Duration,
    shutdown: CancellationToken,
    next_build: AtomicU64,
    active: Mutex<HashMap<u64, CancelHandle>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: Coordinator> Agent<C> {
    pub fn new(
        coordinator: C,
        gate: Arc<AdmissionGate>,
        registry: Arc<ExecutorRegistry>,
    ) -> Self {
        Agent {
            coordinator: Arc::new(coordinator),
            gate,
            registry,
            trace_factory: Arc::new(|_| Arc::new(StdoutTrace::new())),
            check_interval: Duration::from_secs(3),
            shutdown: CancellationToken::new(),
            next_build: AtomicU64::new(0),
            active: Mutex::new(HashMap::new()),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn with_trace_factory(mut self, factory: TraceFactory) -> Self {
        self.trace_factory = factory;
        self
    }

    /// Token that stops the poll loop and aborts in-flight builds.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn gate(&self) -> Arc<AdmissionGate> {
        self.gate.clone()
    }

    /// One poll of one runner. Returns true when a build was started.
    pub async fn poll_runner(self: &Arc<Self>, runner: &RunnerSettings) -> bool {
        if !self.gate.acquire_request(runner) {
            debug!(runner = %runner.name, "request concurrency reached, skipping poll");
            return false;
        }
        let requested = self.coordinator.request_job(runner).await;
        if !self.gate.release_request(runner) {
            warn!(runner = %runner.name, "request slot released twice");
        }

        let job = match requested {
            Ok(Some(job)) => job,
            Ok(None) => return false,
            Err(err) => {
                warn!(runner = %runner.name, error = %err, "job request failed");
                return false;
            }
        };

        if !self.gate.acquire_build(runner) {
            // At the execution limit: hand the job back so the coordinator
            // can requeue it elsewhere.
            warn!(
                job = job.id,
                runner = %runner.name,
                "execution limit reached, returning job"
            );
            self.report(
                runner,
                &job,
                JobState::Failed(FailureReason::RunnerSystemFailure),
            )
            .await;
            return false;
        }

        info!(job = job.id, project = %job.project, runner = %runner.name, "job admitted");
        self.start_build(runner, job);
        true
    }

    fn start_build(self: &Arc<Self>, runner: &RunnerSettings, job: Job) {
        let registration = self.gate.add_build(&job);
        let trace = (self.trace_factory)(&job);
        let build = Build::new(
            job.clone(),
            runner.clone(),
            self.registry.clone(),
            trace,
        );

        let build_id = self.next_build.fetch_add(1, Ordering::Relaxed);
        self.active.lock().insert(build_id, build.cancel_handle());

        let agent = self.clone();
        let runner = runner.clone();
        let handle = tokio::spawn(async move {
            let result = build.run().await;
            let state = match result.failure_reason() {
                None => JobState::Success,
                Some(reason) => JobState::Failed(reason),
            };
            agent.report(&runner, &job, state).await;
            if !agent.gate.release_build(&runner) {
                warn!(runner = %runner.name, "build slot released twice");
            }
            drop(registration);
            agent.active.lock().remove(&build_id);
        });
        self.handles.lock().push(handle);
    }

    async fn report(&self, runner: &RunnerSettings, job: &Job, state: JobState) {
        if let Err(err) = self.coordinator.update_job(runner, job, state).await {
            warn!(job = job.id, error = %err, "failed to report job status");
        }
    }

    /// Deliver the interrupt to every in-flight build.
    pub fn abort_builds(&self) {
        for cancel in self.active.lock().values() {
            cancel.abort();
        }
    }

    /// Wait for all spawned build tasks to finish.
    pub async fn drain(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if handle.await.is_err() {
                warn!("build task panicked");
            }
        }
    }

    /// Poll until the shutdown token fires, then abort and drain builds.
    pub async fn run(self: Arc<Self>, runners: Vec<RunnerSettings>) {
        let mut tick = tokio::time::interval(self.check_interval);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tick.tick() => {
                    for runner in &runners {
                        self.poll_runner(runner).await;
                    }
                }
            }
        }
        info!("poll loop stopped, aborting in-flight builds");
        self.abort_builds();
        self.drain().await;
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
