// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator client.
//!
//! The agent talks to the coordinator through the [`Coordinator`] trait:
//! request one job, report one terminal status. The HTTP implementation is
//! the production transport; tests swap in [`FakeCoordinator`].

use async_trait::async_trait;
use gantry_core::{FailureReason, Job, RunnerSettings};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("coordinator request failed: {0}")]
    Transport(String),
    #[error("coordinator returned status {0}")]
    Status(u16),
}

/// Terminal job status reported back to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Success,
    Failed(FailureReason),
}

#[async_trait]
pub trait Coordinator: Send + Sync + 'static {
    /// Ask for one queued job; None when the coordinator has nothing for
    /// this runner.
    async fn request_job(&self, runner: &RunnerSettings)
        -> Result<Option<Job>, CoordinatorError>;

    /// Report a job's terminal state.
    async fn update_job(
        &self,
        runner: &RunnerSettings,
        job: &Job,
        state: JobState,
    ) -> Result<(), CoordinatorError>;
}

/// HTTP coordinator client.
#[derive(Clone, Default)]
pub struct HttpCoordinator {
    client: reqwest::Client,
}

impl HttpCoordinator {
    pub fn new() -> Self {
        Self::default()
    }
}

fn api_endpoint(runner: &RunnerSettings, path: &str) -> String {
    format!("{}/api/v4/{path}", runner.url.trim_end_matches('/'))
}

fn transport(err: reqwest::Error) -> CoordinatorError {
    CoordinatorError::Transport(err.to_string())
}

#[async_trait]
impl Coordinator for HttpCoordinator {
    async fn request_job(
        &self,
        runner: &RunnerSettings,
    ) -> Result<Option<Job>, CoordinatorError> {
        let response = self
            .client
            .post(api_endpoint(runner, "jobs/request"))
            .json(&json!({ "token": runner.token }))
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            reqwest::StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => {
                let job = response.json::<Job>().await.map_err(transport)?;
                Ok(Some(job))
            }
            status => Err(CoordinatorError::Status(status.as_u16())),
        }
    }

    async fn update_job(
        &self,
        runner: &RunnerSettings,
        job: &Job,
        state: JobState,
    ) -> Result<(), CoordinatorError> {
        let (state_name, failure_reason) = match state {
            JobState::Success => ("success", None),
            JobState::Failed(reason) => ("failed", Some(reason)),
        };
        let response = self
            .client
            .put(api_endpoint(runner, &format!("jobs/{}", job.id)))
            .json(&json!({
                "token": job.token,
                "state": state_name,
                "failure_reason": failure_reason,
            }))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(CoordinatorError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCoordinator;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Coordinator, CoordinatorError, JobState};
    use async_trait::async_trait;
    use gantry_core::{Job, RunnerSettings};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeCoordinatorState {
        queue: VecDeque<Job>,
        fail_requests: usize,
        requests: usize,
        updates: Vec<(u64, JobState)>,
    }

    /// In-memory coordinator for tests: a job queue plus a record of every
    /// status update.
    #[derive(Clone, Default)]
    pub struct FakeCoordinator {
        inner: Arc<Mutex<FakeCoordinatorState>>,
    }

    impl FakeCoordinator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn queue_job(&self, job: Job) {
            self.inner.lock().queue.push_back(job);
        }

        /// Make the next `times` job requests fail with a transport error.
        pub fn fail_requests(&self, times: usize) {
            self.inner.lock().fail_requests = times;
        }

        pub fn request_count(&self) -> usize {
            self.inner.lock().requests
        }

        /// Terminal states reported so far, as `(job id, state)` pairs.
        pub fn updates(&self) -> Vec<(u64, JobState)> {
            self.inner.lock().updates.clone()
        }
    }

    #[async_trait]
    impl Coordinator for FakeCoordinator {
        async fn request_job(
            &self,
            _runner: &RunnerSettings,
        ) -> Result<Option<Job>, CoordinatorError> {
            let mut state = self.inner.lock();
            state.requests += 1;
            if state.fail_requests > 0 {
                state.fail_requests -= 1;
                return Err(CoordinatorError::Transport("connection refused".into()));
            }
            Ok(state.queue.pop_front())
        }

        async fn update_job(
            &self,
            _runner: &RunnerSettings,
            job: &Job,
            state: JobState,
        ) -> Result<(), CoordinatorError> {
            self.inner.lock().updates.push((job.id, state));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
