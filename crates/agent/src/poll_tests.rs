// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::Agent;
use crate::coordinator::{FakeCoordinator, JobState};
use gantry_core::{FailureReason, FakeTrace, JobBuilder, RunnerSettings, Stage};
use gantry_engine::AdmissionGate;
use gantry_executors::{ExecutorError, ExecutorRegistry, FakeExecutorControl, FakeExecutorProvider};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    agent: Arc<Agent<FakeCoordinator>>,
    coordinator: FakeCoordinator,
    control: FakeExecutorControl,
    gate: Arc<AdmissionGate>,
    runner: RunnerSettings,
}

fn harness(limit: u64) -> Harness {
    let provider = FakeExecutorProvider::new();
    let control = provider.control();
    let mut registry = ExecutorRegistry::new();
    registry.register("fake", Arc::new(provider));

    let coordinator = FakeCoordinator::new();
    let gate = Arc::new(AdmissionGate::new());
    let trace = FakeTrace::new();
    let agent = Arc::new(
        Agent::new(coordinator.clone(), gate.clone(), Arc::new(registry))
            .with_check_interval(Duration::from_millis(1))
            .with_trace_factory(Arc::new(move |_| Arc::new(trace.clone()))),
    );

    Harness {
        agent,
        coordinator,
        control,
        gate,
        runner: RunnerSettings {
            name: "test".into(),
            url: "https://ci.example.com".into(),
            token: "runner-token".into(),
            executor: "fake".into(),
            request_concurrency: 1,
            limit,
            environment: Vec::new(),
            build_dir: None,
        },
    }
}

#[tokio::test]
async fn empty_queue_releases_the_request_slot() {
    let h = harness(0);

    assert!(!h.agent.poll_runner(&h.runner).await);

    // Slot available again: a second poll still reaches the coordinator
    assert!(!h.agent.poll_runner(&h.runner).await);
    assert_eq!(h.coordinator.request_count(), 2);
}

#[tokio::test]
async fn failed_request_releases_the_request_slot() {
    let h = harness(0);
    h.coordinator.fail_requests(1);
    h.coordinator.queue_job(JobBuilder::new().build());

    assert!(!h.agent.poll_runner(&h.runner).await);
    // The next poll gets through and picks up the job
    assert!(h.agent.poll_runner(&h.runner).await);
    h.agent.drain().await;
}

#[tokio::test]
async fn admitted_job_runs_and_reports_success() {
    let h = harness(0);
    h.coordinator.queue_job(JobBuilder::new().id(7).build());

    assert!(h.agent.poll_runner(&h.runner).await);
    assert_eq!(h.gate.active_count(), 1);
    h.agent.drain().await;

    assert_eq!(h.coordinator.updates(), vec![(7, JobState::Success)]);
    assert!(!h.control.stages_run().is_empty());
    // Registration and build slot released on completion
    assert_eq!(h.gate.active_count(), 0);
    assert!(!h.gate.release_build(&h.runner));
}

#[tokio::test]
async fn failed_job_reports_its_failure_reason() {
    let h = harness(0);
    h.control
        .fail_stage(Stage::UserScript, ExecutorError::ScriptFailed { code: 2 });
    h.coordinator.queue_job(JobBuilder::new().id(3).build());

    assert!(h.agent.poll_runner(&h.runner).await);
    h.agent.drain().await;

    assert_eq!(
        h.coordinator.updates(),
        vec![(3, JobState::Failed(FailureReason::ScriptFailure))]
    );
}

#[tokio::test]
async fn execution_limit_denial_returns_the_job() {
    let h = harness(1);
    // Occupy the only build slot out of band
    assert!(h.gate.acquire_build(&h.runner));
    h.coordinator.queue_job(JobBuilder::new().id(5).build());

    assert!(!h.agent.poll_runner(&h.runner).await);

    assert_eq!(
        h.coordinator.updates(),
        vec![(5, JobState::Failed(FailureReason::RunnerSystemFailure))]
    );
    assert_eq!(h.gate.active_count(), 0);
    // The out-of-band slot is untouched
    assert!(h.gate.release_build(&h.runner));
    assert!(!h.gate.release_build(&h.runner));
}

#[tokio::test]
async fn abort_interrupts_in_flight_builds() {
    let h = harness(0);
    h.control.hang_on(Stage::UserScript);
    h.coordinator.queue_job(JobBuilder::new().id(11).build());

    assert!(h.agent.poll_runner(&h.runner).await);
    while h.control.run_count(Stage::UserScript) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    h.agent.abort_builds();
    h.agent.drain().await;

    assert_eq!(
        h.coordinator.updates(),
        vec![(11, JobState::Failed(FailureReason::RunnerSystemFailure))]
    );
    assert_eq!(h.gate.active_count(), 0);
}

#[tokio::test]
async fn run_loop_stops_on_shutdown() {
    let h = harness(0);
    h.coordinator.queue_job(JobBuilder::new().id(21).build());
    let shutdown = h.agent.shutdown_token();

    let agent = h.agent.clone();
    let runner = h.runner.clone();
    let loop_task = tokio::spawn(agent.run(vec![runner]));

    while h.coordinator.updates().is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    shutdown.cancel();
    loop_task.await.unwrap();

    assert_eq!(h.coordinator.updates(), vec![(21, JobState::Success)]);
}
