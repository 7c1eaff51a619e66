// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end agent flow: poll, admit, run, report, release.
//!
//! Exercises the public API the way the daemon wires it together, with the
//! coordinator and executor replaced by their test-support fakes.

use gantry_agent::{Agent, FakeCoordinator, JobState};
use gantry_core::{FailureReason, FakeTrace, JobBuilder, RunnerSettings, Stage, TraceResult};
use gantry_engine::AdmissionGate;
use gantry_executors::{ExecutorError, ExecutorRegistry, FakeExecutorProvider};
use std::sync::Arc;
use std::time::Duration;

fn runner(limit: u64) -> RunnerSettings {
    RunnerSettings {
        name: "integration".into(),
        url: "https://ci.example.com".into(),
        token: "runner-token".into(),
        executor: "fake".into(),
        request_concurrency: 1,
        limit,
        environment: Vec::new(),
        build_dir: None,
    }
}

fn agent(
    coordinator: &FakeCoordinator,
    gate: &Arc<AdmissionGate>,
    provider: FakeExecutorProvider,
    trace: &FakeTrace,
) -> Arc<Agent<FakeCoordinator>> {
    let mut registry = ExecutorRegistry::new();
    registry.register("fake", Arc::new(provider));
    let trace = trace.clone();
    Arc::new(
        Agent::new(coordinator.clone(), gate.clone(), Arc::new(registry))
            .with_check_interval(Duration::from_millis(1))
            .with_trace_factory(Arc::new(move |_| Arc::new(trace.clone()))),
    )
}

#[tokio::test]
async fn job_flows_from_poll_to_success_report() {
    let provider = FakeExecutorProvider::new();
    let control = provider.control();
    let coordinator = FakeCoordinator::new();
    let gate = Arc::new(AdmissionGate::new());
    let trace = FakeTrace::new();
    let agent = agent(&coordinator, &gate, provider, &trace);
    let runner = runner(0);

    coordinator.queue_job(
        JobBuilder::new()
            .id(42)
            .script(&["make", "make test"])
            .build(),
    );

    assert!(agent.poll_runner(&runner).await);
    agent.drain().await;

    assert_eq!(coordinator.updates(), vec![(42, JobState::Success)]);
    assert_eq!(trace.result(), Some(TraceResult::Success));
    assert_eq!(
        control.stages_run(),
        vec![
            Stage::GetSources,
            Stage::RestoreCache,
            Stage::DownloadArtifacts,
            Stage::UserScript,
            Stage::AfterScript,
            Stage::ArchiveCache,
            Stage::UploadOnSuccess,
        ]
    );
    // All admission state released
    assert_eq!(gate.active_count(), 0);
    assert!(gate.acquire_request(&runner));
    assert!(!gate.release_build(&runner));
}

#[tokio::test]
async fn masked_variable_never_reaches_the_trace() {
    let provider = FakeExecutorProvider::new();
    let control = provider.control();
    control.set_stage_output(Stage::UserScript, "deploy key: hunter2-key\n");
    let coordinator = FakeCoordinator::new();
    let gate = Arc::new(AdmissionGate::new());
    let trace = FakeTrace::new();
    let agent = agent(&coordinator, &gate, provider, &trace);
    let runner = runner(0);

    coordinator.queue_job(
        JobBuilder::new()
            .masked_var("DEPLOY_KEY", "hunter2-key")
            .build(),
    );

    assert!(agent.poll_runner(&runner).await);
    agent.drain().await;

    assert!(!trace.output().contains("hunter2-key"));
    assert!(trace.output().contains("deploy key: [MASKED]"));
}

#[tokio::test]
async fn limit_of_one_admits_jobs_strictly_in_sequence() {
    let provider = FakeExecutorProvider::new();
    let coordinator = FakeCoordinator::new();
    let gate = Arc::new(AdmissionGate::new());
    let trace = FakeTrace::new();
    let agent = agent(&coordinator, &gate, provider, &trace);
    let runner = runner(1);

    coordinator.queue_job(JobBuilder::new().id(1).build());
    coordinator.queue_job(JobBuilder::new().id(2).build());

    assert!(agent.poll_runner(&runner).await);
    agent.drain().await;
    assert!(agent.poll_runner(&runner).await);
    agent.drain().await;

    assert_eq!(
        coordinator.updates(),
        vec![(1, JobState::Success), (2, JobState::Success)]
    );
}

#[tokio::test]
async fn script_failure_reaches_the_coordinator_and_the_trace() {
    let provider = FakeExecutorProvider::new();
    let control = provider.control();
    control.fail_stage(Stage::UserScript, ExecutorError::ScriptFailed { code: 9 });
    let coordinator = FakeCoordinator::new();
    let gate = Arc::new(AdmissionGate::new());
    let trace = FakeTrace::new();
    let agent = agent(&coordinator, &gate, provider, &trace);
    let runner = runner(0);

    coordinator.queue_job(JobBuilder::new().id(8).build());

    assert!(agent.poll_runner(&runner).await);
    agent.drain().await;

    assert_eq!(
        coordinator.updates(),
        vec![(8, JobState::Failed(FailureReason::ScriptFailure))]
    );
    assert_eq!(
        trace.result(),
        Some(TraceResult::Failed(FailureReason::ScriptFailure))
    );
    assert_eq!(
        trace.last_error(),
        Some("script exited with code 9".to_string())
    );
}
