// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::ShellExecutorProvider;
use crate::contract::{Executor, ExecutorCommand, ExecutorError, ExecutorProvider, PrepareOptions};
use gantry_core::{FakeTrace, Job, JobBuilder, JobTrace, RunnerSettings, Stage, VariableSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn runner(build_dir: &std::path::Path) -> RunnerSettings {
    RunnerSettings {
        name: "test".into(),
        url: "https://ci.example.com".into(),
        token: "runner-token".into(),
        executor: "shell".into(),
        request_concurrency: 0,
        limit: 0,
        environment: Vec::new(),
        build_dir: Some(build_dir.to_path_buf()),
    }
}

async fn prepared(
    job: &Job,
    runner: &RunnerSettings,
) -> (Box<dyn Executor>, FakeTrace, CancellationToken) {
    let trace = FakeTrace::new();
    let vars = VariableSet::new(&runner.environment, &job.variables);
    trace.set_masked(vars.masked_values());
    let token = CancellationToken::new();
    let mut executor = ShellExecutorProvider::new().create();
    executor
        .prepare(PrepareOptions {
            job,
            runner,
            variables: &vars,
            trace: Arc::new(trace.clone()),
            token: token.clone(),
        })
        .await
        .unwrap();
    (executor, trace, token)
}

fn command(script: &str, token: &CancellationToken) -> ExecutorCommand {
    ExecutorCommand {
        stage: Stage::UserScript,
        script: script.to_string(),
        token: token.clone(),
    }
}

#[tokio::test]
async fn runs_script_and_streams_output() {
    let dir = tempfile::tempdir().unwrap();
    let job = JobBuilder::new().build();
    let runner = runner(dir.path());
    let (mut executor, trace, token) = prepared(&job, &runner).await;

    executor
        .run(command("echo hello from the job", &token))
        .await
        .unwrap();
    executor.cleanup().await;

    assert!(trace.output().contains("hello from the job\n"));
}

#[tokio::test]
async fn nonzero_exit_is_a_script_failure() {
    let dir = tempfile::tempdir().unwrap();
    let job = JobBuilder::new().build();
    let runner = runner(dir.path());
    let (mut executor, _trace, token) = prepared(&job, &runner).await;

    let err = executor.run(command("exit 3", &token)).await.unwrap_err();
    executor.cleanup().await;

    assert_eq!(err, ExecutorError::ScriptFailed { code: 3 });
}

#[tokio::test]
async fn masked_values_never_reach_the_trace() {
    let dir = tempfile::tempdir().unwrap();
    let job = JobBuilder::new().masked_var("SECRET", "hush-now").build();
    let runner = runner(dir.path());
    let (mut executor, trace, token) = prepared(&job, &runner).await;

    executor
        .run(command("echo leaking $SECRET", &token))
        .await
        .unwrap();
    executor.cleanup().await;

    let output = trace.output();
    assert!(!output.contains("hush-now"));
    assert!(output.contains("leaking [MASKED]"));
}

#[tokio::test]
async fn cancellation_interrupts_a_running_script() {
    let dir = tempfile::tempdir().unwrap();
    let job = JobBuilder::new().build();
    let runner = runner(dir.path());
    let (mut executor, _trace, token) = prepared(&job, &runner).await;

    let killer = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        killer.cancel();
    });

    let err = executor
        .run(command("sleep 30", &token))
        .await
        .unwrap_err();
    executor.cleanup().await;

    assert_eq!(err, ExecutorError::Canceled);
}

#[tokio::test]
async fn cleanup_removes_the_build_dir() {
    let dir = tempfile::tempdir().unwrap();
    let job = JobBuilder::new().id(42).build();
    let runner = runner(dir.path());
    let (mut executor, _trace, _token) = prepared(&job, &runner).await;

    let build_dir = dir.path().join(format!("gantry-{}-42", std::process::id()));
    assert!(build_dir.exists());

    executor.cleanup().await;
    assert!(!build_dir.exists());
}

#[tokio::test]
async fn run_before_prepare_is_a_system_error() {
    let token = CancellationToken::new();
    let mut executor = ShellExecutorProvider::new().create();
    let err = executor.run(command("true", &token)).await.unwrap_err();
    assert!(!err.is_job_error());
}

#[tokio::test]
async fn file_variables_expand_to_paths() {
    let dir = tempfile::tempdir().unwrap();
    let mut job = JobBuilder::new().build();
    let mut var = gantry_core::JobVariable::new("KUBECONFIG_DATA", "cluster: test");
    var.file = true;
    job.variables.push(var);
    let runner = runner(dir.path());
    let (mut executor, trace, token) = prepared(&job, &runner).await;

    executor
        .run(command("cat \"$KUBECONFIG_DATA\"", &token))
        .await
        .unwrap();
    executor.cleanup().await;

    assert!(trace.output().contains("cluster: test"));
}
