// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{api_endpoint, Coordinator, CoordinatorError, FakeCoordinator, JobState};
use gantry_core::{FailureReason, JobBuilder, RunnerSettings};

fn runner(url: &str) -> RunnerSettings {
    RunnerSettings {
        name: "test".into(),
        url: url.into(),
        token: "runner-token".into(),
        executor: "shell".into(),
        request_concurrency: 0,
        limit: 0,
        environment: Vec::new(),
        build_dir: None,
    }
}

#[test]
fn endpoint_joins_without_doubled_slash() {
    let plain = runner("https://ci.example.com");
    let trailing = runner("https://ci.example.com/");
    assert_eq!(
        api_endpoint(&plain, "jobs/request"),
        "https://ci.example.com/api/v4/jobs/request"
    );
    assert_eq!(
        api_endpoint(&trailing, "jobs/request"),
        "https://ci.example.com/api/v4/jobs/request"
    );
}

#[tokio::test]
async fn fake_hands_out_queued_jobs_in_order() {
    let coordinator = FakeCoordinator::new();
    coordinator.queue_job(JobBuilder::new().id(1).build());
    coordinator.queue_job(JobBuilder::new().id(2).build());
    let runner = runner("https://ci.example.com");

    let first = coordinator.request_job(&runner).await.unwrap().unwrap();
    let second = coordinator.request_job(&runner).await.unwrap().unwrap();
    assert_eq!((first.id, second.id), (1, 2));

    assert!(coordinator.request_job(&runner).await.unwrap().is_none());
    assert_eq!(coordinator.request_count(), 3);
}

#[tokio::test]
async fn fake_fails_the_scripted_number_of_requests() {
    let coordinator = FakeCoordinator::new();
    coordinator.queue_job(JobBuilder::new().build());
    coordinator.fail_requests(1);
    let runner = runner("https://ci.example.com");

    let err = coordinator.request_job(&runner).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::Transport(_)));

    // The queued job survives the failed request
    assert!(coordinator.request_job(&runner).await.unwrap().is_some());
}

#[tokio::test]
async fn fake_records_updates() {
    let coordinator = FakeCoordinator::new();
    let runner = runner("https://ci.example.com");
    let job = JobBuilder::new().id(9).build();

    coordinator
        .update_job(&runner, &job, JobState::Success)
        .await
        .unwrap();
    coordinator
        .update_job(
            &runner,
            &job,
            JobState::Failed(FailureReason::ScriptFailure),
        )
        .await
        .unwrap();

    assert_eq!(
        coordinator.updates(),
        vec![
            (9, JobState::Success),
            (9, JobState::Failed(FailureReason::ScriptFailure)),
        ]
    );
}
