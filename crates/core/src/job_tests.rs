// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Job, StepName};
use std::time::Duration;

#[test]
fn deserializes_with_defaults() {
    let job: Job = serde_json::from_str(r#"{"id": 7, "token": "t"}"#).unwrap();
    assert_eq!(job.id, 7);
    assert_eq!(job.timeout(), Duration::from_secs(3600));
    assert!(job.steps.is_empty());
    assert!(job.session_url.is_none());
}

#[test]
fn step_lookup_by_name() {
    let job: Job = serde_json::from_str(
        r#"{
            "id": 1,
            "token": "t",
            "steps": [
                {"name": "script", "script": ["make"]},
                {"name": "after_script", "script": ["make clean"], "allow_failure": true}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(job.step(StepName::Script).unwrap().script, vec!["make"]);
    assert!(job.step(StepName::AfterScript).unwrap().allow_failure);
}

#[test]
fn describe_is_project_and_id() {
    let job: Job =
        serde_json::from_str(r#"{"id": 12, "token": "t", "project": "group/app"}"#).unwrap();
    assert_eq!(job.describe(), "group/app #12");
}
