// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::stage_script;
use gantry_core::{JobBuilder, Stage};

#[test]
fn user_script_joins_declared_lines() {
    let job = JobBuilder::new().script(&["make", "make test"]).build();
    assert_eq!(stage_script(&job, Stage::UserScript), "make\nmake test");
}

#[test]
fn missing_after_script_is_a_noop() {
    let job = JobBuilder::new().build();
    assert_eq!(stage_script(&job, Stage::AfterScript), ":");
}

#[test]
fn sources_script_without_repo_is_a_noop_with_message() {
    let job = JobBuilder::new().build();
    let script = stage_script(&job, Stage::GetSources);
    assert!(script.contains("no repository declared"));
}

#[test]
fn sources_script_clones_with_depth_and_checks_out_sha() {
    let mut job = JobBuilder::new().build();
    job.git_info.repo_url = "https://git.example.com/app.git".into();
    job.git_info.sha = "abc123".into();
    job.git_info.depth = 50;

    let script = stage_script(&job, Stage::GetSources);
    assert!(script.contains("git clone --depth 50 https://git.example.com/app.git"));
    assert!(script.contains("git checkout -q abc123"));
}

#[test]
fn every_stage_yields_a_script() {
    let job = JobBuilder::new().build();
    let stages = [
        Stage::Prepare,
        Stage::GetSources,
        Stage::RestoreCache,
        Stage::DownloadArtifacts,
        Stage::UserScript,
        Stage::AfterScript,
        Stage::ArchiveCache,
        Stage::UploadOnSuccess,
        Stage::UploadOnFailure,
    ];
    for stage in stages {
        assert!(!stage_script(&job, stage).is_empty(), "{stage}");
    }
}
