// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-stage script generation.
//!
//! Each stage is submitted to the executor as an opaque script; what the
//! executor does with it is its own business. Stages with no job-declared
//! content get a no-op script so every stage of the fixed sequence is
//! submitted exactly once.

use gantry_core::{Job, Stage, StepName};

pub fn stage_script(job: &Job, stage: Stage) -> String {
    match stage {
        Stage::Prepare => ":".to_string(),
        Stage::GetSources => sources_script(job),
        Stage::RestoreCache => "echo 'Checking cache...'".to_string(),
        Stage::DownloadArtifacts => "echo 'Checking artifacts...'".to_string(),
        Stage::UserScript => step_script(job, StepName::Script),
        Stage::AfterScript => step_script(job, StepName::AfterScript),
        Stage::ArchiveCache => "echo 'Archiving cache...'".to_string(),
        Stage::UploadOnSuccess | Stage::UploadOnFailure => {
            "echo 'Uploading artifacts...'".to_string()
        }
    }
}

fn sources_script(job: &Job) -> String {
    let git = &job.git_info;
    if git.repo_url.is_empty() {
        return "echo 'Skipping sources: no repository declared'".to_string();
    }
    let mut lines = vec![
        format!("echo 'Fetching changes from {}'", git.repo_url),
        "rm -rf sources".to_string(),
    ];
    if git.depth > 0 {
        lines.push(format!(
            "git clone --depth {} {} sources",
            git.depth, git.repo_url
        ));
    } else {
        lines.push(format!("git clone {} sources", git.repo_url));
    }
    lines.push("cd sources".to_string());
    if !git.sha.is_empty() {
        lines.push(format!("git checkout -q {}", git.sha));
    } else if !git.ref_name.is_empty() {
        lines.push(format!("git checkout -q {}", git.ref_name));
    }
    lines.join("\n")
}

fn step_script(job: &Job, name: StepName) -> String {
    match job.step(name) {
        Some(step) if !step.script.is_empty() => step.script.join("\n"),
        _ => ":".to_string(),
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
