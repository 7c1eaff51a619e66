// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job description received from the coordinator.
//!
//! A `Job` is immutable for the duration of one run; the stage state machine
//! owns it exclusively and never mutates it concurrently.

use crate::variables::JobVariable;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_timeout_secs() -> u64 {
    3600
}

/// Git/source information for the job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitInfo {
    #[serde(default)]
    pub repo_url: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub ref_name: String,
    #[serde(default)]
    pub depth: u32,
}

/// Named step declared on the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Script,
    AfterScript,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub name: StepName,
    pub script: Vec<String>,
    #[serde(default)]
    pub allow_failure: bool,
}

/// One unit of work received from the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    /// Per-job token used when reporting status and trace data back
    pub token: String,
    /// Coordinator project path, e.g. `group/project`
    #[serde(default)]
    pub project: String,
    /// Coordinator job URL, used for operational listings
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub git_info: GitInfo,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub variables: Vec<JobVariable>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Interactive session endpoint owned by this job, if any
    #[serde(default)]
    pub session_url: Option<String>,
}

impl Job {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn step(&self, name: StepName) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// One-line identifier for operational listings: project plus job id.
    pub fn describe(&self) -> String {
        format!("{} #{}", self.project, self.id)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
