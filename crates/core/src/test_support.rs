// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across crates' tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::job::{GitInfo, Job, Step, StepName};
use crate::stage::Stage;
use crate::variables::JobVariable;

/// Builder producing a minimal but complete [`Job`] for tests.
#[derive(Debug, Clone)]
pub struct JobBuilder {
    job: Job,
}

impl Default for JobBuilder {
    fn default() -> Self {
        JobBuilder {
            job: Job {
                id: 1,
                token: "job-token".into(),
                project: "group/project".into(),
                url: "https://ci.example.com/group/project/-/jobs/1".into(),
                git_info: GitInfo::default(),
                steps: vec![Step {
                    name: StepName::Script,
                    script: vec!["echo hello".into()],
                    allow_failure: false,
                }],
                variables: Vec::new(),
                timeout_secs: 3600,
                session_url: None,
            },
        }
    }
}

impl JobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: u64) -> Self {
        self.job.id = id;
        self.job.url = format!("https://ci.example.com/group/project/-/jobs/{id}");
        self
    }

    pub fn script(mut self, lines: &[&str]) -> Self {
        self.job.steps.retain(|s| s.name != StepName::Script);
        self.job.steps.push(Step {
            name: StepName::Script,
            script: lines.iter().map(|l| l.to_string()).collect(),
            allow_failure: false,
        });
        self
    }

    pub fn after_script(mut self, lines: &[&str]) -> Self {
        self.job.steps.push(Step {
            name: StepName::AfterScript,
            script: lines.iter().map(|l| l.to_string()).collect(),
            allow_failure: true,
        });
        self
    }

    pub fn var(mut self, key: &str, value: &str) -> Self {
        self.job.variables.push(JobVariable::new(key, value));
        self
    }

    pub fn masked_var(mut self, key: &str, value: &str) -> Self {
        self.job.variables.push(JobVariable::new(key, value).masked());
        self
    }

    /// Set the attempt variable for a setup stage.
    pub fn attempts(self, stage: Stage, count: &str) -> Self {
        let key = match stage.attempts_variable() {
            Some(key) => key.to_string(),
            None => format!("{}_ATTEMPTS", stage.name().to_uppercase()),
        };
        self.var(&key, count)
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.job.timeout_secs = secs;
        self
    }

    pub fn session_url(mut self, url: &str) -> Self {
        self.job.session_url = Some(url.to_string());
        self
    }

    pub fn build(self) -> Job {
        self.job
    }
}
