// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner identity and per-runner settings.

use crate::variables::JobVariable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_executor() -> String {
    "shell".to_string()
}

/// Stable key identifying one registered agent configuration: the
/// coordinator URL plus the registration token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunnerIdentity {
    pub url: String,
    pub token: String,
}

impl RunnerIdentity {
    /// Short token prefix for logs; the full token never appears in output.
    pub fn short_token(&self) -> &str {
        let end = self.token.len().min(8);
        self.token.get(..end).unwrap_or(&self.token)
    }
}

/// One `[[runners]]` entry of the agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSettings {
    pub name: String,
    pub url: String,
    pub token: String,
    /// Backend name resolved against the executor registry
    #[serde(default = "default_executor")]
    pub executor: String,
    /// Max in-flight job requests; values <= 0 mean 1
    #[serde(default)]
    pub request_concurrency: i64,
    /// Max concurrent job executions; 0 means unlimited
    #[serde(default)]
    pub limit: u64,
    /// Runner-declared variables merged under the job's own
    #[serde(default)]
    pub environment: Vec<JobVariable>,
    /// Base directory for build workspaces (shell backend)
    #[serde(default)]
    pub build_dir: Option<PathBuf>,
}

impl RunnerSettings {
    pub fn identity(&self) -> RunnerIdentity {
        RunnerIdentity {
            url: self.url.clone(),
            token: self.token.clone(),
        }
    }

    /// Request concurrency with the default applied.
    pub fn effective_request_concurrency(&self) -> usize {
        if self.request_concurrency <= 0 {
            1
        } else {
            self.request_concurrency as usize
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
