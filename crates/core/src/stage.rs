// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build stage taxonomy.

use std::fmt;

/// One named phase of a job run.
///
/// Stages execute in the declaration order below; which of the trailing
/// stages run depends on where (and whether) the run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Executor preparation (not submitted as a command)
    Prepare,
    GetSources,
    RestoreCache,
    DownloadArtifacts,
    UserScript,
    AfterScript,
    ArchiveCache,
    UploadOnSuccess,
    UploadOnFailure,
}

impl Stage {
    /// Setup stages: retryable per their attempt variables, and a failure
    /// here skips `after_script` and `archive_cache` entirely.
    pub const SETUP: [Stage; 3] = [
        Stage::GetSources,
        Stage::RestoreCache,
        Stage::DownloadArtifacts,
    ];

    /// Wire name of the stage, as submitted to executors and shown in traces.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Prepare => "prepare",
            Stage::GetSources => "get_sources",
            Stage::RestoreCache => "restore_cache",
            Stage::DownloadArtifacts => "download_artifacts",
            Stage::UserScript => "user_script",
            Stage::AfterScript => "after_script",
            Stage::ArchiveCache => "archive_cache",
            Stage::UploadOnSuccess => "upload_artifacts_on_success",
            Stage::UploadOnFailure => "upload_artifacts_on_failure",
        }
    }

    pub fn is_setup(self) -> bool {
        Self::SETUP.contains(&self)
    }

    /// Job variable controlling the attempt count for this stage, if any.
    pub fn attempts_variable(self) -> Option<&'static str> {
        match self {
            Stage::GetSources => Some("GET_SOURCES_ATTEMPTS"),
            Stage::RestoreCache => Some("RESTORE_CACHE_ATTEMPTS"),
            Stage::DownloadArtifacts => Some("ARTIFACT_DOWNLOAD_ATTEMPTS"),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
