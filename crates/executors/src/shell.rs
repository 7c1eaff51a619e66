// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local shell backend.
//!
//! Runs each stage script with bash inside a per-job build directory.
//! Output is streamed line-by-line to the run's trace sink.

use crate::contract::{
    Executor, ExecutorCommand, ExecutorError, ExecutorProvider, FeaturesInfo, PrepareOptions,
    ShellInfo,
};
use async_trait::async_trait;
use gantry_core::{BuildError, JobTrace};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

const DEFAULT_SHELL: &str = "bash";

/// Provider for the local shell backend.
#[derive(Debug, Default, Clone)]
pub struct ShellExecutorProvider;

impl ShellExecutorProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutorProvider for ShellExecutorProvider {
    fn can_create(&self) -> bool {
        true
    }

    fn create(&self) -> Box<dyn Executor> {
        Box::new(ShellExecutor {
            build_dir: None,
            env: Vec::new(),
            trace: None,
        })
    }

    fn default_shell(&self) -> &str {
        DEFAULT_SHELL
    }

    fn features(&self, features: &mut FeaturesInfo) {
        features.variables = true;
        features.masking = true;
    }
}

pub struct ShellExecutor {
    build_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
    trace: Option<Arc<dyn JobTrace>>,
}

impl ShellExecutor {
    fn trace_write(&self, text: &str) {
        if let Some(trace) = &self.trace {
            trace.write(text.as_bytes());
        }
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    async fn prepare(&mut self, options: PrepareOptions<'_>) -> Result<(), ExecutorError> {
        let base = options
            .runner
            .build_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let dir = base.join(format!("gantry-{}-{}", std::process::id(), options.job.id));
        tokio::fs::create_dir_all(&dir).await?;

        let mut env: Vec<(String, String)> = vec![
            ("CI".into(), "true".into()),
            ("CI_JOB_ID".into(), options.job.id.to_string()),
            ("CI_PROJECT_PATH".into(), options.job.project.clone()),
            ("CI_COMMIT_SHA".into(), options.job.git_info.sha.clone()),
            (
                "CI_COMMIT_REF_NAME".into(),
                options.job.git_info.ref_name.clone(),
            ),
        ];

        // File variables are materialized on disk; the variable expands to
        // the file's path.
        let var_dir = dir.join(".vars");
        for variable in options.variables.iter() {
            if variable.file {
                tokio::fs::create_dir_all(&var_dir).await?;
                let path = var_dir.join(&variable.key);
                tokio::fs::write(&path, &variable.value).await?;
                env.push((variable.key.clone(), path.display().to_string()));
            } else {
                env.push((variable.key.clone(), variable.value.clone()));
            }
        }

        options.trace.write(
            format!(
                "Preparing the shell executor for {} in {}\n",
                options.job.describe(),
                dir.display()
            )
            .as_bytes(),
        );

        self.build_dir = Some(dir);
        self.env = env;
        self.trace = Some(options.trace);
        Ok(())
    }

    async fn run(&mut self, command: ExecutorCommand) -> Result<(), ExecutorError> {
        if command.token.is_cancelled() {
            return Err(ExecutorError::Canceled);
        }
        let dir = self
            .build_dir
            .clone()
            .ok_or_else(|| ExecutorError::system("shell executor not prepared"))?;

        let script_dir = dir.join(".scripts");
        tokio::fs::create_dir_all(&script_dir).await?;
        let script_path = script_dir.join(format!("{}.sh", command.stage));
        let script = format!("set -eo pipefail\n{}\n", command.script);
        tokio::fs::write(&script_path, script).await?;

        let mut child = Command::new(DEFAULT_SHELL)
            .arg(&script_path)
            .current_dir(&dir)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_task = spawn_line_copier(stdout, self.trace.clone());
        let err_task = spawn_line_copier(stderr, self.trace.clone());

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = command.token.cancelled() => {
                let _ = child.kill().await;
                let _ = out_task.await;
                let _ = err_task.await;
                return Err(ExecutorError::Canceled);
            }
        };
        let _ = out_task.await;
        let _ = err_task.await;

        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(ExecutorError::ScriptFailed { code }),
            None => Err(ExecutorError::system("script terminated by signal")),
        }
    }

    async fn finish(&mut self, error: Option<&BuildError>) {
        if let Some(error) = error {
            self.trace_write(&format!("Stage failed: {error}\n"));
        }
    }

    async fn cleanup(&mut self) {
        if let Some(dir) = self.build_dir.take() {
            if let Err(err) = tokio::fs::remove_dir_all(&dir).await {
                debug!(dir = %dir.display(), error = %err, "build dir cleanup failed");
            }
        }
    }

    fn shell(&self) -> Option<ShellInfo> {
        Some(ShellInfo {
            shell: DEFAULT_SHELL.to_string(),
            args: Vec::new(),
        })
    }
}

/// Copy one output pipe to the trace, line by line.
fn spawn_line_copier<R>(
    reader: Option<R>,
    trace: Option<Arc<dyn JobTrace>>,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let (Some(reader), Some(trace)) = (reader, trace) else {
            return;
        };
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            trace.write(format!("{line}\n").as_bytes());
        }
    })
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
