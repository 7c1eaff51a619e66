// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration file.
//!
//! TOML with a `[[runners]]` table per registered runner; everything except
//! the runner name, URL and token has a default.

use gantry_core::RunnerSettings;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

fn default_check_interval() -> u64 {
    3
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("no [[runners]] configured in {0}")]
    NoRunners(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Seconds between poll ticks
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
    /// Bind address for the introspection HTTP listener, e.g. `127.0.0.1:8093`.
    /// Disabled when absent.
    #[serde(default)]
    pub listen_address: Option<String>,
    #[serde(default)]
    pub runners: Vec<RunnerSettings>,
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: AgentConfig =
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        if config.runners.is_empty() {
            return Err(ConfigError::NoRunners(path.display().to_string()));
        }
        Ok(config)
    }

    pub fn check_interval(&self) -> Duration {
        // A zero interval would spin the poll loop
        Duration::from_secs(self.check_interval.max(1))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
