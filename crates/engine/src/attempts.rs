// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt policy: how many times a retryable stage may run.

use gantry_core::{BuildError, Stage, VariableSet};

pub const MIN_ATTEMPTS: u32 = 1;
pub const MAX_ATTEMPTS: u32 = 10;

/// Resolve the attempt count for a stage from the effective variable set.
///
/// Stages without an attempt variable always get 1. An absent or unparsable
/// variable falls back to the default of 1; a parsed value outside
/// `[MIN_ATTEMPTS, MAX_ATTEMPTS]` is a configuration error naming the stage.
/// Resolution is lazy: the engine calls this immediately before the stage
/// would execute.
pub fn stage_attempts(stage: Stage, variables: &VariableSet) -> Result<u32, BuildError> {
    let Some(variable) = stage.attempts_variable() else {
        return Ok(MIN_ATTEMPTS);
    };
    let Some(raw) = variables.get(variable) else {
        return Ok(MIN_ATTEMPTS);
    };
    let Ok(value) = raw.trim().parse::<i64>() else {
        return Ok(MIN_ATTEMPTS);
    };
    if !(i64::from(MIN_ATTEMPTS)..=i64::from(MAX_ATTEMPTS)).contains(&value) {
        return Err(BuildError::Configuration(format!(
            "number of attempts for stage {stage} out of range [{MIN_ATTEMPTS},{MAX_ATTEMPTS}]: {value}"
        )));
    }
    Ok(value as u32)
}

#[cfg(test)]
#[path = "attempts_tests.rs"]
mod tests;
