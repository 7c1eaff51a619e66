// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::ExecutorError;
use gantry_core::{BuildError, Disposition};

#[yare::parameterized(
    script_exit   = { ExecutorError::ScriptFailed { code: 1 }, true },
    configuration = { ExecutorError::Configuration("bad image".into()), true },
    system        = { ExecutorError::system("network down"), false },
    canceled      = { ExecutorError::Canceled, false },
)]
fn job_error_classification(err: ExecutorError, is_job: bool) {
    assert_eq!(err.is_job_error(), is_job);
}

#[test]
fn script_exit_maps_to_job_failure_with_code() {
    let err = ExecutorError::ScriptFailed { code: 7 }.into_build_error();
    assert_eq!(err.disposition(), Disposition::JobFailure);
    assert_eq!(err.exit_code(), Some(7));
}

#[test]
fn system_error_maps_to_retryable_system_failure() {
    let err = ExecutorError::system("oom").into_build_error();
    assert!(err.is_retryable());
}

#[test]
fn canceled_maps_to_cancel_by_default() {
    assert_eq!(
        ExecutorError::Canceled.into_build_error(),
        BuildError::Canceled
    );
}

#[test]
fn io_errors_become_system_errors() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: ExecutorError = io.into();
    assert!(!err.is_job_error());
}
