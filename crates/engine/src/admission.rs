// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission gate: per-runner-identity concurrency bounds.
//!
//! Two independent slot pools per identity — job requests (bounded by
//! `request_concurrency`) and job executions (bounded by `limit`, 0 meaning
//! unlimited) — plus a registry of in-flight jobs for out-of-band lookup.
//! Acquisition never blocks; callers poll or back off. Over-release is
//! reported as a false return, never a panic.

use gantry_core::{Job, RunnerIdentity, RunnerSettings};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct SlotCounts {
    requests: usize,
    builds: usize,
}

/// One in-flight job visible to introspection and session routing.
#[derive(Debug, Clone)]
pub struct ActiveJob {
    registration: u64,
    pub job_id: u64,
    pub url: String,
    pub session_url: Option<String>,
}

/// Process-wide registry bounding per-identity concurrency.
///
/// Per-identity counters sit behind their own mutex so runners never contend
/// with each other; the outer map lock is held only for lookup/insert.
#[derive(Default)]
pub struct AdmissionGate {
    slots: RwLock<HashMap<RunnerIdentity, Arc<Mutex<SlotCounts>>>>,
    active: Mutex<Vec<ActiveJob>>,
    next_registration: AtomicU64,
}

impl AdmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn counts(&self, identity: &RunnerIdentity) -> Arc<Mutex<SlotCounts>> {
        if let Some(entry) = self.slots.read().get(identity) {
            return entry.clone();
        }
        self.slots
            .write()
            .entry(identity.clone())
            .or_default()
            .clone()
    }

    /// Try to take a request slot; false when the identity is at its
    /// request concurrency.
    pub fn acquire_request(&self, runner: &RunnerSettings) -> bool {
        let entry = self.counts(&runner.identity());
        let mut counts = entry.lock();
        if counts.requests >= runner.effective_request_concurrency() {
            return false;
        }
        counts.requests += 1;
        true
    }

    /// Return a request slot; false when none was outstanding.
    pub fn release_request(&self, runner: &RunnerSettings) -> bool {
        let entry = self.counts(&runner.identity());
        let mut counts = entry.lock();
        if counts.requests == 0 {
            return false;
        }
        counts.requests -= 1;
        true
    }

    /// Try to take a build slot; a limit of 0 always succeeds.
    pub fn acquire_build(&self, runner: &RunnerSettings) -> bool {
        let entry = self.counts(&runner.identity());
        let mut counts = entry.lock();
        if runner.limit > 0 && counts.builds as u64 >= runner.limit {
            return false;
        }
        counts.builds += 1;
        true
    }

    /// Return a build slot; false when none was outstanding.
    pub fn release_build(&self, runner: &RunnerSettings) -> bool {
        let entry = self.counts(&runner.identity());
        let mut counts = entry.lock();
        if counts.builds == 0 {
            return false;
        }
        counts.builds -= 1;
        true
    }

    /// Register an in-flight job for introspection and session routing.
    ///
    /// The registration is removed when the returned guard drops.
    pub fn add_build(self: &Arc<Self>, job: &Job) -> BuildRegistration {
        let registration = self.next_registration.fetch_add(1, Ordering::Relaxed);
        self.active.lock().push(ActiveJob {
            registration,
            job_id: job.id,
            url: job.url.clone(),
            session_url: job.session_url.clone(),
        });
        BuildRegistration {
            gate: self.clone(),
            registration,
        }
    }

    /// Find the in-flight job whose session endpoint is a prefix of `path`.
    ///
    /// Returns None (not an error) when no active job matches.
    pub fn find_session_by_url(&self, path: &str) -> Option<ActiveJob> {
        self.active
            .lock()
            .iter()
            .find(|job| {
                job.session_url
                    .as_deref()
                    .is_some_and(|endpoint| path.starts_with(endpoint))
            })
            .cloned()
    }

    /// One `url=<job-url>` line per active job, for the debug listing.
    pub fn list_active_jobs(&self) -> Vec<String> {
        self.active
            .lock()
            .iter()
            .map(|job| format!("url={}", job.url))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

/// Guard for one registered in-flight job.
pub struct BuildRegistration {
    gate: Arc<AdmissionGate>,
    registration: u64,
}

impl Drop for BuildRegistration {
    fn drop(&mut self) {
        self.gate
            .active
            .lock()
            .retain(|job| job.registration != self.registration);
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
