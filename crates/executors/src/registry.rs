// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor provider registry.
//!
//! Explicitly constructed at process start and injected into the engine;
//! never a package-level global, so tests can build their own.

use crate::contract::ExecutorProvider;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct ExecutorRegistry {
    providers: HashMap<String, Arc<dyn ExecutorProvider>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under a backend name, replacing any previous one.
    pub fn register<S: Into<String>>(&mut self, name: S, provider: Arc<dyn ExecutorProvider>) {
        let name = name.into();
        if self.providers.insert(name.clone(), provider).is_some() {
            tracing::warn!(backend = %name, "executor provider replaced");
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn ExecutorProvider>> {
        self.providers.get(name).cloned()
    }

    /// Registered backend names, sorted for stable diagnostics.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
