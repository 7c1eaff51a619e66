// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job variables and the effective variable set.

use serde::{Deserialize, Serialize};

/// A single key/value variable attached to a job or runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobVariable {
    pub key: String,
    pub value: String,
    /// Visible to forks / exposed in UI
    #[serde(default)]
    pub public: bool,
    /// Value must never appear verbatim in trace output
    #[serde(default)]
    pub masked: bool,
    /// Materialized as a file, with the variable expanding to its path
    #[serde(default)]
    pub file: bool,
    /// Injected by the runner rather than declared on the job
    #[serde(default)]
    pub internal: bool,
}

impl JobVariable {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        JobVariable {
            key: key.into(),
            value: value.into(),
            public: false,
            masked: false,
            file: false,
            internal: false,
        }
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }
}

/// Ordered union of runner-declared and job-declared variables.
///
/// Computed once per run and read-only afterwards. Lookups are last-wins,
/// so job variables override runner variables of the same key.
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    vars: Vec<JobVariable>,
}

impl VariableSet {
    /// Runner variables first, then job variables, so the job wins on clashes.
    pub fn new(runner_vars: &[JobVariable], job_vars: &[JobVariable]) -> Self {
        let mut vars = Vec::with_capacity(runner_vars.len() + job_vars.len());
        vars.extend_from_slice(runner_vars);
        vars.extend_from_slice(job_vars);
        VariableSet { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .rev()
            .find(|v| v.key == key)
            .map(|v| v.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobVariable> {
        self.vars.iter()
    }

    /// Values that must be replaced in trace output.
    pub fn masked_values(&self) -> Vec<String> {
        let mut values: Vec<String> = self
            .vars
            .iter()
            .filter(|v| v.masked && !v.value.is_empty())
            .map(|v| v.value.clone())
            .collect();
        values.sort();
        values.dedup();
        values
    }

    pub fn public_only(&self) -> impl Iterator<Item = &JobVariable> {
        self.vars.iter().filter(|v| v.public)
    }

    /// Expand `$KEY` and `${KEY}` references against this set.
    ///
    /// Unknown keys expand to the empty string; `$$` escapes a literal `$`.
    pub fn expand(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut chars = input.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            match chars.peek() {
                Some((_, '$')) => {
                    chars.next();
                    out.push('$');
                }
                Some((_, '{')) => {
                    chars.next();
                    let mut key = String::new();
                    let mut closed = false;
                    for (_, k) in chars.by_ref() {
                        if k == '}' {
                            closed = true;
                            break;
                        }
                        key.push(k);
                    }
                    if closed {
                        if let Some(value) = self.get(&key) {
                            out.push_str(value);
                        }
                    } else {
                        // Unterminated ${ is kept literally
                        out.push_str("${");
                        out.push_str(&key);
                    }
                }
                Some((_, k)) if k.is_ascii_alphanumeric() || *k == '_' => {
                    let mut key = String::new();
                    while let Some((_, k)) = chars.peek() {
                        if k.is_ascii_alphanumeric() || *k == '_' {
                            key.push(*k);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if let Some(value) = self.get(&key) {
                        out.push_str(value);
                    }
                }
                _ => out.push('$'),
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "variables_tests.rs"]
mod tests;
