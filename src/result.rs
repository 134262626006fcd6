//! Outcome of a single test unit run
//!
//! A [`RunResult`] serves two purposes. It returns the unit's runtime error,
//! if any, separately from its assertion failures. And it hands data about
//! the run back to the engine: `data` is merged into the context seen by
//! later units (for example, a previous HTTP response), while `vars` holds
//! values the scenario author asked to capture.

use std::collections::HashMap;

use crate::common::{Error, ErrorKind};

/// Data passed between test units, keyed by plugin-chosen names
pub type RunData = HashMap<String, serde_json::Value>;

#[derive(Debug, Default)]
pub struct RunResult {
    /// Always a runtime-classified error
    err: Option<Error>,
    /// Assertion failures; never runtime errors
    failures: Vec<String>,
    data: Option<RunData>,
    vars: Option<RunData>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a runtime error.
    ///
    /// # Panics
    ///
    /// Panics if `err` is not a runtime error. Returning a parse error or
    /// an ambient error here is a bug in the plugin, and accepting it would
    /// blur the line between runtime errors and assertion failures.
    pub fn with_runtime_error(mut self, err: Error) -> Self {
        assert!(
            err.is(ErrorKind::Runtime),
            "expected {err} to be a runtime error"
        );
        self.err = Some(err);
        self
    }

    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.set_data(key, value);
        self
    }

    pub fn with_var(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.set_var(key, value);
        self
    }

    pub fn with_failures<I, S>(mut self, failures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_failures(failures);
        self
    }

    pub fn set_data(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.data
            .get_or_insert_with(RunData::new)
            .insert(key.to_string(), value.into());
    }

    pub fn set_var(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.vars
            .get_or_insert_with(RunData::new)
            .insert(key.to_string(), value.into());
    }

    pub fn set_failures<I, S>(&mut self, failures: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failures = failures.into_iter().map(Into::into).collect();
    }

    /// Record one more assertion failure
    pub fn add_failure(&mut self, failure: impl Into<String>) {
        self.failures.push(failure.into());
    }

    pub fn has_runtime_error(&self) -> bool {
        self.err.is_some()
    }

    pub fn runtime_error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Take the runtime error out of the result
    pub fn take_runtime_error(&mut self) -> Option<Error> {
        self.err.take()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn has_vars(&self) -> bool {
        self.vars.is_some()
    }

    pub fn data(&self) -> Option<&RunData> {
        self.data.as_ref()
    }

    pub fn vars(&self) -> Option<&RunData> {
        self.vars.as_ref()
    }

    /// Whether any assertion failed
    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}
