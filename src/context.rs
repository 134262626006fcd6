//! Execution context
//!
//! A [`Context`] carries the shared state of a run: the debug sink, the
//! plugins used for resolution, the fixture table, data handed forward by
//! earlier test units and the deadline of the current unit. It is never
//! mutated in place; every `with_*`/`register_*`/`store_*` call returns a
//! new layer and leaves the receiver untouched. Layers share their
//! unchanged parts through `Arc`s, so they are cheap to clone.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::debug::DebugSink;
use crate::fixture::Fixture;
use crate::plugin::Plugin;
use crate::result::RunData;

#[derive(Clone, Default)]
pub struct Context {
    debug: Option<DebugSink>,
    plugins: Arc<Vec<Arc<dyn Plugin>>>,
    fixtures: Arc<HashMap<String, Arc<dyn Fixture>>>,
    prior_run: Arc<RunData>,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(&self, sink: DebugSink) -> Self {
        Self {
            debug: Some(sink),
            ..self.clone()
        }
    }

    pub fn with_plugins(&self, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self {
            plugins: Arc::new(plugins),
            ..self.clone()
        }
    }

    /// Replace the fixture table. Names are matched case-insensitively.
    pub fn with_fixtures(&self, fixtures: HashMap<String, Arc<dyn Fixture>>) -> Self {
        let fixtures = fixtures
            .into_iter()
            .map(|(name, f)| (name.to_lowercase(), f))
            .collect();
        Self {
            fixtures: Arc::new(fixtures),
            ..self.clone()
        }
    }

    /// Add one named fixture to the existing table
    pub fn register_fixture(&self, name: &str, fixture: Arc<dyn Fixture>) -> Self {
        let mut fixtures = (*self.fixtures).clone();
        fixtures.insert(name.to_lowercase(), fixture);
        Self {
            fixtures: Arc::new(fixtures),
            ..self.clone()
        }
    }

    /// Add a plugin unless one with the same name is already present
    pub fn register_plugin(&self, plugin: Arc<dyn Plugin>) -> Self {
        let name = plugin.info().name;
        if self
            .plugins
            .iter()
            .any(|p| p.info().name.eq_ignore_ascii_case(&name))
        {
            return self.clone();
        }
        let mut plugins = (*self.plugins).clone();
        plugins.push(plugin);
        Self {
            plugins: Arc::new(plugins),
            ..self.clone()
        }
    }

    /// Merge `data` over the prior-run data already in the context
    pub fn store_prior_run(&self, data: &RunData) -> Self {
        let mut merged = (*self.prior_run).clone();
        merged.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            prior_run: Arc::new(merged),
            ..self.clone()
        }
    }

    /// A child layer that expires after `timeout`. An earlier deadline
    /// inherited from the parent is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            deadline: Some(match self.deadline {
                Some(existing) if existing < deadline => existing,
                _ => deadline,
            }),
            ..self.clone()
        }
    }

    pub fn debug(&self) -> Option<&DebugSink> {
        self.debug.as_ref()
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub fn fixtures(&self) -> &HashMap<String, Arc<dyn Fixture>> {
        &self.fixtures
    }

    /// Look up a fixture by case-insensitive name
    pub fn fixture(&self, name: &str) -> Option<Arc<dyn Fixture>> {
        self.fixtures.get(&name.to_lowercase()).cloned()
    }

    pub fn prior_run(&self) -> &RunData {
        &self.prior_run
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether this context's deadline has passed
    pub fn timed_out(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<String> = self.plugins.iter().map(|p| p.info().name).collect();
        let mut fixtures: Vec<&String> = self.fixtures.keys().collect();
        fixtures.sort();
        f.debug_struct("Context")
            .field("debug", &self.debug.is_some())
            .field("plugins", &plugins)
            .field("fixtures", &fixtures)
            .field("prior_run", &self.prior_run)
            .field("deadline", &self.deadline)
            .finish()
    }
}
