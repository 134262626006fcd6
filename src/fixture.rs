//! Fixtures: named external resources with a start/stop lifecycle

use std::sync::Arc;

/// A resource a scenario can `require`
pub trait Fixture: Send + Sync {
    fn start(&self);

    fn stop(&self);
}

/// Stops the fixtures it holds, in reverse start order, when dropped.
///
/// The engine keeps one of these alive for the duration of a scenario run,
/// so fixtures are stopped on every exit path: normal return, an aborted
/// run, a panicking unit, or a cancelled future.
#[derive(Default)]
pub struct FixtureGuard {
    started: Vec<(String, Arc<dyn Fixture>)>,
}

impl FixtureGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `fixture` and take responsibility for stopping it
    pub fn start(&mut self, name: &str, fixture: Arc<dyn Fixture>) {
        tracing::debug!(fixture = name, "starting fixture");
        fixture.start();
        self.started.push((name.to_string(), fixture));
    }

    pub fn len(&self) -> usize {
        self.started.len()
    }

    pub fn is_empty(&self) -> bool {
        self.started.is_empty()
    }
}

impl Drop for FixtureGuard {
    fn drop(&mut self) {
        while let Some((name, fixture)) = self.started.pop() {
            tracing::debug!(fixture = %name, "stopping fixture");
            fixture.stop();
        }
    }
}
