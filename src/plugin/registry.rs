//! Plugin registry
//!
//! Stores plugins by lowercased name and is safe to share between threads.
//! Listing returns plugins in registration order so that spec resolution
//! probes them in a stable, explicit order.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Plugin;

#[derive(Default)]
pub struct PluginRegistry {
    entries: RwLock<Vec<(String, Arc<dyn Plugin>)>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, replacing any plugin with the same name in place
    pub fn add(&self, plugin: Arc<dyn Plugin>) {
        let name = plugin.info().name.to_lowercase();
        let mut entries = self.write();

        for (other, existing) in entries.iter() {
            if *other == name {
                continue;
            }
            for field in overlapping_fields(existing.as_ref(), plugin.as_ref()) {
                tracing::warn!(
                    plugin = %name,
                    other = %other,
                    field,
                    "plugins declare the same spec field; the first registered plugin claims nodes using only shared fields"
                );
            }
        }

        match entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = plugin,
            None => entries.push((name.clone(), plugin)),
        }
        tracing::debug!(plugin = %name, "registered plugin");
    }

    /// Delist the plugin with the same name as `plugin`
    pub fn remove(&self, plugin: &dyn Plugin) {
        self.remove_named(&plugin.info().name);
    }

    pub fn remove_named(&self, name: &str) {
        let lowered = name.to_lowercase();
        self.write().retain(|(n, _)| *n != lowered);
    }

    /// Look up a plugin by case-insensitive name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        let lowered = name.to_lowercase();
        self.read()
            .iter()
            .find(|(n, _)| *n == lowered)
            .map(|(_, p)| Arc::clone(p))
    }

    /// Snapshot of all registered plugins, in registration order
    pub fn list(&self) -> Vec<Arc<dyn Plugin>> {
        self.read().iter().map(|(_, p)| Arc::clone(p)).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Writers never leave the Vec half-updated; poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, Vec<(String, Arc<dyn Plugin>)>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<(String, Arc<dyn Plugin>)>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn overlapping_fields(a: &dyn Plugin, b: &dyn Plugin) -> Vec<&'static str> {
    let theirs: Vec<&'static str> = a.specs().iter().flat_map(|s| s.fields().iter().copied()).collect();
    let mut shared: Vec<&'static str> = b
        .specs()
        .iter()
        .flat_map(|s| s.fields().iter().copied())
        .filter(|f| theirs.contains(f))
        .collect();
    shared.sort_unstable();
    shared.dedup();
    shared
}
