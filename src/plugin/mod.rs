//! Plugins supply test unit shapes and decode their default configuration

mod registry;

pub use registry::PluginRegistry;

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::common::Result;
use crate::node::Node;
use crate::spec::Shape;

/// Descriptive information about a plugin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginInfo {
    /// Unique (case-insensitive) name, also the key under `defaults`
    pub name: String,
    pub description: String,
}

impl PluginInfo {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// A source of test unit shapes
pub trait Plugin: Send + Sync {
    fn info(&self) -> PluginInfo;

    /// Decode this plugin's section of a scenario's `defaults` mapping.
    ///
    /// Returning `Ok(None)` stores nothing for the plugin.
    fn decode_defaults(&self, _node: &Node) -> Result<Option<Box<dyn PluginDefaults>>> {
        Ok(None)
    }

    /// Prototype shapes, in the order they should be probed
    fn specs(&self) -> Vec<Shape>;
}

/// Decoded default configuration of one plugin
pub trait PluginDefaults: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn dyn_eq(&self, other: &dyn PluginDefaults) -> bool;
}

impl<T: Any + fmt::Debug + PartialEq + Send + Sync> PluginDefaults for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn PluginDefaults) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }
}

/// Decoded defaults of a scenario, keyed by plugin name
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    entries: BTreeMap<String, Arc<dyn PluginDefaults>>,
}

impl Defaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, plugin: &str, defaults: Box<dyn PluginDefaults>) {
        self.entries.insert(plugin.to_lowercase(), Arc::from(defaults));
    }

    /// Typed access to one plugin's defaults
    pub fn get<T: PluginDefaults>(&self, plugin: &str) -> Option<&T> {
        self.entries
            .get(&plugin.to_lowercase())
            .and_then(|d| d.as_any().downcast_ref::<T>())
    }

    pub fn contains(&self, plugin: &str) -> bool {
        self.entries.contains_key(&plugin.to_lowercase())
    }

    pub fn plugins(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Defaults {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va.dyn_eq(vb.as_ref()))
    }
}
