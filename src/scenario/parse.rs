//! Spec resolution
//!
//! Turns a document into a [`Scenario`]. Each element of `tests` is offered
//! to every shape of every plugin, in plugin registration order. A shape
//! claims a node when the node has no field the shape does not recognize.
//! The first shape to claim a node decodes it.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use super::Scenario;
use crate::common::{Error, ErrorKind, Result};
use crate::context::Context;
use crate::node::Node;
use crate::plugin::{Defaults, Plugin};
use crate::spec::{Base, Shape, TestUnit, Timeout};

/// Key of the scenario-wide timeout inside `defaults`
const DEFAULT_TIMEOUT_KEY: &str = "timeout";

impl Scenario {
    /// Load and resolve the scenario document at `path`
    pub fn from_path(path: impl AsRef<Path>, ctx: &Context) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_yaml_str(&text, path, ctx)
    }

    /// Resolve a scenario document read from `reader`
    pub fn from_reader<R: Read>(mut reader: R, path: impl AsRef<Path>, ctx: &Context) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_yaml_str(&text, path, ctx)
    }

    /// Resolve a scenario document held in memory
    pub fn from_yaml_str(text: &str, path: impl AsRef<Path>, ctx: &Context) -> Result<Self> {
        let path = path.as_ref();
        let node = Node::from_yaml_str(text).map_err(|e| Error::parse_in(&path.display().to_string(), e))?;
        Self::from_node(&node, path, ctx)
    }

    /// Resolve an already-decoded document using the context's plugins.
    ///
    /// Every failure is wrapped in [`Error::Parse`] naming `path`; the
    /// wrapped error keeps its own classification.
    pub fn from_node(node: &Node, path: impl AsRef<Path>, ctx: &Context) -> Result<Self> {
        let path = path.as_ref();
        resolve(node, path, ctx.plugins()).map_err(|e| Error::parse_in(&path.display().to_string(), e))
    }
}

fn resolve(node: &Node, path: &Path, plugins: &[Arc<dyn Plugin>]) -> Result<Scenario> {
    let mut scenario = Scenario::new(path);
    if node.is_null() {
        return Ok(scenario);
    }

    let mut defaults_node = None;
    let mut tests_node = None;
    for (key, value) in node.expect_mapping()? {
        match key.as_str() {
            "name" => scenario.name = value.expect_scalar()?.to_string(),
            "description" => scenario.description = value.expect_scalar()?.to_string(),
            "require" => {
                if !value.is_null() {
                    scenario.require = value
                        .expect_sequence()?
                        .iter()
                        .map(|n| n.expect_scalar().map(str::to_string))
                        .collect::<Result<_>>()?;
                }
            }
            "defaults" => defaults_node = Some(value),
            "tests" => tests_node = Some(value),
            _ => return Err(Error::unknown_field(key, value.pos())),
        }
    }

    let defaults = Arc::new(match defaults_node {
        Some(node) => {
            scenario.timeout = default_timeout(node)?;
            decode_defaults(node, plugins)?
        }
        None => Defaults::new(),
    });

    if let Some(tests) = tests_node.filter(|n| !n.is_null()) {
        for (index, unit_node) in tests.expect_sequence()?.iter().enumerate() {
            let unit = resolve_unit(unit_node, index, plugins, &defaults)?;
            scenario.tests.push(unit);
        }
    }
    scenario.defaults = defaults;

    tracing::debug!(
        scenario = %scenario.title(),
        tests = scenario.tests.len(),
        "resolved scenario"
    );
    Ok(scenario)
}

/// The `defaults.timeout` section, applied to units without a timeout
fn default_timeout(node: &Node) -> Result<Option<Timeout>> {
    match node.get(DEFAULT_TIMEOUT_KEY) {
        Some(section) if !section.is_null() => Ok(Some(Timeout::from_node(section)?)),
        _ => Ok(None),
    }
}

/// Hand each plugin its named section of the `defaults` mapping
fn decode_defaults(node: &Node, plugins: &[Arc<dyn Plugin>]) -> Result<Defaults> {
    let mut defaults = Defaults::new();
    if node.is_null() {
        return Ok(defaults);
    }
    let entries = node.expect_mapping()?;
    for plugin in plugins {
        let name = plugin.info().name;
        if name.eq_ignore_ascii_case(DEFAULT_TIMEOUT_KEY) {
            tracing::warn!(plugin = %name, "plugin name collides with defaults.timeout; section not passed on");
            continue;
        }
        let section = entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
            .map(|(_, value)| value);
        if let Some(section) = section {
            if let Some(decoded) = plugin.decode_defaults(section)? {
                defaults.insert(&name, decoded);
            }
        }
    }
    for (key, _) in entries.iter().filter(|(key, _)| key.as_str() != DEFAULT_TIMEOUT_KEY) {
        if !plugins.iter().any(|p| p.info().name.eq_ignore_ascii_case(key)) {
            tracing::debug!(section = %key, "no registered plugin for defaults section");
        }
    }
    Ok(defaults)
}

/// Decode `node` with the first shape that claims it
fn resolve_unit(
    node: &Node,
    index: usize,
    plugins: &[Arc<dyn Plugin>],
    defaults: &Arc<Defaults>,
) -> Result<Box<dyn TestUnit>> {
    node.expect_mapping()?;

    let mut claimed: Option<(String, Shape)> = None;
    for plugin in plugins {
        let plugin_name = plugin.info().name;
        for shape in plugin.specs() {
            match node.check_fields(shape.fields()) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::UnknownField => continue,
                Err(e) => return Err(e),
            }
            let owner = format!("{}/{}", plugin_name, shape.kind());
            match &claimed {
                Some((first, _)) => {
                    tracing::warn!(pos = %node.pos(), first = %first, other = %owner, "spec also claimed by a later shape");
                }
                None => claimed = Some((owner, shape)),
            }
        }
    }

    let (owner, shape) = claimed.ok_or_else(|| Error::UnknownSpec(node.pos().clone()))?;
    tracing::trace!(index, owner = %owner, "spec claimed");

    let mut unit = shape.decode(node)?;
    unit.set_base(Base::from_node(node, index, Arc::clone(defaults))?);
    Ok(unit)
}
