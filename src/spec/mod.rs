//! Test units
//!
//! A test unit is one executable step of a scenario. Its concrete type is
//! supplied by a plugin; every unit embeds a [`Base`] holding the fields
//! the engine itself interprets (wait, timeout, index and so on).

mod timing;

pub use timing::{parse_duration, Timeout, Wait};

use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::common::Result;
use crate::context::Context;
use crate::node::Node;
use crate::plugin::Defaults;
use crate::reporter::Reporter;
use crate::result::RunResult;

/// Fields every test unit accepts in addition to its plugin's own
pub const BASE_FIELDS: &[&str] = &["name", "description", "wait", "timeout"];

/// Common fields of a test unit, parsed by shared code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Base {
    /// Zero-based position in the scenario's `tests` sequence
    pub index: usize,
    pub name: String,
    pub description: String,
    /// Per-plugin defaults of the owning scenario, shared by all its units
    pub defaults: Arc<Defaults>,
    pub wait: Option<Wait>,
    pub timeout: Option<Timeout>,
}

impl Base {
    /// Parse the base fields of a unit node. Plugin fields are ignored.
    pub fn from_node(node: &Node, index: usize, defaults: Arc<Defaults>) -> Result<Self> {
        let mut base = Base {
            index,
            defaults,
            ..Default::default()
        };
        for (key, value) in node.expect_mapping()? {
            match key.as_str() {
                "name" => base.name = value.expect_scalar()?.to_string(),
                "description" => base.description = value.expect_scalar()?.to_string(),
                "wait" => base.wait = Some(Wait::from_node(value)?),
                "timeout" => base.timeout = Some(Timeout::from_node(value)?),
                _ => {}
            }
        }
        Ok(base)
    }

    /// Name if set, else the description, else the position
    pub fn title(&self) -> String {
        if !self.name.is_empty() {
            self.name.clone()
        } else if !self.description.is_empty() {
            self.description.clone()
        } else {
            format!("test-{}", self.index)
        }
    }
}

/// An executable step produced by a plugin
#[async_trait]
pub trait TestUnit: fmt::Debug + Send + Sync {
    fn base(&self) -> &Base;

    fn base_mut(&mut self) -> &mut Base;

    fn set_base(&mut self, base: Base) {
        *self.base_mut() = base;
    }

    fn title(&self) -> String {
        self.base().title()
    }

    /// Execute the unit.
    ///
    /// Assertion failures belong in the returned [`RunResult`]; an `Err` is
    /// always recorded as a runtime error.
    async fn run(&self, ctx: &Context, reporter: &mut dyn Reporter) -> Result<RunResult>;

    fn as_any(&self) -> &dyn Any;
}

/// A test unit type that can be decoded from a document node
pub trait DecodeUnit: TestUnit + Sized + 'static {
    /// Name of this shape, used in diagnostics
    const KIND: &'static str;
    /// Plugin-specific fields this shape recognizes
    const FIELDS: &'static [&'static str];

    /// Decode the plugin fields of `node`. Unknown fields have already been
    /// rejected by the time this is called.
    fn decode(node: &Node) -> Result<Self>;
}

type DecodeFn = dyn Fn(&Node) -> Result<Box<dyn TestUnit>> + Send + Sync;

/// A prototype test unit shape offered by a plugin
#[derive(Clone)]
pub struct Shape {
    kind: &'static str,
    fields: &'static [&'static str],
    decode: Arc<DecodeFn>,
}

impl Shape {
    /// The shape of a [`DecodeUnit`] type
    pub fn of<T: DecodeUnit>() -> Self {
        Self {
            kind: T::KIND,
            fields: T::FIELDS,
            decode: Arc::new(decode_boxed::<T>),
        }
    }

    /// A shape with a custom decoder, for plugins that carry their own
    /// configuration into the units they produce
    pub fn new<F>(kind: &'static str, fields: &'static [&'static str], decode: F) -> Self
    where
        F: Fn(&Node) -> Result<Box<dyn TestUnit>> + Send + Sync + 'static,
    {
        Self {
            kind,
            fields,
            decode: Arc::new(decode),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Decode `node` into a fresh unit of this shape.
    ///
    /// Fails with `UnknownField` when the node has a key this shape does
    /// not recognize.
    pub fn decode(&self, node: &Node) -> Result<Box<dyn TestUnit>> {
        node.check_fields(self.fields)?;
        (self.decode)(node)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .finish()
    }
}

fn decode_boxed<T: DecodeUnit>(node: &Node) -> Result<Box<dyn TestUnit>> {
    Ok(Box::new(T::decode(node)?))
}
