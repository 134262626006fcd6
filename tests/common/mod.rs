//! Plugins and fixtures shared by the integration tests

#![allow(dead_code)]

use std::any::Any;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::Instant;

use yamltest::node::Node;
use yamltest::spec::parse_duration;
use yamltest::{
    Base, Context, DecodeUnit, Error, Fixture, Plugin, PluginDefaults, PluginInfo, Reporter,
    Result, RunResult, Shape, TestUnit,
};

pub const PRIOR_RUN_DATA_KEY: &str = "priorrun";

/// Path of a file under `tests/testdata`
pub fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join(name)
}

fn scalar(node: &Node, key: &str) -> Result<String> {
    match node.get(key) {
        Some(value) => Ok(value.expect_scalar()?.to_string()),
        None => Ok(String::new()),
    }
}

// === foo ===

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FooDefaults {
    #[serde(default)]
    pub bar: String,
    #[serde(default)]
    pub fail: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FooSpec {
    base: Base,
    pub foo: String,
}

impl DecodeUnit for FooSpec {
    const KIND: &'static str = "foo";
    const FIELDS: &'static [&'static str] = &["foo"];

    fn decode(node: &Node) -> Result<Self> {
        Ok(Self {
            base: Base::default(),
            foo: scalar(node, "foo")?,
        })
    }
}

#[async_trait]
impl TestUnit for FooSpec {
    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }

    async fn run(&self, _ctx: &Context, _reporter: &mut dyn Reporter) -> Result<RunResult> {
        let want = if self.base.name == "bar" { "bar" } else { "baz" };
        let mut res = RunResult::new();
        if self.foo != want {
            res.add_failure(format!("expected foo to be {want} but got {}", self.foo));
        }
        Ok(res)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct FooPlugin;

impl Plugin for FooPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("foo", "test plugin with a string field")
    }

    fn decode_defaults(&self, node: &Node) -> Result<Option<Box<dyn PluginDefaults>>> {
        let defaults: FooDefaults = node.decode()?;
        if defaults.fail {
            return Err(Error::Decode {
                pos: node.pos().clone(),
                message: "defaults parsing failed".to_string(),
            });
        }
        Ok(Some(Box::new(defaults)))
    }

    fn specs(&self) -> Vec<Shape> {
        vec![Shape::of::<FooSpec>()]
    }
}

/// A second plugin claiming the same nodes as [`FooPlugin`]
pub struct FooTwinPlugin;

impl Plugin for FooTwinPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("footwin", "test plugin overlapping foo")
    }

    fn specs(&self) -> Vec<Shape> {
        vec![Shape::of::<FooSpec>()]
    }
}

// === bar ===

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSpec {
    base: Base,
    pub bar: i64,
}

impl DecodeUnit for BarSpec {
    const KIND: &'static str = "bar";
    const FIELDS: &'static [&'static str] = &["bar"];

    fn decode(node: &Node) -> Result<Self> {
        let bar = match node.get("bar") {
            Some(value) => value.expect_int()?,
            None => 0,
        };
        Ok(Self {
            base: Base::default(),
            bar,
        })
    }
}

#[async_trait]
impl TestUnit for BarSpec {
    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }

    async fn run(&self, _ctx: &Context, _reporter: &mut dyn Reporter) -> Result<RunResult> {
        Ok(RunResult::new())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct BarPlugin;

impl Plugin for BarPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("bar", "test plugin with an int field")
    }

    fn specs(&self) -> Vec<Shape> {
        vec![Shape::of::<BarSpec>()]
    }
}

// === failer ===

/// Claims `foo` nodes and then always fails to decode them
#[derive(Debug, Default)]
pub struct FailSpec {
    base: Base,
}

impl DecodeUnit for FailSpec {
    const KIND: &'static str = "fail";
    const FIELDS: &'static [&'static str] = &["foo"];

    fn decode(node: &Node) -> Result<Self> {
        Err(Error::Decode {
            pos: node.pos().clone(),
            message: "Indy, bad dates!".to_string(),
        })
    }
}

#[async_trait]
impl TestUnit for FailSpec {
    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }

    async fn run(&self, _ctx: &Context, _reporter: &mut dyn Reporter) -> Result<RunResult> {
        Ok(RunResult::new())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct FailingPlugin;

impl Plugin for FailingPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("failer", "test plugin whose units never decode")
    }

    fn specs(&self) -> Vec<Shape> {
        vec![Shape::of::<FailSpec>()]
    }
}

// === priorRun ===

/// Hands `state` forward and checks the previous unit's `state` against
/// its own `prior`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorRunSpec {
    base: Base,
    pub state: String,
    pub prior: String,
}

impl DecodeUnit for PriorRunSpec {
    const KIND: &'static str = "priorRun";
    const FIELDS: &'static [&'static str] = &["state", "prior"];

    fn decode(node: &Node) -> Result<Self> {
        Ok(Self {
            base: Base::default(),
            state: scalar(node, "state")?,
            prior: scalar(node, "prior")?,
        })
    }
}

#[async_trait]
impl TestUnit for PriorRunSpec {
    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }

    async fn run(&self, ctx: &Context, _reporter: &mut dyn Reporter) -> Result<RunResult> {
        let mut res = RunResult::new().with_data(PRIOR_RUN_DATA_KEY, self.state.clone());
        let prior = ctx.prior_run();
        if self.base.index == 0 {
            if !prior.is_empty() {
                res.add_failure(format!("expected no prior run data, got {prior:?}"));
            }
        } else {
            match prior.get(PRIOR_RUN_DATA_KEY).and_then(|v| v.as_str()) {
                Some(got) if got == self.prior => {}
                other => res.add_failure(format!("expected prior {} but got {other:?}", self.prior)),
            }
        }
        Ok(res)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct PriorRunPlugin;

impl Plugin for PriorRunPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("priorRun", "test plugin passing data between units")
    }

    fn specs(&self) -> Vec<Shape> {
        vec![Shape::of::<PriorRunSpec>()]
    }
}

// === lifecycle ===

/// Sleeps for a while. With `honor_deadline` set, a sleep that would run
/// past the context deadline is refused with [`Error::DeadlineExceeded`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SleepSpec {
    base: Base,
    pub sleep: Duration,
    pub honor_deadline: bool,
}

impl DecodeUnit for SleepSpec {
    const KIND: &'static str = "sleep";
    const FIELDS: &'static [&'static str] = &["sleep", "honor_deadline"];

    fn decode(node: &Node) -> Result<Self> {
        let text = scalar(node, "sleep")?;
        let sleep = parse_duration(&text).map_err(|reason| {
            Error::invalid_duration(&text, node.get("sleep").unwrap_or(node).pos(), &reason)
        })?;
        let honor_deadline = match node.get("honor_deadline") {
            Some(value) => value.expect_bool()?,
            None => false,
        };
        Ok(Self {
            base: Base::default(),
            sleep,
            honor_deadline,
        })
    }
}

#[async_trait]
impl TestUnit for SleepSpec {
    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }

    async fn run(&self, ctx: &Context, _reporter: &mut dyn Reporter) -> Result<RunResult> {
        if self.honor_deadline {
            if let Some(deadline) = ctx.deadline() {
                if Instant::now() + self.sleep > deadline {
                    return Err(Error::DeadlineExceeded);
                }
            }
        }
        tokio::time::sleep(self.sleep).await;
        Ok(RunResult::new().with_data("slept", self.sleep.as_millis() as u64))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Returns its `error` message as a runtime error
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorSpec {
    base: Base,
    pub error: String,
}

impl DecodeUnit for ErrorSpec {
    const KIND: &'static str = "error";
    const FIELDS: &'static [&'static str] = &["error"];

    fn decode(node: &Node) -> Result<Self> {
        Ok(Self {
            base: Base::default(),
            error: scalar(node, "error")?,
        })
    }
}

#[async_trait]
impl TestUnit for ErrorSpec {
    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }

    async fn run(&self, _ctx: &Context, _reporter: &mut dyn Reporter) -> Result<RunResult> {
        Err(Error::Runtime(self.error.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct LifecyclePlugin;

impl Plugin for LifecyclePlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("lifecycle", "test plugin for timeouts and runtime errors")
    }

    fn specs(&self) -> Vec<Shape> {
        vec![Shape::of::<SleepSpec>(), Shape::of::<ErrorSpec>()]
    }
}

// === fixtures ===

/// Records start and stop calls into a shared log
pub struct RecordingFixture {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingFixture {
    pub fn new(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: Arc::clone(log),
        })
    }
}

impl Fixture for RecordingFixture {
    fn start(&self) {
        self.log.lock().unwrap().push(format!("start {}", self.name));
    }

    fn stop(&self) {
        self.log.lock().unwrap().push(format!("stop {}", self.name));
    }
}
