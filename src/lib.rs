//! yamltest - a declarative, plugin-extensible test scenario engine
//!
//! Scenarios are YAML documents whose `tests` are resolved into typed test
//! units by probing registered plugins, then run in order with shared
//! fixture, timeout, wait and data-propagation semantics.

pub mod cli;
pub mod commands;
pub mod common;
pub mod context;
pub mod debug;
pub mod exec;
pub mod fixture;
pub mod node;
pub mod plugin;
pub mod reporter;
pub mod result;
pub mod scenario;
pub mod spec;

// Re-export commonly used types for tests and embedders
pub use common::{Error, ErrorKind, Result, RuntimeErrors};
pub use context::Context;
pub use fixture::Fixture;
pub use node::Node;
pub use plugin::{Defaults, Plugin, PluginDefaults, PluginInfo, PluginRegistry};
pub use reporter::{ConsoleReporter, RecordingReporter, ReportEvent, Reporter};
pub use result::{RunData, RunResult};
pub use scenario::Scenario;
pub use spec::{Base, DecodeUnit, Shape, TestUnit, Timeout, Wait};
