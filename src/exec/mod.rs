//! Built-in `exec` plugin
//!
//! Runs a command, directly or through a shell, and asserts on its exit
//! code and output:
//!
//! ```yaml
//! defaults:
//!   exec:
//!     shell: bash
//! tests:
//!   - exec: ls /this/dir/does/not/exist
//!     assert:
//!       exit_code: 2
//!       err:
//!         contains: No such file
//! ```

mod action;
mod assertion;
mod spec;

pub use action::{Action, Outcome};
pub use assertion::{Expect, PipeExpect};
pub use spec::{ExecSpec, OnResult, VarCapture};

use serde::Deserialize;

use crate::common::{Error, Result};
use crate::node::{Node, Position};
use crate::plugin::{Plugin, PluginDefaults, PluginInfo};
use crate::spec::{DecodeUnit, Shape, TestUnit};

pub const PLUGIN_NAME: &str = "exec";

/// The `defaults.exec` section of a scenario
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecDefaults {
    #[serde(default)]
    pub shell: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExecPlugin {
    /// Shell used when neither a unit nor its scenario names one
    shell: Option<String>,
}

impl ExecPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shell(shell: Option<String>) -> Self {
        Self { shell }
    }
}

impl Plugin for ExecPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new(PLUGIN_NAME, "Execute commands and assert on their exit code and output")
    }

    fn decode_defaults(&self, node: &Node) -> Result<Option<Box<dyn PluginDefaults>>> {
        if node.is_null() {
            return Ok(None);
        }
        let defaults: ExecDefaults = node.decode()?;
        if let Some(shell) = &defaults.shell {
            check_shell(shell, node.get("shell").unwrap_or(node).pos())?;
        }
        Ok(Some(Box::new(defaults)))
    }

    fn specs(&self) -> Vec<Shape> {
        let shell = self.shell.clone();
        vec![Shape::new(ExecSpec::KIND, ExecSpec::FIELDS, move |node| {
            let spec = ExecSpec::decode(node)?.with_fallback_shell(shell.clone());
            let unit: Box<dyn TestUnit> = Box::new(spec);
            Ok(unit)
        })]
    }
}

/// A shell must be an executable on `PATH` (or a path to one)
fn check_shell(shell: &str, pos: &Position) -> Result<()> {
    which::which(shell).map(|_| ()).map_err(|_| Error::UnknownShell {
        shell: shell.to_string(),
        pos: pos.clone(),
    })
}
