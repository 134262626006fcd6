//! Scenarios
//!
//! A scenario is one parsed test-case document: a set of test units
//! resolved from registered plugins, plus the defaults and fixtures they
//! share. Documents are resolved into scenarios by `Scenario::from_*` and
//! executed by `Scenario::run`.

mod parse;
mod run;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::plugin::Defaults;
use crate::spec::{TestUnit, Timeout};

#[derive(Debug)]
pub struct Scenario {
    /// Path of the document this scenario was loaded from
    pub path: PathBuf,
    /// Short name as written; see [`Scenario::title`] for the fallback
    pub name: String,
    pub description: String,
    /// Decoded per-plugin defaults, shared with every test unit
    pub defaults: Arc<Defaults>,
    /// `defaults.timeout`, used by units that set no timeout of their own
    pub timeout: Option<Timeout>,
    /// Fixtures to start before the first unit, in order
    pub require: Vec<String>,
    /// Resolved test units; `tests[i].base().index == i`
    pub tests: Vec<Box<dyn TestUnit>>,
}

impl Scenario {
    /// An empty scenario for `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            name: String::new(),
            description: String::new(),
            defaults: Arc::default(),
            timeout: None,
            require: Vec::new(),
            tests: Vec::new(),
        }
    }

    /// The name, or the file name of the path if there is no name
    pub fn title(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
