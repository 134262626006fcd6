//! Test reporting sinks
//!
//! The engine opens one named scope per scenario and test units may open
//! nested scopes of their own. Inside a scope, results are recorded as
//! passes, failures or fatal failures.

use colored::Colorize;

/// A structured, nestable test-reporting sink
pub trait Reporter: Send {
    /// Open a named sub-test scope
    fn enter(&mut self, name: &str);

    /// Close the innermost scope
    fn leave(&mut self);

    fn pass(&mut self, msg: &str);

    fn fail(&mut self, msg: &str);

    /// A failure that ends the current scope's run
    fn fatal(&mut self, msg: &str);

    /// Whether any failure has been recorded
    fn failed(&self) -> bool;
}

/// One recorded reporting call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Enter(String),
    Leave,
    Pass(String),
    Fail(String),
    Fatal(String),
}

/// Reporter that records every call, for tests and embedding
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Vec<ReportEvent>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    /// Messages of all `Fail` and `Fatal` events
    pub fn failures(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Fail(msg) | ReportEvent::Fatal(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names of all opened scopes, in order
    pub fn scopes(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Enter(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn enter(&mut self, name: &str) {
        self.events.push(ReportEvent::Enter(name.to_string()));
    }

    fn leave(&mut self) {
        self.events.push(ReportEvent::Leave);
    }

    fn pass(&mut self, msg: &str) {
        self.events.push(ReportEvent::Pass(msg.to_string()));
    }

    fn fail(&mut self, msg: &str) {
        self.events.push(ReportEvent::Fail(msg.to_string()));
    }

    fn fatal(&mut self, msg: &str) {
        self.events.push(ReportEvent::Fatal(msg.to_string()));
    }

    fn failed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, ReportEvent::Fail(_) | ReportEvent::Fatal(_)))
    }
}

/// Reporter that prints an indented, colored tree to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    verbose: bool,
    /// Open scopes and whether each has seen a failure
    scopes: Vec<(String, bool)>,
    passed: usize,
    failed: usize,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..Default::default()
        }
    }

    pub fn passed_count(&self) -> usize {
        self.passed
    }

    pub fn failed_count(&self) -> usize {
        self.failed
    }

    fn indent(&self) -> String {
        "  ".repeat(self.scopes.len())
    }

    fn mark_failed(&mut self) {
        self.failed += 1;
        for scope in &mut self.scopes {
            scope.1 = true;
        }
    }
}

impl Reporter for ConsoleReporter {
    fn enter(&mut self, name: &str) {
        println!("{}{}", self.indent(), name.white().bold());
        self.scopes.push((name.to_string(), false));
    }

    fn leave(&mut self) {
        if let Some((name, failed)) = self.scopes.pop() {
            if self.verbose || failed {
                let mark = if failed { "✗".red() } else { "✓".green() };
                println!("{}{} {}", self.indent(), mark, name.dimmed());
            }
        }
    }

    fn pass(&mut self, msg: &str) {
        self.passed += 1;
        println!("{}{} {}", self.indent(), "✓".green(), msg.dimmed());
    }

    fn fail(&mut self, msg: &str) {
        self.mark_failed();
        println!("{}{} {}", self.indent(), "✗".red(), msg);
    }

    fn fatal(&mut self, msg: &str) {
        self.mark_failed();
        println!("{}{} {}", self.indent(), "✗ fatal:".red().bold(), msg);
    }

    fn failed(&self) -> bool {
        self.failed > 0
    }
}
