//! The exec test unit

use std::any::Any;

use async_trait::async_trait;
use serde::Deserialize;

use super::action::{Action, Outcome};
use super::assertion::Expect;
use super::ExecDefaults;
use crate::common::{Error, Result};
use crate::context::Context;
use crate::debug;
use crate::node::Node;
use crate::reporter::Reporter;
use crate::result::RunResult;
use crate::spec::{Base, DecodeUnit, TestUnit};

/// Names to store command results under in the run's `vars`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarCapture {
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub exit_code: Option<String>,
}

impl VarCapture {
    fn capture(&self, outcome: &Outcome, res: &mut RunResult) {
        if let Some(name) = self.stdout.as_deref().filter(|n| !n.is_empty()) {
            res.set_var(name, outcome.stdout.trim_end());
        }
        if let Some(name) = self.stderr.as_deref().filter(|n| !n.is_empty()) {
            res.set_var(name, outcome.stderr.trim_end());
        }
        if let Some(name) = self.exit_code.as_deref().filter(|n| !n.is_empty()) {
            res.set_var(name, outcome.exit_code);
        }
    }
}

/// Actions to take depending on the unit's assertions
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OnResult {
    /// Run when any assertion fails, typically to dump diagnostics
    #[serde(default)]
    pub fail: Option<Action>,
}

#[derive(Deserialize)]
struct RawExecSpec {
    exec: String,
    #[serde(default)]
    shell: Option<String>,
    #[serde(default)]
    assert: Option<Expect>,
    #[serde(default)]
    var: Option<VarCapture>,
    #[serde(default)]
    on: Option<OnResult>,
}

/// Runs a command and checks its exit code and output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecSpec {
    base: Base,
    pub action: Action,
    pub assert: Option<Expect>,
    pub var: Option<VarCapture>,
    pub on: Option<OnResult>,
    /// Shell from the plugin configuration, used when neither the unit nor
    /// the scenario defaults name one
    pub fallback_shell: Option<String>,
}

impl ExecSpec {
    pub fn with_fallback_shell(mut self, shell: Option<String>) -> Self {
        self.fallback_shell = shell;
        self
    }

    /// Shell to use when the unit does not name its own
    fn default_shell(&self) -> Option<&str> {
        self.base
            .defaults
            .get::<ExecDefaults>(super::PLUGIN_NAME)
            .and_then(|d| d.shell.as_deref())
            .or(self.fallback_shell.as_deref())
    }

    async fn run_on_fail(&self, ctx: &Context) {
        let Some(action) = self.on.as_ref().and_then(|on| on.fail.as_ref()) else {
            return;
        };
        debug::println(ctx, &format!("exec: on.fail: {}", action.exec));
        if let Err(e) = action.run(ctx, self.default_shell()).await {
            tracing::warn!(command = %action.exec, error = %e, "on.fail action failed");
        }
    }
}

impl DecodeUnit for ExecSpec {
    const KIND: &'static str = "exec";
    const FIELDS: &'static [&'static str] = &["exec", "shell", "assert", "var", "on"];

    fn decode(node: &Node) -> Result<Self> {
        let raw: RawExecSpec = node.decode()?;
        let exec_node = node.get("exec").unwrap_or(node);
        if raw.exec.trim().is_empty() {
            return Err(Error::Decode {
                pos: exec_node.pos().clone(),
                message: "exec must not be empty".to_string(),
            });
        }
        if let Some(shell) = &raw.shell {
            let pos = node.get("shell").unwrap_or(node).pos();
            super::check_shell(shell, pos)?;
        }
        Ok(Self {
            base: Base::default(),
            action: Action {
                exec: raw.exec,
                shell: raw.shell,
            },
            assert: raw.assert,
            var: raw.var,
            on: raw.on,
            fallback_shell: None,
        })
    }
}

#[async_trait]
impl TestUnit for ExecSpec {
    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }

    async fn run(&self, ctx: &Context, _reporter: &mut dyn Reporter) -> Result<RunResult> {
        let outcome = match self.action.run(ctx, self.default_shell()).await {
            Ok(outcome) => outcome,
            Err(e) => return Ok(RunResult::new().with_runtime_error(e)),
        };

        let failures = self.assert.clone().unwrap_or_default().evaluate(&outcome);
        let mut res = RunResult::new()
            .with_failures(failures)
            .with_data(super::PLUGIN_NAME, outcome.to_json());
        if let Some(var) = &self.var {
            var.capture(&outcome, &mut res);
        }
        if res.failed() {
            self.run_on_fail(ctx).await;
        }
        Ok(res)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use crate::debug::DebugSink;
    use crate::reporter::RecordingReporter;

    fn decode(yaml: &str) -> Result<ExecSpec> {
        ExecSpec::decode(&Node::from_yaml_str(yaml).unwrap())
    }

    #[test]
    fn test_decode_full_unit() {
        let spec = decode(
            "exec: ls -l\nshell: sh\nassert:\n  exit_code: 2\n  err:\n    contains: [No such]\nvar:\n  stdout: LISTING\n",
        )
        .unwrap();
        assert_eq!(spec.action.exec, "ls -l");
        assert_eq!(spec.action.shell.as_deref(), Some("sh"));
        let assert = spec.assert.unwrap();
        assert_eq!(assert.exit_code, 2);
        assert_eq!(assert.err.unwrap().contains, vec!["No such"]);
        assert_eq!(spec.var.unwrap().stdout.as_deref(), Some("LISTING"));
    }

    #[test]
    fn test_decode_unknown_shell() {
        let err = decode("exec: echo\nshell: yamltest-no-such-shell\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownShell);
        assert!(err.is(ErrorKind::Parse));
    }

    #[test]
    fn test_decode_missing_exec() {
        let err = decode("shell: sh\n").unwrap_err();
        assert!(err.is(ErrorKind::Parse));
        let err = decode("exec: ''\n").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_run_reports_data_and_vars() {
        let mut spec = decode("exec: echo cat\nvar:\n  stdout: ANIMAL\n  exit_code: RC\n").unwrap();
        spec.set_base(Base::default());
        let mut reporter = RecordingReporter::new();

        let res = spec.run(&Context::new(), &mut reporter).await.unwrap();

        assert!(!res.failed());
        let data = res.data().unwrap();
        assert_eq!(data["exec"]["stdout"], "cat\n");
        assert_eq!(data["exec"]["exit_code"], 0);
        let vars = res.vars().unwrap();
        assert_eq!(vars["ANIMAL"], "cat");
        assert_eq!(vars["RC"], 0);
    }

    #[tokio::test]
    async fn test_run_failure_triggers_on_fail() {
        let spec = decode(
            "exec: echo cat\nassert:\n  out:\n    is: dat\non:\n  fail:\n    exec: echo bad kitty\n",
        )
        .unwrap();
        let (sink, buf) = DebugSink::buffer();
        let ctx = Context::new().with_debug(sink);
        let mut reporter = RecordingReporter::new();

        let res = spec.run(&ctx, &mut reporter).await.unwrap();

        assert_eq!(res.failures(), &["not equal: expected dat but got cat".to_string()]);
        assert!(buf.contents().contains("exec: echo [bad kitty]"));
    }

    #[tokio::test]
    async fn test_run_spawn_failure_is_runtime_error() {
        let spec = decode("exec: yamltest-no-such-program\n").unwrap();
        let mut reporter = RecordingReporter::new();

        let res = spec.run(&Context::new(), &mut reporter).await.unwrap();

        assert!(res.has_runtime_error());
        assert!(res.runtime_error().unwrap().is(ErrorKind::ExecFailed));
        assert!(!res.failed());
    }
}
