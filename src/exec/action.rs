//! Running a command line as a child process

use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::common::{Error, Result};
use crate::context::Context;
use crate::debug;

/// A command to run, optionally through a shell
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Action {
    pub exec: String,
    #[serde(default)]
    pub shell: Option<String>,
}

/// Exit status and captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Exit code, or -1 when the process was killed by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "exit_code": self.exit_code,
            "stdout": self.stdout,
            "stderr": self.stderr,
        })
    }
}

impl Action {
    pub fn new(exec: &str) -> Self {
        Self {
            exec: exec.to_string(),
            shell: None,
        }
    }

    /// Program and arguments for this action. The action's own shell wins
    /// over `fallback`; without any shell the command line is split on
    /// whitespace.
    pub fn argv(&self, fallback: Option<&str>) -> (String, Vec<String>) {
        match self.shell.as_deref().or(fallback) {
            Some(shell) => (shell.to_string(), vec!["-c".to_string(), self.exec.clone()]),
            None => {
                let mut parts = self.exec.split_whitespace().map(str::to_string);
                let program = parts.next().unwrap_or_default();
                (program, parts.collect())
            }
        }
    }

    /// Run to completion, capturing both output pipes.
    ///
    /// The child is killed if the returned future is dropped, so a unit
    /// timeout does not leave processes behind.
    pub async fn run(&self, ctx: &Context, fallback_shell: Option<&str>) -> Result<Outcome> {
        let (program, args) = self.argv(fallback_shell);
        debug::println(ctx, &format!("exec: {} [{}]", program, args.join(" ")));

        let output = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::exec_failed(&self.exec, &e.to_string()))?;

        let outcome = Outcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !outcome.stdout.is_empty() {
            debug::println(ctx, &format!("exec: stdout: {}", outcome.stdout.trim_end()));
        }
        if !outcome.stderr.is_empty() {
            debug::println(ctx, &format!("exec: stderr: {}", outcome.stderr.trim_end()));
        }
        Ok(outcome)
    }
}
