//! CLI command handling
//!
//! Builds the plugin registry and execution context from configuration,
//! then resolves and runs each scenario file.

mod discover;

pub use discover::scenario_files;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::context::Context;
use crate::debug::DebugSink;
use crate::exec::ExecPlugin;
use crate::plugin::PluginRegistry;
use crate::reporter::{ConsoleReporter, Reporter};
use crate::scenario::Scenario;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            paths,
            debug,
            config,
            verbose,
            fail_fast,
        } => {
            let config = load_config(config.as_deref())?;
            let registry = default_registry(&config);
            let mut ctx = Context::new().with_plugins(registry.list());
            if debug || config.debug.enabled {
                ctx = ctx.with_debug(debug_sink(&config)?);
            }

            let files = scenario_files(&paths, &config.run.extensions)?;
            if files.is_empty() {
                return Err(Error::Config("no scenario files found".to_string()));
            }
            run_files(&files, &ctx, verbose, fail_fast || config.run.fail_fast).await
        }

        Commands::Plugins { json } => {
            let registry = default_registry(&Config::load()?);
            print_plugins(&registry, json)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Registry holding the built-in plugins
pub fn default_registry(config: &Config) -> PluginRegistry {
    let registry = PluginRegistry::new();
    registry.add(Arc::new(ExecPlugin::with_shell(config.exec.shell.clone())));
    registry
}

fn debug_sink(config: &Config) -> Result<DebugSink> {
    match &config.debug.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| Error::FileWrite {
                    path: path.display().to_string(),
                    error: e.to_string(),
                })?;
            Ok(DebugSink::new(file))
        }
        None => Ok(DebugSink::stderr()),
    }
}

async fn run_files(files: &[PathBuf], ctx: &Context, verbose: bool, fail_fast: bool) -> Result<()> {
    let mut reporter = ConsoleReporter::new(verbose);
    let mut failed = 0;
    let mut total = 0;

    for file in files {
        total += 1;
        if !run_file(file, ctx, &mut reporter).await {
            failed += 1;
            if fail_fast {
                break;
            }
        }
    }

    println!();
    let summary = format!(
        "{} passed, {} failed ({} scenarios)",
        reporter.passed_count(),
        reporter.failed_count(),
        total
    );
    if failed == 0 {
        println!("{} {}", "✓".green().bold(), summary.green().bold());
        Ok(())
    } else {
        println!("{} {}", "✗".red().bold(), summary.red().bold());
        Err(Error::ScenariosFailed { failed, total })
    }
}

/// Resolve and run one scenario file, returning whether it passed
async fn run_file(file: &Path, ctx: &Context, reporter: &mut ConsoleReporter) -> bool {
    let scenario = match Scenario::from_path(file, ctx) {
        Ok(scenario) => scenario,
        Err(e) => {
            reporter.enter(&file.display().to_string());
            reporter.fatal(&e.to_string());
            reporter.leave();
            return false;
        }
    };

    let failures_before = reporter.failed_count();
    let result = scenario.run(ctx, reporter).await;
    if let Err(e) = &result {
        eprintln!("{} {}: {}", "Error:".red(), scenario.title(), e);
    }
    result.is_ok() && reporter.failed_count() == failures_before
}

fn print_plugins(registry: &PluginRegistry, json: bool) -> Result<()> {
    let plugins = registry.list();
    if json {
        let listing: Vec<_> = plugins
            .iter()
            .map(|p| {
                let info = p.info();
                let specs: Vec<_> = p
                    .specs()
                    .iter()
                    .map(|s| serde_json::json!({ "kind": s.kind(), "fields": s.fields() }))
                    .collect();
                serde_json::json!({
                    "name": info.name,
                    "description": info.description,
                    "specs": specs,
                })
            })
            .collect();
        let out = serde_json::to_string_pretty(&listing)
            .map_err(|e| Error::Config(format!("failed to serialize plugin list: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    for plugin in plugins {
        let info = plugin.info();
        println!("{} - {}", info.name.bold(), info.description);
        for shape in plugin.specs() {
            println!("  {} [{}]", shape.kind().cyan(), shape.fields().join(", ").dimmed());
        }
    }
    Ok(())
}
