//! yamltest - declarative YAML test scenarios
//!
//! Resolves YAML scenario documents into test units supplied by plugins
//! and runs them with shared fixture, timeout and wait semantics.

use clap::Parser;
use yamltest::commands::Commands;
use yamltest::{cli, common::logging};

#[derive(Parser)]
#[command(name = "yamltest", about = "Run declarative YAML test scenarios")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.command.verbose());

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
