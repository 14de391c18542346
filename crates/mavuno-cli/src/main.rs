#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;
mod telemetry;

use std::process;

use anyhow::Context;
use mavuno_flow::engine::Engine;
use mavuno_flow::registry::FlowRegistry;
use mavuno_gemini::GeminiClient;

use crate::config::{Cli, Command, RunArgs};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "mavuno_cli::startup";
pub const TRACING_TARGET_CONFIG: &str = "mavuno_cli::config";
pub const TRACING_TARGET_RUN: &str = "mavuno_cli::run";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_STARTUP,
            error = %format!("{error:#}"),
            "mavuno terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    telemetry::init_tracing();
    log_startup_info();

    match cli.command {
        Command::List => {
            let registry = FlowRegistry::with_defaults().context("failed to load flows")?;
            command::list_flows(&registry, &mut std::io::stdout().lock())
                .context("failed to write flow list")?;
        }
        Command::Run(args) => run_command(args).await?,
    }

    Ok(())
}

async fn run_command(args: RunArgs) -> anyhow::Result<()> {
    args.log();

    let input = command::read_input(args.input.as_deref())?;
    let client = GeminiClient::new(args.gemini).context("failed to create Gemini client")?;
    let registry = FlowRegistry::with_defaults().context("failed to load flows")?;
    let engine = Engine::new(args.engine, registry, client.into_shared());

    let output = command::run_flow(&engine, &args.flow, input, args.report).await?;
    command::write_output(&output, args.output.as_deref())
}

/// Logs startup information.
fn log_startup_info() {
    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        features = ?enabled_features(),
        "starting mavuno"
    );
}

/// Returns a list of enabled compile-time features.
fn enabled_features() -> Vec<&'static str> {
    [cfg!(feature = "dotenv").then_some("dotenv")]
        .into_iter()
        .flatten()
        .collect()
}
