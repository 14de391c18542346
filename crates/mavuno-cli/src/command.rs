//! Subcommand implementations.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::Context;
use mavuno_flow::engine::Engine;
use mavuno_flow::registry::FlowRegistry;
use serde_json::Value;

use crate::TRACING_TARGET_RUN;

/// Writes one line per registered flow: its name and description.
pub fn list_flows(registry: &FlowRegistry, out: &mut impl Write) -> io::Result<()> {
    let width = registry.names().iter().map(|name| name.len()).max().unwrap_or(0);
    for flow in registry.definitions() {
        writeln!(out, "{:<width$}  {}", flow.name(), flow.description())?;
    }
    Ok(())
}

/// Reads a JSON request from `path`, or from stdin when `None`.
pub fn read_input(path: Option<&Path>) -> anyhow::Result<Value> {
    let source = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read input from stdin")?;
            buffer
        }
    };

    serde_json::from_str(&source).context("input is not valid JSON")
}

/// Writes `value` as pretty JSON to `path`, or to stdout when `None`.
pub fn write_output(value: &Value, path: Option<&Path>) -> anyhow::Result<()> {
    let mut rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    rendered.push('\n');

    match path {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write output to stdout")
        }
    }
}

/// Runs `flow` and returns the value to print.
///
/// With `report`, the result and its execution report are returned together.
pub async fn run_flow(
    engine: &Engine,
    flow: &str,
    input: Value,
    report: bool,
) -> anyhow::Result<Value> {
    let result = engine
        .run(flow, input)
        .await
        .with_context(|| format!("flow '{flow}' failed"))?;

    tracing::info!(
        target: TRACING_TARGET_RUN,
        flow,
        run_id = %result.report.run_id(),
        fallbacks = ?result.report.fallback_keys(),
        "flow completed"
    );

    if report {
        serde_json::to_value(&result).context("failed to serialize execution report")
    } else {
        Ok(result.value)
    }
}
