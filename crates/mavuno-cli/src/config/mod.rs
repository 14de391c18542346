//! CLI configuration.
//!
//! ```text
//! Cli
//! ├── list                          # Registered flows
//! └── run <flow>
//!     ├── input/output/report       # File I/O
//!     ├── gemini: GeminiConfig      # API key, endpoint, models, timeout
//!     └── engine: EngineConfig      # Concurrency caps
//! ```
//!
//! Every option can also be set through its environment variable. Use
//! `--help` on a subcommand to see them.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mavuno_flow::engine::EngineConfig;
use mavuno_gemini::GeminiConfig;

use crate::TRACING_TARGET_CONFIG;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "mavuno")]
#[command(about = "Run mavuno garden planning flows")]
#[command(version)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the registered flows.
    List,
    /// Run a flow on a JSON request.
    Run(RunArgs),
}

/// Arguments of `mavuno run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Name of the flow to run.
    pub flow: String,

    /// JSON request file; reads stdin when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file; writes stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include the execution report alongside the result.
    #[arg(long, default_value_t = false)]
    pub report: bool,

    /// Gemini client configuration.
    #[clap(flatten)]
    pub gemini: GeminiConfig,

    /// Engine configuration.
    #[clap(flatten)]
    pub engine: EngineConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}
}

impl RunArgs {
    /// Logs configuration at info level (no sensitive information).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            flow = %self.flow,
            input = ?self.input,
            output = ?self.output,
            base_url = %self.gemini.base_url,
            text_model = %self.gemini.text_model,
            image_model = %self.gemini.image_model,
            timeout_secs = self.gemini.timeout_secs,
            max_concurrent_runs = self.engine.max_concurrent_runs,
            max_concurrent_enrichments = self.engine.max_concurrent_enrichments,
            "run configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list() {
        let cli = Cli::try_parse_from(["mavuno", "list"]).unwrap();
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn parses_run() {
        let cli = Cli::try_parse_from([
            "mavuno",
            "run",
            "recommendations",
            "--input",
            "request.json",
            "--report",
            "--gemini-api-key",
            "test-key",
            "--gemini-text-model",
            "gemini-2.5-flash",
            "--max-concurrent-enrichments",
            "3",
        ])
        .unwrap();

        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.flow, "recommendations");
        assert_eq!(args.input, Some(PathBuf::from("request.json")));
        assert_eq!(args.output, None);
        assert!(args.report);
        assert_eq!(args.gemini.api_key, "test-key");
        assert_eq!(args.gemini.text_model, "gemini-2.5-flash");
        assert_eq!(args.engine.max_concurrent_enrichments, 3);
    }

    #[test]
    fn run_requires_flow_name() {
        assert!(Cli::try_parse_from(["mavuno", "run", "--gemini-api-key", "k"]).is_err());
    }
}
