//! `tokensale`: replay a token sale scenario and print its settlement.
//!
//! ```text
//! tokensale run --scenario scenarios/sample.json [--config scenarios/sale.json]
//! tokensale default-config
//! ```
//!
//! Logs go to stderr (`--log-format pretty|json`, `RUST_LOG` overrides
//! `--log-level`); the JSON report goes to stdout.

mod scenario;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tokensale_types::{Result, SaleConfig, SaleError, constants, wei_to_ether};
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

#[derive(Debug, Parser)]
#[command(name = "tokensale", version, about)]
struct Cli {
    /// Log level when RUST_LOG is unset, e.g. info,debug,trace
    #[arg(long, env = "TOKENSALE_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Log line format.
    #[arg(
        long,
        value_enum,
        env = "TOKENSALE_LOG_FORMAT",
        default_value_t = LogFormat::Pretty,
        global = true
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deploy a sale, replay the scenario, settle and pay out.
    Run {
        /// Scenario file (owner, allow-list, purchases, transfers).
        #[arg(long, env = "TOKENSALE_SCENARIO")]
        scenario: PathBuf,

        /// Sale config file; defaults apply when omitted.
        #[arg(long, env = "TOKENSALE_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the default sale config as JSON.
    DefaultConfig,
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    match cli.log_format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().flatten_event(true).init(),
    }
}

fn load_config(path: Option<&Path>) -> Result<SaleConfig> {
    match path {
        Some(path) => SaleConfig::from_json_str(&std::fs::read_to_string(path)?),
        None => Ok(SaleConfig::default()),
    }
}

fn run(cli: &Cli) -> Result<String> {
    match &cli.command {
        Command::Run { scenario, config } => {
            let config = load_config(config.as_deref())?;
            let scenario = Scenario::from_json_str(&std::fs::read_to_string(scenario)?)?;
            let outcome = scenario.run(&config)?;
            tracing::info!(
                sale = %outcome.report.sale_id,
                tokens_granted = outcome.distribution.tokens_granted,
                tokens_burned = outcome.distribution.tokens_burned,
                proceeds_ether = %wei_to_ether(outcome.distribution.proceeds),
                rejected = outcome.rejected.len(),
                "Scenario complete"
            );
            Ok(serde_json::to_string_pretty(&outcome)?)
        }
        Command::DefaultConfig => Ok(serde_json::to_string_pretty(&SaleConfig::default())?),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);
    tracing::debug!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        "Starting"
    );

    match run(&cli) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Run failed");
            eprintln!("error: {err}");
            match err {
                SaleError::Configuration(_) | SaleError::Serialization(_) | SaleError::Io(_) => {
                    ExitCode::from(2)
                }
                _ => ExitCode::FAILURE,
            }
        }
    }
}
