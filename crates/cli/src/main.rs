// bursar CLI - cash session reconciliation over exported school ledgers

mod exit_codes;
mod logging;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "bursar")]
#[command(about = "Cash session reconciliation and financial anomaly detection")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log engine decisions (coerced amounts, skipped records) to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive reports from a snapshot (exit 62 = irregularities at/above --fail-on)
    #[command(after_help = "\
Examples:
  bursar run --snapshot ledger.json --json
  bursar run --snapshot ledger.json --config campus.recon.toml --output reports.json
  bursar run --snapshot ledger.json --from 2026-03-01 --to 2026-03-31 --cashier 4
  bursar run --snapshot ledger.json --as-of 2026-03-20 --fail-on medium")]
    Run(recon::RunArgs),

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  bursar validate campus.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  bursar-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => recon::cmd_run(args),
        Commands::Validate { config } => recon::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
