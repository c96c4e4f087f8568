//! Log output for the CLI.
//!
//! The engine logs through the `log` facade; the fmt subscriber bridges those
//! records, so `RUST_LOG=bursar_recon=debug` shows every coerced amount and
//! skipped record. Everything goes to stderr so `--json` stdout stays a
//! single JSON value.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `--verbose` forces `debug`. Otherwise `RUST_LOG` applies, defaulting to `warn`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    if let Err(e) = install(filter) {
        eprintln!("warning: logging disabled: {e}");
    }
}

fn install(filter: EnvFilter) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time()
        .try_init()
}
