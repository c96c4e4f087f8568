//! `bursar run` and `bursar validate`: snapshot reconciliation.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;

use bursar_recon::normalize::parse_timestamp;
use bursar_recon::{
    derive, DateRange, DemandStatus, DeriveRequest, ReconConfig, ReportFilters, Reports, Severity,
    Snapshot,
};

use crate::exit_codes::{recon_exit_code, EXIT_RECON_IRREGULAR, EXIT_RECON_RUNTIME, EXIT_USAGE};
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// Snapshot JSON exported from the school database
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Path to the .recon.toml config file (defaults apply when omitted)
    #[arg(long, env = "BURSAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// First day of the window, inclusive (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Last day of the window, inclusive (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Only this cashier's payments and sessions
    #[arg(long, value_name = "ID")]
    pub cashier: Option<String>,

    /// Only this register's payments, expenses and sessions
    #[arg(long, value_name = "ID")]
    pub register: Option<String>,

    /// Only demands with this status (pending, approved, rejected, validated)
    #[arg(long, value_name = "STATUS")]
    pub demand_status: Option<DemandStatus>,

    /// Only irregularities of exactly this severity (low, medium, high)
    #[arg(long, value_name = "LEVEL")]
    pub severity: Option<Severity>,

    /// Academic year for delinquency (defaults to the year flagged current)
    #[arg(long, value_name = "ID")]
    pub academic_year: Option<String>,

    /// Reference time for overdue days and unclosed sessions (default: now)
    #[arg(long, value_name = "TIME", value_parser = parse_as_of)]
    pub as_of: Option<DateTime<Utc>>,

    /// Output JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Exit 62 when any irregularity is at or above this severity
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<Severity>,
}

fn parse_as_of(s: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(s).ok_or_else(|| format!("invalid time \"{s}\" (expected RFC 3339 or YYYY-MM-DD)"))
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

impl RunArgs {
    fn request(&self) -> Result<DeriveRequest, CliError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(recon_err(EXIT_USAGE, format!("--from {from} is after --to {to}"))
                    .with_hint("the window is inclusive on both ends; swap the dates"));
            }
        }
        Ok(DeriveRequest {
            as_of: self.as_of.unwrap_or_else(Utc::now),
            filters: ReportFilters {
                date_range: DateRange { start: self.from, end: self.to },
                cashier_id: self.cashier.clone(),
                register_id: self.register.clone(),
                demand_status: self.demand_status,
                severity: self.severity,
                academic_year_id: self.academic_year.clone(),
            },
        })
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        tracing::debug!("no config given, using defaults");
        return Ok(ReconConfig::default());
    };
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read config: {e}")))?;
    ReconConfig::from_toml(&config_str)
        .map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let request = args.request()?;
    let config = load_config(args.config.as_ref())?;

    let snapshot_str = std::fs::read_to_string(&args.snapshot).map_err(|e| {
        recon_err(EXIT_RECON_RUNTIME, format!("cannot read {}: {e}", args.snapshot.display()))
    })?;
    let snapshot = Snapshot::from_json(&snapshot_str).map_err(|e| {
        recon_err(recon_exit_code(&e), e.to_string())
            .with_hint("the snapshot must be one JSON object of record collections")
    })?;

    let reports = derive(&config, &snapshot, &request);

    let json_str = serde_json::to_string_pretty(&reports)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        println!("{json_str}");
    }

    print_summary(&reports);

    if let (Some(threshold), Some(worst)) = (args.fail_on, reports.worst_severity()) {
        if worst >= threshold {
            return Err(recon_err(
                EXIT_RECON_IRREGULAR,
                format!("irregularities at or above {threshold} found (worst: {worst})"),
            ));
        }
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary(reports: &Reports) {
    let s = &reports.summary;
    let currency = &reports.meta.currency;
    let high = reports
        .irregularities
        .iter()
        .filter(|i| i.severity == Severity::High)
        .count();

    eprintln!(
        "recon as of {}: {} irregularities ({} high), {} overdue installments",
        reports.meta.as_of.to_rfc3339(),
        reports.irregularities.len(),
        high,
        reports.overdue_payments.len(),
    );
    eprintln!(
        "revenue {} {currency}, expenses {} {currency}, net {} {currency}, cash in hand {} {currency} over {} open session(s)",
        s.total_revenue, s.total_expenses, s.net_balance, s.cash_in_hand, s.active_sessions,
    );
    if !reports.data_quality.is_empty() {
        eprintln!(
            "data quality: {} record(s) coerced or skipped (see data_quality in the JSON output)",
            reports.data_quality.len(),
        );
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    eprintln!(
        "valid: '{}' in {} ({} minor digit(s)), tolerance {}, medium above {}, high above {}",
        config.name.as_deref().unwrap_or("unnamed"),
        config.currency.code,
        config.currency.minor_digits,
        config.tolerance.discrepancy,
        config.severity.medium_above,
        config.severity.high_above,
    );
    Ok(())
}
