use chrono::{DateTime, Utc};
use log::info;

use crate::chain::build_chains;
use crate::config::ReconConfig;
use crate::delinquency::{pricings_in_scope, resolve_academic_year, scan_overdue};
use crate::demand::analyze_demands;
use crate::error::ReconError;
use crate::filter::{self, ReportFilters};
use crate::model::Ledger;
use crate::monthly::monthly_breakdown;
use crate::normalize::normalize;
use crate::performance::{cashier_performance, payment_method_stats};
use crate::reconcile::reconcile_sessions;
use crate::report::{DataQualityWarning, ReportMeta, Reports};
use crate::snapshot::Snapshot;
use crate::summary::summarize;

/// What one dashboard refresh asks for.
///
/// `as_of` stands in for "now" everywhere (overdue days, pending
/// installments, unclosed session windows). The engine never reads the clock.
#[derive(Debug, Clone, PartialEq)]
pub struct DeriveRequest {
    pub as_of: DateTime<Utc>,
    pub filters: ReportFilters,
}

impl DeriveRequest {
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            filters: ReportFilters::default(),
        }
    }
}

/// Derive every report from one snapshot.
///
/// Infallible: malformed values are coerced and listed in
/// `Reports::data_quality`, empty inputs give zero-value reports.
pub fn derive(config: &ReconConfig, snapshot: &Snapshot, request: &DeriveRequest) -> Reports {
    let normalized = normalize(snapshot, &config.currency);
    derive_ledger(config, &normalized.ledger, normalized.warnings, request)
}

/// Parse a JSON snapshot, then [`derive`].
pub fn derive_json(
    config: &ReconConfig,
    snapshot_json: &str,
    request: &DeriveRequest,
) -> Result<Reports, ReconError> {
    let snapshot = Snapshot::from_json(snapshot_json)?;
    Ok(derive(config, &snapshot, request))
}

/// Derive from an already-normalized ledger.
pub fn derive_ledger(
    config: &ReconConfig,
    ledger: &Ledger,
    data_quality: Vec<DataQualityWarning>,
    request: &DeriveRequest,
) -> Reports {
    let filters = &request.filters;
    let as_of = request.as_of;
    let filtered = filter::apply(ledger, filters);

    let chains = build_chains(&filtered.sessions);
    let irregularities = filter::retain_severity(
        reconcile_sessions(&chains, &ledger.payments, &ledger.expenses, config, as_of),
        filters.severity,
    );

    let academic_year = resolve_academic_year(ledger, filters.academic_year_id.as_deref());
    let overdue_payments = scan_overdue(ledger, academic_year, as_of);
    let summary = summarize(
        &filtered,
        pricings_in_scope(ledger, academic_year),
        &overdue_payments,
        as_of,
    );

    let cashiers = cashier_performance(&ledger.cashiers, &filtered, filters.cashier_id.as_deref());
    let payment_methods = payment_method_stats(&ledger.payment_methods, &filtered);
    let demand_analysis = analyze_demands(&filtered.demands);
    let monthly = monthly_breakdown(&filtered);

    info!(
        "derived reports as of {}: {} payments, {} expenses, {} sessions in {} chains, \
         {} irregularities, {} overdue installments, {} data-quality warnings",
        as_of.to_rfc3339(),
        filtered.payments.len(),
        filtered.expenses.len(),
        filtered.sessions.len(),
        chains.len(),
        irregularities.len(),
        overdue_payments.len(),
        data_quality.len(),
    );

    Reports {
        meta: ReportMeta {
            config_name: config.name.clone(),
            currency: config.currency.code.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            as_of,
            tolerance: config.tolerance.discrepancy,
        },
        summary,
        irregularities,
        overdue_payments,
        demand_analysis,
        payment_methods,
        monthly,
        cashiers,
        data_quality,
    }
}
