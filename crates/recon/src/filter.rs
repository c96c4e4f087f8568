//! Record filters applied before any aggregation.
//!
//! All active filters combine with AND; absent filters impose nothing.
//! Filtering borrows from the ledger and preserves input order.

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{CashSession, Demand, DemandStatus, Expense, Id, Ledger, Payment};
use crate::report::{SessionIrregularity, Severity};

/// Inclusive `[start, end]` at day granularity (UTC date). Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Undated records only pass when no bound is set.
    pub fn contains(&self, at: Option<DateTime<Utc>>) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(at) = at else {
            return false;
        };
        let day = at.date_naive();
        self.start.map_or(true, |start| day >= start) && self.end.map_or(true, |end| day <= end)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilters {
    pub date_range: DateRange,
    pub cashier_id: Option<Id>,
    pub register_id: Option<Id>,
    pub demand_status: Option<DemandStatus>,
    /// Exact match on the irregularity output.
    pub severity: Option<Severity>,
    /// Overrides the ledger's current academic year for delinquency scope.
    pub academic_year_id: Option<Id>,
}

/// Filtered views over a [`Ledger`].
#[derive(Debug, Clone, Default)]
pub struct FilteredLedger<'a> {
    pub payments: Vec<&'a Payment>,
    pub expenses: Vec<&'a Expense>,
    pub sessions: Vec<&'a CashSession>,
    pub demands: Vec<&'a Demand>,
}

pub fn apply<'a>(ledger: &'a Ledger, filters: &ReportFilters) -> FilteredLedger<'a> {
    let range = &filters.date_range;
    let cashier = filters.cashier_id.as_deref();
    let register = filters.register_id.as_deref();

    FilteredLedger {
        payments: ledger
            .payments
            .iter()
            .filter(|p| range.contains(p.created_at))
            .filter(|p| id_matches(cashier, p.cashier_id.as_deref()))
            .filter(|p| id_matches(register, p.register_id.as_deref()))
            .collect(),
        // Expenses carry no cashier, so the cashier filter does not apply.
        expenses: ledger
            .expenses
            .iter()
            .filter(|e| range.contains(e.expense_date))
            .filter(|e| id_matches(register, e.register_id.as_deref()))
            .collect(),
        sessions: ledger
            .sessions
            .iter()
            .filter(|s| range.contains(Some(s.opening_date)))
            .filter(|s| id_matches(cashier, Some(s.cashier_id.as_str())))
            .filter(|s| id_matches(register, Some(s.register_id.as_str())))
            .collect(),
        demands: ledger
            .demands
            .iter()
            .filter(|d| range.contains(d.created_at))
            .filter(|d| filters.demand_status.map_or(true, |status| d.status == status))
            .collect(),
    }
}

/// Keep irregularities of exactly `severity`, or all of them when unset.
pub fn retain_severity(
    irregularities: Vec<SessionIrregularity>,
    severity: Option<Severity>,
) -> Vec<SessionIrregularity> {
    match severity {
        None => irregularities,
        Some(wanted) => irregularities
            .into_iter()
            .filter(|i| i.severity == wanted)
            .collect(),
    }
}

fn id_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual == Some(wanted),
    }
}
