//! Financial summary over the filtered record set.

use chrono::{DateTime, Utc};

use crate::amount::total;
use crate::filter::FilteredLedger;
use crate::model::Pricing;
use crate::report::{FinancialSummary, OverdueStudentPayment};

/// Roll up the filtered records.
///
/// `overdue` must be the delinquency scanner's output for the same pass so
/// that `overdue_amount` and the overdue list never disagree. `pricings` is
/// the same academic-year scope the scanner used.
pub fn summarize<'a>(
    filtered: &FilteredLedger<'_>,
    pricings: impl IntoIterator<Item = &'a Pricing>,
    overdue: &[OverdueStudentPayment],
    as_of: DateTime<Utc>,
) -> FinancialSummary {
    let today = as_of.date_naive();

    let total_revenue = total(filtered.payments.iter().map(|p| p.amount));
    let total_expenses = total(filtered.expenses.iter().map(|e| e.amount));

    let pending_payments = total(
        pricings
            .into_iter()
            .flat_map(|p| &p.installments)
            .filter(|i| !i.is_paid() && i.due_date.is_some_and(|due| due > today))
            .map(|i| i.amount_due),
    );

    let open_sessions: Vec<_> = filtered.sessions.iter().filter(|s| s.is_open()).collect();

    FinancialSummary {
        total_revenue,
        total_expenses,
        net_balance: total_revenue.saturating_sub(total_expenses),
        pending_payments,
        overdue_amount: total(overdue.iter().map(|o| o.amount_due)),
        cash_in_hand: total(open_sessions.iter().map(|s| s.opening_amount)),
        active_sessions: open_sessions.len(),
        payment_count: filtered.payments.len(),
        expense_count: filtered.expenses.len(),
    }
}
