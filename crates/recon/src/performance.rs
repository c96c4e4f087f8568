//! Per-cashier and per-payment-method rollups.

use std::collections::{HashMap, HashSet};

use crate::amount::{rounded_average, total};
use crate::filter::FilteredLedger;
use crate::model::{Cashier, PaymentMethod};
use crate::report::{CashierPerformance, PaymentMethodStats};

/// One row per cashier in `roster`, highest `total_payments` first.
///
/// Expenses carry no cashier. An expense is attributed to every cashier with
/// at least one filtered session on the expense's register, once per cashier.
pub fn cashier_performance(
    roster: &[Cashier],
    filtered: &FilteredLedger<'_>,
    cashier_filter: Option<&str>,
) -> Vec<CashierPerformance> {
    let mut rows: Vec<CashierPerformance> = roster
        .iter()
        .filter(|c| cashier_filter.map_or(true, |wanted| c.id == wanted))
        .map(|cashier| {
            let payments: Vec<i64> = filtered
                .payments
                .iter()
                .filter(|p| p.cashier_id.as_deref() == Some(cashier.id.as_str()))
                .map(|p| p.amount)
                .collect();

            let sessions: Vec<_> = filtered
                .sessions
                .iter()
                .filter(|s| s.cashier_id == cashier.id)
                .collect();
            let registers: HashSet<&str> = sessions.iter().map(|s| s.register_id.as_str()).collect();

            let expenses: Vec<i64> = filtered
                .expenses
                .iter()
                .filter(|e| e.register_id.as_deref().is_some_and(|r| registers.contains(r)))
                .map(|e| e.amount)
                .collect();

            let total_payments = total(payments.iter().copied());
            let total_expenses = total(expenses.iter().copied());
            let transaction_count = payments.len() + expenses.len();

            CashierPerformance {
                cashier_id: cashier.id.clone(),
                cashier_name: cashier.name.clone(),
                total_payments,
                total_expenses,
                transaction_count,
                average_transaction: rounded_average(
                    total_payments.saturating_add(total_expenses),
                    transaction_count,
                ),
                session_count: sessions.len(),
                last_session_opened_at: sessions.iter().map(|s| s.opening_date).max(),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.total_payments.cmp(&a.total_payments));
    rows
}

/// One row per method in `roster`, highest `total_amount` first.
///
/// Amounts come from each payment's allocation to the method, not the full
/// payment amount. Percentages are against total filtered revenue.
pub fn payment_method_stats(
    roster: &[PaymentMethod],
    filtered: &FilteredLedger<'_>,
) -> Vec<PaymentMethodStats> {
    let revenue = total(filtered.payments.iter().map(|p| p.amount));

    // method id -> (allocated total, payments using it)
    let mut per_method: HashMap<&str, (i64, usize)> = HashMap::new();
    for payment in &filtered.payments {
        let mut seen: HashSet<&str> = HashSet::new();
        for allocation in &payment.allocations {
            let entry = per_method.entry(allocation.method_id.as_str()).or_default();
            entry.0 = entry.0.saturating_add(allocation.amount);
            if seen.insert(allocation.method_id.as_str()) {
                entry.1 += 1;
            }
        }
    }

    let mut rows: Vec<PaymentMethodStats> = roster
        .iter()
        .map(|method| {
            let (total_amount, transaction_count) =
                per_method.get(method.id.as_str()).copied().unwrap_or_default();
            PaymentMethodStats {
                method_id: method.id.clone(),
                method_name: method.name.clone(),
                total_amount,
                transaction_count,
                percentage: percentage(total_amount, revenue),
                average_amount: rounded_average(total_amount, transaction_count),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));
    rows
}

fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
