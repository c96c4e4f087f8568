//! Revenue and expenses bucketed by calendar month (UTC).

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};

use crate::filter::FilteredLedger;
use crate::report::MonthlyFinancialData;

#[derive(Default)]
struct Bucket {
    revenue: i64,
    expenses: i64,
    payment_count: usize,
    expense_count: usize,
}

/// Months present in the filtered payments or expenses, ascending.
/// Undated records are not bucketed.
pub fn monthly_breakdown(filtered: &FilteredLedger<'_>) -> Vec<MonthlyFinancialData> {
    let mut months: BTreeMap<(i32, u32), Bucket> = BTreeMap::new();

    for payment in &filtered.payments {
        if let Some(at) = payment.created_at {
            let bucket = months.entry(month_of(at)).or_default();
            bucket.revenue = bucket.revenue.saturating_add(payment.amount);
            bucket.payment_count += 1;
        }
    }
    for expense in &filtered.expenses {
        if let Some(at) = expense.expense_date {
            let bucket = months.entry(month_of(at)).or_default();
            bucket.expenses = bucket.expenses.saturating_add(expense.amount);
            bucket.expense_count += 1;
        }
    }

    months
        .into_iter()
        .map(|((year, month), b)| MonthlyFinancialData {
            month: format!("{year:04}-{month:02}"),
            revenue: b.revenue,
            expenses: b.expenses,
            net: b.revenue.saturating_sub(b.expenses),
            payment_count: b.payment_count,
            expense_count: b.expense_count,
        })
        .collect()
}

fn month_of(at: DateTime<Utc>) -> (i32, u32) {
    (at.year(), at.month())
}
