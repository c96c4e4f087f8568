//! Session reconciliation.
//!
//! Two independent checks per session:
//!
//! - **Gap**: opening amount vs. the predecessor's recorded closing amount.
//! - **Balance**: declared closing amount vs. opening + payments - expenses
//!   recorded on the same register inside the session window.
//!
//! Both classify the discrepancy with the same severity bands. Nothing is
//! corrected; irregularities are only reported.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::debug;

use crate::amount::total;
use crate::chain::SessionChain;
use crate::config::ReconConfig;
use crate::model::{CashSession, Expense, Payment};
use crate::report::{IrregularityKind, SessionIrregularity};

/// Run both checks over every chain. Output follows chain order, sessions
/// chronologically, gap before balance for the same session.
///
/// `payments` and `expenses` are the whole ledger, not the filtered views:
/// filters pick which sessions are checked, never which movements count
/// toward a checked session's window.
pub fn reconcile_sessions(
    chains: &[SessionChain<'_>],
    payments: &[Payment],
    expenses: &[Expense],
    config: &ReconConfig,
    as_of: DateTime<Utc>,
) -> Vec<SessionIrregularity> {
    let movements = RegisterMovements::index(payments, expenses);
    let mut irregularities = Vec::new();

    for chain in chains {
        for (previous, session) in chain.links() {
            if let Some(previous) = previous {
                irregularities.extend(check_gap(previous, session, config));
            }
            irregularities.extend(check_balance(session, &movements, config, as_of));
        }
    }

    irregularities
}

/// Check A. Skipped unless the predecessor is closed with a recorded closing amount.
pub fn check_gap(
    previous: &CashSession,
    current: &CashSession,
    config: &ReconConfig,
) -> Option<SessionIrregularity> {
    let expected = previous.recorded_closing()?;
    let discrepancy = discrepancy(current.opening_amount, expected);
    let severity = config.severity_for(discrepancy)?;

    Some(SessionIrregularity {
        kind: IrregularityKind::SessionGap,
        severity,
        session_id: current.id.clone(),
        previous_session_id: Some(previous.id.clone()),
        cashier_id: current.cashier_id.clone(),
        register_id: current.register_id.clone(),
        expected_amount: expected,
        declared_amount: current.opening_amount,
        discrepancy,
        detected_at: current.opening_date,
    })
}

/// Check B. Skipped unless the session is closed with a recorded closing amount.
pub fn check_balance(
    session: &CashSession,
    movements: &RegisterMovements<'_>,
    config: &ReconConfig,
    as_of: DateTime<Utc>,
) -> Option<SessionIrregularity> {
    let Some(declared) = session.recorded_closing() else {
        if !session.is_open() {
            debug!("session {}: closed without closing amount, balance check skipped", session.id);
        }
        return None;
    };
    let until = session.closing_date.unwrap_or(as_of);
    let expected = expected_closing(session, movements, until);
    let discrepancy = discrepancy(declared, expected);
    let severity = config.severity_for(discrepancy)?;

    Some(SessionIrregularity {
        kind: IrregularityKind::OpeningClosing,
        severity,
        session_id: session.id.clone(),
        previous_session_id: None,
        cashier_id: session.cashier_id.clone(),
        register_id: session.register_id.clone(),
        expected_amount: expected,
        declared_amount: declared,
        discrepancy,
        detected_at: until,
    })
}

/// `opening_amount + payments - expenses` over `[opening_date, until]`.
pub fn expected_closing(
    session: &CashSession,
    movements: &RegisterMovements<'_>,
    until: DateTime<Utc>,
) -> i64 {
    let (received, spent) = movements.between(&session.register_id, session.opening_date, until);
    session
        .opening_amount
        .saturating_add(received)
        .saturating_sub(spent)
}

fn discrepancy(declared: i64, expected: i64) -> i64 {
    i64::try_from(declared.abs_diff(expected)).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Register index
// ---------------------------------------------------------------------------

/// Dated payments and expenses grouped by register. Records without a
/// register or a date can never fall inside a session window and are left out.
#[derive(Debug, Default)]
pub struct RegisterMovements<'a> {
    payments: HashMap<&'a str, Vec<&'a Payment>>,
    expenses: HashMap<&'a str, Vec<&'a Expense>>,
}

impl<'a> RegisterMovements<'a> {
    pub fn index(payments: &'a [Payment], expenses: &'a [Expense]) -> Self {
        let mut index = Self::default();
        for p in payments {
            if let (Some(register), Some(_)) = (p.register_id.as_deref(), p.created_at) {
                index.payments.entry(register).or_default().push(p);
            }
        }
        for e in expenses {
            if let (Some(register), Some(_)) = (e.register_id.as_deref(), e.expense_date) {
                index.expenses.entry(register).or_default().push(e);
            }
        }
        index
    }

    /// `(payments, expenses)` totals on `register` within `[from, until]`.
    pub fn between(&self, register: &str, from: DateTime<Utc>, until: DateTime<Utc>) -> (i64, i64) {
        let within = |at: Option<DateTime<Utc>>| at.is_some_and(|at| at >= from && at <= until);
        let received = self.payments.get(register).map_or(0, |list| {
            total(list.iter().filter(|p| within(p.created_at)).map(|p| p.amount))
        });
        let spent = self.expenses.get(register).map_or(0, |list| {
            total(list.iter().filter(|e| within(e.expense_date)).map(|e| e.amount))
        });
        (received, spent)
    }
}
