//! Session chains: one per (cashier, register) pair, ordered by opening date.

use std::collections::BTreeMap;

use crate::model::CashSession;

#[derive(Debug, Clone)]
pub struct SessionChain<'a> {
    pub cashier_id: &'a str,
    pub register_id: &'a str,
    /// Ascending by opening date; equal dates keep input order.
    pub sessions: Vec<&'a CashSession>,
}

impl<'a> SessionChain<'a> {
    /// Each session with its immediate predecessor (`None` for the first).
    pub fn links(&self) -> impl Iterator<Item = (Option<&'a CashSession>, &'a CashSession)> + '_ {
        self.sessions.iter().enumerate().map(|(i, current)| {
            let previous = i.checked_sub(1).map(|p| self.sessions[p]);
            (previous, *current)
        })
    }
}

/// Group sessions by `(cashier_id, register_id)`. Chains come out in
/// ascending key order.
pub fn build_chains<'a>(sessions: &[&'a CashSession]) -> Vec<SessionChain<'a>> {
    let mut groups: BTreeMap<(&'a str, &'a str), Vec<&'a CashSession>> = BTreeMap::new();
    for &session in sessions {
        groups
            .entry((session.cashier_id.as_str(), session.register_id.as_str()))
            .or_default()
            .push(session);
    }

    groups
        .into_iter()
        .map(|((cashier_id, register_id), mut sessions)| {
            sessions.sort_by_key(|s| s.opening_date);
            SessionChain {
                cashier_id,
                register_id,
                sessions,
            }
        })
        .collect()
}
